//! 도메인 데이터 모델.

pub mod classification;
pub mod frame;
