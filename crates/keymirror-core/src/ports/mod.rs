//! Hexagonal Architecture 포트 인터페이스.

pub mod frame_source;
pub mod input_driver;
