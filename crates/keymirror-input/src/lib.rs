//! # keymirror-input
//!
//! 입력 사이드 — 키보드 시뮬레이션 드라이버와 키 상태 조정기.
//! 분류 결과를 눌린 키 집합에 대한 최소 press/release 액션으로 변환한다.

pub mod driver;
pub mod reconciler;
