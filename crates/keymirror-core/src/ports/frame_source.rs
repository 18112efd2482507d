//! 프레임 소스 포트.
//!
//! 대상 윈도우 탐색과 영역 캡처 인터페이스를 정의한다.
//! 구현: `keymirror-vision` crate (xcap)

use crate::error::CoreError;
use crate::models::frame::{CapturedFrame, WindowRect};

/// 프레임 소스 — 윈도우 탐색 + 캡처
///
/// 탐색과 캡처는 동일한 윈도우 열거를 공유하므로 한 포트로 묶는다.
/// 캡처 실패 시 호출자는 `locate()`를 다시 호출해 재탐색해야 한다.
pub trait FrameSource: Send {
    /// 대상 윈도우를 탐색해 사각형 반환
    ///
    /// 윈도우가 없거나 최소화 상태면 `CoreError::WindowNotFound`.
    fn locate(&mut self) -> Result<WindowRect, CoreError>;

    /// 마지막으로 탐색된 사각형을 캡처
    ///
    /// `locate()` 성공 이전이거나 윈도우가 사라진 경우 에러.
    fn capture(&mut self) -> Result<CapturedFrame, CoreError>;
}
