//! 윈도우 캡처.
//!
//! xcap 기반 대상 윈도우 탐색 + 캡처.
//! xcap은 최소화된 윈도우를 복원할 수 없으므로 최소화 상태는
//! 미발견으로 취급하고 재탐색 주기에 다시 시도한다.

use image::DynamicImage;
use keymirror_core::error::CoreError;
use keymirror_core::models::frame::{CapturedFrame, WindowRect};
use keymirror_core::ports::frame_source::FrameSource;
use tracing::{debug, info};
use xcap::Window;

/// xcap 기반 프레임 소스
pub struct XcapFrameSource {
    /// 대상 윈도우 제목 부분 문자열 (소문자 비교)
    title_substring: String,
    /// 마지막 탐색된 윈도우 ID
    window_id: Option<u32>,
    /// 마지막 탐색된 사각형
    rect: Option<WindowRect>,
}

impl XcapFrameSource {
    /// 제목 부분 문자열로 프레임 소스 생성
    pub fn new(title_substring: impl Into<String>) -> Self {
        Self {
            title_substring: title_substring.into().to_lowercase(),
            window_id: None,
            rect: None,
        }
    }

    /// 대상 윈도우를 열거 목록에서 찾기
    fn find_window(&self) -> Result<Window, CoreError> {
        let windows =
            Window::all().map_err(|e| CoreError::Capture(format!("윈도우 목록 조회 실패: {e}")))?;

        windows
            .into_iter()
            .find(|w| {
                w.title()
                    .map(|t| t.to_lowercase().contains(&self.title_substring))
                    .unwrap_or(false)
            })
            .ok_or_else(|| CoreError::WindowNotFound(self.title_substring.clone()))
    }

    /// 윈도우의 현재 사각형 조회
    fn window_rect(window: &Window) -> Result<WindowRect, CoreError> {
        let rect = WindowRect {
            x: window
                .x()
                .map_err(|e| CoreError::Capture(format!("윈도우 좌표 조회 실패: {e}")))?,
            y: window
                .y()
                .map_err(|e| CoreError::Capture(format!("윈도우 좌표 조회 실패: {e}")))?,
            w: window
                .width()
                .map_err(|e| CoreError::Capture(format!("윈도우 크기 조회 실패: {e}")))?,
            h: window
                .height()
                .map_err(|e| CoreError::Capture(format!("윈도우 크기 조회 실패: {e}")))?,
        };
        Ok(rect)
    }
}

impl FrameSource for XcapFrameSource {
    fn locate(&mut self) -> Result<WindowRect, CoreError> {
        let window = self.find_window()?;

        // 최소화 윈도우는 캡처 불가 — 미발견으로 취급
        if window.is_minimized().unwrap_or(false) {
            self.window_id = None;
            self.rect = None;
            return Err(CoreError::WindowNotFound(format!(
                "{} (최소화 상태)",
                self.title_substring
            )));
        }

        let rect = Self::window_rect(&window)?;
        if rect.is_empty() {
            return Err(CoreError::WindowNotFound(format!(
                "{} (크기 0)",
                self.title_substring
            )));
        }

        let id = window
            .id()
            .map_err(|e| CoreError::Capture(format!("윈도우 ID 조회 실패: {e}")))?;

        if self.window_id != Some(id) {
            info!(
                "대상 윈도우 발견: '{}' id={id}, 위치=({}, {}) {}x{}",
                self.title_substring, rect.x, rect.y, rect.w, rect.h
            );
        }

        self.window_id = Some(id);
        self.rect = Some(rect);
        Ok(rect)
    }

    fn capture(&mut self) -> Result<CapturedFrame, CoreError> {
        let id = self
            .window_id
            .ok_or_else(|| CoreError::WindowNotFound(self.title_substring.clone()))?;

        let windows =
            Window::all().map_err(|e| CoreError::Capture(format!("윈도우 목록 조회 실패: {e}")))?;

        let window = windows
            .into_iter()
            .find(|w| w.id().map(|wid| wid == id).unwrap_or(false))
            .ok_or_else(|| {
                CoreError::Capture(format!("윈도우 id={id} 사라짐 — 재탐색 필요"))
            })?;

        let rect = Self::window_rect(&window)?;
        let image = window
            .capture_image()
            .map_err(|e| CoreError::Capture(format!("윈도우 캡처 실패: {e}")))?;

        debug!("캡처 완료: {}x{}", image.width(), image.height());

        self.rect = Some(rect);
        Ok(CapturedFrame::new(DynamicImage::ImageRgba8(image), rect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_before_locate_is_window_not_found() {
        let mut source = XcapFrameSource::new("definitely-no-such-window");
        assert!(matches!(
            source.capture(),
            Err(CoreError::WindowNotFound(_))
        ));
    }

    #[test]
    fn title_matching_is_case_insensitive() {
        let source = XcapFrameSource::new("MineCraft");
        assert_eq!(source.title_substring, "minecraft");
    }
}
