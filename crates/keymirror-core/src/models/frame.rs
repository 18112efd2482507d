//! 캡처 프레임 모델.
//!
//! 캡처 스테이지가 생산하고 처리 스테이지가 한 번 소비하는 일회성 버퍼.

use chrono::{DateTime, Utc};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// 윈도우 사각형 (스크린 좌표)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRect {
    /// 좌측 상단 x
    pub x: i32,
    /// 좌측 상단 y
    pub y: i32,
    /// 너비 (픽셀)
    pub w: u32,
    /// 높이 (픽셀)
    pub h: u32,
}

impl WindowRect {
    /// 빈 사각형 여부 (너비 또는 높이 0)
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

/// 캡처된 프레임 — 픽셀 버퍼 + 캡처 시각 + 원본 사각형
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// 픽셀 버퍼
    pub image: DynamicImage,
    /// 캡처 시각
    pub timestamp: DateTime<Utc>,
    /// 캡처 원본 사각형
    pub rect: WindowRect,
}

impl CapturedFrame {
    /// 새 프레임 생성 (캡처 시각은 현재)
    pub fn new(image: DynamicImage, rect: WindowRect) -> Self {
        Self {
            image,
            timestamp: Utc::now(),
            rect,
        }
    }

    /// 빈 프레임 여부 (픽셀 없음)
    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }
}
