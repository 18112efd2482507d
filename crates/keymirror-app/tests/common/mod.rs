//! 통합 테스트 공용 헬퍼 — 기록 드라이버, 합성 코퍼스 생성.

use async_trait::async_trait;
use image::{DynamicImage, Luma};
use keymirror_core::error::CoreError;
use keymirror_core::ports::input_driver::InputDriver;
use std::path::Path;
use std::sync::Mutex;

/// 호출 기록 입력 드라이버
#[derive(Default)]
pub struct RecordingDriver {
    pub presses: Mutex<Vec<String>>,
    pub releases: Mutex<Vec<String>>,
}

impl RecordingDriver {
    pub fn presses(&self) -> Vec<String> {
        self.presses.lock().unwrap().clone()
    }

    pub fn releases(&self) -> Vec<String> {
        self.releases.lock().unwrap().clone()
    }
}

#[async_trait]
impl InputDriver for RecordingDriver {
    async fn key_press(&self, key: &str) -> Result<(), CoreError> {
        self.presses.lock().unwrap().push(key.to_string());
        Ok(())
    }

    async fn key_release(&self, key: &str) -> Result<(), CoreError> {
        self.releases.lock().unwrap().push(key.to_string());
        Ok(())
    }

    fn platform(&self) -> &str {
        "mock"
    }
}

/// 위쪽 절반이 밝은 64x64 이미지 — "UP" 인디케이터 모사
pub fn top_bright_image(top: u8, bottom: u8) -> DynamicImage {
    DynamicImage::ImageLuma8(image::ImageBuffer::from_fn(64, 64, |_, y| {
        if y < 32 {
            Luma([top])
        } else {
            Luma([bottom])
        }
    }))
}

/// 왼쪽 절반이 밝은 64x64 이미지 — "SPACE" 인디케이터 모사
pub fn left_bright_image(left: u8, right: u8) -> DynamicImage {
    DynamicImage::ImageLuma8(image::ImageBuffer::from_fn(64, 64, |x, _| {
        if x < 32 {
            Luma([left])
        } else {
            Luma([right])
        }
    }))
}

/// 아래쪽 절반이 밝은 64x64 이미지 — 어느 클래스와도 닮지 않은 프레임
pub fn bottom_bright_image() -> DynamicImage {
    DynamicImage::ImageLuma8(image::ImageBuffer::from_fn(64, 64, |_, y| {
        if y < 32 {
            Luma([0])
        } else {
            Luma([255])
        }
    }))
}

/// 클래스 디렉토리에 이미지 저장
pub fn save_class_image(corpus: &Path, class: &str, name: &str, image: &DynamicImage) {
    let dir = corpus.join(class);
    std::fs::create_dir_all(&dir).unwrap();
    image.save(dir.join(name)).unwrap();
}

/// §8 엔드투엔드 시나리오용 코퍼스: UP 2장(서로 유사) + SPACE 1장(구분됨)
pub fn build_two_class_corpus(corpus: &Path) {
    save_class_image(corpus, "UP", "1.png", &top_bright_image(255, 0));
    save_class_image(corpus, "UP", "2.png", &top_bright_image(230, 10));
    save_class_image(corpus, "SPACE", "1.png", &left_bright_image(255, 0));
}

/// RGBA 변환 헬퍼 (캡처 버퍼 모사)
pub fn as_rgba(image: &DynamicImage) -> DynamicImage {
    DynamicImage::ImageRgba8(image.to_rgba8())
}
