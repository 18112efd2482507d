//! 특징 추출.
//!
//! 임의 크기/채널의 픽셀 버퍼를 R×R 그레이스케일 [0,1] 벡터로 변환한다.
//! 순수 함수 — 동일 입력은 항상 동일 출력을 낸다. 스토어 빌드 경로와
//! 라이브 분류 경로가 이 변환을 공유한다.

use fast_image_resize::{images::Image as FirImage, ResizeAlg, ResizeOptions, Resizer};
use image::DynamicImage;
use keymirror_core::error::CoreError;

/// 특징 추출기 — 고정 해상도 R
#[derive(Debug, Clone, Copy)]
pub struct Featurizer {
    /// 출력 해상도 (R×R)
    resolution: u32,
}

impl Featurizer {
    /// 새 특징 추출기 생성
    pub fn new(resolution: u32) -> Result<Self, CoreError> {
        if resolution == 0 {
            return Err(CoreError::Config(
                "특징 해상도는 1 이상이어야 함".to_string(),
            ));
        }
        Ok(Self { resolution })
    }

    /// 출력 벡터 길이 (R×R)
    pub fn feature_len(&self) -> usize {
        (self.resolution as usize) * (self.resolution as usize)
    }

    /// 이미지를 특징 벡터로 변환
    ///
    /// 그레이스케일 변환 → bilinear 리사이즈 → u8을 [0,1]로 스케일.
    pub fn featurize(&self, image: &DynamicImage) -> Result<Vec<f32>, CoreError> {
        let (src_w, src_h) = (image.width(), image.height());
        if src_w == 0 || src_h == 0 {
            return Err(CoreError::Image("소스 이미지 크기 0".to_string()));
        }

        let luma = image.to_luma8();
        let r = self.resolution;

        let resized = if src_w == r && src_h == r {
            luma.into_raw()
        } else {
            let src_image = FirImage::from_vec_u8(
                src_w,
                src_h,
                luma.into_raw(),
                fast_image_resize::PixelType::U8,
            )
            .map_err(|e| CoreError::Image(format!("소스 이미지 생성 실패: {e}")))?;

            let mut dst_image = FirImage::new(r, r, fast_image_resize::PixelType::U8);

            let mut resizer = Resizer::new();
            let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(
                fast_image_resize::FilterType::Bilinear,
            ));

            resizer
                .resize(&src_image, &mut dst_image, &options)
                .map_err(|e| CoreError::Image(format!("리사이즈 실패: {e}")))?;

            dst_image.into_vec()
        };

        Ok(resized.into_iter().map(|p| p as f32 / 255.0).collect())
    }
}

/// 여러 특징 벡터의 원소별 평균
///
/// 클래스당 하나의 대표 벡터만 유지한다 — 클래스 내 분산 정보는
/// 인덱스 크기와 조회 비용을 한정하기 위해 의도적으로 버린다.
pub fn mean_features(vectors: &[Vec<f32>]) -> Option<Vec<f32>> {
    let first = vectors.first()?;
    let len = first.len();
    let count = vectors.len() as f32;

    let mut mean = vec![0.0f32; len];
    for v in vectors {
        debug_assert_eq!(v.len(), len);
        for (acc, x) in mean.iter_mut().zip(v.iter()) {
            *acc += x;
        }
    }
    for acc in mean.iter_mut() {
        *acc /= count;
    }
    Some(mean)
}
