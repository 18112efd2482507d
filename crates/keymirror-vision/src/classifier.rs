//! 라이브 분류.
//!
//! 특징 벡터를 현재 인덱스에 대해 매칭해 임계값을 넘는
//! 상위 `k_max`개 클래스를 반환한다.

use keymirror_core::models::classification::ClassMatch;
use tracing::trace;

use crate::index::FeatureIndex;

/// 특징 벡터 분류
///
/// 인덱스가 없거나 임계값을 넘는 이웃이 없으면 빈 결과.
/// 결과는 신뢰도 내림차순 (동점 시 클래스명 사전순), 최대 `k_max`개.
/// 신뢰도는 `threshold`를 엄격히 초과해야 한다.
pub fn classify(
    features: &[f32],
    index: Option<&FeatureIndex>,
    k_max: usize,
    threshold: f32,
) -> Vec<ClassMatch> {
    let Some(index) = index else {
        return Vec::new();
    };
    if index.is_empty() || k_max == 0 {
        return Vec::new();
    }

    let mut matched: Vec<ClassMatch> = index
        .nearest(features)
        .into_iter()
        .filter(|(_, similarity)| *similarity > threshold)
        .map(|(entry, similarity)| ClassMatch {
            class_name: entry.class_name.clone(),
            key: entry.key.clone(),
            confidence: similarity,
        })
        .collect();

    matched.truncate(k_max);

    trace!(count = matched.len(), "분류 완료");
    matched
}
