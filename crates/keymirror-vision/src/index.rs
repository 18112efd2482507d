//! 최근접 이웃 인덱스.
//!
//! 클래스별 평균 특징 벡터에 대한 코사인 거리 brute-force 인덱스.
//! 클래스 수가 수십 개 수준이므로 선형 스캔으로 충분하다.
//! 불변 구조 — 리빌드 시 전체 교체되며 제자리 변경은 없다.

use keymirror_core::error::CoreError;

/// 인덱스 엔트리 — 클래스 하나당 평균 벡터 하나
#[derive(Debug, Clone)]
pub struct ClassEntry {
    /// 클래스명 (코퍼스 디렉토리 이름)
    pub class_name: String,
    /// 매핑된 실제 키 이름
    pub key: String,
    /// 평균 특징 벡터 ([0,1] 정규화)
    pub features: Vec<f32>,
}

/// 특정 시점의 불변 최근접 이웃 인덱스
#[derive(Debug, Clone)]
pub struct FeatureIndex {
    /// 엔트리 — 클래스명 사전순 정렬 (동점 시 결정적 순서 보장)
    entries: Vec<ClassEntry>,
    /// 이웃 조회 상한 (min(5, 클래스 수))
    k: usize,
}

impl FeatureIndex {
    /// 엔트리 목록으로 인덱스 구축
    ///
    /// 엔트리는 클래스명 사전순으로 정렬되어 저장된다.
    /// 모든 벡터 길이가 일치하지 않으면 에러.
    pub fn build(mut entries: Vec<ClassEntry>) -> Result<Self, CoreError> {
        if let Some(first) = entries.first() {
            let len = first.features.len();
            if let Some(bad) = entries.iter().find(|e| e.features.len() != len) {
                return Err(CoreError::Internal(format!(
                    "특징 벡터 길이 불일치: {} ({} != {})",
                    bad.class_name,
                    bad.features.len(),
                    len
                )));
            }
        }

        entries.sort_by(|a, b| a.class_name.cmp(&b.class_name));
        let k = entries.len().min(5);
        Ok(Self { entries, k })
    }

    /// 클래스 수
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 인덱스가 비었는지
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 이웃 조회 상한
    pub fn k(&self) -> usize {
        self.k
    }

    /// 엔트리 조회 (사전순)
    pub fn entries(&self) -> &[ClassEntry] {
        &self.entries
    }

    /// 쿼리 벡터의 최근접 k개 이웃을 (엔트리, 유사도) 쌍으로 반환
    ///
    /// 유사도 = 1 − 코사인 거리. 유사도 내림차순, 동점 시 클래스명
    /// 사전순 (엔트리가 사전순 저장 + 안정 정렬).
    pub fn nearest(&self, query: &[f32]) -> Vec<(&ClassEntry, f32)> {
        let mut scored: Vec<(&ClassEntry, f32)> = self
            .entries
            .iter()
            .map(|e| (e, cosine_similarity(query, &e.features)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.k);
        scored
    }
}

/// 코사인 유사도 (1 − 코사인 거리)
///
/// 영벡터가 포함되면 0.0 (매칭 불가로 취급).
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += x as f64 * y as f64;
        norm_a += x as f64 * x as f64;
        norm_b += y as f64 * y as f64;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}
