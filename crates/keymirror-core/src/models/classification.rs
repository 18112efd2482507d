//! 분류 결과 모델.

use serde::{Deserialize, Serialize};

/// 매칭 결과 — 클래스명, 매핑된 키 이름, 신뢰도
///
/// 신뢰도는 1 − 코사인 거리로, (0, 1] 범위에서 임계값을 넘은 것만 생성된다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMatch {
    /// 클래스명 (코퍼스 디렉토리 이름)
    pub class_name: String,
    /// 매핑된 실제 키 이름 (스토어 빌드 시 해석됨)
    pub key: String,
    /// 매칭 신뢰도 (0, 1]
    pub confidence: f32,
}
