//! KEYMIRROR 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 외부 라이브러리 에러를 `CoreError`로 래핑한다.
//! 파이프라인은 에러를 발생 지점에서 격리한다 — 한 프레임의 실패가
//! 전체 루프를 중단시키지 않는다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 캡처, 코퍼스 로딩, 입력 시뮬레이션 등 도메인 공통 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 대상 윈도우를 찾을 수 없음 (재탐색 스케줄로 복구)
    #[error("대상 윈도우 미발견: {0}")]
    WindowNotFound(String),

    /// 스크린 캡처 실패 (일시적 — 윈도우 재탐색 후 재시도)
    #[error("캡처 에러: {0}")]
    Capture(String),

    /// 이미지 디코딩/변환 실패 (코퍼스 파일 스킵)
    #[error("이미지 에러: {0}")]
    Image(String),

    /// 키 입력 시뮬레이션 실패 (다음 조정 주기에 재시도)
    #[error("입력 에러: {0}")]
    Input(String),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}
