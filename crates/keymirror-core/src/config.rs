//! 애플리케이션 설정 구조체.
//!
//! 대상 윈도우, 캡처 주기, 매칭 임계값, 코퍼스 경로 등
//! 런타임 설정을 정의한다. JSON 파일/CLI 인자에서 로드.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 대상 윈도우 설정
    #[serde(default)]
    pub window: WindowConfig,
    /// 캡처 설정
    #[serde(default)]
    pub capture: CaptureConfig,
    /// 매칭(분류) 설정
    #[serde(default)]
    pub matching: MatchingConfig,
    /// 입력 시뮬레이션 설정
    #[serde(default)]
    pub input: InputConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

// ============================================================
// 대상 윈도우 설정
// ============================================================

/// 대상 윈도우 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// 윈도우 제목 부분 문자열 (대소문자 구분 없음)
    #[serde(default = "default_title_substring")]
    pub title_substring: String,
    /// 윈도우 위치 재탐색 주기 (초)
    #[serde(default = "default_rescan_secs")]
    pub rescan_secs: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title_substring: default_title_substring(),
            rescan_secs: default_rescan_secs(),
        }
    }
}

// ============================================================
// 캡처 설정
// ============================================================

/// 캡처 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// 캡처 간격 (밀리초)
    #[serde(default = "default_capture_interval_ms")]
    pub interval_ms: u64,
    /// 캡처 실패 시 백오프 (밀리초)
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,
    /// 작업 큐 최대 길이 (초과 시 최신 프레임 드롭)
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_capture_interval_ms(),
            error_backoff_ms: default_error_backoff_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

// ============================================================
// 매칭 설정
// ============================================================

/// 매칭(분류) 설정 — 코퍼스, 임계값, 리로드 주기
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// 참조 코퍼스 루트 디렉토리 (클래스명 하위 디렉토리 구조)
    #[serde(default = "default_corpus_dir")]
    pub corpus_dir: PathBuf,
    /// 매칭 유사도 임계값 (0, 1]
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
    /// 한 번에 시뮬레이션할 최대 키 수 (>= 1)
    #[serde(default = "default_max_keys")]
    pub max_keys: usize,
    /// 특징 벡터 해상도 (R — R×R 그레이스케일)
    #[serde(default = "default_feature_resolution")]
    pub feature_resolution: u32,
    /// 리로드 작업 투입 주기 (초)
    #[serde(default = "default_reload_enqueue_secs")]
    pub reload_enqueue_secs: u64,
    /// 실효 리빌드 최소 간격 (초) — 이 간격 내 리빌드 요청은 no-op
    #[serde(default = "default_min_rebuild_secs")]
    pub min_rebuild_secs: u64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            corpus_dir: default_corpus_dir(),
            similarity_threshold: default_similarity_threshold(),
            max_keys: default_max_keys(),
            feature_resolution: default_feature_resolution(),
            reload_enqueue_secs: default_reload_enqueue_secs(),
            min_rebuild_secs: default_min_rebuild_secs(),
        }
    }
}

// ============================================================
// 입력 설정
// ============================================================

/// 입력 시뮬레이션 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    /// 드라이런 모드 — 실제 키 입력 대신 로깅만 수행
    #[serde(default)]
    pub dry_run: bool,
    /// 클래스명 → 키 이름 명시적 오버라이드 (기본 규칙보다 우선)
    #[serde(default)]
    pub key_overrides: BTreeMap<String, String>,
}

// ============================================================
// AppConfig impl
// ============================================================

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self {
            window: WindowConfig::default(),
            capture: CaptureConfig::default(),
            matching: MatchingConfig::default(),
            input: InputConfig::default(),
        }
    }

    /// 설정값 유효성 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(self.matching.similarity_threshold > 0.0 && self.matching.similarity_threshold <= 1.0)
        {
            return Err(CoreError::Config(format!(
                "similarity_threshold는 (0, 1] 범위여야 함: {}",
                self.matching.similarity_threshold
            )));
        }
        if self.matching.max_keys == 0 {
            return Err(CoreError::Config("max_keys는 1 이상이어야 함".to_string()));
        }
        if self.matching.feature_resolution == 0 {
            return Err(CoreError::Config(
                "feature_resolution은 1 이상이어야 함".to_string(),
            ));
        }
        if self.capture.queue_capacity == 0 {
            return Err(CoreError::Config(
                "queue_capacity는 1 이상이어야 함".to_string(),
            ));
        }
        Ok(())
    }

    /// 캡처 간격을 Duration으로 반환
    pub fn capture_interval(&self) -> Duration {
        Duration::from_millis(self.capture.interval_ms)
    }

    /// 윈도우 재탐색 주기를 Duration으로 반환
    pub fn window_rescan_interval(&self) -> Duration {
        Duration::from_secs(self.window.rescan_secs)
    }

    /// 리로드 작업 투입 주기를 Duration으로 반환
    pub fn reload_enqueue_interval(&self) -> Duration {
        Duration::from_secs(self.matching.reload_enqueue_secs)
    }

    /// 실효 리빌드 최소 간격을 Duration으로 반환
    pub fn min_rebuild_interval(&self) -> Duration {
        Duration::from_secs(self.matching.min_rebuild_secs)
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_title_substring() -> String {
    "Minecraft".to_string()
}
fn default_rescan_secs() -> u64 {
    5
}
fn default_capture_interval_ms() -> u64 {
    50
}
fn default_error_backoff_ms() -> u64 {
    1_000
}
fn default_queue_capacity() -> usize {
    32
}
fn default_corpus_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_similarity_threshold() -> f32 {
    0.75
}
fn default_max_keys() -> usize {
    1
}
fn default_feature_resolution() -> u32 {
    64
}
fn default_reload_enqueue_secs() -> u64 {
    30
}
fn default_min_rebuild_secs() -> u64 {
    60
}
