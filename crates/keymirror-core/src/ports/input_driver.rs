//! 입력 드라이버 포트.
//!
//! 키보드 시뮬레이션을 위한 크로스 플랫폼 인터페이스를 정의한다.

use async_trait::async_trait;

use crate::error::CoreError;

/// 입력 드라이버 — 키 누름/놓음 시뮬레이션 인터페이스
///
/// 구현체: `EnigoInputDriver` (실제 입력), `NoOpInputDriver` (드라이런/테스트용)
#[async_trait]
pub trait InputDriver: Send + Sync {
    /// 키 누름 (개별적으로 실패 가능)
    async fn key_press(&self, key: &str) -> Result<(), CoreError>;

    /// 키 놓음 (개별적으로 실패 가능)
    async fn key_release(&self, key: &str) -> Result<(), CoreError>;

    /// 플랫폼 이름 (예: "macos", "windows", "linux", "noop")
    fn platform(&self) -> &str;
}
