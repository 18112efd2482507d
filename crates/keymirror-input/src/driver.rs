//! 입력 드라이버 구현.
//!
//! `EnigoInputDriver` (실제 입력)와 `NoOpInputDriver` (드라이런/테스트용)를 제공한다.

use async_trait::async_trait;
use tracing::debug;

use keymirror_core::error::CoreError;
use keymirror_core::ports::input_driver::InputDriver;

// ============================================================
// NoOpInputDriver — 드라이런/테스트용
// ============================================================

/// No-Op 입력 드라이버 — 모든 입력을 로깅만 하고 실행하지 않음
///
/// 드라이런 모드, 테스트, 시뮬레이션에서 사용.
pub struct NoOpInputDriver;

#[async_trait]
impl InputDriver for NoOpInputDriver {
    async fn key_press(&self, key: &str) -> Result<(), CoreError> {
        debug!(key, "[NoOp] 키 누름");
        Ok(())
    }

    async fn key_release(&self, key: &str) -> Result<(), CoreError> {
        debug!(key, "[NoOp] 키 놓음");
        Ok(())
    }

    fn platform(&self) -> &str {
        "noop"
    }
}

// ============================================================
// EnigoInputDriver — 실제 키보드 입력
// ============================================================

/// 실제 키보드 입력 드라이버 (enigo 기반)
///
/// macOS: Accessibility 권한 필요
/// Windows: UIAccess 또는 관리자 권한 필요
/// Linux: X11 또는 Wayland + uinput 권한 필요
pub struct EnigoInputDriver {
    /// enigo 인스턴스 (Send지만 !Sync → tokio::sync::Mutex 사용)
    enigo: tokio::sync::Mutex<enigo::Enigo>,
}

impl EnigoInputDriver {
    /// 새 EnigoInputDriver 생성
    pub fn new() -> Result<Self, CoreError> {
        let settings = enigo::Settings::default();
        let enigo = enigo::Enigo::new(&settings)
            .map_err(|e| CoreError::Input(format!("입력 드라이버 초기화 실패: {e}")))?;
        Ok(Self {
            enigo: tokio::sync::Mutex::new(enigo),
        })
    }

    /// 문자열 → enigo 키 매핑
    fn parse_key(key: &str) -> Result<enigo::Key, CoreError> {
        let parsed = match key.to_lowercase().as_str() {
            "enter" | "return" => enigo::Key::Return,
            "tab" => enigo::Key::Tab,
            "escape" | "esc" => enigo::Key::Escape,
            "backspace" => enigo::Key::Backspace,
            "delete" | "del" => enigo::Key::Delete,
            "space" => enigo::Key::Space,
            "home" => enigo::Key::Home,
            "end" => enigo::Key::End,
            "pageup" => enigo::Key::PageUp,
            "pagedown" => enigo::Key::PageDown,
            "up" | "uparrow" => enigo::Key::UpArrow,
            "down" | "downarrow" => enigo::Key::DownArrow,
            "left" | "leftarrow" => enigo::Key::LeftArrow,
            "right" | "rightarrow" => enigo::Key::RightArrow,
            "ctrl" | "control" => enigo::Key::Control,
            "shift" => enigo::Key::Shift,
            "alt" | "option" => enigo::Key::Alt,
            "meta" | "command" | "cmd" | "super" | "win" => enigo::Key::Meta,
            "capslock" => enigo::Key::CapsLock,
            "f1" => enigo::Key::F1,
            "f2" => enigo::Key::F2,
            "f3" => enigo::Key::F3,
            "f4" => enigo::Key::F4,
            "f5" => enigo::Key::F5,
            "f6" => enigo::Key::F6,
            "f7" => enigo::Key::F7,
            "f8" => enigo::Key::F8,
            "f9" => enigo::Key::F9,
            "f10" => enigo::Key::F10,
            "f11" => enigo::Key::F11,
            "f12" => enigo::Key::F12,
            other => {
                // 단일 문자 → Unicode 키
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => enigo::Key::Unicode(ch),
                    _ => {
                        return Err(CoreError::Input(format!("알 수 없는 키: {other}")));
                    }
                }
            }
        };
        Ok(parsed)
    }
}

#[async_trait]
impl InputDriver for EnigoInputDriver {
    async fn key_press(&self, key: &str) -> Result<(), CoreError> {
        use enigo::Keyboard;
        debug!(key, "[Enigo] 키 누름");
        let mut enigo = self.enigo.lock().await;
        enigo
            .key(Self::parse_key(key)?, enigo::Direction::Press)
            .map_err(|e| CoreError::Input(format!("키 누름 실패: {e}")))?;
        Ok(())
    }

    async fn key_release(&self, key: &str) -> Result<(), CoreError> {
        use enigo::Keyboard;
        debug!(key, "[Enigo] 키 놓음");
        let mut enigo = self.enigo.lock().await;
        enigo
            .key(Self::parse_key(key)?, enigo::Direction::Release)
            .map_err(|e| CoreError::Input(format!("키 놓음 실패: {e}")))?;
        Ok(())
    }

    fn platform(&self) -> &str {
        #[cfg(target_os = "macos")]
        {
            "macos"
        }
        #[cfg(target_os = "windows")]
        {
            "windows"
        }
        #[cfg(target_os = "linux")]
        {
            "linux"
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        {
            "unknown"
        }
    }
}

/// 입력 드라이버 생성 팩토리
///
/// `dry_run`이면 NoOp, 아니면 enigo 드라이버.
/// enigo 초기화 실패 시 (권한 부족 등) NoOp으로 폴백한다.
pub fn create_input_driver(dry_run: bool) -> Box<dyn InputDriver> {
    if dry_run {
        tracing::info!("드라이런 모드 — NoOp 입력 드라이버 사용");
        return Box::new(NoOpInputDriver);
    }

    match EnigoInputDriver::new() {
        Ok(driver) => {
            tracing::info!("실제 입력 드라이버 (enigo) 초기화 완료");
            Box::new(driver)
        }
        Err(e) => {
            tracing::warn!("enigo 초기화 실패, NoOp 폴백: {e}");
            Box::new(NoOpInputDriver)
        }
    }
}

// ============================================================
// 테스트
// ============================================================
