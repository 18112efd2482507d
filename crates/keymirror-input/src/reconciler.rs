//! 키 상태 조정기.
//!
//! "현재 시뮬레이션으로 눌린 키" 집합의 유일한 소유자.
//! 프레임별 분류 결과를 최소한의 press/release 액션으로 변환해
//! 눌린 키 집합이 항상 마지막 분류 결과와 일치하도록 유지한다.
//!
//! 모든 집합 변경과 드라이버 호출은 조정 1회당 하나의 뮤텍스 영역
//! 안에서 일어난다 — 종료 훅의 전체 해제와 진행 중인 조정이 같은
//! 락을 공유하므로 찢어진 상태를 관찰할 수 없다.

use std::collections::BTreeSet;
use std::sync::Arc;

use keymirror_core::error::CoreError;
use keymirror_core::models::classification::ClassMatch;
use keymirror_core::ports::input_driver::InputDriver;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// 키 상태 조정기
pub struct KeyStateReconciler {
    /// 입력 드라이버
    driver: Arc<dyn InputDriver>,
    /// 현재 눌린 (매핑된) 키 이름 집합
    pressed: Mutex<BTreeSet<String>>,
}

impl KeyStateReconciler {
    /// 새 조정기 생성 (눌린 키 없음)
    pub fn new(driver: Arc<dyn InputDriver>) -> Self {
        Self {
            driver,
            pressed: Mutex::new(BTreeSet::new()),
        }
    }

    /// 현재 눌린 키 집합 (복제본)
    pub async fn pressed(&self) -> BTreeSet<String> {
        self.pressed.lock().await.clone()
    }

    /// 분류 결과에 맞춰 눌린 키 집합 조정
    ///
    /// `matched`가 비면 모든 키를 해제한다 (인식 가능한 상태 없음 신호).
    /// 아니면 release 먼저, press 나중 순서로 차집합만 실행한다.
    /// 개별 드라이버 호출 실패는 로깅 후 집합을 갱신하지 않아
    /// 다음 조정 주기에 자연스럽게 재시도된다.
    pub async fn reconcile(&self, matched: &[ClassMatch]) {
        let mut pressed = self.pressed.lock().await;

        if matched.is_empty() {
            if !pressed.is_empty() {
                debug!("매칭 없음 — 모든 키 해제");
                self.release_held(&mut pressed).await;
            }
            return;
        }

        let desired: BTreeSet<String> = matched.iter().map(|m| m.key.clone()).collect();

        // 더 이상 필요 없는 키 해제
        let to_release: Vec<String> = pressed.difference(&desired).cloned().collect();
        for key in to_release {
            match self.driver.key_release(&key).await {
                Ok(()) => {
                    info!("키 해제: {key}");
                    pressed.remove(&key);
                }
                Err(e) => {
                    warn!("키 해제 실패: {key}: {e}");
                }
            }
        }

        // 새로 필요한 키 누름
        let to_press: Vec<String> = desired.difference(&pressed).cloned().collect();
        for key in to_press {
            match self.driver.key_press(&key).await {
                Ok(()) => {
                    let confidence = matched
                        .iter()
                        .find(|m| m.key == key)
                        .map(|m| m.confidence)
                        .unwrap_or(0.0);
                    info!("키 누름: {key} (신뢰도: {confidence:.2})");
                    pressed.insert(key);
                }
                Err(e) => {
                    warn!("키 누름 실패: {key}: {e}");
                }
            }
        }
    }

    /// 종료 훅 — 눌린 키 전부 해제 (best-effort)
    ///
    /// 개별 실패는 삼키고 집합은 비운다. 물리 키가 눌린 채
    /// 남지 않도록 프로세스 종료 전에 반드시 호출된다.
    pub async fn release_all(&self) {
        let mut pressed = self.pressed.lock().await;
        if pressed.is_empty() {
            return;
        }
        info!("종료 — 눌린 키 {}개 해제", pressed.len());
        self.release_held(&mut pressed).await;
        pressed.clear();
    }

    /// 집합의 모든 키 해제, 성공한 것만 제거
    async fn release_held(&self, pressed: &mut BTreeSet<String>) {
        let held: Vec<String> = pressed.iter().cloned().collect();
        for key in held {
            match self.driver.key_release(&key).await {
                Ok(()) => {
                    info!("키 해제: {key}");
                    pressed.remove(&key);
                }
                Err(e) => {
                    warn!("키 해제 실패: {key}: {e}");
                }
            }
        }
    }
}

impl Drop for KeyStateReconciler {
    fn drop(&mut self) {
        // 비동기 해제는 여기서 불가 — 잔여 키는 경고만 남긴다.
        // 정상 경로에서는 release_all()이 먼저 호출된다.
        if let Ok(pressed) = self.pressed.try_lock() {
            if !pressed.is_empty() {
                warn!("조정기 해제 시 눌린 키 잔존: {:?}", *pressed);
            }
        }
    }
}

// ============================================================
// 테스트
// ============================================================
