//! 캡처/분류 파이프라인.
//!
//! 독립 태스크 세 개가 바운디드 작업 큐로 연결된다:
//!
//! 1. **캡처 태스크** — 주기적으로 대상 윈도우를 캡처해 큐에 투입.
//!    윈도우 미발견/캡처 실패 시 재탐색 + 백오프.
//! 2. **처리 태스크** — 큐에서 FIFO로 꺼내 특징 추출 → 분류 → 조정 실행.
//!    리로드 작업도 같은 큐를 타므로 진행 중인 프레임을 선점하지 않는다.
//! 3. **리로드 틱** — 고정 주기로 리로드 작업 투입 (캡처 주기와 무관).
//!
//! 큐가 가득 차면 최신 항목을 드롭한다 — 지속적 처리 지연 시에도
//! 메모리가 무한히 자라지 않는다.

use std::sync::Arc;
use std::time::{Duration, Instant};

use keymirror_core::config::AppConfig;
use keymirror_core::error::CoreError;
use keymirror_core::models::frame::CapturedFrame;
use keymirror_core::ports::frame_source::FrameSource;
use keymirror_input::reconciler::KeyStateReconciler;
use keymirror_vision::classifier::classify;
use keymirror_vision::store::FeatureStore;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// 작업 큐 항목
pub enum WorkItem {
    /// 캡처된 프레임 처리 (특징 추출 → 분류 → 조정)
    Frame(CapturedFrame),
    /// 참조 코퍼스 리로드 (스토어 자체 레이트 리밋이 2차 가드)
    ReloadFeatures,
}

/// 캡처/분류 파이프라인
pub struct Pipeline {
    config: AppConfig,
    source: Box<dyn FrameSource>,
    store: FeatureStore,
    reconciler: Arc<KeyStateReconciler>,
}

impl Pipeline {
    /// 새 파이프라인 생성
    pub fn new(
        config: AppConfig,
        source: Box<dyn FrameSource>,
        store: FeatureStore,
        reconciler: Arc<KeyStateReconciler>,
    ) -> Self {
        Self {
            config,
            source,
            store,
            reconciler,
        }
    }

    /// 파이프라인 실행 — 종료 신호까지 블록
    ///
    /// 종료 신호 수신 후 태스크를 내리고 눌린 키를 전부 해제한 뒤 반환한다.
    pub async fn run(self, shutdown_rx: watch::Receiver<bool>) {
        let Self {
            config,
            source,
            mut store,
            reconciler,
        } = self;

        info!(
            "파이프라인 시작: 캡처={}ms, 재탐색={}s, 리로드={}s, 임계값={}, 큐={}",
            config.capture.interval_ms,
            config.window.rescan_secs,
            config.matching.reload_enqueue_secs,
            config.matching.similarity_threshold,
            config.capture.queue_capacity,
        );

        // 시작 시 1회 리빌드 — 실패해도 파이프라인은 계속 (코퍼스 없이 idle)
        if let Err(e) = store.rebuild() {
            warn!("초기 코퍼스 리빌드 실패: {e}");
        }

        let (work_tx, work_rx) = mpsc::channel::<WorkItem>(config.capture.queue_capacity);

        let capture_task = tokio::spawn(capture_loop(
            source,
            work_tx.clone(),
            config.capture_interval(),
            config.window_rescan_interval(),
            Duration::from_millis(config.capture.error_backoff_ms),
            shutdown_rx.clone(),
        ));

        let reload_task = tokio::spawn(reload_tick_loop(
            work_tx,
            config.reload_enqueue_interval(),
            shutdown_rx.clone(),
        ));

        let k_max = config.matching.max_keys;
        let threshold = config.matching.similarity_threshold;
        let reconciler_proc = reconciler.clone();
        let processing_task = tokio::spawn(processing_loop(
            work_rx,
            store,
            reconciler_proc,
            k_max,
            threshold,
            shutdown_rx.clone(),
        ));

        // 종료 대기
        let mut shutdown = shutdown_rx;
        let _ = shutdown.changed().await;
        info!("파이프라인 종료 신호 수신");

        capture_task.abort();
        reload_task.abort();
        let _ = processing_task.await;

        // 종료 훅 — 어떤 태스크가 중간이었든 같은 뮤텍스를 공유하므로 안전
        reconciler.release_all().await;
        info!("파이프라인 종료 완료");
    }
}

/// 캡처 루프
///
/// 윈도우가 미해결이거나 재탐색 주기가 지나면 다시 탐색한다.
/// 캡처 에러는 윈도우를 미해결로 되돌리고 백오프한다.
async fn capture_loop(
    mut source: Box<dyn FrameSource>,
    work_tx: mpsc::Sender<WorkItem>,
    capture_interval: Duration,
    rescan_interval: Duration,
    error_backoff: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut window_found = false;
    let mut last_rescan = Instant::now();
    let mut interval = tokio::time::interval(capture_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                // 미해결이거나 재탐색 주기 경과 시 윈도우 재탐색
                if !window_found || last_rescan.elapsed() > rescan_interval {
                    match source.locate() {
                        Ok(_) => {
                            window_found = true;
                            last_rescan = Instant::now();
                        }
                        Err(CoreError::WindowNotFound(title)) => {
                            debug!("대상 윈도우 미발견: {title}");
                            window_found = false;
                            tokio::time::sleep(error_backoff).await;
                            continue;
                        }
                        Err(e) => {
                            warn!("윈도우 탐색 실패: {e}");
                            window_found = false;
                            tokio::time::sleep(error_backoff).await;
                            continue;
                        }
                    }
                }

                match source.capture() {
                    Ok(frame) if frame.is_empty() => {
                        debug!("빈 프레임 — 스킵");
                    }
                    Ok(frame) => {
                        // 큐가 가득이면 최신 프레임 드롭 (바운디드 백프레셔)
                        if work_tx.try_send(WorkItem::Frame(frame)).is_err() {
                            debug!("작업 큐 가득 — 프레임 드롭");
                        }
                    }
                    Err(e) => {
                        warn!("캡처 실패: {e}");
                        window_found = false;
                        tokio::time::sleep(error_backoff).await;
                    }
                }
            }
            _ = shutdown_rx.changed() => {
                info!("캡처 루프 종료");
                break;
            }
        }
    }
}

/// 처리 루프 — 큐 FIFO 소비
///
/// 리빌드는 이 루프 안에서 동기로 실행된다 — 리빌드 동안 프레임
/// 처리가 잠시 멈추지만 캡처는 계속 큐에 쌓인다 (한도 내에서).
async fn processing_loop(
    mut work_rx: mpsc::Receiver<WorkItem>,
    mut store: FeatureStore,
    reconciler: Arc<KeyStateReconciler>,
    k_max: usize,
    threshold: f32,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let featurizer = store.featurizer();

    loop {
        tokio::select! {
            item = work_rx.recv() => {
                let Some(item) = item else {
                    info!("작업 큐 닫힘 — 처리 루프 종료");
                    break;
                };

                match item {
                    WorkItem::ReloadFeatures => {
                        if let Err(e) = store.rebuild() {
                            warn!("코퍼스 리빌드 실패: {e}");
                        }
                    }
                    WorkItem::Frame(frame) => {
                        let features = match featurizer.featurize(&frame.image) {
                            Ok(f) => f,
                            Err(e) => {
                                warn!("프레임 특징 추출 실패: {e}");
                                continue;
                            }
                        };

                        let matched = classify(&features, store.index(), k_max, threshold);
                        reconciler.reconcile(&matched).await;
                    }
                }
            }
            _ = shutdown_rx.changed() => {
                info!("처리 루프 종료");
                break;
            }
        }
    }
}

/// 리로드 틱 루프 — 캡처 주기와 독립된 타이머
async fn reload_tick_loop(
    work_tx: mpsc::Sender<WorkItem>,
    reload_interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(reload_interval);
    // 첫 틱은 즉시 발화 — 시작 리빌드는 이미 수행됐으므로 건너뜀
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                // 큐가 가득이면 드롭 — 다음 틱이 재시도
                if work_tx.try_send(WorkItem::ReloadFeatures).is_err() {
                    debug!("작업 큐 가득 — 리로드 틱 드롭");
                }
            }
            _ = shutdown_rx.changed() => {
                info!("리로드 틱 종료");
                break;
            }
        }
    }
}

// ============================================================
// 테스트
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{DynamicImage, Luma};
    use keymirror_core::config::AppConfig;
    use keymirror_core::models::frame::WindowRect;
    use keymirror_core::ports::input_driver::InputDriver;
    use std::collections::BTreeMap;
    use std::sync::Mutex as StdMutex;
    use tempfile::tempdir;

    /// 호출 기록 드라이버
    #[derive(Default)]
    struct RecordingDriver {
        presses: StdMutex<Vec<String>>,
        releases: StdMutex<Vec<String>>,
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

    /// 고정 프레임을 반환하는 스텁 소스
    struct StubFrameSource {
        image: DynamicImage,
    }

    impl FrameSource for StubFrameSource {
        fn locate(&mut self) -> Result<WindowRect, CoreError> {
            Ok(WindowRect {
                x: 0,
                y: 0,
                w: 64,
                h: 64,
            })
        }

        fn capture(&mut self) -> Result<CapturedFrame, CoreError> {
            Ok(CapturedFrame::new(
                self.image.clone(),
                WindowRect {
                    x: 0,
                    y: 0,
                    w: 64,
                    h: 64,
                },
            ))
        }
    }

    /// 항상 미발견인 소스
    struct MissingWindowSource;

    impl FrameSource for MissingWindowSource {
        fn locate(&mut self) -> Result<WindowRect, CoreError> {
            Err(CoreError::WindowNotFound("stub".to_string()))
        }

        fn capture(&mut self) -> Result<CapturedFrame, CoreError> {
            Err(CoreError::WindowNotFound("stub".to_string()))
        }
    }

    fn top_bright(top: u8, bottom: u8) -> DynamicImage {
        DynamicImage::ImageLuma8(image::ImageBuffer::from_fn(64, 64, |_, y| {
            if y < 32 {
                Luma([top])
            } else {
                Luma([bottom])
            }
        }))
    }

    fn test_config(corpus: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default_config();
        config.matching.corpus_dir = corpus.to_path_buf();
        config.matching.min_rebuild_secs = 0;
        config.matching.reload_enqueue_secs = 3600;
        config.capture.interval_ms = 5;
        config.capture.error_backoff_ms = 10;
        config
    }

    fn pipeline_with(
        config: AppConfig,
        source: Box<dyn FrameSource>,
    ) -> (Pipeline, Arc<RecordingDriver>) {
        let driver = Arc::new(RecordingDriver::default());
        let store = FeatureStore::new(&config.matching, BTreeMap::new()).unwrap();
        let reconciler = Arc::new(KeyStateReconciler::new(driver.clone()));
        (Pipeline::new(config, source, store, reconciler), driver)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn frame_matching_corpus_presses_and_shutdown_releases() {
        let dir = tempdir().unwrap();
        let class_dir = dir.path().join("UP");
        std::fs::create_dir_all(&class_dir).unwrap();
        top_bright(255, 0).save(class_dir.join("1.png")).unwrap();

        let source = Box::new(StubFrameSource {
            image: top_bright(250, 5),
        });
        let (pipeline, driver) = pipeline_with(test_config(dir.path()), source);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(pipeline.run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(300)).await;
        shutdown_tx.send(true).unwrap();
        task.await.unwrap();

        // 매칭 프레임 → 누름, 종료 훅 → 해제
        assert_eq!(driver.presses.lock().unwrap().first().map(String::as_str), Some("up"));
        assert!(driver
            .releases
            .lock()
            .unwrap()
            .iter()
            .any(|k| k == "up"));
    }

    #[tokio::test]
    async fn full_queue_drops_newest_keeps_fifo() {
        let (work_tx, mut work_rx) = mpsc::channel::<WorkItem>(1);

        let rect = WindowRect { x: 0, y: 0, w: 64, h: 64 };
        let first = CapturedFrame::new(top_bright(255, 0), rect);
        let second = CapturedFrame::new(top_bright(0, 255), rect);

        assert!(work_tx.try_send(WorkItem::Frame(first)).is_ok());
        // 용량 초과 — 최신 항목이 드롭된다
        assert!(work_tx.try_send(WorkItem::Frame(second)).is_err());

        match work_rx.recv().await {
            Some(WorkItem::Frame(frame)) => {
                // 먼저 들어간 프레임이 남는다
                assert_eq!(frame.image.to_luma8().get_pixel(0, 0).0[0], 255);
            }
            _ => panic!("프레임이 큐에 남아 있어야 함"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_window_keeps_pipeline_alive_without_presses() {
        let dir = tempdir().unwrap();
        let (pipeline, driver) =
            pipeline_with(test_config(dir.path()), Box::new(MissingWindowSource));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(pipeline.run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown_tx.send(true).unwrap();
        // 미발견 상태에서도 파이프라인은 정상 종료된다
        task.await.unwrap();

        assert!(driver.presses.lock().unwrap().is_empty());
    }
}
