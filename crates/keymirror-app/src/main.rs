//! # keymirror-app
//!
//! KEYMIRROR 바이너리 진입점.
//! 설정 로드, 컴포넌트 조립, 파이프라인 실행, 종료 훅을 담당한다.
//!
//! 대상 윈도우의 화면에 표시되는 키 인디케이터를 분류해 실제 키 입력
//! 상태를 화면 상태에 동기화한다.

mod pipeline;

use anyhow::{Context, Result};
use clap::Parser;
use keymirror_core::config_manager::ConfigManager;
use keymirror_input::driver::create_input_driver;
use keymirror_input::reconciler::KeyStateReconciler;
use keymirror_vision::source::XcapFrameSource;
use keymirror_vision::store::FeatureStore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::pipeline::Pipeline;

/// KEYMIRROR 데스크톱 클라이언트
///
/// 화면 키 인디케이터 분류 기반 키 입력 시뮬레이터
#[derive(Parser, Debug)]
#[command(name = "keymirror")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (기본: ./keymirror.json)
    #[arg(long, short = 'c', default_value = "keymirror.json")]
    config: PathBuf,

    /// 대상 윈도우 제목 부분 문자열 (설정 오버라이드)
    #[arg(long, short = 'w')]
    window: Option<String>,

    /// 참조 코퍼스 디렉토리 (설정 오버라이드)
    #[arg(long, short = 'd')]
    corpus_dir: Option<PathBuf>,

    /// 매칭 유사도 임계값 (설정 오버라이드)
    #[arg(long, short = 't')]
    threshold: Option<f32>,

    /// 드라이런 모드 — 실제 키 입력 없이 로깅만
    #[arg(long)]
    dry_run: bool,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(args.log_level.clone())),
        )
        .init();

    // 설정 로드 + CLI 오버라이드
    let manager =
        ConfigManager::with_path(args.config.clone()).context("설정 로드 실패")?;
    let config = {
        let mut config = manager.get();
        if let Some(window) = args.window {
            config.window.title_substring = window;
        }
        if let Some(corpus_dir) = args.corpus_dir {
            config.matching.corpus_dir = corpus_dir;
        }
        if let Some(threshold) = args.threshold {
            config.matching.similarity_threshold = threshold;
        }
        if args.dry_run {
            config.input.dry_run = true;
        }
        config.validate().context("설정값 검증 실패")?;
        config
    };

    info!(
        "KEYMIRROR 시작 (대상 윈도우: '{}', 코퍼스: {}, 임계값: {})",
        config.window.title_substring,
        config.matching.corpus_dir.display(),
        config.matching.similarity_threshold,
    );

    // 컴포넌트 조립
    let source = Box::new(XcapFrameSource::new(config.window.title_substring.clone()));
    let store = FeatureStore::new(&config.matching, config.input.key_overrides.clone())
        .context("참조 스토어 생성 실패")?;
    let driver = Arc::from(create_input_driver(config.input.dry_run));
    let reconciler = Arc::new(KeyStateReconciler::new(driver));

    let pipeline = Pipeline::new(config, source, store, reconciler);

    // 종료 신호 배선 — Ctrl+C 수신 시 파이프라인이 키를 모두 해제한 뒤 반환
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let pipeline_task = tokio::spawn(pipeline.run(shutdown_rx));

    info!("Ctrl+C로 종료");
    tokio::signal::ctrl_c()
        .await
        .context("종료 신호 대기 실패")?;
    info!("종료 신호 수신 — 정리 시작");

    let _ = shutdown_tx.send(true);
    pipeline_task.await.context("파이프라인 종료 실패")?;

    info!("정상 종료");
    Ok(())
}
