//! 엔드투엔드: 코퍼스 빌드 → 분류 → 키 상태 조정.
//!
//! UP 2장(서로 유사) + SPACE 1장(구분됨) 코퍼스에서,
//! UP과 닮은 프레임은 매핑된 키 "up"을 누르고,
//! 어느 클래스와도 닮지 않은 프레임은 해제해야 한다.

mod common;

use common::{
    as_rgba, bottom_bright_image, build_two_class_corpus, top_bright_image, RecordingDriver,
};
use keymirror_core::config::MatchingConfig;
use keymirror_input::reconciler::KeyStateReconciler;
use keymirror_vision::classifier::classify;
use keymirror_vision::index::cosine_similarity;
use keymirror_vision::store::FeatureStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use tempfile::tempdir;

fn store_for(corpus: &std::path::Path) -> FeatureStore {
    let config = MatchingConfig {
        corpus_dir: corpus.to_path_buf(),
        min_rebuild_secs: 0,
        ..MatchingConfig::default()
    };
    let mut store = FeatureStore::new(&config, BTreeMap::new()).unwrap();
    store.rebuild().unwrap();
    store
}

#[test]
fn corpus_classes_are_visually_separable() {
    let dir = tempdir().unwrap();
    build_two_class_corpus(dir.path());
    let store = store_for(dir.path());

    let index = store.index().unwrap();
    let featurizer = store.featurizer();

    // UP의 두 참조 이미지는 서로 코사인 유사도 > 0.9
    let a = featurizer.featurize(&top_bright_image(255, 0)).unwrap();
    let b = featurizer.featurize(&top_bright_image(230, 10)).unwrap();
    assert!(cosine_similarity(&a, &b) > 0.9);

    // UP 평균 벡터와 SPACE 평균 벡터는 임계값 아래로 구분
    let entries = index.entries();
    let space = &entries[0];
    let up = &entries[1];
    assert_eq!(space.class_name, "SPACE");
    assert_eq!(up.class_name, "UP");
    assert!(cosine_similarity(&space.features, &up.features) < 0.75);
}

#[test]
fn live_frame_classifies_to_up_above_threshold() {
    let dir = tempdir().unwrap();
    build_two_class_corpus(dir.path());
    let store = store_for(dir.path());

    // img1과 닮은 라이브 프레임 (RGBA 캡처 버퍼 모사)
    let frame = as_rgba(&top_bright_image(250, 5));
    let features = store.featurizer().featurize(&frame).unwrap();

    let matched = classify(&features, store.index(), 1, 0.75);
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].class_name, "UP");
    assert_eq!(matched[0].key, "up");
    assert!(matched[0].confidence > 0.75);
}

#[test]
fn unrelated_frame_matches_nothing() {
    let dir = tempdir().unwrap();
    build_two_class_corpus(dir.path());
    let store = store_for(dir.path());

    let features = store
        .featurizer()
        .featurize(&as_rgba(&bottom_bright_image()))
        .unwrap();

    assert!(classify(&features, store.index(), 1, 0.75).is_empty());
}

#[tokio::test]
async fn up_frame_presses_then_unrelated_frame_releases() {
    let dir = tempdir().unwrap();
    build_two_class_corpus(dir.path());
    let store = store_for(dir.path());

    let driver = Arc::new(RecordingDriver::default());
    let reconciler = KeyStateReconciler::new(driver.clone());
    let featurizer = store.featurizer();

    // 1. UP과 닮은 프레임 → "up" 누름
    let features = featurizer
        .featurize(&as_rgba(&top_bright_image(250, 5)))
        .unwrap();
    let matched = classify(&features, store.index(), 1, 0.75);
    reconciler.reconcile(&matched).await;

    assert_eq!(driver.presses(), vec!["up"]);
    assert_eq!(
        reconciler.pressed().await,
        std::collections::BTreeSet::from(["up".to_string()])
    );

    // 2. 어느 클래스와도 닮지 않은 프레임 → "up" 해제
    let features = featurizer
        .featurize(&as_rgba(&bottom_bright_image()))
        .unwrap();
    let matched = classify(&features, store.index(), 1, 0.75);
    reconciler.reconcile(&matched).await;

    assert_eq!(driver.releases(), vec!["up"]);
    assert!(reconciler.pressed().await.is_empty());
}

#[tokio::test]
async fn shutdown_hook_releases_held_key_once() {
    let dir = tempdir().unwrap();
    build_two_class_corpus(dir.path());
    let store = store_for(dir.path());

    let driver = Arc::new(RecordingDriver::default());
    let reconciler = KeyStateReconciler::new(driver.clone());

    let features = store
        .featurizer()
        .featurize(&as_rgba(&top_bright_image(250, 5)))
        .unwrap();
    let matched = classify(&features, store.index(), 1, 0.75);
    reconciler.reconcile(&matched).await;

    reconciler.release_all().await;

    assert_eq!(driver.releases(), vec!["up"]);
    assert!(reconciler.pressed().await.is_empty());
}
