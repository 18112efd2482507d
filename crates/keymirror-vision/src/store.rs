//! 참조 코퍼스 스토어.
//!
//! 레이블된 참조 이미지 코퍼스(클래스명 디렉토리 구조)를 스캔해
//! 클래스별 평균 특징 벡터를 계산하고 최근접 이웃 인덱스를 구축한다.
//! 인덱스는 리빌드마다 전체 교체된다 — 부분적으로 빌드된 인덱스를
//! 관찰하는 호출자는 없다.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use keymirror_core::config::MatchingConfig;
use keymirror_core::error::CoreError;
use keymirror_core::keymap;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::featurizer::{mean_features, Featurizer};
use crate::index::{ClassEntry, FeatureIndex};

/// 유효 이미지 확장자 (대소문자 구분 없음)
const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// 참조 코퍼스 스토어
pub struct FeatureStore {
    /// 코퍼스 루트 디렉토리
    corpus_dir: PathBuf,
    /// 공유 특징 추출기
    featurizer: Featurizer,
    /// 클래스명 → 키 이름 명시적 오버라이드
    key_overrides: BTreeMap<String, String>,
    /// 실효 리빌드 최소 간격
    min_rebuild_interval: Duration,
    /// 마지막 리빌드 완료 시각
    last_rebuild: Option<Instant>,
    /// 현재 인덱스 — 리빌드 시 교체
    index: Option<FeatureIndex>,
}

impl FeatureStore {
    /// 매칭 설정 + 오버라이드로 스토어 생성 (인덱스는 비어 있음)
    pub fn new(
        matching: &MatchingConfig,
        key_overrides: BTreeMap<String, String>,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            corpus_dir: matching.corpus_dir.clone(),
            featurizer: Featurizer::new(matching.feature_resolution)?,
            key_overrides,
            min_rebuild_interval: Duration::from_secs(matching.min_rebuild_secs),
            last_rebuild: None,
            index: None,
        })
    }

    /// 공유 특징 추출기 (라이브 분류 경로와 공유)
    pub fn featurizer(&self) -> Featurizer {
        self.featurizer
    }

    /// 현재 인덱스 (없으면 None)
    pub fn index(&self) -> Option<&FeatureIndex> {
        self.index.as_ref()
    }

    /// 코퍼스를 스캔해 인덱스 리빌드
    ///
    /// 마지막 완료된 리빌드 이후 최소 간격이 지나지 않았으면 no-op으로
    /// `false`를 반환한다. 코퍼스 루트가 없으면 경고 후 no-op.
    /// 리빌드가 수행되면 `true`.
    pub fn rebuild(&mut self) -> Result<bool, CoreError> {
        if let Some(last) = self.last_rebuild {
            if last.elapsed() < self.min_rebuild_interval {
                debug!("리빌드 최소 간격 미경과 — 스킵");
                return Ok(false);
            }
        }

        if !self.corpus_dir.exists() {
            warn!("코퍼스 디렉토리 없음: {}", self.corpus_dir.display());
            self.last_rebuild = Some(Instant::now());
            return Ok(false);
        }

        info!("참조 코퍼스 리빌드 시작: {}", self.corpus_dir.display());

        let mut entries = Vec::new();
        for dir_entry in std::fs::read_dir(&self.corpus_dir)? {
            let dir_entry = match dir_entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("디렉토리 엔트리 읽기 실패: {e}");
                    continue;
                }
            };
            let path = dir_entry.path();
            if !path.is_dir() {
                continue;
            }

            let class_name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => {
                    warn!("클래스 디렉토리 이름 해석 실패: {}", path.display());
                    continue;
                }
            };

            match self.build_class_entry(&class_name, &path) {
                Some(entry) => entries.push(entry),
                None => {
                    warn!("클래스 {class_name}에 유효한 이미지 없음 — 인덱스에서 제외");
                }
            }
        }

        if entries.is_empty() {
            warn!("유효한 클래스 없음 — 인덱스 비활성");
            self.index = None;
        } else {
            let index = FeatureIndex::build(entries)?;
            info!(
                "인덱스 구축 완료: {}개 클래스, k={}",
                index.len(),
                index.k()
            );
            // 교체 — 제자리 변경 아님
            self.index = Some(index);
        }

        self.last_rebuild = Some(Instant::now());
        Ok(true)
    }

    /// 클래스 디렉토리 하나를 평균 벡터 엔트리로 변환
    ///
    /// 손상된/읽기 불가 이미지는 스킵된다. 유효 이미지가 없으면 None.
    fn build_class_entry(&self, class_name: &str, dir: &Path) -> Option<ClassEntry> {
        let read_dir = match std::fs::read_dir(dir) {
            Ok(rd) => rd,
            Err(e) => {
                warn!("클래스 디렉토리 읽기 실패: {}: {e}", dir.display());
                return None;
            }
        };

        let mut vectors = Vec::new();
        for file in read_dir.flatten() {
            let file_path = file.path();
            if !is_image_file(&file_path) {
                continue;
            }

            let image = match image::open(&file_path) {
                Ok(img) => img,
                Err(e) => {
                    warn!("이미지 로드 실패: {}: {e}", file_path.display());
                    continue;
                }
            };

            match self.featurizer.featurize(&image) {
                Ok(features) => vectors.push(features),
                Err(e) => {
                    warn!("특징 추출 실패: {}: {e}", file_path.display());
                }
            }
        }

        let features = mean_features(&vectors)?;
        let key = keymap::resolve_key(class_name, &self.key_overrides);
        debug!(
            "클래스 로드: {class_name} → 키 '{key}' ({}개 이미지 평균)",
            vectors.len()
        );

        Some(ClassEntry {
            class_name: class_name.to_string(),
            key,
            features,
        })
    }
}

/// 파일이 유효 이미지 확장자인지 (대소문자 구분 없음)
fn is_image_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let lower = ext.to_lowercase();
                IMAGE_EXTENSIONS.contains(&lower.as_str())
            })
            .unwrap_or(false)
}
