//! # keymirror-vision
//!
//! 분류 파이프라인의 비전 사이드.
//! 특징 추출, 참조 코퍼스 스토어(클래스별 평균 벡터), 코사인 최근접 이웃
//! 분류, xcap 기반 윈도우 캡처를 담당한다.
//!
//! 특징 추출은 학습(스토어 빌드)과 추론(라이브 분류) 양쪽에서 동일한
//! 변환을 사용해야 한다 — [`featurizer`] 하나를 공유한다.

pub mod classifier;
pub mod featurizer;
pub mod index;
pub mod source;
pub mod store;
