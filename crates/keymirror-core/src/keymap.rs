//! 클래스명 → 실제 키 이름 매핑.
//!
//! 코퍼스 디렉토리 이름(클래스명)을 입력 드라이버가 인식하는 키 이름으로
//! 변환한다. 규칙은 우선순위 순서의 패턴 매칭으로 고정되어 있다:
//!
//! 1. 설정의 명시적 오버라이드
//! 2. 방향 클래스 (`UP`/`DOWN`/`LEFT`/`RIGHT` → 화살표 키)
//! 3. 이름 있는 수정/제어 클래스 (`SPACE`, `ENTER`, `CTRL`, `ALT`, `SHIFT`)
//! 4. 단일 알파벳 문자 → 소문자
//! 5. 그 외 → 클래스명 전체 소문자

use std::collections::BTreeMap;

/// 클래스명을 실제 키 이름으로 해석
///
/// `overrides`가 기본 규칙보다 항상 우선한다.
pub fn resolve_key(class_name: &str, overrides: &BTreeMap<String, String>) -> String {
    if let Some(mapped) = overrides.get(class_name) {
        return mapped.clone();
    }

    match class_name {
        "UP" => "up".to_string(),
        "DOWN" => "down".to_string(),
        "LEFT" => "left".to_string(),
        "RIGHT" => "right".to_string(),
        "SPACE" => "space".to_string(),
        "ENTER" => "enter".to_string(),
        "CTRL" => "ctrl".to_string(),
        "ALT" => "alt".to_string(),
        "SHIFT" => "shift".to_string(),
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                // 단일 알파벳 문자 → 소문자
                (Some(c), None) if c.is_alphabetic() => c.to_lowercase().to_string(),
                _ => other.to_lowercase(),
            }
        }
    }
}
