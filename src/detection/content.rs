//! Content validation of a successful response body.
//!
//! Exactly one validation mode runs per check. Failures are reported as a list
//! of violated rules; they never change the check's up/down status.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordMode {
    #[default]
    Contains,
    NotContains,
}

fn default_true() -> bool {
    true
}

/// Content validation configuration, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ContentValidation {
    Keyword {
        keywords: Vec<String>,
        #[serde(default)]
        mode: KeywordMode,
        #[serde(default)]
        case_sensitive: bool,
    },
    Regex {
        pattern: String,
        #[serde(default = "default_true")]
        should_match: bool,
    },
    Hash {
        #[serde(default)]
        expected_hash: Option<String>,
        #[serde(default)]
        detect_changes: bool,
    },
    Json {
        #[serde(default)]
        required_fields: Vec<String>,
        #[serde(default)]
        expected_values: HashMap<String, serde_json::Value>,
    },
    Size {
        #[serde(default)]
        min_bytes: Option<usize>,
        #[serde(default)]
        max_bytes: Option<usize>,
    },
}

impl ContentValidation {
    pub fn type_name(&self) -> &'static str {
        match self {
            ContentValidation::Keyword { .. } => "keyword",
            ContentValidation::Regex { .. } => "regex",
            ContentValidation::Hash { .. } => "hash",
            ContentValidation::Json { .. } => "json",
            ContentValidation::Size { .. } => "size",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub passed: bool,
    pub validation_type: String,
    pub failures: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub computed_hash: Option<String>,
}

/// SHA-256 of `body`, lowercase hex.
pub fn sha256_hex(body: &[u8]) -> String {
    format!("{:x}", Sha256::digest(body))
}

/// Validates `body` (original case) against `config`.
///
/// `truncated` means `body` is only a prefix of what the server sent. A
/// maximum size then fails outright; every other mode runs on the prefix
/// and says so in a warning.
pub fn validate(config: &ContentValidation, body: &str, truncated: bool) -> ValidationOutcome {
    let mut failures = Vec::new();
    let mut warnings = Vec::new();
    let mut computed_hash = None;

    if truncated && !matches!(config, ContentValidation::Size { .. }) {
        warnings.push(format!(
            "body truncated at {} bytes, validated the prefix only",
            body.len()
        ));
    }

    match config {
        ContentValidation::Keyword {
            keywords,
            mode,
            case_sensitive,
        } => {
            let haystack = if *case_sensitive {
                body.to_string()
            } else {
                body.to_lowercase()
            };
            for keyword in keywords {
                let needle = if *case_sensitive {
                    keyword.clone()
                } else {
                    keyword.to_lowercase()
                };
                let found = haystack.contains(&needle);
                match (mode, found) {
                    (KeywordMode::Contains, false) => {
                        failures.push(format!("missing keyword {keyword:?}"))
                    }
                    (KeywordMode::NotContains, true) => {
                        failures.push(format!("forbidden keyword {keyword:?} present"))
                    }
                    _ => {}
                }
            }
        }
        ContentValidation::Regex {
            pattern,
            should_match,
        } => match Regex::new(pattern) {
            Ok(re) => {
                let matched = re.is_match(body);
                if matched != *should_match {
                    failures.push(if *should_match {
                        format!("pattern {pattern:?} did not match")
                    } else {
                        format!("pattern {pattern:?} matched but should not")
                    });
                }
            }
            Err(e) => failures.push(format!("invalid pattern {pattern:?}: {e}")),
        },
        ContentValidation::Hash {
            expected_hash,
            detect_changes,
        } => {
            let hash = sha256_hex(body.as_bytes());
            if let Some(expected) = expected_hash {
                if !expected.trim().eq_ignore_ascii_case(&hash) {
                    if *detect_changes {
                        warnings.push(format!("content changed: hash {hash} differs from {expected}"));
                    } else {
                        failures.push(format!("hash mismatch: expected {expected}, got {hash}"));
                    }
                }
            }
            computed_hash = Some(hash);
        }
        ContentValidation::Json {
            required_fields,
            expected_values,
        } => match serde_json::from_str::<serde_json::Value>(body) {
            Ok(doc) => {
                for path in required_fields {
                    if lookup_path(&doc, path).is_none() {
                        failures.push(format!("missing field {path:?}"));
                    }
                }
                let mut expected: Vec<_> = expected_values.iter().collect();
                expected.sort_by(|a, b| a.0.cmp(b.0));
                for (path, want) in expected {
                    match lookup_path(&doc, path) {
                        Some(got) if got == want => {}
                        Some(got) => failures.push(format!("field {path:?} is {got}, expected {want}")),
                        None => failures.push(format!("missing field {path:?}")),
                    }
                }
            }
            Err(e) => failures.push(format!("body is not valid JSON: {e}")),
        },
        ContentValidation::Size {
            min_bytes,
            max_bytes,
        } => {
            let len = body.len();
            if let Some(min) = min_bytes {
                if truncated && len < *min {
                    warnings.push(format!(
                        "body truncated at {len} bytes, minimum {min} not confirmed"
                    ));
                } else if len < *min {
                    failures.push(format!("body is {len} bytes, below minimum {min}"));
                }
            }
            if let Some(max) = max_bytes {
                if truncated {
                    failures.push(format!(
                        "body exceeds the {len}-byte read limit, above maximum {max}"
                    ));
                } else if len > *max {
                    failures.push(format!("body is {len} bytes, above maximum {max}"));
                }
            }
        }
    }

    ValidationOutcome {
        passed: failures.is_empty(),
        validation_type: config.type_name().to_string(),
        failures,
        warnings,
        computed_hash,
    }
}

/// Resolves a dotted path; numeric segments index arrays.
fn lookup_path<'a>(doc: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    path.split('.')
        .filter(|s| !s.is_empty())
        .try_fold(doc, |node, segment| match node {
            serde_json::Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
            serde_json::Value::Object(map) => map.get(segment),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> ContentValidation {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_keyword_contains_case_insensitive() {
        let cfg = parse(json!({"type": "keyword", "keywords": ["Welcome", "Checkout"]}));
        let outcome = validate(&cfg, "<h1>WELCOME</h1>", false);
        assert!(!outcome.passed);
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].contains("Checkout"));
    }

    #[test]
    fn test_keyword_not_contains() {
        let cfg = parse(json!({
            "type": "keyword",
            "keywords": ["Error"],
            "mode": "not_contains",
            "caseSensitive": true
        }));
        assert!(validate(&cfg, "all good, no error", false).passed);
        assert!(!validate(&cfg, "Error 500", false).passed);
    }

    #[test]
    fn test_regex_invalid_pattern_is_failure() {
        let cfg = parse(json!({"type": "regex", "pattern": "(unclosed"}));
        let outcome = validate(&cfg, "anything", false);
        assert!(!outcome.passed);
        assert!(outcome.failures[0].contains("invalid pattern"));
    }

    #[test]
    fn test_regex_should_not_match() {
        let cfg = parse(json!({"type": "regex", "pattern": "maintenance", "shouldMatch": false}));
        assert!(validate(&cfg, "open for business", false).passed);
        assert!(!validate(&cfg, "down for maintenance", false).passed);
    }

    #[test]
    fn test_hash_detect_changes_warns_instead_of_failing() {
        let cfg = parse(json!({
            "type": "hash",
            "expectedHash": "0000000000000000000000000000000000000000000000000000000000000000",
            "detectChanges": true
        }));
        let outcome = validate(&cfg, "new content", false);
        assert!(outcome.passed);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.computed_hash, Some(sha256_hex(b"new content")));
    }

    #[test]
    fn test_hash_mismatch_fails_without_detect_changes() {
        let cfg = parse(json!({"type": "hash", "expectedHash": "abc"}));
        assert!(!validate(&cfg, "body", false).passed);
    }

    #[test]
    fn test_hash_match() {
        let hash = sha256_hex(b"hello");
        assert_eq!(
            hash,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        let cfg = parse(json!({"type": "hash", "expectedHash": hash.to_uppercase()}));
        assert!(validate(&cfg, "hello", false).passed);
    }

    #[test]
    fn test_json_fields_and_values() {
        let cfg = parse(json!({
            "type": "json",
            "requiredFields": ["status", "items.0.id", "meta.version"],
            "expectedValues": {"status": "ok"}
        }));
        let body = r#"{"status":"ok","items":[{"id":7}]}"#;
        let outcome = validate(&cfg, body, false);
        assert!(!outcome.passed);
        assert_eq!(outcome.failures, vec!["missing field \"meta.version\"".to_string()]);
    }

    #[test]
    fn test_json_unparseable_body() {
        let cfg = parse(json!({"type": "json", "requiredFields": ["a"]}));
        let outcome = validate(&cfg, "<html>", false);
        assert!(!outcome.passed);
        assert!(outcome.failures[0].contains("not valid JSON"));
    }

    #[test]
    fn test_size_bounds() {
        let cfg = parse(json!({"type": "size", "minBytes": 5, "maxBytes": 10}));
        assert!(!validate(&cfg, "abc", false).passed);
        assert!(validate(&cfg, "abcdef", false).passed);
        assert!(!validate(&cfg, "abcdefghijklmnop", false).passed);
    }

    #[test]
    fn test_size_max_fails_on_truncated_body() {
        let cfg = parse(json!({"type": "size", "maxBytes": 2_500_000}));
        let outcome = validate(&cfg, "abcdef", true);
        assert!(!outcome.passed);
        assert!(outcome.failures[0].contains("read limit"));
    }

    #[test]
    fn test_size_min_beyond_read_limit_warns() {
        let cfg = parse(json!({"type": "size", "minBytes": 10}));
        let outcome = validate(&cfg, "abcdef", true);
        assert!(outcome.passed);
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn test_truncated_body_warns_for_other_modes() {
        let cfg = parse(json!({"type": "hash"}));
        let outcome = validate(&cfg, "prefix", true);
        assert!(outcome.passed);
        assert!(outcome.warnings[0].contains("truncated at 6 bytes"));

        let cfg = parse(json!({"type": "keyword", "keywords": ["prefix"]}));
        assert_eq!(validate(&cfg, "prefix", true).warnings.len(), 1);
        assert!(validate(&cfg, "prefix", false).warnings.is_empty());
    }
}
