//! Configuration validation
//!
//! Every check runs on every call and errors accumulate, so a single pass
//! reports everything that is wrong with a deployment's configuration.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use url::Url;

/// Top-level keys that must be present
pub const REQUIRED_KEYS: &[&str] = &["version", "cdn", "options"];

const DELIMITER_KEYS: &[&str] = &["left", "right", "display"];

fn semver_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+$").expect("semver pattern is a valid regex")
    })
}

/// Ordered, human-readable validation errors. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }

    fn push(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

/// Validates KaTeX configuration trees.
///
/// Keeps the errors of the last `validate` call so callers can inspect them
/// after a `false` result.
#[derive(Debug, Clone, Default)]
pub struct ConfigValidator {
    last: ValidationResult,
}

impl ConfigValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `config`, replacing any previously recorded errors
    pub fn validate(&mut self, config: &Value) -> bool {
        self.last = check(config);
        self.last.is_valid()
    }

    /// Errors recorded by the last `validate` call
    pub fn errors(&self) -> &[String] {
        self.last.errors()
    }

    pub fn has_errors(&self) -> bool {
        !self.last.is_valid()
    }
}

/// Run every check against `config` and collect the errors
pub fn check(config: &Value) -> ValidationResult {
    let mut result = ValidationResult::default();

    let Value::Object(config) = config else {
        result.push("Configuration must be an object");
        return result;
    };

    check_required_keys(config, &mut result);
    check_version(config, &mut result);
    check_cdn(config, &mut result);
    check_options(config, &mut result);

    result
}

fn check_required_keys(config: &Map<String, Value>, result: &mut ValidationResult) {
    for key in REQUIRED_KEYS {
        if !config.contains_key(*key) {
            result.push(format!("Missing required configuration key: {key}"));
        }
    }
}

// A null value counts as "not set": the key check above already passed and
// the renderer falls back to an empty string.
fn check_version(config: &Map<String, Value>, result: &mut ValidationResult) {
    match config.get("version") {
        None | Some(Value::Null) => {}
        Some(Value::String(version)) => {
            if !semver_pattern().is_match(version) {
                result.push("Version must follow semantic versioning (e.g., 0.16.28)");
            }
        }
        Some(_) => result.push("Version must be a string"),
    }
}

fn check_cdn(config: &Map<String, Value>, result: &mut ValidationResult) {
    match config.get("cdn") {
        None | Some(Value::Null) => {}
        Some(Value::String(cdn)) => {
            if Url::parse(cdn).is_err() {
                result.push("CDN must be a valid URL");
            }
        }
        Some(_) => result.push("CDN must be a string"),
    }
}

fn check_options(config: &Map<String, Value>, result: &mut ValidationResult) {
    match config.get("options") {
        None | Some(Value::Null) => {}
        Some(Value::Object(options)) => check_delimiters(options, result),
        Some(_) => result.push("Options must be an object"),
    }
}

fn check_delimiters(options: &Map<String, Value>, result: &mut ValidationResult) {
    let delimiters = match options.get("delimiters") {
        None | Some(Value::Null) => return,
        Some(Value::Array(delimiters)) => delimiters,
        Some(_) => {
            result.push("Delimiters must be an array");
            return;
        }
    };

    for (index, delimiter) in delimiters.iter().enumerate() {
        match delimiter {
            Value::Object(delimiter) => check_delimiter(index, delimiter, result),
            _ => result.push(format!("Delimiter at index {index} must be an object")),
        }
    }
}

fn check_delimiter(index: usize, delimiter: &Map<String, Value>, result: &mut ValidationResult) {
    for key in DELIMITER_KEYS {
        let Some(value) = delimiter.get(*key) else {
            result.push(format!("Delimiter at index {index} missing required key: {key}"));
            continue;
        };
        let well_typed = match *key {
            "display" => value.is_boolean(),
            _ => value.is_string(),
        };
        if !well_typed {
            let expected = if *key == "display" { "a boolean" } else { "a string" };
            result.push(format!("Delimiter at index {index}: {key} must be {expected}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "version": "0.16.28",
            "cdn": "https://cdn.jsdelivr.net/npm/katex",
            "options": {
                "delimiters": [
                    {"left": "$$", "right": "$$", "display": true},
                    {"left": "\\(", "right": "\\)", "display": false}
                ]
            }
        })
    }

    #[test]
    fn accepts_a_well_formed_configuration() {
        let mut validator = ConfigValidator::new();
        assert!(validator.validate(&valid()));
        assert!(validator.errors().is_empty());
        assert!(!validator.has_errors());
    }

    #[test]
    fn reports_every_missing_required_key() {
        let result = check(&json!({}));
        assert_eq!(
            result.errors(),
            [
                "Missing required configuration key: version",
                "Missing required configuration key: cdn",
                "Missing required configuration key: options",
            ]
        );
    }

    #[test]
    fn non_string_version_is_reported_once() {
        let mut cfg = valid();
        cfg["version"] = json!(123);
        assert_eq!(check(&cfg).errors(), ["Version must be a string"]);
    }

    #[test]
    fn version_must_be_plain_semver() {
        for bad in ["0.16", "v0.16.28", "0.16.28-beta", "0.16.28\n", "\u{0661}.2.3", ""] {
            let mut cfg = valid();
            cfg["version"] = json!(bad);
            assert_eq!(
                check(&cfg).errors(),
                ["Version must follow semantic versioning (e.g., 0.16.28)"],
                "version {bad:?}"
            );
        }
    }

    #[test]
    fn cdn_must_be_an_absolute_url() {
        let mut cfg = valid();
        cfg["cdn"] = json!("cdn.jsdelivr.net/npm/katex");
        assert_eq!(check(&cfg).errors(), ["CDN must be a valid URL"]);

        cfg["cdn"] = json!(["https://a"]);
        assert_eq!(check(&cfg).errors(), ["CDN must be a string"]);

        cfg["cdn"] = json!("http://localhost:8080/katex");
        assert!(check(&cfg).is_valid());
    }

    #[test]
    fn options_and_delimiters_shapes_are_checked() {
        let mut cfg = valid();
        cfg["options"] = json!("nope");
        assert_eq!(check(&cfg).errors(), ["Options must be an object"]);

        cfg["options"] = json!({"delimiters": {"left": "$"}});
        assert_eq!(check(&cfg).errors(), ["Delimiters must be an array"]);

        cfg["options"] = json!({"delimiters": ["$", {"left": "$", "right": "$", "display": false}]});
        assert_eq!(check(&cfg).errors(), ["Delimiter at index 0 must be an object"]);
    }

    #[test]
    fn delimiter_fields_name_index_and_field() {
        let mut cfg = valid();
        cfg["options"]["delimiters"] = json!([
            {"left": "$$", "right": "$$", "display": true},
            {"left": 1, "display": "yes"}
        ]);
        assert_eq!(
            check(&cfg).errors(),
            [
                "Delimiter at index 1: left must be a string",
                "Delimiter at index 1 missing required key: right",
                "Delimiter at index 1: display must be a boolean",
            ]
        );
    }

    #[test]
    fn errors_accumulate_across_fields() {
        let cfg = json!({"version": 1, "cdn": "::", "options": []});
        let result = check(&cfg);
        assert_eq!(result.errors().len(), 3);
    }

    #[test]
    fn validate_replaces_previous_errors() {
        let mut validator = ConfigValidator::new();
        assert!(!validator.validate(&json!({})));
        assert_eq!(validator.errors().len(), 3);
        assert!(validator.validate(&valid()));
        assert!(validator.errors().is_empty());
    }

    #[test]
    fn non_object_configuration_is_rejected() {
        assert_eq!(check(&json!([1, 2])).errors(), ["Configuration must be an object"]);
    }
}
