//! Configuration tree, defaults and layered loading
//!
//! The configuration is kept as a JSON tree rather than a typed struct: the
//! auto-render `options` are passed through to the browser library untouched
//! and validation has to be able to report wrongly-typed values instead of
//! failing to deserialize them.
//!
//! Layers are applied in order: built-in defaults, an optional JSON file,
//! then `KATEX_*` environment overrides.

use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::markup::merge_options;
use crate::{Error, Result};

/// KaTeX release the defaults (and their integrity hashes) refer to
pub const DEFAULT_VERSION: &str = "0.16.28";

/// Default CDN base; assets live under `{cdn}@{version}/dist/`
pub const DEFAULT_CDN: &str = "https://cdn.jsdelivr.net/npm/katex";

pub const DEFAULT_CSS_INTEGRITY: &str =
    "sha384-Wsr4Nh3yrvMf2KCebJchRJoVo1gTU6kcP05uRSh5NV3sj9+a8IomuJoQzf3sMq4T";
pub const DEFAULT_JS_INTEGRITY: &str =
    "sha384-+W9OcrYK2/bD7BmUAk+xeFAyKp0QjyRQUCxeU31dfyTt/FrPsUgaBTLLkVf33qWt";
pub const DEFAULT_AUTO_RENDER_INTEGRITY: &str =
    "sha384-hCXGrW6PitJEwbkoStFjeJxv+fSOOQKOPbJxSfM6G5sWZjAyWhXiTIIAmQqnlLlh";

/// One auto-render delimiter record as the browser library expects it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiter {
    pub left: String,
    pub right: String,
    pub display: bool,
}

impl Delimiter {
    pub fn new(left: &str, right: &str, display: bool) -> Self {
        Self {
            left: left.to_string(),
            right: right.to_string(),
            display,
        }
    }
}

/// Delimiters scanned for by auto-render out of the box
pub fn default_auto_render_delimiters() -> Vec<Delimiter> {
    vec![
        Delimiter::new("$$", "$$", true),
        Delimiter::new("\\[", "\\]", true),
        Delimiter::new("\\(", "\\)", false),
    ]
}

/// The complete default configuration tree
pub fn default_config() -> Value {
    json!({
        "version": DEFAULT_VERSION,
        "use_local_assets": false,
        "asset_url": "",
        "cdn": DEFAULT_CDN,
        "css_integrity": DEFAULT_CSS_INTEGRITY,
        "js_integrity": DEFAULT_JS_INTEGRITY,
        "auto_render_integrity": DEFAULT_AUTO_RENDER_INTEGRITY,
        "delimiters": {
            "inline": { "left": "\\(", "right": "\\)" },
            "display": { "left": "$$", "right": "$$" }
        },
        "options": {
            "delimiters": default_auto_render_delimiters(),
            "ignoredTags": [
                "script", "noscript", "style", "textarea", "pre",
                "code", "option", "annotation", "annotation-xml"
            ],
            "ignoredClasses": ["no-katex", "katex-ignore"],
            "throwOnError": false,
            "errorColor": "#cc0000",
            "output": "htmlAndMathml",
            "trust": false,
            "strict": "warn",
            "macros": {}
        },
        "livewire": false,
        "preprocess": false,
        "cache": {
            "enabled": false,
            "ttl": 3600,
            "driver": "file"
        }
    })
}

/// Look up a dotted path (`"delimiters.inline.left"`) in a configuration
/// tree. Numeric segments index into arrays.
pub fn lookup<'a>(config: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(config);
    }
    path.split('.').try_fold(config, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Loose truthiness used for flag-like settings that may arrive as strings
/// or numbers from hand-written configuration files.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Parse an environment-style boolean
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "(true)" | "1" | "yes" | "on" => Some(true),
        "false" | "(false)" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
enum EnvKind {
    Str,
    Bool,
    UInt,
}

/// Environment variable, target path, value kind
const ENV_OVERRIDES: &[(&str, &str, EnvKind)] = &[
    ("KATEX_VERSION", "version", EnvKind::Str),
    ("KATEX_USE_LOCAL_ASSETS", "use_local_assets", EnvKind::Bool),
    ("KATEX_ASSET_URL", "asset_url", EnvKind::Str),
    ("KATEX_CDN", "cdn", EnvKind::Str),
    ("KATEX_CSS_INTEGRITY", "css_integrity", EnvKind::Str),
    ("KATEX_JS_INTEGRITY", "js_integrity", EnvKind::Str),
    ("KATEX_AUTO_RENDER_INTEGRITY", "auto_render_integrity", EnvKind::Str),
    ("KATEX_LIVEWIRE", "livewire", EnvKind::Bool),
    ("KATEX_PREPROCESS", "preprocess", EnvKind::Bool),
    ("KATEX_CACHE_ENABLED", "cache.enabled", EnvKind::Bool),
    ("KATEX_CACHE_TTL", "cache.ttl", EnvKind::UInt),
    ("KATEX_CACHE_DRIVER", "cache.driver", EnvKind::Str),
];

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Builds a configuration tree from defaults, a file and the environment
pub struct ConfigLoader {
    file: Option<PathBuf>,
    env: Option<EnvLookup>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader that reads the process environment
    pub fn new() -> Self {
        Self {
            file: None,
            env: Some(Box::new(|key| std::env::var(key).ok())),
        }
    }

    /// Merge a JSON file over the defaults
    pub fn file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Replace the environment source, e.g. with a fixed map in tests
    pub fn env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Some(Box::new(lookup));
        self
    }

    /// Ignore environment overrides entirely
    pub fn without_env(mut self) -> Self {
        self.env = None;
        self
    }

    /// Produce the layered configuration. The result is not validated;
    /// hand it to `KatexRenderer::new` for that.
    pub fn load(&self) -> Result<Value> {
        let mut config = default_config();

        if let Some(path) = &self.file {
            debug!("merging configuration file {}", path.display());
            let text = std::fs::read_to_string(path)
                .map_err(|e| Error::ConfigFile(format!("{}: {}", path.display(), e)))?;
            let layer: Value = serde_json::from_str(&text)
                .map_err(|e| Error::ConfigFile(format!("{}: {}", path.display(), e)))?;
            config = merge_options(&config, &layer);
        }

        if let Some(env) = &self.env {
            for (key, path, kind) in ENV_OVERRIDES {
                if let Some(raw) = env(key) {
                    debug!("{} overrides {}", key, path);
                    let value = parse_env_value(key, &raw, *kind)?;
                    set_path(&mut config, path, value);
                }
            }
        }

        Ok(config)
    }
}

fn parse_env_value(key: &str, raw: &str, kind: EnvKind) -> Result<Value> {
    let invalid = || Error::Environment {
        key: key.to_string(),
        value: raw.to_string(),
    };
    match kind {
        EnvKind::Str => Ok(Value::String(raw.to_string())),
        EnvKind::Bool => parse_bool(raw).map(Value::Bool).ok_or_else(invalid),
        EnvKind::UInt => raw
            .trim()
            .parse::<u64>()
            .map(Value::from)
            .map_err(|_| invalid()),
    }
}

/// Set a dotted path, creating intermediate objects as needed
fn set_path(config: &mut Value, path: &str, value: Value) {
    let mut node = config;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(map) = node else {
            return;
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        node = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}
