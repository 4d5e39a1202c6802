//! The renderer facade: owns a validated configuration and builds markup

use std::fmt;
use std::sync::Arc;

use log::debug;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::assets::{AssetSource, AUTO_RENDER_SCRIPT, CORE_SCRIPT, STYLESHEET};
use crate::config::{lookup, truthy, ConfigLoader, DEFAULT_CDN, DEFAULT_VERSION};
use crate::livewire::LiveUpdateIntegration;
use crate::markup::{encode_options, merge_options, script_tag, void_tag, Attributes};
use crate::validator;
use crate::{Error, MathMode, Result};

/// Builds KaTeX tags and delimited expressions from one configuration.
///
/// A renderer only exists for a configuration that passed validation and
/// never mutates it afterwards, so it can be shared freely between threads.
pub struct KatexRenderer {
    config: Value,
    live_updates: Option<Arc<dyn LiveUpdateIntegration>>,
}

impl fmt::Debug for KatexRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KatexRenderer")
            .field("config", &self.config)
            .field("live_updates", &self.live_updates.is_some())
            .finish()
    }
}

impl KatexRenderer {
    /// Validate `config` and build a renderer.
    ///
    /// Fails with `Error::ConfigurationInvalid` carrying every validation
    /// error when the configuration is not usable.
    pub fn new(config: Value) -> Result<Self> {
        let result = validator::check(&config);
        if !result.is_valid() {
            return Err(Error::ConfigurationInvalid(result.into_errors()));
        }
        Ok(Self {
            config,
            live_updates: None,
        })
    }

    /// Like `new`, with a live-update integration for `livewire = true`
    pub fn with_live_updates(
        config: Value,
        integration: Arc<dyn LiveUpdateIntegration>,
    ) -> Result<Self> {
        let mut renderer = Self::new(config)?;
        renderer.live_updates = Some(integration);
        Ok(renderer)
    }

    /// Renderer over defaults plus `KATEX_*` environment overrides
    pub fn from_env() -> Result<Self> {
        Self::new(ConfigLoader::new().load()?)
    }

    /// The whole configuration tree
    pub fn config(&self) -> &Value {
        &self.config
    }

    /// Dotted-path lookup, `None` if any segment is absent
    pub fn config_value(&self, key: &str) -> Option<&Value> {
        lookup(&self.config, key)
    }

    /// Dotted-path lookup returning `default` if any segment is absent
    pub fn get_config(&self, key: &str, default: impl Into<Value>) -> Value {
        self.config_value(key)
            .cloned()
            .unwrap_or_else(|| default.into())
    }

    // An explicit null reads as an empty string, absent keys as `default`.
    fn str_setting<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        match self.config_value(key) {
            Some(Value::String(s)) => s.as_str(),
            Some(Value::Null) => "",
            _ => default,
        }
    }

    fn flag(&self, key: &str) -> bool {
        self.config_value(key).map(truthy).unwrap_or(false)
    }

    /// Where tags should point: local assets when enabled, else the CDN
    pub fn asset_source(&self) -> AssetSource {
        if self.flag("use_local_assets") {
            AssetSource::Local {
                base: self.str_setting("asset_url", "").to_string(),
            }
        } else {
            AssetSource::Cdn {
                cdn: self.str_setting("cdn", DEFAULT_CDN).to_string(),
                version: self.str_setting("version", DEFAULT_VERSION).to_string(),
            }
        }
    }

    /// `<link rel="stylesheet">` for the KaTeX CSS
    pub fn generate_stylesheet(&self) -> String {
        let source = self.asset_source();
        let mut attrs = Attributes::new()
            .set("rel", "stylesheet")
            .set("href", source.url(STYLESHEET));
        if !source.is_local() {
            attrs = attrs
                .set_non_empty("integrity", self.str_setting("css_integrity", ""))
                .set("crossorigin", "anonymous");
        }
        void_tag("link", &attrs)
    }

    /// Script tags for the KaTeX core and the auto-render extension, plus
    /// the live-update script when `livewire` is enabled.
    ///
    /// `options` are deep-merged over the configured auto-render options.
    pub fn generate_scripts(&self, options: &Map<String, Value>) -> Result<String> {
        let merged = self.merge_options(&Value::Object(options.clone()));
        let json_options = encode_options(&merged)?;
        let source = self.asset_source();
        debug!("generating scripts from {:?}", source);

        let onload = format!("renderMathInElement(document.body, {json_options});");
        let mut scripts = vec![
            self.script(&source, CORE_SCRIPT, "js_integrity", None),
            self.script(&source, AUTO_RENDER_SCRIPT, "auto_render_integrity", Some(onload)),
        ];

        if self.flag("livewire") {
            let integration = self.live_updates.as_ref().ok_or_else(|| {
                Error::DependencyMissing(
                    "Livewire integration is enabled but no integrator was provided".into(),
                )
            })?;
            scripts.push(integration.generate_script(&json_options)?);
        }

        Ok(scripts.join("\n"))
    }

    /// `generate_scripts` with no per-call options
    pub fn generate_default_scripts(&self) -> Result<String> {
        self.generate_scripts(&Map::new())
    }

    /// `generate_scripts` for any serializable options value.
    ///
    /// The value has to serialize to a JSON object.
    pub fn generate_scripts_with<T>(&self, options: &T) -> Result<String>
    where
        T: Serialize + ?Sized,
    {
        match serde_json::to_value(options).map_err(|e| Error::EncodingFailure(e.to_string()))? {
            Value::Object(map) => self.generate_scripts(&map),
            Value::Null => self.generate_default_scripts(),
            other => Err(Error::EncodingFailure(format!(
                "render options must be a JSON object, got {other}"
            ))),
        }
    }

    fn script(
        &self,
        source: &AssetSource,
        file: &str,
        integrity_key: &str,
        onload: Option<String>,
    ) -> String {
        let mut attrs = Attributes::new().flag("defer").set("src", source.url(file));
        if !source.is_local() {
            attrs = attrs.set_non_empty("integrity", self.str_setting(integrity_key, ""));
        }
        if let Some(onload) = onload {
            attrs = attrs.set("onload", onload);
        }
        if !source.is_local() {
            attrs = attrs.set("crossorigin", "anonymous");
        }
        script_tag(&attrs)
    }

    /// Configured auto-render options with `overrides` merged on top
    pub fn merge_options(&self, overrides: &Value) -> Value {
        let defaults = self
            .config_value("options")
            .filter(|v| !v.is_null())
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        merge_options(&defaults, overrides)
    }

    /// HTML-safe JSON encoding of auto-render options
    pub fn encode_options(&self, options: &Value) -> Result<String> {
        encode_options(options)
    }

    /// `expression` between the inline delimiters. No escaping is applied.
    pub fn wrap_inline(&self, expression: &str) -> String {
        let left = self.str_setting("delimiters.inline.left", "\\(");
        let right = self.str_setting("delimiters.inline.right", "\\)");
        format!("{left}{expression}{right}")
    }

    /// `expression` between the display delimiters. No escaping is applied.
    pub fn wrap_display(&self, expression: &str) -> String {
        let left = self.str_setting("delimiters.display.left", "$$");
        let right = self.str_setting("delimiters.display.right", "$$");
        format!("{left}{expression}{right}")
    }

    pub fn wrap(&self, expression: &str, mode: MathMode) -> String {
        match mode {
            MathMode::Inline => self.wrap_inline(expression),
            MathMode::Display => self.wrap_display(expression),
        }
    }

    /// Re-run validation against the held configuration
    pub fn is_configured(&self) -> bool {
        validator::check(&self.config).is_valid()
    }

    pub fn config_errors(&self) -> Vec<String> {
        validator::check(&self.config).into_errors()
    }
}
