//! KaTeX tags for server-rendered pages
//!
//! Builds the `<link>`/`<script>` tags that load KaTeX (from a CDN or from
//! locally served copies), wraps math expressions in the configured
//! delimiters, and validates the configuration all of this is driven by.
//! Actual typesetting happens in the browser.
//!
//! # Features
//!
//! - **Fail-fast configuration**: a [`KatexRenderer`] only exists for a
//!   configuration that passed validation, and validation reports every
//!   problem at once
//! - **Injection-safe markup**: attribute values are HTML-escaped and the
//!   auto-render options are embedded as HTML-safe JSON
//! - **Livewire support**: optional script that re-renders math after DOM patches
//! - **Asset download** (`download` feature): fetch the KaTeX dist tree for
//!   local serving and compute its integrity hashes
//!
//! # Example
//!
//! ```
//! use katex_tags::{default_config, KatexRenderer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let renderer = KatexRenderer::new(default_config())?;
//!
//! let head = renderer.generate_stylesheet();
//! assert!(head.contains("katex@0.16.28/dist/katex.min.css"));
//!
//! let body = renderer.generate_default_scripts()?;
//! assert!(body.contains("renderMathInElement"));
//!
//! assert_eq!(renderer.wrap_inline("x^2"), "\\(x^2\\)");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod assets;
pub mod config;
pub mod directive;
pub mod livewire;
pub mod markup;
pub mod renderer;
pub mod validator;

// Asset download + SRI hashing (blocking HTTP)
#[cfg(feature = "download")]
pub mod download;

pub use assets::AssetSource;
pub use config::{default_config, ConfigLoader, Delimiter};
pub use directive::{Directive, MathComponent};
pub use livewire::{LiveUpdateIntegration, LivewireIntegrator};
pub use markup::{encode_options, escape_html, merge_options};
pub use renderer::KatexRenderer;
pub use validator::{ConfigValidator, ValidationResult};

#[cfg(feature = "download")]
pub use download::{sri_hash, AssetDownloader, DownloadOptions, DownloadOutcome, DownloadReport};

/// Inline (`\(..\)`) or display (`$$..$$`) math
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MathMode {
    #[default]
    Inline,
    Display,
}

impl MathMode {
    pub fn from_display(display: bool) -> Self {
        if display {
            MathMode::Display
        } else {
            MathMode::Inline
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_math_mode_default_is_inline() {
        assert_eq!(MathMode::default(), MathMode::Inline);
        assert_eq!(MathMode::from_display(true), MathMode::Display);
    }

    #[test]
    fn test_default_config_builds_renderer() {
        let renderer = KatexRenderer::new(default_config()).expect("defaults are valid");
        assert!(renderer.is_configured());
    }
}
