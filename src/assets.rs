//! Where KaTeX assets are loaded from
//!
//! Local assets live in a fixed tree under the static root:
//!
//! ```text
//! vendor/katex/katex.min.css
//! vendor/katex/katex.min.js
//! vendor/katex/contrib/auto-render.min.js
//! vendor/katex/fonts/KaTeX_*.{woff2,woff,ttf}
//! ```

/// Directory, relative to the static root, holding local assets
pub const LOCAL_ASSET_DIR: &str = "vendor/katex";

pub const STYLESHEET: &str = "katex.min.css";
pub const CORE_SCRIPT: &str = "katex.min.js";
pub const AUTO_RENDER_SCRIPT: &str = "contrib/auto-render.min.js";

/// Files the pages cannot work without
pub const REQUIRED_FILES: &[&str] = &[STYLESHEET, CORE_SCRIPT, AUTO_RENDER_SCRIPT];

pub const FONT_FAMILIES: &[&str] = &[
    "KaTeX_AMS-Regular",
    "KaTeX_Caligraphic-Bold",
    "KaTeX_Caligraphic-Regular",
    "KaTeX_Fraktur-Bold",
    "KaTeX_Fraktur-Regular",
    "KaTeX_Main-Bold",
    "KaTeX_Main-BoldItalic",
    "KaTeX_Main-Italic",
    "KaTeX_Main-Regular",
    "KaTeX_Math-BoldItalic",
    "KaTeX_Math-Italic",
    "KaTeX_SansSerif-Bold",
    "KaTeX_SansSerif-Italic",
    "KaTeX_SansSerif-Regular",
    "KaTeX_Script-Regular",
    "KaTeX_Size1-Regular",
    "KaTeX_Size2-Regular",
    "KaTeX_Size3-Regular",
    "KaTeX_Size4-Regular",
    "KaTeX_Typewriter-Regular",
];

pub const FONT_EXTENSIONS: &[&str] = &["woff2", "woff", "ttf"];

/// Every font file name, e.g. `fonts/KaTeX_Main-Regular.woff2`
pub fn font_files() -> impl Iterator<Item = String> {
    FONT_FAMILIES.iter().flat_map(|family| {
        FONT_EXTENSIONS
            .iter()
            .map(move |ext| format!("fonts/{family}.{ext}"))
    })
}

/// Resolved origin of the asset files
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    /// Served by the host from `{base}/vendor/katex/`
    Local { base: String },
    /// Fetched from `{cdn}@{version}/dist/`
    Cdn { cdn: String, version: String },
}

impl AssetSource {
    /// URL of `file` (relative to the KaTeX `dist` directory)
    pub fn url(&self, file: &str) -> String {
        match self {
            AssetSource::Local { base } => {
                format!("{}/{}/{}", base.trim_end_matches('/'), LOCAL_ASSET_DIR, file)
            }
            AssetSource::Cdn { cdn, version } => format!("{cdn}@{version}/dist/{file}"),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, AssetSource::Local { .. })
    }
}
