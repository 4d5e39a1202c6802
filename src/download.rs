//! Fetching KaTeX assets for local serving
//!
//! Populates `{public}/vendor/katex` from `{cdn}@{version}/dist`. The three
//! required files must all arrive (and match their configured integrity
//! hashes when verification is on); font files are best effort.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine as Base64Engine;
use log::{info, warn};
use reqwest::blocking::Client;
use serde::Serialize;
use sha2::{Digest, Sha384};

use crate::assets::{
    font_files, AssetSource, AUTO_RENDER_SCRIPT, CORE_SCRIPT, LOCAL_ASSET_DIR, REQUIRED_FILES,
    STYLESHEET,
};
use crate::config::{DEFAULT_CDN, DEFAULT_VERSION};
use crate::{Error, KatexRenderer, Result};

/// Subresource Integrity value (`sha384-<base64>`) for `bytes`
pub fn sri_hash(bytes: &[u8]) -> String {
    let digest = Sha384::digest(bytes);
    format!(
        "sha384-{}",
        Base64Engine::encode(&base64::engine::general_purpose::STANDARD, digest)
    )
}

/// Knobs for a download run
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Overwrite existing assets without asking
    pub force: bool,
    /// Reject required files whose hash differs from the configured one
    pub verify_integrity: bool,
    /// Per-request timeout
    pub timeout_ms: u64,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            force: false,
            verify_integrity: true,
            timeout_ms: 30000,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadedAsset {
    pub file: String,
    pub url: String,
    pub integrity: String,
    pub bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FontFailure {
    pub file: String,
    pub reason: String,
}

/// What a completed run fetched
#[derive(Debug, Clone, Serialize)]
pub struct DownloadReport {
    pub target: PathBuf,
    pub assets: Vec<DownloadedAsset>,
    pub fonts_downloaded: usize,
    pub font_failures: Vec<FontFailure>,
}

#[derive(Debug, Clone)]
pub enum DownloadOutcome {
    /// Assets existed and the overwrite was declined
    Cancelled,
    Completed(DownloadReport),
}

/// Downloads the asset tree described by a renderer's configuration
pub struct AssetDownloader {
    client: Client,
    source: AssetSource,
    target: PathBuf,
    expected: Vec<(&'static str, String)>,
    options: DownloadOptions,
}

impl AssetDownloader {
    /// Prepare a download into `{public_dir}/vendor/katex`
    pub fn new(
        renderer: &KatexRenderer,
        public_dir: impl AsRef<Path>,
        options: DownloadOptions,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(options.timeout_ms))
            .build()
            .map_err(|e| Error::Download {
                url: String::new(),
                reason: format!("Failed to build HTTP client: {}", e),
            })?;

        let setting = |key: &str, default: &str| {
            renderer
                .config_value(key)
                .and_then(|v| v.as_str())
                .unwrap_or(default)
                .to_string()
        };

        let source = AssetSource::Cdn {
            cdn: setting("cdn", DEFAULT_CDN).trim_end_matches('/').to_string(),
            version: setting("version", DEFAULT_VERSION),
        };
        let expected = vec![
            (STYLESHEET, setting("css_integrity", "")),
            (CORE_SCRIPT, setting("js_integrity", "")),
            (AUTO_RENDER_SCRIPT, setting("auto_render_integrity", "")),
        ];

        Ok(Self {
            client,
            source,
            target: public_dir.as_ref().join(LOCAL_ASSET_DIR),
            expected,
            options,
        })
    }

    /// Directory the assets are written to
    pub fn target_dir(&self) -> &Path {
        &self.target
    }

    /// URL of a file relative to the `dist` directory
    pub fn url_for(&self, file: &str) -> String {
        self.source.url(file)
    }

    /// Run the download. `confirm_overwrite` is only consulted when the
    /// target already exists and `force` is off.
    pub fn run<F>(&self, confirm_overwrite: F) -> Result<DownloadOutcome>
    where
        F: FnOnce(&Path) -> bool,
    {
        if self.target.exists() && !self.options.force && !confirm_overwrite(&self.target) {
            info!("Download cancelled.");
            return Ok(DownloadOutcome::Cancelled);
        }

        fs::create_dir_all(&self.target)?;

        let mut assets = Vec::with_capacity(REQUIRED_FILES.len());
        for file in REQUIRED_FILES {
            assets.push(self.fetch_required(file)?);
        }

        let mut fonts_downloaded = 0;
        let mut font_failures = Vec::new();
        for file in font_files() {
            match self.fetch_to_disk(&file) {
                Ok(_) => fonts_downloaded += 1,
                Err(e) => {
                    warn!("Failed to download {}: {}", file, e);
                    font_failures.push(FontFailure {
                        file,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "KaTeX assets downloaded to {} ({} fonts, {} font failures)",
            self.target.display(),
            fonts_downloaded,
            font_failures.len()
        );

        Ok(DownloadOutcome::Completed(DownloadReport {
            target: self.target.clone(),
            assets,
            fonts_downloaded,
            font_failures,
        }))
    }

    fn fetch_required(&self, file: &str) -> Result<DownloadedAsset> {
        let url = self.url_for(file);
        let body = self.fetch(&url)?;
        let integrity = sri_hash(&body);

        if self.options.verify_integrity {
            let expected = self
                .expected
                .iter()
                .find(|(name, _)| *name == file)
                .map(|(_, hash)| hash.as_str())
                .unwrap_or("");
            if !expected.is_empty() && expected != integrity {
                return Err(Error::IntegrityMismatch {
                    file: file.to_string(),
                    expected: expected.to_string(),
                    actual: integrity,
                });
            }
        }

        self.write(file, &body)?;
        info!("Downloaded {} ({} bytes)", file, body.len());
        Ok(DownloadedAsset {
            file: file.to_string(),
            url,
            integrity,
            bytes: body.len(),
        })
    }

    fn fetch_to_disk(&self, file: &str) -> Result<usize> {
        let body = self.fetch(&self.url_for(file))?;
        self.write(file, &body)?;
        Ok(body.len())
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let failed = |e: reqwest::Error| Error::Download {
            url: url.to_string(),
            reason: e.to_string(),
        };
        let resp = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(failed)?;
        let body = resp.bytes().map_err(failed)?;
        Ok(body.to_vec())
    }

    fn write(&self, file: &str, body: &[u8]) -> Result<()> {
        let destination = self.target.join(file);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(destination, body)?;
        Ok(())
    }
}
