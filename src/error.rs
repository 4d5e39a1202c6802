//! Error types for configuration, markup generation and asset downloads

use thiserror::Error;

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building KaTeX markup
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration failed validation; carries every collected error
    #[error("Invalid KaTeX configuration: {}", .0.join(", "))]
    ConfigurationInvalid(Vec<String>),

    /// An enabled integration needs a collaborator that is not present
    #[error("Dependency missing: {0}")]
    DependencyMissing(String),

    /// Render options could not be serialized to JSON
    #[error("JSON encoding error: {0}")]
    EncodingFailure(String),

    /// An environment override could not be parsed
    #[error("Invalid value for {key}: {value:?}")]
    Environment { key: String, value: String },

    /// A configuration file could not be read or parsed
    #[error("Configuration file error: {0}")]
    ConfigFile(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required asset could not be downloaded
    #[error("Could not download file from {url}: {reason}")]
    Download { url: String, reason: String },

    /// A downloaded asset does not match its configured integrity hash
    #[error("Integrity mismatch for {file}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        file: String,
        expected: String,
        actual: String,
    },
}

impl Error {
    /// Validation errors carried by `ConfigurationInvalid`, empty otherwise
    pub fn config_errors(&self) -> &[String] {
        match self {
            Error::ConfigurationInvalid(errors) => errors,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_invalid_joins_all_errors() {
        let err = Error::ConfigurationInvalid(vec![
            "Missing required configuration key: cdn".into(),
            "Version must be a string".into(),
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid KaTeX configuration: Missing required configuration key: cdn, Version must be a string"
        );
        assert_eq!(err.config_errors().len(), 2);
    }

    #[test]
    fn other_variants_have_no_config_errors() {
        let err = Error::DependencyMissing("Livewire is not installed.".into());
        assert!(err.config_errors().is_empty());
    }
}
