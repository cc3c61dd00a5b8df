//! Configuration loading and management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use remind_ner::{DEFAULT_INFERENCE_TIMEOUT, DEFAULT_MAX_LENGTH, ModelAssets};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Locator of the labeler model weights.
    pub model: String,
    /// Locator of the tokenizer vocabulary JSON.
    pub tokenizer: String,
    /// Locator of the label list JSON.
    pub labels: String,
    /// Where model assets are copied before loading.
    pub cache_dir: PathBuf,
    pub inference_timeout_secs: u64,
    pub max_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        let cache_dir = dirs_cache_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            model: String::new(),
            tokenizer: String::new(),
            labels: String::new(),
            cache_dir: cache_dir.join("ner_cache"),
            inference_timeout_secs: DEFAULT_INFERENCE_TIMEOUT.as_secs(),
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // REMIND_MODEL, REMIND_CACHE_DIR, ...
        figment = figment.merge(Env::prefixed("REMIND_"));

        figment.extract()
    }

    /// The three asset locators.
    pub fn assets(&self) -> ModelAssets {
        ModelAssets {
            model: self.model.clone(),
            tokenizer: self.tokenizer.clone(),
            labels: self.labels.clone(),
        }
    }

    pub const fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }
}

/// Returns the platform-specific config directory for remind.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("remind"))
}

/// Returns the platform-specific cache directory for remind.
///
/// On Linux: `~/.cache/remind`
pub fn dirs_cache_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|p| p.join("remind"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_cache_path_ends_with_remind() {
        let path = dirs_cache_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "remind");
    }

    #[test]
    fn test_default_config_has_no_assets() {
        let config = Config::default();
        assert!(!config.assets().is_complete());
        assert_eq!(config.inference_timeout(), Duration::from_secs(10));
        assert_eq!(config.max_length, 128);
        assert!(config.cache_dir.ends_with("remind/ner_cache"));
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "model = \"/models/ner.onnx\"\ninference_timeout_secs = 15\n",
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.model, "/models/ner.onnx");
        assert_eq!(config.inference_timeout(), Duration::from_secs(15));
        assert_eq!(config.max_length, 128);
    }
}
