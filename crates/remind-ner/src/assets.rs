//! Model asset locators and the local cache.
//!
//! Each asset is copied byte-for-byte into a private cache directory
//! before use. No versioning or checksum is applied; a corrupt copy only
//! shows up when the session is created.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::NerError;

pub const MODEL_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const LABELS_FILE: &str = "labels.json";

/// Locators for the three files a labeler needs.
///
/// A locator is a local path, a `file://` URL or an `http(s)://` URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelAssets {
    pub model: String,
    pub tokenizer: String,
    pub labels: String,
}

impl ModelAssets {
    /// Returns `true` when no locator is blank.
    pub fn is_complete(&self) -> bool {
        [&self.model, &self.tokenizer, &self.labels]
            .iter()
            .all(|locator| !locator.trim().is_empty())
    }
}

/// Paths of the cached copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedAssets {
    pub model: PathBuf,
    pub tokenizer: PathBuf,
    pub labels: PathBuf,
}

enum Locator<'a> {
    Path(&'a Path),
    Http(&'a str),
}

impl<'a> Locator<'a> {
    fn parse(locator: &'a str) -> Self {
        let locator = locator.trim();
        if locator.starts_with("http://") || locator.starts_with("https://") {
            Self::Http(locator)
        } else {
            Self::Path(Path::new(
                locator.strip_prefix("file://").unwrap_or(locator),
            ))
        }
    }
}

/// Copies assets into the cache directory.
#[derive(Clone)]
pub struct AssetFetcher {
    http: reqwest::Client,
    cache_dir: PathBuf,
}

impl fmt::Debug for AssetFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetFetcher")
            .field("cache_dir", &self.cache_dir)
            .finish_non_exhaustive()
    }
}

impl AssetFetcher {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self, NerError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(NerError::ClientBuild)?;
        Ok(Self {
            http,
            cache_dir: cache_dir.into(),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Copies all three assets, reporting progress as a percentage.
    pub async fn fetch_all<F>(
        &self,
        assets: &ModelAssets,
        progress: F,
    ) -> Result<CachedAssets, NerError>
    where
        F: Fn(u8) + Send,
    {
        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|err| NerError::io(&self.cache_dir, err))?;

        progress(10);
        let model = self.fetch(&assets.model, MODEL_FILE).await?;
        progress(40);
        let tokenizer = self.fetch(&assets.tokenizer, TOKENIZER_FILE).await?;
        progress(70);
        let labels = self.fetch(&assets.labels, LABELS_FILE).await?;
        progress(90);

        Ok(CachedAssets {
            model,
            tokenizer,
            labels,
        })
    }

    /// Copies one locator to `file_name` in the cache directory.
    ///
    /// The copy is written to a `.partial` file first and renamed into
    /// place, so a reader never sees a half-written asset.
    pub async fn fetch(&self, locator: &str, file_name: &str) -> Result<PathBuf, NerError> {
        let destination = self.cache_dir.join(file_name);
        let partial = self.cache_dir.join(format!("{file_name}.partial"));
        tracing::debug!(locator, destination = %destination.display(), "copying asset");

        match Locator::parse(locator) {
            Locator::Path(source) => {
                tokio::fs::copy(source, &partial)
                    .await
                    .map_err(|err| NerError::io(source, err))?;
            }
            Locator::Http(url) => self.download(url, &partial).await?,
        }

        tokio::fs::rename(&partial, &destination)
            .await
            .map_err(|err| NerError::io(&destination, err))?;
        tracing::debug!(destination = %destination.display(), "copy complete");
        Ok(destination)
    }

    async fn download(&self, url: &str, destination: &Path) -> Result<(), NerError> {
        let download_error = |source| NerError::Download {
            locator: url.to_string(),
            source,
        };

        let mut response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(download_error)?;

        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(|err| NerError::io(destination, err))?;
        while let Some(chunk) = response.chunk().await.map_err(download_error)? {
            file.write_all(&chunk)
                .await
                .map_err(|err| NerError::io(destination, err))?;
        }
        file.flush()
            .await
            .map_err(|err| NerError::io(destination, err))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assets_with_blank_locator_are_incomplete() {
        let assets = ModelAssets {
            model: "/m.onnx".to_string(),
            tokenizer: "  ".to_string(),
            labels: "/labels.json".to_string(),
        };
        assert!(!assets.is_complete());
        assert!(!ModelAssets::default().is_complete());
    }

    #[test]
    fn locator_parsing() {
        assert!(matches!(
            Locator::parse("https://example.com/model.onnx"),
            Locator::Http(_)
        ));
        let Locator::Path(path) = Locator::parse("file:///tmp/model.onnx") else {
            panic!("expected a path locator");
        };
        assert_eq!(path, Path::new("/tmp/model.onnx"));
    }

    #[tokio::test]
    async fn fetch_all_copies_local_files_into_cache() {
        let source = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        for (name, body) in [("m.bin", "weights"), ("t.json", "{}"), ("l.json", "[]")] {
            std::fs::write(source.path().join(name), body).unwrap();
        }
        let assets = ModelAssets {
            model: source.path().join("m.bin").display().to_string(),
            tokenizer: format!("file://{}", source.path().join("t.json").display()),
            labels: source.path().join("l.json").display().to_string(),
        };

        let fetcher = AssetFetcher::new(cache.path().join("ner_cache")).unwrap();
        let seen = std::sync::Mutex::new(Vec::new());
        let cached = fetcher
            .fetch_all(&assets, |p| seen.lock().unwrap().push(p))
            .await
            .unwrap();

        assert_eq!(cached.model, cache.path().join("ner_cache").join(MODEL_FILE));
        assert_eq!(std::fs::read_to_string(&cached.model).unwrap(), "weights");
        assert_eq!(std::fs::read_to_string(&cached.labels).unwrap(), "[]");
        assert_eq!(*seen.lock().unwrap(), vec![10, 40, 70, 90]);
    }

    #[tokio::test]
    async fn missing_source_is_an_io_error() {
        let cache = tempfile::tempdir().unwrap();
        let fetcher = AssetFetcher::new(cache.path()).unwrap();
        let err = fetcher
            .fetch("/definitely/not/here.onnx", MODEL_FILE)
            .await
            .unwrap_err();
        assert!(matches!(err, NerError::Io { .. }));
    }
}
