//! Prompt template loading.
//!
//! The template lives in a UTF-8 file next to the service. Callers may bypass
//! it per request with an inline prompt.

use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("failed to read prompt template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Identity of the file contents a cached template was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

#[derive(Debug)]
struct CachedTemplate {
    stamp: FileStamp,
    text: String,
}

/// Reads the instruction template from disk.
///
/// With caching enabled the last read is reused until the file's mtime or
/// length changes, so callers always see what is currently on disk.
#[derive(Debug)]
pub struct PromptLoader {
    path: PathBuf,
    cache: Option<RwLock<Option<CachedTemplate>>>,
}

impl PromptLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: None,
        }
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache = enabled.then(|| RwLock::new(None));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Use the inline prompt when it has content, otherwise read the template.
    pub async fn resolve(&self, custom_prompt: Option<&str>) -> Result<String, PromptError> {
        match custom_prompt.filter(|p| !p.is_empty()) {
            Some(prompt) => Ok(prompt.to_string()),
            None => self.load().await,
        }
    }

    pub async fn load(&self) -> Result<String, PromptError> {
        let Some(cache) = &self.cache else {
            return self.read_file().await;
        };

        let stamp = self.stamp().await?;
        if let Some(cached) = cache.read().await.as_ref() {
            if cached.stamp == stamp {
                return Ok(cached.text.clone());
            }
        }

        let text = self.read_file().await?;
        tracing::debug!(path = %self.path.display(), "Prompt template (re)loaded into cache");
        *cache.write().await = Some(CachedTemplate {
            stamp,
            text: text.clone(),
        });
        Ok(text)
    }

    async fn stamp(&self) -> Result<FileStamp, PromptError> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        Ok(FileStamp {
            modified: metadata.modified().ok(),
            len: metadata.len(),
        })
    }

    async fn read_file(&self) -> Result<String, PromptError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: std::io::Error) -> PromptError {
        PromptError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
