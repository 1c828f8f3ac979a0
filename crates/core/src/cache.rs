//! Local media cache layout.
//!
//! Every source URL maps to `{root}/{md5(url)}.{extension}`. Downloads are
//! written to a sibling staging path (`.download` suffix) and renamed into
//! place once complete, so a file at the final path is always whole.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::channel::MediaRef;
use crate::config::StorageConfig;

/// Suffix appended to the final cache path while a download is in progress.
pub const STAGING_SUFFIX: &str = ".download";

/// Deterministic mapping from media references to cache files.
#[derive(Debug, Clone)]
pub struct MediaCache {
    root: PathBuf,
    extension: String,
}

impl MediaCache {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.root_path.clone(), config.cache_extension.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final cache path for a source URL.
    pub fn path_for(&self, media: &MediaRef) -> PathBuf {
        let digest = md5::compute(media.as_str().as_bytes());
        self.root.join(format!("{:x}.{}", digest, self.extension))
    }

    /// Staging path used while `final_path` is being downloaded.
    pub fn staging_path(final_path: &Path) -> PathBuf {
        let mut name = OsString::from(final_path.as_os_str());
        name.push(STAGING_SUFFIX);
        PathBuf::from(name)
    }

    /// Whether a complete copy of `media` is cached.
    pub async fn contains(&self, media: &MediaRef) -> bool {
        tokio::fs::try_exists(self.path_for(media))
            .await
            .unwrap_or(false)
    }

    /// Create the storage root if it does not exist yet.
    pub async fn ensure_root(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }
}
