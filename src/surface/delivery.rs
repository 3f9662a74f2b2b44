//! File delivery surface for finished captures.

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Give up on collision suffixes past this point.
const MAX_COLLISION_SUFFIX: u32 = 10_000;

// ============================================================================
// File Delivery
// ============================================================================

/// Port for handing finished images to the host.
///
/// Browser embedders trigger downloads; headless embedders write files.
/// The engine calls this once per successfully captured combination.
#[async_trait]
pub trait FileDelivery: Send + Sync {
    /// Delivers one finished image under the suggested filename.
    async fn deliver(&self, bytes: &[u8], filename: &str) -> Result<()>;
}

// ============================================================================
// Directory Delivery
// ============================================================================

/// [`FileDelivery`] that writes into a directory.
///
/// Name collisions are resolved with numeric suffixes
/// (`chair.png`, `chair_1.png`, ...), matching how download managers
/// behave.
#[derive(Debug, Clone)]
pub struct DirectoryDelivery {
    root: PathBuf,
}

impl DirectoryDelivery {
    /// Creates a delivery target rooted at `root`.
    ///
    /// The directory is created on first delivery if missing.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The output directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn unique_path(&self, filename: &str) -> Result<PathBuf> {
        let initial = self.root.join(filename);
        if !tokio::fs::try_exists(&initial).await? {
            return Ok(initial);
        }

        let (stem, ext) = match filename.rsplit_once('.') {
            Some((stem, ext)) => (stem, format!(".{ext}")),
            None => (filename, String::new()),
        };
        for n in 1..=MAX_COLLISION_SUFFIX {
            let candidate = self.root.join(format!("{stem}_{n}{ext}"));
            if !tokio::fs::try_exists(&candidate).await? {
                return Ok(candidate);
            }
        }

        Err(Error::store(format!("no free filename for {filename}")))
    }
}

#[async_trait]
impl FileDelivery for DirectoryDelivery {
    async fn deliver(&self, bytes: &[u8], filename: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;

        let path = self.unique_path(filename).await?;
        tokio::fs::write(&path, bytes).await?;

        debug!(path = %path.display(), bytes = bytes.len(), "Delivered image");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
