//! Asset source over a virtual filesystem.
//!
//! Paths are resolved relative to the tree root; a leading `/` (as used by the
//! sticker proxy rewrite and by web-style asset URLs) is ignored. Any
//! [`vfs::FileSystem`] works: `PhysicalFS` for a served directory,
//! `MemoryFS` in tests.

use std::io::Read;
use std::path::Path;

use async_trait::async_trait;
use rootcause::Report;
use tracing::debug;
use vfs::error::VfsErrorKind;
use vfs::{PhysicalFS, VfsPath};

use super::{AssetSource, FetchError};

#[derive(Debug, Clone)]
pub struct VfsSource {
    root: VfsPath,
}

impl VfsSource {
    pub fn new(root: VfsPath) -> Self {
        Self { root }
    }

    /// Serve assets from a directory on disk.
    pub fn physical(dir: &Path) -> Self {
        Self::new(VfsPath::new(PhysicalFS::new(dir)))
    }

    pub fn root(&self) -> &VfsPath {
        &self.root
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, Report<FetchError>> {
        let relative = path.trim_start_matches('/');
        let file = self
            .root
            .join(relative)
            .map_err(|_| Report::new(FetchError::InvalidPath(path.to_string())))?;

        let mut reader = file.open_file().map_err(|e| match e.kind() {
            VfsErrorKind::FileNotFound => Report::new(FetchError::NotFound(path.to_string())),
            _ => Report::new(FetchError::Io {
                path: path.to_string(),
                reason: e.to_string(),
            }),
        })?;

        let mut data = Vec::new();
        reader.read_to_end(&mut data).map_err(|e| {
            Report::new(FetchError::Io {
                path: path.to_string(),
                reason: e.to_string(),
            })
        })?;

        if data.is_empty() {
            return Err(Report::new(FetchError::Empty(path.to_string())));
        }
        Ok(data)
    }
}

#[async_trait(?Send)]
impl AssetSource for VfsSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, Report<FetchError>> {
        debug!("requesting file: {path}");
        self.read(path)
    }
}
