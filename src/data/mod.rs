/// Read-through cache of weapon assets shared by every viewer
pub mod cache;
/// [`AssetSource`] backed by a [`vfs::VfsPath`] tree
pub mod vfs_source;

use async_trait::async_trait;
use rootcause::Report;
use thiserror::Error;

pub use cache::AssetCache;
pub use vfs_source::VfsSource;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("invalid resource path: {0}")]
    InvalidPath(String),
    #[error("resource is empty: {0}")]
    Empty(String),
    #[error("I/O error reading {path}: {reason}")]
    Io { path: String, reason: String },
}

/// Asynchronous retrieval of binary resources (models, textures, sticker
/// images) addressed by path.
///
/// Completions are delivered on the caller's executor; implementations are not
/// required to be `Send`.
#[async_trait(?Send)]
pub trait AssetSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, Report<FetchError>>;
}

/// Adapts a plain function into an [`AssetSource`].
pub struct SourceWithCallback<F> {
    callback: F,
}

impl<F> SourceWithCallback<F>
where
    F: Fn(&str) -> Result<Vec<u8>, Report<FetchError>>,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

#[async_trait(?Send)]
impl<F> AssetSource for SourceWithCallback<F>
where
    F: Fn(&str) -> Result<Vec<u8>, Report<FetchError>>,
{
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, Report<FetchError>> {
        (self.callback)(path)
    }
}
