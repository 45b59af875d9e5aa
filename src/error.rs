use thiserror::Error;

use crate::liveness::ResourceClass;

/// Failures surfaced by a viewer instance.
///
/// `AssetUnavailable` is fatal to the owning viewer only: it swaps the 3D
/// subtree for the textual fallback. `TextureUnavailable` degrades visual
/// fidelity and is never shown to the user. `StaleResult` marks work that
/// resolved for an identity that is no longer current and was discarded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("3D asset unavailable for {weapon}: {reason}")]
    AssetUnavailable { weapon: String, reason: String },
    #[error("texture unavailable, tried: {}", tried.join(", "))]
    TextureUnavailable { tried: Vec<String> },
    #[error("{resource} result superseded by a newer request")]
    StaleResult { resource: ResourceClass },
}

impl ViewError {
    pub fn asset_unavailable(weapon: impl Into<String>, reason: impl ToString) -> Self {
        ViewError::AssetUnavailable {
            weapon: weapon.into(),
            reason: reason.to_string(),
        }
    }

    /// True for the conditions that are silently absorbed rather than shown.
    pub fn is_silent(&self) -> bool {
        !matches!(self, ViewError::AssetUnavailable { .. })
    }
}
