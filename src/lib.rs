/// Shared configuration: asset path scheme, variant rules, sticker layout, camera
pub mod config;
/// Asynchronous asset retrieval and the process-wide model cache
pub mod data;
/// Error definitions
pub mod error;
/// Liveness tokens for discarding superseded asynchronous results
pub mod liveness;
/// 3D model import, normalization and the scene graph
pub mod models;
/// Sticker profiles, placement and decals
pub mod stickers;
/// Decoded textures and skin application
pub mod texture;
/// Per-instance preview orchestration
pub mod viewer;
/// Weapon, paint and sticker identities supplied by the catalog
pub mod weapon;

#[cfg(test)]
mod test_support;

pub use error::ViewError;
pub use viewer::{Frame, SceneFrame, ViewerProps, ViewerTasks, WeaponViewer};

pub use vfs;
