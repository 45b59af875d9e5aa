/// Decal quads, their materials and per-slot image loading
pub mod decal;
/// Slot placement from profile coefficients and model extents
pub mod placement;
/// Per-weapon slot coefficient tables
pub mod profiles;

pub use decal::{DecalSet, StickerDecal, proxy_url};
pub use placement::{StickerPlacement, compute_placements};
pub use profiles::{ProfileRegistry, SlotCoefficient, WeaponFamily};
