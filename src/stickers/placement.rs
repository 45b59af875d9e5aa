//! Slot coefficients to concrete decal transforms.

use glam::Vec3;
use serde::Serialize;

use super::profiles::ProfileRegistry;
use crate::config::StickerLayout;
use crate::models::NormalizedModel;
use crate::weapon::{StickerAssignment, WeaponId};

/// Where one sticker sits, in the normalized model's (pre-scale) space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StickerPlacement {
    pub slot: usize,
    pub position: Vec3,
    /// Side length of the square decal.
    pub dimension: f32,
    pub image_ref: String,
}

/// Place every assigned sticker whose slot the weapon can hold.
///
/// All stickers sit on the plane just in front of the model's +Z face; only
/// the in-plane position varies per slot. Empty slots and slots flagged
/// unusable produce nothing.
pub fn compute_placements(
    model: &NormalizedModel,
    assignment: &StickerAssignment,
    weapon: &WeaponId,
    registry: &ProfileRegistry,
    layout: &StickerLayout,
) -> Vec<StickerPlacement> {
    let profile = registry.lookup(weapon);
    let size = model.size;
    let dimension = size.max_element() * layout.size_fraction;
    let depth = model.half_depth + layout.surface_offset;

    assignment
        .iter()
        .zip(profile)
        .filter_map(|((slot, image), coefficient)| {
            let image = image?;
            if coefficient.is_unusable() {
                return None;
            }
            Some(StickerPlacement {
                slot,
                position: Vec3::new(coefficient.xf * size.x, coefficient.yf * size.y, depth),
                dimension,
                image_ref: image.to_string(),
            })
        })
        .collect()
}
