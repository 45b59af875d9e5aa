//! Sticker decals: textured quads floating just off the model surface.
//!
//! Each slot owns its decal and its own [`LoadSlot`], so a slow image in one
//! slot never holds back or overwrites another.

use std::borrow::Cow;

use glam::Vec3;
use tracing::{debug, warn};

use super::placement::StickerPlacement;
use crate::config::ProxyRule;
use crate::data::AssetSource;
use crate::error::ViewError;
use crate::liveness::{LivenessToken, LoadSlot, ResourceClass};
use crate::texture::{ColorSpace, Texture};
use crate::weapon::SLOT_COUNT;

/// Route image hosts that refuse cross-origin reads through the local proxy.
///
/// The first rule whose prefix matches is applied; anything else is returned
/// as-is.
pub fn proxy_url<'a>(image_ref: &'a str, rules: &[ProxyRule]) -> Cow<'a, str> {
    rules
        .iter()
        .find_map(|rule| {
            image_ref
                .strip_prefix(rule.prefix.as_str())
                .map(|rest| Cow::Owned(format!("{}{rest}", rule.replacement)))
        })
        .unwrap_or(Cow::Borrowed(image_ref))
}

/// Depth bias applied while rasterizing, in the GL `glPolygonOffset` sense.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonOffset {
    pub factor: f32,
    pub units: f32,
}

/// Unlit, alpha-blended material for a decal quad.
#[derive(Debug, Clone, PartialEq)]
pub struct DecalMaterial {
    pub map: Option<Texture>,
    pub transparent: bool,
    /// Zero until the image arrives so an unloaded decal draws nothing.
    pub opacity: f32,
    pub double_sided: bool,
    pub depth_test: bool,
    pub depth_write: bool,
    pub polygon_offset: Option<PolygonOffset>,
}

impl Default for DecalMaterial {
    fn default() -> Self {
        Self {
            map: None,
            transparent: true,
            opacity: 0.0,
            double_sided: true,
            depth_test: true,
            depth_write: false,
            polygon_offset: Some(PolygonOffset {
                factor: -1.0,
                units: 0.0,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StickerDecal {
    pub slot: usize,
    pub image_ref: String,
    /// Quad center, in the normalized model's space.
    pub position: Vec3,
    /// Side length of the square quad.
    pub dimension: f32,
    pub material: DecalMaterial,
}

impl StickerDecal {
    pub fn new(placement: &StickerPlacement) -> Self {
        Self {
            slot: placement.slot,
            image_ref: placement.image_ref.clone(),
            position: placement.position,
            dimension: placement.dimension,
            material: DecalMaterial::default(),
        }
    }

    /// Whether this decal already shows `placement`'s image in its slot.
    pub fn shows(&self, placement: &StickerPlacement) -> bool {
        self.slot == placement.slot && self.image_ref == placement.image_ref
    }

    pub fn is_loaded(&self) -> bool {
        self.material.map.is_some()
    }

    fn set_texture(&mut self, texture: Texture) {
        self.material.map = Some(texture);
        self.material.opacity = 1.0;
    }
}

/// A decal image to fetch, issued by [`DecalSet::reconcile`].
#[derive(Debug, Clone)]
pub struct DecalLoad {
    pub slot: usize,
    pub image_ref: String,
    pub token: LivenessToken,
}

/// The five decals of one viewer.
#[derive(Debug)]
pub struct DecalSet {
    decals: [Option<StickerDecal>; SLOT_COUNT],
    loads: [LoadSlot; SLOT_COUNT],
}

impl Default for DecalSet {
    fn default() -> Self {
        Self::new()
    }
}

impl DecalSet {
    pub fn new() -> Self {
        Self {
            decals: Default::default(),
            loads: std::array::from_fn(|slot| LoadSlot::new(ResourceClass::Decal(slot))),
        }
    }

    /// Bring the decals in line with `placements`.
    ///
    /// A slot that keeps its image keeps its texture (and any in-flight load)
    /// and only moves. A slot whose image changed or was cleared invalidates
    /// its pending load. Returns the loads the caller must start.
    pub fn reconcile(&mut self, placements: &[StickerPlacement]) -> Vec<DecalLoad> {
        let mut wanted: [Option<&StickerPlacement>; SLOT_COUNT] = [None; SLOT_COUNT];
        for placement in placements {
            if let Some(entry) = wanted.get_mut(placement.slot) {
                *entry = Some(placement);
            }
        }

        let mut loads = Vec::new();
        for (slot, placement) in wanted.into_iter().enumerate() {
            match (&mut self.decals[slot], placement) {
                (Some(decal), Some(placement)) if decal.shows(placement) => {
                    decal.position = placement.position;
                    decal.dimension = placement.dimension;
                }
                (current, Some(placement)) => {
                    *current = Some(StickerDecal::new(placement));
                    loads.push(DecalLoad {
                        slot,
                        image_ref: placement.image_ref.clone(),
                        token: self.loads[slot].begin(),
                    });
                }
                (current, None) => {
                    if current.take().is_some() {
                        self.loads[slot].invalidate();
                    }
                }
            }
        }
        loads
    }

    /// Deliver a finished load. Returns whether it was applied.
    pub fn finish_load(&mut self, load: &DecalLoad, result: Result<Texture, ViewError>) -> bool {
        if !load.token.is_live() {
            debug!(slot = load.slot, image = %load.image_ref, "discarding stale sticker image");
            return false;
        }
        let Some(decal) = self.decals.get_mut(load.slot).and_then(Option::as_mut) else {
            return false;
        };
        match result {
            Ok(texture) => {
                decal.set_texture(texture);
                true
            }
            Err(err) => {
                warn!(slot = load.slot, "sticker image unavailable: {err}");
                false
            }
        }
    }

    /// Stale every pending load without touching the decals.
    pub fn invalidate_all(&self) {
        for slot in &self.loads {
            slot.invalidate();
        }
    }

    pub fn get(&self, slot: usize) -> Option<&StickerDecal> {
        self.decals.get(slot).and_then(Option::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StickerDecal> {
        self.decals.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fetch and decode one sticker image through the proxy rules.
pub async fn load_decal_texture<S: AssetSource + ?Sized>(
    source: &S,
    image_ref: &str,
    rules: &[ProxyRule],
    token: &LivenessToken,
) -> Result<Texture, ViewError> {
    let url = proxy_url(image_ref, rules);
    let fetched = source.fetch(&url).await;
    if !token.is_live() {
        return Err(ViewError::StaleResult {
            resource: token.class(),
        });
    }

    let unavailable = || ViewError::TextureUnavailable {
        tried: vec![url.to_string()],
    };
    let bytes = fetched.map_err(|e| {
        debug!("sticker fetch failed: {e}");
        unavailable()
    })?;
    let mut texture = Texture::decode(&url, &bytes).map_err(|e| {
        warn!("sticker image could not be decoded: {e}");
        unavailable()
    })?;
    texture.color_space = ColorSpace::Srgb;
    Ok(texture)
}
