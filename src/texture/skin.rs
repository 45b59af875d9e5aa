//! Skin (paint) application: color map plus optional metalness map.
//!
//! Both maps are resolved before any surface is touched, then every eligible
//! material is moved to its final state in one step. A [`LivenessToken`] is
//! checked after every await so a superseded skin never mutates the model.

use serde::Serialize;
use tracing::{debug, warn};

use super::{ColorSpace, Texture};
use crate::config::{AssetPaths, ViewerConfig};
use crate::data::AssetSource;
use crate::error::ViewError;
use crate::liveness::LivenessToken;
use crate::models::SceneNode;
use crate::weapon::{PaintId, WeaponId};

/// Resolved maps for one `(weapon, paint)` pair.
#[derive(Debug, Clone)]
pub struct SkinMaps {
    pub color: Texture,
    pub metal: Option<Texture>,
}

/// What became of a skin request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkinOutcome {
    /// No paint selected.
    Skipped,
    /// Maps requested, not yet resolved.
    Pending,
    Applied { metalness: bool },
    /// No color map in any format; the model keeps its own materials.
    Unavailable,
    /// Superseded before it could apply.
    Stale,
}

impl SkinOutcome {
    pub fn from_error(err: &ViewError) -> Self {
        match err {
            ViewError::StaleResult { .. } => SkinOutcome::Stale,
            _ => SkinOutcome::Unavailable,
        }
    }
}

/// Load the color map and, if it exists, the metalness map.
///
/// The metalness map is only requested once a color map has been found.
/// `TextureUnavailable` means no color map; a missing metalness map is not an
/// error.
pub async fn load_skin_maps<S: AssetSource + ?Sized>(
    source: &S,
    paths: &AssetPaths,
    weapon: &WeaponId,
    paint: &PaintId,
    token: &LivenessToken,
) -> Result<SkinMaps, ViewError> {
    let color = fetch_first(source, &paths.color_maps(weapon, paint), token).await?;

    let metal = match fetch_first(source, &paths.metal_maps(weapon, paint), token).await {
        Ok(metal) => Some(metal),
        Err(ViewError::TextureUnavailable { tried }) => {
            debug!(%weapon, %paint, ?tried, "no metalness map, using color only");
            None
        }
        Err(err) => return Err(err),
    };

    let mut color = color.repeat();
    color.color_space = ColorSpace::Srgb;
    color.flip_y = false;

    let metal = metal.map(|metal| {
        let mut metal = metal.repeat();
        metal.color_space = ColorSpace::Linear;
        metal.flip_y = false;
        metal
    });

    Ok(SkinMaps { color, metal })
}

/// Try each candidate path in order; the first one that fetches and decodes
/// wins.
async fn fetch_first<S: AssetSource + ?Sized>(
    source: &S,
    candidates: &[String],
    token: &LivenessToken,
) -> Result<Texture, ViewError> {
    let mut tried = Vec::with_capacity(candidates.len());
    for path in candidates {
        let fetched = source.fetch(path).await;
        if !token.is_live() {
            return Err(ViewError::StaleResult {
                resource: token.class(),
            });
        }

        match fetched.map(|bytes| Texture::decode(path, &bytes)) {
            Ok(Ok(texture)) => return Ok(texture),
            Ok(Err(e)) => warn!("could not decode {path}: {e}"),
            Err(e) => debug!("texture candidate failed: {e}"),
        }
        tried.push(path.clone());
    }
    Err(ViewError::TextureUnavailable { tried })
}

/// Put `maps` on every eligible surface under `root`. Returns how many
/// surfaces were updated.
pub fn apply_skin_maps(root: &mut SceneNode, maps: &SkinMaps, config: &ViewerConfig) -> usize {
    let mut updated = 0;
    root.for_each_mesh_mut(&mut |mesh| {
        let material = &mut mesh.material;
        if config.is_excluded_material(&material.name) {
            return;
        }
        material.map = Some(maps.color.clone());
        if let Some(metal) = &maps.metal {
            material.metalness_map = Some(metal.clone());
            material.metalness = 1.0;
        }
        material.mark_updated();
        updated += 1;
    });
    updated
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use glam::Vec3;
    use image::ImageFormat;

    use super::*;
    use crate::data::VfsSource;
    use crate::liveness::{LoadSlot, ResourceClass};
    use crate::models::scene::box_mesh;
    use crate::test_support::{RecordingSource, encode_image, memory_tree, write_file};

    fn model() -> SceneNode {
        let mut body = box_mesh("ak47_body", [0.0; 3], [1.0; 3]);
        body.material.metalness = 0.2;
        SceneNode::group("Scene")
            .with_mesh(body)
            .with_child(
                SceneNode::group("arms")
                    .with_translation(Vec3::X)
                    .with_mesh(box_mesh("bare_arm_right", [0.0; 3], [1.0; 3])),
            )
            .with_mesh(box_mesh("ak47_scope_lens", [0.0; 3], [1.0; 3]))
    }

    fn load(source: &impl AssetSource, paint: &str) -> Result<SkinMaps, ViewError> {
        let slot = LoadSlot::new(ResourceClass::Skin);
        block_on(load_skin_maps(
            source,
            &AssetPaths::default(),
            &"weapon_ak47".into(),
            &paint.into(),
            &slot.begin(),
        ))
    }

    #[test]
    fn color_missing_in_both_formats_skips_metal() {
        let source = RecordingSource::new(VfsSource::new(memory_tree()));
        let err = load(&source, "44").unwrap_err();
        assert_eq!(
            err,
            ViewError::TextureUnavailable {
                tried: vec![
                    "textures/weapon_ak47/44.png".to_string(),
                    "textures/weapon_ak47/44.webp".to_string()
                ]
            }
        );
        assert_eq!(source.requests().len(), 2);
        assert!(!source.requests().iter().any(|p| p.contains("_metal")));
    }

    #[test]
    fn falls_back_to_secondary_format() {
        let root = memory_tree();
        write_file(
            &root,
            "textures/weapon_ak47/44.webp",
            &encode_image(ImageFormat::WebP, [9, 9, 9, 255]),
        );
        let source = RecordingSource::new(VfsSource::new(root));
        let maps = load(&source, "44").unwrap();
        assert_eq!(maps.color.source.as_deref(), Some("textures/weapon_ak47/44.webp"));
        assert!(maps.metal.is_none());
        assert_eq!(
            source.requests(),
            [
                "textures/weapon_ak47/44.png",
                "textures/weapon_ak47/44.webp",
                "textures/weapon_ak47/44_metal.png",
                "textures/weapon_ak47/44_metal.webp",
            ]
        );
    }

    #[test]
    fn undecodable_primary_falls_through() {
        let root = memory_tree();
        write_file(&root, "textures/weapon_ak47/44.png", b"truncated");
        write_file(
            &root,
            "textures/weapon_ak47/44.webp",
            &encode_image(ImageFormat::WebP, [1, 1, 1, 255]),
        );
        let maps = load(&VfsSource::new(root), "44").unwrap();
        assert_eq!(maps.color.source.as_deref(), Some("textures/weapon_ak47/44.webp"));
    }

    #[test]
    fn maps_carry_their_color_spaces() {
        let root = memory_tree();
        write_file(
            &root,
            "textures/weapon_ak47/44.png",
            &encode_image(ImageFormat::Png, [200, 10, 10, 255]),
        );
        write_file(
            &root,
            "textures/weapon_ak47/44_metal.webp",
            &encode_image(ImageFormat::WebP, [255, 255, 255, 255]),
        );
        let maps = load(&VfsSource::new(root), "44").unwrap();
        assert_eq!(maps.color.color_space, ColorSpace::Srgb);
        assert!(!maps.color.flip_y);
        let metal = maps.metal.unwrap();
        assert_eq!(metal.color_space, ColorSpace::Linear);
        assert!(!metal.flip_y);
        assert_eq!(metal.source.as_deref(), Some("textures/weapon_ak47/44_metal.webp"));
    }

    #[test]
    fn superseded_load_reports_stale() {
        let root = memory_tree();
        write_file(
            &root,
            "textures/weapon_ak47/44.png",
            &encode_image(ImageFormat::Png, [1, 2, 3, 255]),
        );
        let source = VfsSource::new(root);
        let slot = LoadSlot::new(ResourceClass::Skin);
        let token = slot.begin();
        slot.invalidate();
        let err = block_on(load_skin_maps(
            &source,
            &AssetPaths::default(),
            &"weapon_ak47".into(),
            &"44".into(),
            &token,
        ))
        .unwrap_err();
        assert_eq!(
            err,
            ViewError::StaleResult {
                resource: ResourceClass::Skin
            }
        );
        assert_eq!(SkinOutcome::from_error(&err), SkinOutcome::Stale);
    }

    #[test]
    fn color_only_leaves_metalness_alone() {
        let maps = SkinMaps {
            color: Texture::new(image::RgbaImage::new(1, 1)),
            metal: None,
        };
        let mut root = model();
        let updated = apply_skin_maps(&mut root, &maps, &ViewerConfig::default());
        assert_eq!(updated, 1);

        let body = &root.meshes[0].material;
        assert!(body.map.as_ref().unwrap().same_image(&maps.color));
        assert!(body.metalness_map.is_none());
        assert_eq!(body.metalness, 0.2);
        assert_eq!(body.revision, 1);
    }

    #[test]
    fn color_and_metal_land_together_on_eligible_surfaces() {
        let maps = SkinMaps {
            color: Texture::new(image::RgbaImage::new(1, 1)),
            metal: Some(Texture::new(image::RgbaImage::new(1, 1))),
        };
        let mut root = model();
        apply_skin_maps(&mut root, &maps, &ViewerConfig::default());

        let body = &root.meshes[0].material;
        assert!(body.map.is_some());
        assert!(body.metalness_map.is_some());
        assert_eq!(body.metalness, 1.0);
        assert_eq!(body.revision, 1);

        for excluded in [&root.meshes[1].material, &root.children[0].meshes[0].material] {
            assert!(excluded.map.is_none(), "{} was skinned", excluded.name);
            assert!(excluded.metalness_map.is_none());
            assert_eq!(excluded.revision, 0);
        }
    }

    #[test]
    fn reapplying_is_idempotent_in_content() {
        let maps = SkinMaps {
            color: Texture::new(image::RgbaImage::new(1, 1)),
            metal: Some(Texture::new(image::RgbaImage::new(1, 1))),
        };
        let mut once = model();
        apply_skin_maps(&mut once, &maps, &ViewerConfig::default());
        let mut twice = once.clone();
        apply_skin_maps(&mut twice, &maps, &ViewerConfig::default());
        let (a, b) = (&once.meshes[0].material, &twice.meshes[0].material);
        assert_eq!(a.map, b.map);
        assert_eq!(a.metalness_map, b.metalness_map);
        assert_eq!(a.metalness, b.metalness);
    }
}
