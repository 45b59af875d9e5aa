//! Variant selection, centering and scaling of a weapon model.

use glam::{Mat4, Vec3};
use tracing::debug;

use super::import::WeaponAsset;
use super::scene::{Aabb, SceneNode};
use crate::config::{VariantRules, ViewerConfig};
use crate::weapon::ModelVariant;

/// A viewer's working copy of a weapon, centered on the origin.
///
/// `size` and `half_depth` are in the model's own (pre-scale) units.
/// `scale_factor` is applied by the enclosing group, never baked into `root`.
#[derive(Debug, Clone)]
pub struct NormalizedModel {
    pub root: SceneNode,
    pub scale_factor: f32,
    pub size: Vec3,
    pub half_depth: f32,
}

impl NormalizedModel {
    pub fn max_dimension(&self) -> f32 {
        self.size.max_element()
    }

    /// Bounds of the centered model before group scaling.
    pub fn bounds(&self) -> Aabb {
        self.root.world_bounds()
    }

    /// Transform of the group that holds the model and its decals.
    pub fn group_transform(&self) -> Mat4 {
        Mat4::from_scale(Vec3::splat(self.scale_factor))
    }
}

/// Build a normalized working copy of `asset` for the given variant.
///
/// Deterministic for a given asset and variant; the master copy is untouched.
pub fn normalize(asset: &WeaponAsset, variant: ModelVariant, config: &ViewerConfig) -> NormalizedModel {
    let mut root = asset.instantiate();
    select_variant(&mut root, asset, variant, &config.variants);

    let bounds = root.world_bounds();
    let size = bounds.size();
    root.translation -= bounds.center();

    let max_dim = size.max_element();
    let scale_factor = if max_dim > 0.0 {
        config.target_extent / max_dim
    } else {
        1.0
    };

    debug!(
        weapon = %asset.weapon(),
        ?variant,
        ?size,
        scale_factor,
        "normalized model"
    );

    NormalizedModel {
        root,
        scale_factor,
        size,
        half_depth: size.z * 0.5,
    }
}

fn select_variant(
    root: &mut SceneNode,
    asset: &WeaponAsset,
    variant: ModelVariant,
    rules: &VariantRules,
) {
    if rules.is_single_variant(asset.weapon()) || root.children.len() < 2 {
        return;
    }
    root.remove_child(variant.discarded_child());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scene::box_mesh;
    use crate::test_support::two_variant_rifle;

    const EPS: f32 = 1e-5;

    fn rifle() -> WeaponAsset {
        WeaponAsset::from_gltf_bytes("weapon_ak47".into(), &two_variant_rifle()).unwrap()
    }

    fn assert_centered(model: &NormalizedModel) {
        let center = model.bounds().center();
        assert!(center.length() < EPS, "centroid {center:?} not at origin");
        let scaled = model.bounds().transformed(&model.group_transform()).center();
        assert!(scaled.length() < EPS, "scaled centroid {scaled:?} not at origin");
    }

    #[test]
    fn legacy_keeps_first_child() {
        let asset = rifle();
        let model = normalize(&asset, ModelVariant::Legacy, &ViewerConfig::default());
        assert_eq!(model.root.children.len(), 1);
        assert_eq!(model.root.children[0].name.as_deref(), Some("legacy"));
        assert!((model.size - Vec3::new(1.0, 0.3, 0.1)).abs().max_element() < EPS);
        assert!((model.half_depth - 0.05).abs() < EPS);
        assert!((model.scale_factor - 2.0).abs() < EPS);
        assert_centered(&model);
    }

    #[test]
    fn current_keeps_second_child_unmodified() {
        let asset = rifle();
        let model = normalize(&asset, ModelVariant::Current, &ViewerConfig::default());
        assert_eq!(model.root.children.len(), 1);
        let kept = &model.root.children[0];
        let original = &asset.scene().children[1];
        assert_eq!(kept.name, original.name);
        assert_eq!(kept.translation, original.translation);
        assert_eq!(kept.meshes[0].material, original.meshes[0].material);
        assert!((model.size - Vec3::new(2.0, 0.5, 0.25)).abs().max_element() < EPS);
        assert!((model.scale_factor * model.max_dimension() - 2.0).abs() < EPS);
        assert_centered(&model);
    }

    #[test]
    fn master_copy_is_untouched() {
        let asset = rifle();
        let _ = normalize(&asset, ModelVariant::Current, &ViewerConfig::default());
        assert_eq!(asset.scene().children.len(), 2);
        assert_eq!(asset.scene().translation, Vec3::ZERO);
    }

    #[test]
    fn single_variant_classes_keep_all_children() {
        let scene = SceneNode::group("Scene")
            .with_child(SceneNode::group("blade").with_mesh(box_mesh("blade", [0.0; 3], [1.0; 3])))
            .with_child(SceneNode::group("handle").with_mesh(box_mesh("handle", [1.0; 3], [2.0; 3])));
        for weapon in ["weapon_knife_karambit", "weapon_bayonet", "weapon_taser"] {
            let asset = WeaponAsset::new(weapon.into(), scene.clone());
            let model = normalize(&asset, ModelVariant::Legacy, &ViewerConfig::default());
            assert_eq!(model.root.children.len(), 2, "{weapon}");
            assert_centered(&model);
        }
    }

    #[test]
    fn single_child_assets_ignore_the_flag() {
        let scene = SceneNode::group("Scene")
            .with_child(SceneNode::group("only").with_mesh(box_mesh("body", [0.0; 3], [4.0, 1.0, 1.0])));
        let asset = WeaponAsset::new("weapon_ak47".into(), scene);
        for variant in [ModelVariant::Legacy, ModelVariant::Current] {
            let model = normalize(&asset, variant, &ViewerConfig::default());
            assert_eq!(model.root.children.len(), 1);
            assert!((model.scale_factor - 0.5).abs() < EPS);
        }
    }

    #[test]
    fn degenerate_model_keeps_unit_scale() {
        let asset = WeaponAsset::new("weapon_ak47".into(), SceneNode::group("Scene"));
        let model = normalize(&asset, ModelVariant::Current, &ViewerConfig::default());
        assert_eq!(model.scale_factor, 1.0);
        assert_eq!(model.size, Vec3::ZERO);
        assert_eq!(model.half_depth, 0.0);
    }

    #[test]
    fn offset_root_is_recentered() {
        let scene = SceneNode::group("Scene")
            .with_translation(Vec3::new(3.0, -2.0, 7.0))
            .with_child(SceneNode::group("only").with_mesh(box_mesh("body", [1.0; 3], [2.0, 3.0, 5.0])));
        let asset = WeaponAsset::new("weapon_awp".into(), scene);
        let model = normalize(&asset, ModelVariant::Current, &ViewerConfig::default());
        assert_centered(&model);
        assert!((model.size - Vec3::new(1.0, 2.0, 4.0)).abs().max_element() < EPS);
    }
}
