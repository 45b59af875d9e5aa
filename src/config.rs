//! Viewer configuration: asset path scheme, variant rules, sticker layout and
//! camera defaults.

use std::f32::consts::PI;
use std::path::Path;

use rootcause::Report;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::weapon::{PaintId, WeaponId};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(String),
    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// Options shared by every viewer built against one asset tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub paths: AssetPaths,
    /// Material name fragments (case-insensitive) that never receive a skin.
    pub skin_excluded_materials: Vec<String>,
    pub variants: VariantRules,
    pub sticker_proxy: Vec<ProxyRule>,
    pub stickers: StickerLayout,
    /// Longest edge of a normalized model, in scene units.
    pub target_extent: f32,
    pub camera: CameraSettings,
    /// Text shown in place of the 3D view when the model can't be loaded.
    pub fallback_message: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            paths: AssetPaths::default(),
            skin_excluded_materials: vec!["bare_arm".to_string(), "scope".to_string()],
            variants: VariantRules::default(),
            sticker_proxy: vec![ProxyRule {
                prefix: "https://cdn.steamstatic.com/".to_string(),
                replacement: "/proxy/sticker/".to_string(),
            }],
            stickers: StickerLayout::default(),
            target_extent: 2.0,
            camera: CameraSettings::default(),
            fallback_message: "3D model not available for this weapon".to_string(),
        }
    }
}

impl ViewerConfig {
    pub fn from_json(json: &str) -> Result<Self, Report<ConfigError>> {
        serde_json::from_str(json).map_err(|e| Report::new(ConfigError::Parse(e.to_string())))
    }

    pub fn load(path: &Path) -> Result<Self, Report<ConfigError>> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| Report::new(ConfigError::Io(format!("{}: {e}", path.display()))))?;
        Self::from_json(&json)
    }

    /// Whether a material with this name is kept out of skin application.
    pub fn is_excluded_material(&self, material_name: &str) -> bool {
        let lower = material_name.to_lowercase();
        self.skin_excluded_materials
            .iter()
            .any(|fragment| lower.contains(&fragment.to_lowercase()))
    }
}

/// Conventional layout of models and skin textures inside the asset tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    pub models_dir: String,
    pub model_extension: String,
    pub textures_dir: String,
    pub primary_format: String,
    pub secondary_format: String,
    pub metal_suffix: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            models_dir: "models".to_string(),
            model_extension: "glb".to_string(),
            textures_dir: "textures".to_string(),
            primary_format: "png".to_string(),
            secondary_format: "webp".to_string(),
            metal_suffix: "_metal".to_string(),
        }
    }
}

impl AssetPaths {
    pub fn model(&self, weapon: &WeaponId) -> String {
        format!("{}/{weapon}.{}", self.models_dir, self.model_extension)
    }

    /// Color map candidates, primary format first.
    pub fn color_maps(&self, weapon: &WeaponId, paint: &PaintId) -> [String; 2] {
        self.texture_candidates(weapon, paint.as_str())
    }

    /// Metalness map candidates, primary format first.
    pub fn metal_maps(&self, weapon: &WeaponId, paint: &PaintId) -> [String; 2] {
        self.texture_candidates(weapon, &format!("{paint}{}", self.metal_suffix))
    }

    fn texture_candidates(&self, weapon: &WeaponId, stem: &str) -> [String; 2] {
        [&self.primary_format, &self.secondary_format]
            .map(|ext| format!("{}/{weapon}/{stem}.{ext}", self.textures_dir))
    }
}

/// Weapons whose asset holds a single render instead of a legacy/current pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantRules {
    pub single_variant_prefixes: Vec<String>,
    pub single_variant_ids: Vec<String>,
}

impl Default for VariantRules {
    fn default() -> Self {
        Self {
            single_variant_prefixes: vec!["weapon_knife".to_string()],
            single_variant_ids: vec!["weapon_bayonet".to_string(), "weapon_taser".to_string()],
        }
    }
}

impl VariantRules {
    pub fn is_single_variant(&self, weapon: &WeaponId) -> bool {
        let id = weapon.as_str();
        self.single_variant_ids.iter().any(|s| s == id)
            || self
                .single_variant_prefixes
                .iter()
                .any(|prefix| id.starts_with(prefix.as_str()))
    }
}

/// Prefix substitution for sticker hosts that can't be fetched cross-origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyRule {
    pub prefix: String,
    pub replacement: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StickerLayout {
    /// Decal side length as a fraction of the model's longest edge.
    pub size_fraction: f32,
    /// Distance in front of the +Z face plane.
    pub surface_offset: f32,
}

impl Default for StickerLayout {
    fn default() -> Self {
        Self {
            size_fraction: 0.08,
            surface_offset: 0.05,
        }
    }
}

/// Perspective camera and orbit limits for the preview.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub enable_pan: bool,
    pub enable_damping: bool,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near: 0.01,
            far: 200.0,
            position: [0.0, 0.3, 2.8],
            min_distance: 1.0,
            max_distance: 8.0,
            min_polar_angle: PI * 0.15,
            max_polar_angle: PI * 0.85,
            enable_pan: false,
            enable_damping: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_paths_follow_convention() {
        let paths = AssetPaths::default();
        let weapon = WeaponId::new("weapon_ak47");
        let paint = PaintId::new("44");
        assert_eq!(paths.model(&weapon), "models/weapon_ak47.glb");
        assert_eq!(
            paths.color_maps(&weapon, &paint),
            ["textures/weapon_ak47/44.png", "textures/weapon_ak47/44.webp"]
        );
        assert_eq!(
            paths.metal_maps(&weapon, &paint),
            [
                "textures/weapon_ak47/44_metal.png",
                "textures/weapon_ak47/44_metal.webp"
            ]
        );
    }

    #[test]
    fn single_variant_classes() {
        let rules = VariantRules::default();
        assert!(rules.is_single_variant(&"weapon_knife_karambit".into()));
        assert!(rules.is_single_variant(&"weapon_bayonet".into()));
        assert!(rules.is_single_variant(&"weapon_taser".into()));
        assert!(!rules.is_single_variant(&"weapon_ak47".into()));
    }

    #[test]
    fn excluded_materials_match_case_insensitively() {
        let config = ViewerConfig::default();
        assert!(config.is_excluded_material("Bare_Arm_Male"));
        assert!(config.is_excluded_material("awp_SCOPE_glass"));
        assert!(!config.is_excluded_material("ak47_body"));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            ViewerConfig::from_json(r#"{"paths":{"models_dir":"assets/models"},"target_extent":3.0}"#)
                .unwrap();
        assert_eq!(config.paths.models_dir, "assets/models");
        assert_eq!(config.paths.primary_format, "png");
        assert_eq!(config.target_extent, 3.0);
        assert_eq!(config.stickers, StickerLayout::default());
    }
}
