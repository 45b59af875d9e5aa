//! Per-weapon sticker slot coefficients.
//!
//! The table is data: a JSON resource grouping weapons by family, plus one
//! shared default profile for weapons it does not list. The built-in table is
//! embedded at compile time; [`ProfileRegistry::from_json`] accepts the same
//! shape for overrides.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::LazyLock;

use itertools::Itertools;
use rootcause::Report;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::weapon::{SLOT_COUNT, WeaponId};

const BUILTIN_PROFILES: &str = include_str!("slot_offsets.json");

/// Registry parsed from the embedded table.
pub static BUILTIN_REGISTRY: LazyLock<ProfileRegistry> = LazyLock::new(ProfileRegistry::builtin);

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to parse placement profiles: {0}")]
    Parse(String),
}

/// Fractional offsets of one slot along the model's width (`xf`) and height
/// (`yf`). `df` is a depth factor that only marks whether the slot is usable.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SlotCoefficient {
    pub xf: f32,
    pub yf: f32,
    pub df: f32,
}

impl SlotCoefficient {
    pub const UNUSABLE: SlotCoefficient = SlotCoefficient {
        xf: 0.0,
        yf: 0.0,
        df: 0.0,
    };

    pub const fn new(xf: f32, yf: f32, df: f32) -> Self {
        Self { xf, yf, df }
    }

    /// All-zero coefficients mark a slot the weapon has no room for.
    pub fn is_unusable(&self) -> bool {
        self.xf == 0.0 && self.yf == 0.0 && self.df == 0.0
    }
}

pub type SlotProfile = [SlotCoefficient; SLOT_COUNT];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponFamily {
    Pistol,
    Rifle,
    Smg,
    MachineGun,
    Sniper,
    Shotgun,
}

impl fmt::Display for WeaponFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WeaponFamily::Pistol => "pistol",
            WeaponFamily::Rifle => "rifle",
            WeaponFamily::Smg => "smg",
            WeaponFamily::MachineGun => "machine_gun",
            WeaponFamily::Sniper => "sniper",
            WeaponFamily::Shotgun => "shotgun",
        };
        f.write_str(name)
    }
}

#[derive(Deserialize)]
struct ProfileTable {
    default: SlotProfile,
    #[serde(default)]
    families: BTreeMap<WeaponFamily, BTreeMap<WeaponId, SlotProfile>>,
}

#[derive(Debug, Clone)]
struct WeaponProfile {
    family: WeaponFamily,
    slots: SlotProfile,
}

/// Immutable mapping from weapon identity to its five slot coefficients.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    default: SlotProfile,
    profiles: HashMap<WeaponId, WeaponProfile>,
}

impl ProfileRegistry {
    pub fn from_json(json: &str) -> Result<Self, Report<ProfileError>> {
        let table: ProfileTable =
            serde_json::from_str(json).map_err(|e| Report::new(ProfileError::Parse(e.to_string())))?;

        let mut profiles = HashMap::new();
        for (family, weapons) in table.families {
            for (weapon, slots) in weapons {
                if let Some(previous) = profiles.insert(weapon.clone(), WeaponProfile { family, slots }) {
                    warn!(%weapon, first = %previous.family, second = %family, "weapon listed in two families");
                }
            }
        }

        Ok(Self {
            default: table.default,
            profiles,
        })
    }

    fn builtin() -> Self {
        Self::from_json(BUILTIN_PROFILES).unwrap_or_else(|e| {
            warn!("built-in placement profiles are invalid, using defaults only: {e}");
            Self::default_only()
        })
    }

    /// A registry with no weapon-specific entries.
    pub fn default_only() -> Self {
        Self {
            default: DEFAULT_PROFILE,
            profiles: HashMap::new(),
        }
    }

    /// The weapon's own profile, or the shared default.
    pub fn lookup(&self, weapon: &WeaponId) -> &SlotProfile {
        self.profiles
            .get(weapon)
            .map(|profile| &profile.slots)
            .unwrap_or(&self.default)
    }

    pub fn default_profile(&self) -> &SlotProfile {
        &self.default
    }

    pub fn contains(&self, weapon: &WeaponId) -> bool {
        self.profiles.contains_key(weapon)
    }

    pub fn family_of(&self, weapon: &WeaponId) -> Option<WeaponFamily> {
        self.profiles.get(weapon).map(|profile| profile.family)
    }

    /// Every listed weapon with its family, sorted by id.
    pub fn weapons(&self) -> Vec<(&WeaponId, WeaponFamily)> {
        self.profiles
            .iter()
            .map(|(weapon, profile)| (weapon, profile.family))
            .sorted_by(|a, b| a.0.cmp(b.0))
            .collect()
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        BUILTIN_REGISTRY.clone()
    }
}

const DEFAULT_PROFILE: SlotProfile = [
    SlotCoefficient::new(0.15, 0.25, 1.0),
    SlotCoefficient::new(0.05, 0.25, 1.0),
    SlotCoefficient::new(-0.05, 0.25, 1.0),
    SlotCoefficient::new(-0.15, 0.25, 1.0),
    SlotCoefficient::UNUSABLE,
];
