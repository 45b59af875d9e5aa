//! Identities and per-viewer inputs supplied by the catalog and configuration UI.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Number of sticker attachment points on every weapon.
pub const SLOT_COUNT: usize = 5;

/// Stable key identifying a weapon model, e.g. `weapon_ak47`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeaponId(String);

impl WeaponId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for WeaponId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WeaponId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for WeaponId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Skin (paint kit) key. The catalog stores these as integers, texture paths
/// use the decimal form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "PaintKey")]
pub struct PaintId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum PaintKey {
    Index(u64),
    Name(String),
}

impl From<PaintKey> for PaintId {
    fn from(key: PaintKey) -> Self {
        match key {
            PaintKey::Index(index) => PaintId(index.to_string()),
            PaintKey::Name(name) => PaintId(name),
        }
    }
}

impl PaintId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u32> for PaintId {
    fn from(value: u32) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for PaintId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PaintId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Which of the two structural renders stored in a weapon asset to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    Legacy,
    #[default]
    Current,
}

impl ModelVariant {
    pub fn from_legacy_flag(legacy: bool) -> Self {
        if legacy {
            ModelVariant::Legacy
        } else {
            ModelVariant::Current
        }
    }

    /// Index of the top-level child to drop when the asset carries both renders.
    pub(crate) fn discarded_child(self) -> usize {
        match self {
            ModelVariant::Legacy => 1,
            ModelVariant::Current => 0,
        }
    }
}

/// Read-only catalog record for one skin.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogEntry {
    pub weapon_id: WeaponId,
    #[serde(default)]
    pub paint_id: Option<PaintId>,
    #[serde(default)]
    pub min_float: Option<f32>,
    #[serde(default)]
    pub max_float: Option<f32>,
    #[serde(default, alias = "legacyModel")]
    pub legacy_model: Option<bool>,
}

impl CatalogEntry {
    pub fn variant(&self) -> ModelVariant {
        ModelVariant::from_legacy_flag(self.legacy_model.unwrap_or(false))
    }
}

/// Up to five optional sticker image references, indexed by slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StickerAssignment([Option<String>; SLOT_COUNT]);

impl StickerAssignment {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from a caller-supplied list. Entries past the fifth are ignored.
    pub fn from_refs<I, S>(refs: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let mut slots: [Option<String>; SLOT_COUNT] = Default::default();
        for (index, image) in refs.into_iter().enumerate() {
            if index >= SLOT_COUNT {
                warn!(index, "ignoring sticker beyond the last slot");
                break;
            }
            slots[index] = image.map(Into::into).filter(|s: &String| !s.is_empty());
        }
        Self(slots)
    }

    /// Resolve sticker kit ids (0 = empty slot) into image references.
    ///
    /// Kits the lookup does not know leave their slot empty.
    pub fn from_kit_ids<F>(kit_ids: [u32; SLOT_COUNT], mut lookup: F) -> Self
    where
        F: FnMut(u32) -> Option<String>,
    {
        Self::from_refs(
            kit_ids
                .into_iter()
                .map(|kit| if kit == 0 { None } else { lookup(kit) }),
        )
    }

    pub fn with_slot(mut self, slot: usize, image: impl Into<String>) -> Self {
        if let Some(entry) = self.0.get_mut(slot) {
            *entry = Some(image.into());
        }
        self
    }

    pub fn get(&self, slot: usize) -> Option<&str> {
        self.0.get(slot).and_then(|s| s.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<&str>)> {
        self.0.iter().enumerate().map(|(i, s)| (i, s.as_deref()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }
}
