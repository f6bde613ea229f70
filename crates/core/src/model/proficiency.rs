use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::theory::{CIRCLE, KEY_COUNT, Key};

/// Lowest proficiency a key can hold; every key starts here.
pub const MIN_PROFICIENCY: f64 = 1.0;

/// Highest proficiency a key can hold.
pub const MAX_PROFICIENCY: f64 = 10.0;

fn bound(value: f64) -> f64 {
    if value.is_nan() {
        MIN_PROFICIENCY
    } else {
        value.clamp(MIN_PROFICIENCY, MAX_PROFICIENCY)
    }
}

//
// ─── PROFICIENCY MAP ───────────────────────────────────────────────────────────
//

/// Per-key mastery estimate, always within `[1, 10]`.
///
/// Serializes as a `{ "C": 1.0, "G": 1.2, ... }` map. Keys missing from a
/// persisted map read back as [`MIN_PROFICIENCY`]; stored values outside the
/// range are clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Key, f64>", into = "BTreeMap<Key, f64>")]
pub struct ProficiencyMap {
    levels: [f64; KEY_COUNT],
}

impl ProficiencyMap {
    /// All keys at [`MIN_PROFICIENCY`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            levels: [MIN_PROFICIENCY; KEY_COUNT],
        }
    }

    /// Rehydrate from persisted `(key, value)` pairs.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (Key, f64)>) -> Self {
        let mut map = Self::new();
        for (key, value) in entries {
            map.levels[key.index()] = bound(value);
        }
        map
    }

    #[must_use]
    pub fn get(&self, key: Key) -> f64 {
        self.levels[key.index()]
    }

    /// Raise a key by `increment`, saturating at [`MAX_PROFICIENCY`].
    ///
    /// Negative increments are ignored; proficiency never drops. Returns the
    /// new value.
    pub fn credit(&mut self, key: Key, increment: f64) -> f64 {
        let slot = &mut self.levels[key.index()];
        *slot = bound(*slot + increment.max(0.0));
        *slot
    }

    /// Sampling weight for remedial practice: `max(1, 11 - proficiency)`.
    #[must_use]
    pub fn selection_weight(&self, key: Key) -> f64 {
        (MAX_PROFICIENCY + 1.0 - self.get(key)).max(1.0)
    }

    /// Mean proficiency over all twelve keys.
    #[must_use]
    pub fn skill_level(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let count = KEY_COUNT as f64;
        self.levels.iter().sum::<f64>() / count
    }

    /// `(key, proficiency)` in circle order.
    pub fn iter(&self) -> impl Iterator<Item = (Key, f64)> + '_ {
        CIRCLE.iter().map(|key| (*key, self.get(*key)))
    }
}

impl Default for ProficiencyMap {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BTreeMap<Key, f64>> for ProficiencyMap {
    fn from(map: BTreeMap<Key, f64>) -> Self {
        Self::from_entries(map)
    }
}

impl From<ProficiencyMap> for BTreeMap<Key, f64> {
    fn from(map: ProficiencyMap) -> Self {
        map.iter().collect()
    }
}

/// Recompute the aggregate skill level from a proficiency map.
#[must_use]
pub fn recompute_skill_level(proficiency: &ProficiencyMap) -> f64 {
    proficiency.skill_level()
}
