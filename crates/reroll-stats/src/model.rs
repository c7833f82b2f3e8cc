//! The attribute model: named numeric stats with additive effects.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// The fixed set of attribute names observed across story content.
///
/// Declaration order is display order; `Ord` on this enum drives the
/// ordering of every stat mapping in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatName {
    /// 智力
    Intelligence,
    /// 魅力
    Charm,
    /// 体力
    Stamina,
    /// 心情
    Happiness,
    /// 零花钱 / 家境
    Money,
    /// 气运
    Luck,
}

impl StatName {
    /// The snake_case wire name, as used in generator JSON.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Intelligence => "intelligence",
            Self::Charm => "charm",
            Self::Stamina => "stamina",
            Self::Happiness => "happiness",
            Self::Money => "money",
            Self::Luck => "luck",
        }
    }

    /// Parses a wire name back into a `StatName`.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "intelligence" => Some(Self::Intelligence),
            "charm" => Some(Self::Charm),
            "stamina" => Some(Self::Stamina),
            "happiness" => Some(Self::Happiness),
            "money" => Some(Self::Money),
            "luck" => Some(Self::Luck),
            _ => None,
        }
    }

    /// The Chinese display label used in prompts and UI copy.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Intelligence => "智力",
            Self::Charm => "魅力",
            Self::Stamina => "体力",
            Self::Happiness => "心情",
            Self::Money => "零花钱",
            Self::Luck => "气运",
        }
    }
}

impl fmt::Display for StatName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The two observed five-stat key sets. A session's profile fixes its
/// stat key set for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatProfile {
    /// intelligence, charm, stamina, happiness, money
    Wellbeing,
    /// intelligence, charm, stamina, money, luck
    Fortune,
}

impl StatProfile {
    /// The stat names in this profile, in display order.
    #[must_use]
    pub fn names(self) -> &'static [StatName] {
        match self {
            Self::Wellbeing => &[
                StatName::Intelligence,
                StatName::Charm,
                StatName::Stamina,
                StatName::Happiness,
                StatName::Money,
            ],
            Self::Fortune => &[
                StatName::Intelligence,
                StatName::Charm,
                StatName::Stamina,
                StatName::Money,
                StatName::Luck,
            ],
        }
    }

    /// Whether `stat` belongs to this profile's key set.
    #[must_use]
    pub fn contains(self, stat: StatName) -> bool {
        self.names().contains(&stat)
    }
}

/// A partial signed-delta mapping over stat names.
///
/// Deserialization is lenient: keys that are not recognized stat names are
/// skipped rather than failing the whole payload, so a sloppy generator
/// response degrades instead of crashing the turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Effect(pub BTreeMap<StatName, i64>);

impl Effect {
    /// An effect with no deltas.
    #[must_use]
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Builds an effect from `(stat, delta)` pairs.
    #[must_use]
    pub fn from_deltas(deltas: &[(StatName, i64)]) -> Self {
        Self(deltas.iter().copied().collect())
    }

    /// True when the effect carries no deltas.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for Effect {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EffectVisitor;

        impl<'de> Visitor<'de> for EffectVisitor {
            type Value = Effect;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of stat names to integer deltas")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut deltas = BTreeMap::new();
                while let Some((key, value)) = access.next_entry::<String, i64>()? {
                    if let Some(stat) = StatName::from_key(&key) {
                        deltas.insert(stat, value);
                    }
                }
                Ok(Effect(deltas))
            }
        }

        deserializer.deserialize_map(EffectVisitor)
    }
}

/// An ordered mapping from stat name to value, with a fixed key set.
///
/// Values are unclamped: effects may drive a stat negative or past the
/// display range. Clamping happens only at the presentation boundary via
/// [`normalize_for_display`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatSet {
    profile: StatProfile,
    values: BTreeMap<StatName, i64>,
}

impl StatSet {
    /// Creates a stat set with every stat in the profile at `baseline`.
    #[must_use]
    pub fn with_baseline(profile: StatProfile, baseline: i64) -> Self {
        Self {
            profile,
            values: profile.names().iter().map(|&n| (n, baseline)).collect(),
        }
    }

    /// Creates a stat set from explicit values. Stats outside the profile
    /// are dropped; stats missing from `values` start at 0, preserving the
    /// fixed-key-set invariant.
    #[must_use]
    pub fn from_values(profile: StatProfile, values: BTreeMap<StatName, i64>) -> Self {
        Self {
            profile,
            values: profile
                .names()
                .iter()
                .map(|&n| (n, values.get(&n).copied().unwrap_or(0)))
                .collect(),
        }
    }

    /// The profile this set was created with.
    #[must_use]
    pub fn profile(&self) -> StatProfile {
        self.profile
    }

    /// The value of `stat`, or `None` when it is outside the key set.
    #[must_use]
    pub fn get(&self, stat: StatName) -> Option<i64> {
        self.values.get(&stat).copied()
    }

    /// Sum of all stat values.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.values.values().sum()
    }

    /// Iterates `(stat, value)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (StatName, i64)> + '_ {
        self.values.iter().map(|(&n, &v)| (n, v))
    }

    /// Applies an effect, returning a new set. Deltas for stats outside the
    /// key set are ignored — the key set never changes shape. Purely
    /// additive, so applying a group of effects is order-independent.
    #[must_use]
    pub fn apply_effect(&self, effect: &Effect) -> Self {
        let mut next = self.clone();
        for (&stat, &delta) in &effect.0 {
            if let Some(value) = next.values.get_mut(&stat) {
                *value += delta;
            }
        }
        next
    }
}

/// Maps a raw stat value to a display fraction in `[0, 1]`.
///
/// Negative values clamp to 0; values past `scale_max` clamp to 1. This is
/// purely a presentation concern — stored values stay unclamped.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn normalize_for_display(value: i64, scale_max: i64) -> f64 {
    if scale_max <= 0 {
        return 0.0;
    }
    (value as f64 / scale_max as f64).clamp(0.0, 1.0)
}
