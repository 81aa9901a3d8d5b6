//! Faction hostility.
//!
//! Hostility between factions is a symmetric boolean matrix built once from
//! declared group and pair rules, then only read.

use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};
use strum::{EnumIter, FromRepr, IntoEnumIterator};

/// Size of the hostility matrix (largest faction discriminant + 1)
pub const MAX_FACTIONS: usize = 24;

/// Factions as numbered in the game data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, FromRepr, Serialize, Deserialize)]
#[repr(i32)]
pub enum Faction {
    Hostile1 = 1,
    Friendly1 = 2,
    Hostile2 = 3,
    Friendly2 = 4,
    Neutral = 5,
    Insane = 6,
    Tuskan = 7,
    GlobalXor = 8,
    Surrender1 = 9,
    Surrender2 = 10,
    Predator = 11,
    Prey = 12,
    Trap = 13,
    EndarSpire = 14,
    Rancor = 15,
    Gizka1 = 16,
    Gizka2 = 17,
    SelfLoathing = 21,
    OneOnOne = 22,
    PartyPuppet = 23,
}

impl Faction {
    #[inline]
    pub fn index(self) -> usize {
        self as i32 as usize
    }
}

/// Faction component - the raw id as loaded, which may be out of range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactionId(pub i32);

impl FactionId {
    /// Resolve to a known faction, if the id is one
    pub fn faction(self) -> Option<Faction> {
        Faction::from_repr(self.0)
    }
}

impl From<Faction> for FactionId {
    fn from(faction: Faction) -> Self {
        Self(faction as i32)
    }
}

/// Declarative hostility rules the matrix is built from
#[derive(Debug, Clone, Default)]
pub struct HostilityRules {
    /// Named groups of factions
    pub groups: Vec<(&'static str, Vec<Faction>)>,
    /// Pairs of group names that are hostile to each other
    pub hostile_groups: Vec<(&'static str, &'static str)>,
    /// Individual pair overrides, applied after groups (true = hostile)
    pub overrides: Vec<(Faction, Faction, bool)>,
    /// Faction hostile to every faction, applied last
    pub universally_hostile: Option<Faction>,
}

impl HostilityRules {
    /// The stock faction relationships
    pub fn standard() -> Self {
        use Faction::*;

        Self {
            groups: vec![
                ("hostile", vec![Hostile1, Hostile2, Tuskan, Rancor]),
                ("friendly", vec![Friendly1, Friendly2, EndarSpire, PartyPuppet]),
                ("surrender", vec![Surrender1, Surrender2]),
                ("neutral", vec![Neutral, Trap, GlobalXor]),
            ],
            hostile_groups: vec![("hostile", "friendly")],
            overrides: vec![
                (Predator, Prey, true),
                (Gizka1, Gizka2, true),
                (SelfLoathing, SelfLoathing, true),
                (OneOnOne, Friendly1, true),
            ],
            universally_hostile: Some(Insane),
        }
    }

    fn group(&self, name: &str) -> &[Faction] {
        self.groups
            .iter()
            .find(|(group, _)| *group == name)
            .map(|(_, members)| members.as_slice())
            .unwrap_or(&[])
    }
}

/// Precomputed symmetric hostility lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostilityMatrix {
    hostile: [[bool; MAX_FACTIONS]; MAX_FACTIONS],
}

static STANDARD_MATRIX: LazyLock<Arc<HostilityMatrix>> =
    LazyLock::new(|| Arc::new(HostilityMatrix::build(&HostilityRules::standard())));

impl HostilityMatrix {
    /// Build the matrix: group pairs, then pair overrides, then the
    /// universally hostile faction.
    pub fn build(rules: &HostilityRules) -> Self {
        let mut matrix = Self {
            hostile: [[false; MAX_FACTIONS]; MAX_FACTIONS],
        };

        for (left, right) in &rules.hostile_groups {
            for &a in rules.group(left) {
                for &b in rules.group(right) {
                    matrix.set(a, b, true);
                }
            }
        }

        for &(a, b, hostile) in &rules.overrides {
            matrix.set(a, b, hostile);
        }

        if let Some(insane) = rules.universally_hostile {
            for other in Faction::iter() {
                matrix.set(insane, other, true);
            }
        }

        matrix
    }

    /// Shared matrix for the stock rules, built on first use
    pub fn standard() -> Arc<HostilityMatrix> {
        Arc::clone(&STANDARD_MATRIX)
    }

    fn set(&mut self, a: Faction, b: Faction, hostile: bool) {
        self.hostile[a.index()][b.index()] = hostile;
        self.hostile[b.index()][a.index()] = hostile;
    }

    #[inline]
    pub fn is_hostile(&self, source: Faction, target: Faction) -> bool {
        self.hostile[source.index()][target.index()]
    }

    /// Hostility between raw faction ids. Unknown ids are never hostile.
    pub fn is_hostile_ids(&self, source: FactionId, target: FactionId) -> bool {
        match (source.faction(), target.faction()) {
            (Some(a), Some(b)) => self.is_hostile(a, b),
            _ => {
                tracing::warn!(
                    "hostility check with unknown faction id: source={}, target={}",
                    source.0,
                    target.0
                );
                false
            }
        }
    }
}
