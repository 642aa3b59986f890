//! Keying approaches.
//!
//! The approach decides which door attribute draws the master-key boundaries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Strategy used to group doors under master keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyingApproach {
    /// One master per zone (`door.zone`).
    #[default]
    ZoneBased,
    /// One master per floor (`door.level`).
    FloorBased,
    /// One master per door use/function (`door.use`), at most six.
    Functional,
    /// Masters sized by door count, about thirty doors each.
    DoorCount,
}

impl KeyingApproach {
    /// Every approach.
    pub const ALL: [Self; 4] = [
        Self::ZoneBased,
        Self::FloorBased,
        Self::Functional,
        Self::DoorCount,
    ];

    /// Snake-case identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ZoneBased => "zone_based",
            Self::FloorBased => "floor_based",
            Self::Functional => "functional",
            Self::DoorCount => "door_count",
        }
    }

    /// Human label, e.g. "zone based".
    #[must_use]
    pub fn label(self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl fmt::Display for KeyingApproach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyingApproach {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| CoreError::UnknownApproach(s.to_string()))
    }
}
