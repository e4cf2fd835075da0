use serde::{Deserialize, Serialize};

/// States in the election lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElectionStatus {
    /// Published, but voting has not opened yet.
    Upcoming,
    /// Open for voting.
    Active,
    /// Voting has closed; results are final.
    Completed,
}

impl ElectionStatus {
    /// Compact encoding, so the catalog can hold the status in an atomic.
    pub(crate) fn to_u8(self) -> u8 {
        match self {
            Self::Upcoming => 0,
            Self::Active => 1,
            Self::Completed => 2,
        }
    }

    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Upcoming,
            1 => Self::Active,
            _ => Self::Completed,
        }
    }
}
