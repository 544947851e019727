use std::{fmt, str::FromStr};

use uuid::Uuid;

/// Identity of a court list. The sole key of a status record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CourtListId(pub Uuid);

impl Default for CourtListId {
    fn default() -> Self {
        Self::new()
    }
}

impl CourtListId {
    pub fn new() -> Self {
        CourtListId(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn to_uuid(&self) -> Uuid {
        self.0
    }
}

impl AsRef<Uuid> for CourtListId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for CourtListId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for CourtListId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for CourtListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a court centre (the court building a list belongs to).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CourtCentreId(pub Uuid);

impl CourtCentreId {
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn to_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for CourtCentreId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for CourtCentreId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for CourtCentreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
