//! # Identity Assurance Levels
//!
//! The closed set of assurance tiers an identity provider can attach to a
//! voter at signing time. The tier is trusted input; this crate only checks
//! that the label is one of the three known values.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Identity assurance tier recorded on a signature.
///
/// Every `match` on this enum must be exhaustive. Adding a tier forces the
/// weight table in the engine to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssuranceLevel {
    /// Self-asserted identity, no verification performed.
    #[serde(rename = "IAL1_UNVERIFIED")]
    Ial1Unverified,
    /// Identity evidence verified remotely.
    #[serde(rename = "IAL2_VERIFIED")]
    Ial2Verified,
    /// Sovereign-grade identity (in-person or biometric proofing).
    #[serde(rename = "IAL3_SOVEREIGN")]
    Ial3Sovereign,
}

impl AssuranceLevel {
    /// All tiers, lowest first.
    pub const ALL: [AssuranceLevel; 3] = [
        AssuranceLevel::Ial1Unverified,
        AssuranceLevel::Ial2Verified,
        AssuranceLevel::Ial3Sovereign,
    ];

    /// The wire label for this tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ial1Unverified => "IAL1_UNVERIFIED",
            Self::Ial2Verified => "IAL2_VERIFIED",
            Self::Ial3Sovereign => "IAL3_SOVEREIGN",
        }
    }
}

impl std::fmt::Display for AssuranceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AssuranceLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IAL1_UNVERIFIED" => Ok(Self::Ial1Unverified),
            "IAL2_VERIFIED" => Ok(Self::Ial2Verified),
            "IAL3_SOVEREIGN" => Ok(Self::Ial3Sovereign),
            other => Err(ValidationError::InvalidAssuranceLevel(other.to_string())),
        }
    }
}
