//! # Identity Newtypes
//!
//! Distinct identifier types for every UUID that crosses the pooling
//! boundary. You cannot pass a [`VoterId`] where a [`ContentId`] is
//! expected, and none of them can be built from an unchecked string.
//!
//! ## Validation
//!
//! UUID identifiers reject malformed input and the nil UUID. The
//! [`RegionalSlug`] is validated as lowercase alphanumeric segments joined
//! by single hyphens (e.g. `florianopolis-2026-02`), at most 64 chars.
//! Deserialization runs the same checks through `TryFrom<String>`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID, rejecting the nil UUID.
            pub fn from_uuid(id: Uuid) -> Result<Self, ValidationError> {
                if id.is_nil() {
                    return Err(ValidationError::NilUuid { field: $field });
                }
                Ok(Self(id))
            }

            /// Parse from the textual UUID form.
            ///
            /// # Errors
            ///
            /// `EmptyIdentifier` for blank input, `InvalidUuid` for anything
            /// that is not a UUID, `NilUuid` for the all-zero UUID.
            pub fn parse(value: &str) -> Result<Self, ValidationError> {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::EmptyIdentifier { field: $field });
                }
                let id = Uuid::parse_str(trimmed).map_err(|_| ValidationError::InvalidUuid {
                    field: $field,
                    value: value.to_string(),
                })?;
                Self::from_uuid(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0.to_string()
            }
        }
    };
}

uuid_identifier!(
    /// Identifier of an accepted signature.
    SignatureId,
    "identifier"
);

uuid_identifier!(
    /// Pseudonymous voter identifier issued by the identity provider.
    VoterId,
    "voterIdentifier"
);

uuid_identifier!(
    /// Identifier of the petition or complaint being supported.
    ContentId,
    "targetContentIdentifier"
);

uuid_identifier!(
    /// Identifier of a regional pool.
    PoolId,
    "poolIdentifier"
);

uuid_identifier!(
    /// Request correlation identifier, carried into logs and anchor calls.
    CorrelationId,
    "correlationIdentifier"
);

const MAX_SLUG_LEN: usize = 64;

/// Region/cycle key of a pool, e.g. `florianopolis-2026-02`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionalSlug(String);

impl RegionalSlug {
    /// Validate and wrap a slug.
    ///
    /// # Errors
    ///
    /// `EmptyIdentifier` for blank input, `InvalidRegionalSlug` when the
    /// value is too long, has uppercase or punctuation, or has empty segments.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() {
            return Err(ValidationError::EmptyIdentifier {
                field: "regionalSlug",
            });
        }
        let well_formed = s.len() <= MAX_SLUG_LEN
            && s.split('-').all(|segment| {
                !segment.is_empty()
                    && segment
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            });
        if !well_formed {
            return Err(ValidationError::InvalidRegionalSlug(s));
        }
        Ok(Self(s))
    }

    /// Access the slug string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RegionalSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RegionalSlug {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RegionalSlug> for String {
    fn from(slug: RegionalSlug) -> String {
        slug.0
    }
}
