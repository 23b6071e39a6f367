//! Identifier types.
//!
//! User, participant and round identifiers are opaque strings chosen by the
//! caller. They are validated once at construction so downstream code never
//! sees an empty or control-character-bearing key.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ValidationError;

/// Maximum identifier length in bytes.
///
/// Two identifiers joined by one separator byte must fit LMDB's 511-byte key
/// limit.
pub const MAX_ID_LEN: usize = 255;

fn validate(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyIdentifier(field));
    }
    if value.len() > MAX_ID_LEN {
        return Err(ValidationError::IdentifierTooLong {
            field,
            max: MAX_ID_LEN,
        });
    }
    if value.chars().any(char::is_control) {
        return Err(ValidationError::ControlCharacter(field));
    }
    Ok(())
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                validate($field, &value)?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;
            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// The user who owns a claim.
    UserId,
    "user_id"
);

string_id!(
    /// The scored entity a claim is computed from.
    ParticipantId,
    "participant_id"
);

string_id!(
    /// A reward round, e.g. `round-1`.
    RoundId,
    "round_id"
);

/// Store-assigned claim identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClaimId(u64);

impl ClaimId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
