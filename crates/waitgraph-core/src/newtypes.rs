/// Validated identifier newtypes for processes and resources.
///
/// Both identifiers share one shape rule: 1 to 64 characters, starting with
/// an ASCII alphanumeric, followed by ASCII alphanumerics or `_ . : -`.
/// Construction goes through [`TryFrom<&str>`]; the serde `Deserialize` impls
/// re-run validation so malformed ids cannot enter from untrusted JSON.
///
/// Keeping [`ProcessId`] and [`ResourceId`] as distinct types means a process
/// can never be looked up where a resource is expected, even though both
/// serialize as plain strings.
use std::fmt;
use std::ops::Deref;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Maximum identifier length in bytes.
pub const MAX_ID_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced when constructing an identifier from an invalid string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewtypeError {
    /// The string did not match the identifier shape.
    InvalidFormat {
        /// Name of the type that rejected the input.
        type_name: &'static str,
        /// A human-readable description of the expected format.
        expected: &'static str,
        /// The input that was rejected.
        got: String,
    },
}

impl fmt::Display for NewtypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat {
                type_name,
                expected,
                got,
            } => write!(f, "invalid {type_name}: expected {expected}, got {got:?}"),
        }
    }
}

impl std::error::Error for NewtypeError {}

// ---------------------------------------------------------------------------
// Shape check
// ---------------------------------------------------------------------------

/// Matches the shared identifier shape (length is checked separately).
///
/// The pattern is a literal, so the never-matching fallback is unreachable.
static ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.:\-]*$").unwrap_or_else(|_| {
        Regex::new("a^").unwrap_or_else(|_| unreachable!("regex engine broken"))
    })
});

const ID_EXPECTED: &str = "1-64 chars: alphanumeric first, then alphanumerics or _ . : -";

fn is_valid_id(s: &str) -> bool {
    !s.is_empty() && s.len() <= MAX_ID_LEN && ID_RE.is_match(s)
}

// ---------------------------------------------------------------------------
// Identifier types
// ---------------------------------------------------------------------------

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<&str> for $name {
            type Error = NewtypeError;

            fn try_from(s: &str) -> Result<Self, Self::Error> {
                if is_valid_id(s) {
                    Ok(Self(s.to_owned()))
                } else {
                    Err(NewtypeError::InvalidFormat {
                        type_name: stringify!($name),
                        expected: ID_EXPECTED,
                        got: s.to_owned(),
                    })
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = NewtypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::try_from(s)
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let s = String::deserialize(d)?;
                Self::try_from(s.as_str()).map_err(de::Error::custom)
            }
        }
    };
}

identifier!(
    /// Identifier of a process taking part in a snapshot (e.g. `"P2"`).
    ProcessId
);

identifier!(
    /// Identifier of a single-instance, non-shareable resource (e.g. `"R3"`).
    ResourceId
);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
