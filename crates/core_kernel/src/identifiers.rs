//! Opaque identifiers for records owned by the hosted data platform
//!
//! The platform hands out identifiers as strings and never promises a format,
//! so the newtypes wrap `String` rather than parsing into UUIDs. The wrappers
//! still keep a policy id from being passed where a profile id is expected.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

macro_rules! define_id {
    ($name:ident, $label:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an identifier issued by the data platform
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the raw identifier
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the wrapper and returns the raw identifier
            pub fn into_inner(self) -> String {
                self.0
            }

            /// Human-readable name of the entity this id refers to
            pub fn label() -> &'static str {
                $label
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_string()))
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(PolicyId, "Policy");
define_id!(ProfileId, "Profile");
define_id!(UserId, "User");

impl From<UserId> for ProfileId {
    /// Profiles share their key with the authenticated user they describe
    fn from(id: UserId) -> Self {
        ProfileId(id.0)
    }
}
