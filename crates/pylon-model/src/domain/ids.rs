//! Numeric identifiers of panel records.
//!
//! Every record referenced by a creation request is addressed by a positive integer key.
//! Each key has its own type, so a node id cannot be passed where an allocation id is
//! expected.
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

use crate::error::{ModelError, ModelResult};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "schema", derive(JsonSchema))]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Get the raw key.
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ModelError;
            fn from_str(s: &str) -> ModelResult<Self> {
                s.trim()
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|_| ModelError::InvalidId(s.to_string()))
            }
        }
    };
}

record_id!(
    /// Node (daemon host) that owns allocations.
    NodeId
);
record_id!(
    /// Network allocation: one `(node, ip, port)` binding.
    AllocationId
);
record_id!(
    /// Panel user that owns a server.
    UserId
);
record_id!(
    /// Egg (server template) a server is created from.
    EggId
);
record_id!(
    /// Service pack installed on top of an egg.
    PackId
);
record_id!(
    /// Location grouping nodes for automatic deployment.
    LocationId
);
record_id!(
    /// Server record produced by provisioning.
    ServerId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trimmed_digits() {
        assert_eq!(" 42 ".parse::<NodeId>().unwrap(), NodeId(42));
        assert_eq!("7".parse::<AllocationId>().unwrap().get(), 7);
    }

    #[test]
    fn rejects_non_numeric_and_negative() {
        for bad in ["", "abc", "-1", "1.5"] {
            let err = bad.parse::<LocationId>().unwrap_err();
            assert!(matches!(err, ModelError::InvalidId(_)), "{bad:?}");
        }
    }

    #[test]
    fn serializes_as_bare_number() {
        let json = serde_json::to_string(&ServerId(9)).unwrap();
        assert_eq!(json, "9");

        let back: ServerId = serde_json::from_str("9").unwrap();
        assert_eq!(back, ServerId(9));
    }

    #[test]
    fn display_matches_raw_key() {
        assert_eq!(EggId(3).to_string(), "3");
        assert_eq!(u64::from(UserId(11)), 11);
    }
}
