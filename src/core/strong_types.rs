// Strong Types - newtype ids so a listing id can never be passed where a review id is expected

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the raw ID value
            pub fn value(self) -> i64 {
                self.0
            }

            /// Check if this is a valid ID (positive)
            pub fn is_valid(self) -> bool {
                self.0 > 0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }
    };
}

record_id!(
    /// Identifier of a condo listing
    ListingId
);
record_id!(
    /// Identifier of a review
    ReviewId
);
record_id!(
    /// Identifier of a user, issued by the external auth layer
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_as_plain_numbers() {
        let id = ListingId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let back: ListingId = serde_json::from_str("42").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_parse_and_validity() {
        let id: UserId = " 17 ".parse().unwrap();
        assert_eq!(id.value(), 17);
        assert!(id.is_valid());
        assert!(!ReviewId::new(0).is_valid());
        assert!("abc".parse::<ReviewId>().is_err());
    }
}
