//! Typed identifiers
//!
//! Every entity gets its own UUID newtype so a `UserId` can never be passed
//! where a `ListingId` is expected. Display form is `<prefix>_<uuid>`; the
//! serialized form is the bare UUID.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id_type {
    ($(#[$meta:meta])* $name:ident => $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", Self::PREFIX, self.0)
            }
        }

        /// Accepts the prefixed display form or a bare UUID
        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s
                    .strip_prefix(Self::PREFIX)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .unwrap_or(s);
                Uuid::parse_str(raw).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

define_id_type!(
    /// A registered marketplace user
    UserId => "user"
);
define_id_type!(
    /// A staking or coaching listing
    ListingId => "listing"
);
define_id_type!(
    /// One entry in the rating ledger
    RatingId => "rating"
);
define_id_type!(
    /// A durable conversation
    ConversationId => "conv"
);
define_id_type!(MessageId => "msg");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_prefix() {
        let id = ListingId::new();
        assert!(id.to_string().starts_with("listing_"));
    }

    #[test]
    fn test_parse_with_and_without_prefix() {
        let id = UserId::new();
        assert_eq!(id.to_string().parse::<UserId>().unwrap(), id);
        assert_eq!(id.0.to_string().parse::<UserId>().unwrap(), id);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("conv_not-a-uuid".parse::<ConversationId>().is_err());
        let listing = ListingId::new().to_string();
        assert!(listing.parse::<UserId>().is_err());
    }

    #[test]
    fn test_serializes_as_bare_uuid() {
        let id = MessageId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.0));
    }
}
