//! Felt Types - Canonical domain types for the Felt poker marketplace
//!
//! This crate contains the foundational types shared by every Felt crate,
//! with zero dependencies on other felt crates:
//!
//! - Identity types (UserId, ListingId, RatingId, ...)
//! - Users, roles and derived reputation
//! - Listings, their detail payloads and the moderation state machine
//! - Ratings and rating aspects
//! - Conversations and messages
//!
//! # Engagement Flow
//!
//! ```text
//! Create (Pending) → Moderate → Browse → Converse → Complete → Rate
//! ```

pub mod identity;
pub mod user;
pub mod listing;
pub mod rating;
pub mod conversation;
pub mod error;

pub use identity::*;
pub use user::*;
pub use listing::*;
pub use rating::*;
pub use conversation::*;
pub use error::*;

use chrono::{DateTime, Utc};

/// Version of the Felt types schema
pub const TYPES_VERSION: &str = "0.1.0";

/// Ordering stamp attached to every appended record.
///
/// Wall-clock time orders records; the sequence number breaks ties in
/// insertion order when two records share a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Stamp {
    /// Wall-clock time of the record
    pub at: DateTime<Utc>,
    /// Store-wide insertion counter
    pub sequence: u64,
}

impl Stamp {
    /// Create a stamp at an explicit time
    pub fn new(at: DateTime<Utc>, sequence: u64) -> Self {
        Self { at, sequence }
    }

    /// Create a stamp at the current time
    pub fn now(sequence: u64) -> Self {
        Self::new(Utc::now(), sequence)
    }

    /// Create a stamp that never sorts before `floor`.
    ///
    /// Used to keep per-conversation timestamps non-decreasing even when the
    /// wall clock steps backwards.
    pub fn not_before(floor: Option<&Stamp>, sequence: u64) -> Self {
        let now = Utc::now();
        let at = match floor {
            Some(prev) if prev.at > now => prev.at,
            _ => now,
        };
        Self::new(at, sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_stamp_orders_by_time_then_sequence() {
        let t = Utc::now();
        let a = Stamp::new(t, 2);
        let b = Stamp::new(t, 3);
        let c = Stamp::new(t + Duration::milliseconds(1), 1);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_not_before_clamps_to_floor() {
        let future = Stamp::new(Utc::now() + Duration::hours(1), 7);
        let next = Stamp::not_before(Some(&future), 8);
        assert_eq!(next.at, future.at);
        assert!(next > future);
    }
}
