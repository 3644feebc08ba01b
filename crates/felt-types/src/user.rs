//! User types for Felt
//!
//! Users are created outside the core. The core only reads profiles and
//! derives reputation from the rating ledger.

use crate::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a marketplace user. Roles are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    /// Sells staking or coaching listings
    Player,
    /// Buys action or coaching
    Backer,
    /// Moderates listings
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "Player"),
            Self::Backer => write!(f, "Backer"),
            Self::Admin => write!(f, "Admin"),
        }
    }
}

/// External profiles a player can link for verification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationLinks {
    pub hendon_mob: Option<String>,
    pub shark_scope: Option<String>,
    pub twitter: Option<String>,
    pub instagram: Option<String>,
}

/// A user profile as supplied by the identity layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Unique user ID
    pub id: UserId,
    /// Display name
    pub username: String,
    /// Role
    pub role: UserRole,
    /// Free-text bio
    pub bio: String,
    /// Avatar URL
    pub profile_picture_url: Option<String>,
    /// e.g. "NLH Tournaments", "PLO Cash"
    pub preferred_games: Vec<String>,
    /// Verification links
    pub verification_links: VerificationLinks,
}

impl UserProfile {
    /// Create a minimal profile
    pub fn new(username: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            role,
            bio: String::new(),
            profile_picture_url: None,
            preferred_games: Vec::new(),
            verification_links: VerificationLinks::default(),
        }
    }

    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = bio.into();
        self
    }

    pub fn with_preferred_games(mut self, games: Vec<String>) -> Self {
        self.preferred_games = games;
        self
    }

    pub fn with_verification_links(mut self, links: VerificationLinks) -> Self {
        self.verification_links = links;
        self
    }

    /// The acting identity of this profile
    pub fn actor(&self) -> Actor {
        Actor::new(self.id, self.role)
    }
}

/// Aggregate reputation derived from the rating ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Reputation {
    /// Mean score rounded to one decimal
    pub average_score: f64,
    /// Number of ratings received
    pub count: u32,
}

impl Reputation {
    /// Derive a reputation from received scores.
    ///
    /// Pure function of its input: the same scores always give the same
    /// aggregate, regardless of how many times it is recomputed. The mean is
    /// rounded half up to one decimal in integer arithmetic.
    pub fn from_scores<I>(scores: I) -> Self
    where
        I: IntoIterator<Item = u8>,
    {
        let (sum, count) = scores
            .into_iter()
            .fold((0u64, 0u32), |(sum, count), s| (sum + u64::from(s), count + 1));
        if count == 0 {
            return Self::default();
        }
        let count_wide = u64::from(count);
        let tenths = (sum * 20 + count_wide) / (count_wide * 2);
        Self {
            average_score: tenths as f64 / 10.0,
            count,
        }
    }
}

/// The acting user of an operation: id plus role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: UserRole,
}

impl Actor {
    pub fn new(id: UserId, role: UserRole) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reputation_from_scores() {
        let rep = Reputation::from_scores([5, 4, 4]);
        assert_eq!(rep.count, 3);
        assert_eq!(rep.average_score, 4.3);
    }

    #[test]
    fn test_reputation_empty() {
        let rep = Reputation::from_scores(Vec::<u8>::new());
        assert_eq!(rep, Reputation::default());
    }

    #[test]
    fn test_half_way_means_round_up() {
        // 89 / 20 = 4.45
        let scores = std::iter::repeat(5).take(9).chain(std::iter::repeat(4).take(11));
        let rep = Reputation::from_scores(scores);
        assert_eq!(rep.count, 20);
        assert_eq!(rep.average_score, 4.5);

        // 23 / 20 = 1.15
        let scores = std::iter::repeat(2).take(3).chain(std::iter::repeat(1).take(17));
        assert_eq!(Reputation::from_scores(scores).average_score, 1.2);

        // 17 / 4 = 4.25
        assert_eq!(Reputation::from_scores([5, 4, 4, 4]).average_score, 4.3);
    }

    #[test]
    fn test_below_half_rounds_down() {
        // 13 / 3 = 4.333..
        assert_eq!(Reputation::from_scores([5, 4, 4]).average_score, 4.3);
        // 29 / 7 = 4.142..
        assert_eq!(Reputation::from_scores([5, 5, 4, 4, 4, 4, 3]).average_score, 4.1);
    }
}
