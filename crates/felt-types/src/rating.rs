//! Rating types for Felt
//!
//! Ratings are immutable once appended to the ledger. The sub-aspects a
//! rater may score depend on the direction of the rating.

use crate::{FeltError, ListingId, RatingId, Result, Stamp, UserId, UserRole};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lowest allowed score
pub const MIN_SCORE: u8 = 1;
/// Highest allowed score
pub const MAX_SCORE: u8 = 5;

/// A named sub-aspect of a rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RatingAspect {
    PaymentSpeed,
    Communication,
    Professionalism,
    Transparency,
}

impl fmt::Display for RatingAspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PaymentSpeed => write!(f, "paymentSpeed"),
            Self::Communication => write!(f, "communication"),
            Self::Professionalism => write!(f, "professionalism"),
            Self::Transparency => write!(f, "transparency"),
        }
    }
}

/// Direction of a rating between the two sides of a deal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RatingDirection {
    /// The listing's player rates a backer
    PlayerRatesBacker,
    /// A backer rates the listing's player
    BackerRatesPlayer,
}

impl RatingDirection {
    /// Resolve the direction from the two roles, if they form a valid pair
    pub fn between(rater: UserRole, ratee: UserRole) -> Option<Self> {
        match (rater, ratee) {
            (UserRole::Player, UserRole::Backer) => Some(Self::PlayerRatesBacker),
            (UserRole::Backer, UserRole::Player) => Some(Self::BackerRatesPlayer),
            _ => None,
        }
    }

    /// Aspect names valid for this direction
    pub fn allowed_aspects(&self) -> &'static [RatingAspect] {
        match self {
            Self::PlayerRatesBacker => &[RatingAspect::PaymentSpeed, RatingAspect::Communication],
            Self::BackerRatesPlayer => &[
                RatingAspect::Professionalism,
                RatingAspect::Transparency,
                RatingAspect::Communication,
            ],
        }
    }
}

/// A rating stored in the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub id: RatingId,
    pub rater: UserId,
    pub ratee: UserId,
    /// Listing the deal was made on
    pub listing: ListingId,
    /// Overall score, 1-5
    pub score: u8,
    pub comment: String,
    /// Sub-aspect scores, 1-5 each
    pub aspects: BTreeMap<RatingAspect, u8>,
    pub created: Stamp,
}

/// Input for submitting a rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRating {
    pub rater: UserId,
    pub ratee: UserId,
    pub listing: ListingId,
    pub score: u8,
    pub comment: String,
    pub aspects: BTreeMap<RatingAspect, u8>,
}

impl NewRating {
    pub fn new(rater: UserId, ratee: UserId, listing: ListingId, score: u8) -> Self {
        Self {
            rater,
            ratee,
            listing,
            score,
            comment: String::new(),
            aspects: BTreeMap::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_aspect(mut self, aspect: RatingAspect, score: u8) -> Self {
        self.aspects.insert(aspect, score);
        self
    }

    /// Direction-independent checks: score ranges and self-rating
    pub fn validate(&self) -> Result<()> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&self.score) {
            return Err(FeltError::validation(
                "score",
                format!("must be between {} and {}, got {}", MIN_SCORE, MAX_SCORE, self.score),
            ));
        }
        if self.rater == self.ratee {
            return Err(FeltError::validation("ratee", "users cannot rate themselves"));
        }
        for (aspect, score) in &self.aspects {
            if !(MIN_SCORE..=MAX_SCORE).contains(score) {
                return Err(FeltError::validation(
                    aspect.to_string(),
                    format!("must be between {} and {}, got {}", MIN_SCORE, MAX_SCORE, score),
                ));
            }
        }
        Ok(())
    }

    /// Check that every scored aspect belongs to `direction`
    pub fn validate_aspects(&self, direction: RatingDirection) -> Result<()> {
        let allowed = direction.allowed_aspects();
        match self.aspects.keys().find(|a| !allowed.contains(a)) {
            Some(aspect) => Err(FeltError::validation(
                aspect.to_string(),
                format!("not a valid aspect for {:?}", direction),
            )),
            None => Ok(()),
        }
    }
}

/// Which side of a rating the queried user is on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RatingSide {
    /// Ratings received
    #[default]
    AsRatee,
    /// Ratings given
    AsRater,
}

/// Query for rating lookups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingFilter {
    pub side: RatingSide,
    /// Restrict to one listing
    pub listing: Option<ListingId>,
}

impl RatingFilter {
    /// Ratings received, all listings
    pub fn received() -> Self {
        Self::default()
    }

    /// Ratings given, all listings
    pub fn given() -> Self {
        Self {
            side: RatingSide::AsRater,
            listing: None,
        }
    }

    pub fn for_listing(mut self, listing: ListingId) -> Self {
        self.listing = Some(listing);
        self
    }

    pub fn matches(&self, user: &UserId, rating: &Rating) -> bool {
        let side_matches = match self.side {
            RatingSide::AsRatee => &rating.ratee == user,
            RatingSide::AsRater => &rating.rater == user,
        };
        side_matches && self.listing.map_or(true, |l| l == rating.listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_range() {
        let base = NewRating::new(UserId::new(), UserId::new(), ListingId::new(), 5);
        assert!(base.validate().is_ok());
        for bad in [0, 6, 255] {
            let r = NewRating { score: bad, ..base.clone() };
            assert!(matches!(r.validate(), Err(FeltError::Validation { .. })));
        }
    }

    #[test]
    fn test_self_rating_rejected() {
        let user = UserId::new();
        let r = NewRating::new(user, user, ListingId::new(), 4);
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_aspect_score_range() {
        let r = NewRating::new(UserId::new(), UserId::new(), ListingId::new(), 4)
            .with_aspect(RatingAspect::Communication, 0);
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_aspects_depend_on_direction() {
        let r = NewRating::new(UserId::new(), UserId::new(), ListingId::new(), 4)
            .with_aspect(RatingAspect::PaymentSpeed, 5)
            .with_aspect(RatingAspect::Communication, 4);
        assert!(r.validate_aspects(RatingDirection::PlayerRatesBacker).is_ok());
        assert!(r.validate_aspects(RatingDirection::BackerRatesPlayer).is_err());
    }

    #[test]
    fn test_direction_between_roles() {
        assert_eq!(
            RatingDirection::between(UserRole::Backer, UserRole::Player),
            Some(RatingDirection::BackerRatesPlayer)
        );
        assert_eq!(RatingDirection::between(UserRole::Admin, UserRole::Player), None);
        assert_eq!(RatingDirection::between(UserRole::Player, UserRole::Player), None);
    }

    #[test]
    fn test_aspect_names_serialize_camel_case() {
        let json = serde_json::to_string(&RatingAspect::PaymentSpeed).unwrap();
        assert_eq!(json, "\"paymentSpeed\"");
    }
}
