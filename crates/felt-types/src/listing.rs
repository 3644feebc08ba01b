//! Listing types for Felt
//!
//! A listing is a player's offer of staking or coaching. It carries exactly
//! one details payload matching its type, and moves through the moderation
//! state machine defined by [`ListingStatus`].

use crate::{Actor, FeltError, ListingId, Result, Stamp, UserId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// Kind of listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListingType {
    /// Selling a share of tournament or session action
    Staking,
    /// Selling coaching or hand history review
    Coaching,
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Staking => write!(f, "Staking"),
            Self::Coaching => write!(f, "Coaching"),
        }
    }
}

/// Staking package terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakingDetails {
    /// Tournament, Cash Game, Online Series
    pub game_type: String,
    /// Event and venue description
    pub event_venue_details: String,
    /// Total buy-in of the event
    pub total_buy_in: f64,
    /// Multiplier applied to the buy-in share, e.g. 1.2
    pub markup: f64,
    /// Share of action offered, in percent
    pub percentage_for_sale: f64,
    /// Smallest purchasable share, in percent
    pub min_purchase_percentage: f64,
    /// Largest purchasable share, in percent
    pub max_purchase_percentage: f64,
}

impl StakingDetails {
    /// Price of a 1% share: `total_buy_in * markup / 100`
    pub fn cost_per_percent(&self) -> f64 {
        self.total_buy_in * self.markup / 100.0
    }

    fn validate(&self) -> Result<()> {
        if self.game_type.trim().is_empty() {
            return Err(FeltError::validation("game_type", "must not be empty"));
        }
        if self.event_venue_details.trim().is_empty() {
            return Err(FeltError::validation("event_venue_details", "must not be empty"));
        }
        if !(self.total_buy_in.is_finite() && self.total_buy_in > 0.0) {
            return Err(FeltError::validation("total_buy_in", "must be greater than zero"));
        }
        if !(self.markup.is_finite() && self.markup > 0.0) {
            return Err(FeltError::validation("markup", "must be greater than zero"));
        }
        let (min, max, sale) = (
            self.min_purchase_percentage,
            self.max_purchase_percentage,
            self.percentage_for_sale,
        );
        if !(min > 0.0 && min <= max && max <= sale && sale <= 100.0) {
            return Err(FeltError::validation(
                "percentages",
                "expected 0 < min <= max <= percentage_for_sale <= 100",
            ));
        }
        Ok(())
    }
}

/// How a coaching offer is priced
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CoachingPrice {
    PerHour(f64),
    PerSession(f64),
}

impl CoachingPrice {
    pub fn amount(&self) -> f64 {
        match self {
            Self::PerHour(a) | Self::PerSession(a) => *a,
        }
    }
}

/// Coaching offer terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachingDetails {
    /// Coaching, Hand History Review
    pub service_type: String,
    pub price: CoachingPrice,
    /// e.g. "60 minutes"
    pub session_duration: Option<String>,
}

impl CoachingDetails {
    fn validate(&self) -> Result<()> {
        if self.service_type.trim().is_empty() {
            return Err(FeltError::validation("service_type", "must not be empty"));
        }
        let amount = self.price.amount();
        if !(amount.is_finite() && amount > 0.0) {
            return Err(FeltError::validation("price", "must be greater than zero"));
        }
        Ok(())
    }
}

/// Type-specific payload. Exactly one variant is present, matching the type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "listing_type", content = "details")]
pub enum ListingDetails {
    Staking(StakingDetails),
    Coaching(CoachingDetails),
}

impl ListingDetails {
    pub fn listing_type(&self) -> ListingType {
        match self {
            Self::Staking(_) => ListingType::Staking,
            Self::Coaching(_) => ListingType::Coaching,
        }
    }

    /// Game type for staking, service type for coaching
    pub fn game_label(&self) -> &str {
        match self {
            Self::Staking(s) => &s.game_type,
            Self::Coaching(c) => &c.service_type,
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::Staking(s) => s.validate(),
            Self::Coaching(c) => c.validate(),
        }
    }
}

/// Who may drive a given status transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionActor {
    Admin,
    Owner,
    OwnerOrAdmin,
}

impl TransitionActor {
    /// Whether `actor` may act on a listing owned by `owner`
    pub fn permits(&self, actor: &Actor, owner: &UserId) -> bool {
        let is_owner = &actor.id == owner;
        match self {
            Self::Admin => actor.is_admin(),
            Self::Owner => is_owner,
            Self::OwnerOrAdmin => is_owner || actor.is_admin(),
        }
    }
}

/// Status of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ListingStatus {
    /// Awaiting moderation (initial)
    PendingApproval,
    /// Published and open for deals
    Active,
    /// Temporarily hidden by owner or admin
    Paused,
    /// Deal completed; enables post-deal rating
    Completed,
    /// Refused by moderation
    Rejected,
    /// Withdrawn by the owner
    Cancelled,
}

impl ListingStatus {
    /// Every status, in declaration order
    pub const ALL: [ListingStatus; 6] = [
        Self::PendingApproval,
        Self::Active,
        Self::Paused,
        Self::Completed,
        Self::Rejected,
        Self::Cancelled,
    ];

    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the owner may delete a listing in this state
    pub fn is_deletable(&self) -> bool {
        matches!(
            self,
            Self::PendingApproval | Self::Paused | Self::Rejected | Self::Cancelled
        )
    }

    /// The actor allowed to move from `self` to `target`, or `None` when the
    /// transition is not permitted for anyone.
    pub fn transition_actor(&self, target: ListingStatus) -> Option<TransitionActor> {
        use ListingStatus::*;
        match (*self, target) {
            (PendingApproval, Active) => Some(TransitionActor::Admin),
            (Active, Paused) | (Paused, Active) => Some(TransitionActor::OwnerOrAdmin),
            (Active, Completed) | (Paused, Completed) => Some(TransitionActor::Owner),
            (PendingApproval | Active | Paused | Rejected, Rejected) => {
                Some(TransitionActor::Admin)
            }
            (Rejected, Active) => Some(TransitionActor::Admin),
            (PendingApproval, Cancelled) | (Paused, Cancelled) => Some(TransitionActor::Owner),
            _ => None,
        }
    }

    /// Get valid transitions from this state
    pub fn valid_transitions(&self) -> Vec<ListingStatus> {
        Self::ALL
            .into_iter()
            .filter(|t| self.transition_actor(*t).is_some())
            .collect()
    }

    /// Check if transition to target state is valid for some actor
    pub fn can_transition_to(&self, target: ListingStatus) -> bool {
        self.transition_actor(target).is_some()
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PendingApproval => write!(f, "PendingApproval"),
            Self::Active => write!(f, "Active"),
            Self::Paused => write!(f, "Paused"),
            Self::Completed => write!(f, "Completed"),
            Self::Rejected => write!(f, "Rejected"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// A marketplace listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Unique listing ID
    pub id: ListingId,
    /// Owning player
    pub owner: UserId,
    pub title: String,
    pub description: String,
    /// Type-specific terms
    pub details: ListingDetails,
    /// e.g. "PayPal", "Crypto" (payment happens off-platform)
    pub payment_methods: BTreeSet<String>,
    /// Moderation status
    pub status: ListingStatus,
    /// Admin-controlled presentation boost
    pub featured: bool,
    /// Present iff status is Rejected
    pub rejection_reason: Option<String>,
    /// When posted
    pub created: Stamp,
}

impl Listing {
    pub fn listing_type(&self) -> ListingType {
        self.details.listing_type()
    }

    pub fn staking(&self) -> Option<&StakingDetails> {
        match &self.details {
            ListingDetails::Staking(s) => Some(s),
            ListingDetails::Coaching(_) => None,
        }
    }

    /// Derived price of a 1% share; staking listings only
    pub fn cost_per_percent(&self) -> Option<f64> {
        self.staking().map(StakingDetails::cost_per_percent)
    }

    /// Total buy-in; staking listings only
    pub fn buy_in(&self) -> Option<f64> {
        self.staking().map(|s| s.total_buy_in)
    }

    /// Case-insensitive substring match over title and description
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

/// Input for creating a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub details: ListingDetails,
    pub payment_methods: Vec<String>,
}

impl NewListing {
    /// Check required fields and type-specific terms
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(FeltError::validation("title", "must not be empty"));
        }
        if self.description.trim().is_empty() {
            return Err(FeltError::validation("description", "must not be empty"));
        }
        if self.payment_methods.iter().all(|m| m.trim().is_empty()) {
            return Err(FeltError::validation(
                "payment_methods",
                "at least one payment method is required",
            ));
        }
        self.details.validate()
    }
}

/// Buy-in brackets for staking searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuyInRange {
    /// Up to 100
    Low,
    /// Above 100, up to 1000
    Mid,
    /// Above 1000
    High,
}

impl BuyInRange {
    pub fn contains(&self, buy_in: f64) -> bool {
        match self {
            Self::Low => buy_in <= 100.0,
            Self::Mid => buy_in > 100.0 && buy_in <= 1000.0,
            Self::High => buy_in > 1000.0,
        }
    }
}

/// Sort options for listing queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListingSort {
    /// Most recently posted first
    #[default]
    Newest,
    /// Oldest first
    Oldest,
    /// Featured listings first, then newest
    FeaturedFirst,
    /// Cheapest 1% share first; listings without one go last
    CostPerPercent,
}

impl ListingSort {
    pub fn compare(&self, a: &Listing, b: &Listing) -> Ordering {
        let newest = b.created.cmp(&a.created);
        match self {
            Self::Newest => newest,
            Self::Oldest => a.created.cmp(&b.created),
            Self::FeaturedFirst => b.featured.cmp(&a.featured).then(newest),
            Self::CostPerPercent => match (a.cost_per_percent(), b.cost_per_percent()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal).then(newest),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => newest,
            },
        }
    }
}

/// Query for browsing listings. Every unset field matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingFilter {
    /// Allowed statuses (`None` = all)
    pub statuses: Option<BTreeSet<ListingStatus>>,
    pub listing_type: Option<ListingType>,
    /// Free text over title and description
    pub text: Option<String>,
    /// Substring over game type / service type
    pub game: Option<String>,
    /// Buy-in bracket; excludes listings without a buy-in
    pub buy_in: Option<BuyInRange>,
    pub owner: Option<UserId>,
    pub featured_only: bool,
    pub sort: ListingSort,
}

impl ListingFilter {
    /// Everything, newest first
    pub fn new() -> Self {
        Self::default()
    }

    /// The public browse view: Active and PendingApproval listings
    pub fn browse() -> Self {
        Self::new().with_statuses([ListingStatus::Active, ListingStatus::PendingApproval])
    }

    pub fn with_statuses<I>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = ListingStatus>,
    {
        self.statuses = Some(statuses.into_iter().collect());
        self
    }

    pub fn with_type(mut self, listing_type: ListingType) -> Self {
        self.listing_type = Some(listing_type);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_game(mut self, game: impl Into<String>) -> Self {
        self.game = Some(game.into());
        self
    }

    pub fn with_buy_in(mut self, range: BuyInRange) -> Self {
        self.buy_in = Some(range);
        self
    }

    pub fn with_owner(mut self, owner: UserId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn featured_only(mut self) -> Self {
        self.featured_only = true;
        self
    }

    pub fn sorted_by(mut self, sort: ListingSort) -> Self {
        self.sort = sort;
        self
    }

    /// Check a single listing against every set criterion
    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&listing.status) {
                return false;
            }
        }
        if let Some(t) = self.listing_type {
            if listing.listing_type() != t {
                return false;
            }
        }
        if let Some(text) = self.text.as_deref().filter(|t| !t.trim().is_empty()) {
            if !listing.matches_text(text) {
                return false;
            }
        }
        if let Some(game) = self.game.as_deref().filter(|g| !g.trim().is_empty()) {
            let label = listing.details.game_label().to_lowercase();
            if !label.contains(&game.to_lowercase()) {
                return false;
            }
        }
        if let Some(range) = self.buy_in {
            match listing.buy_in() {
                Some(b) if range.contains(b) => {}
                _ => return false,
            }
        }
        if let Some(owner) = self.owner {
            if listing.owner != owner {
                return false;
            }
        }
        !self.featured_only || listing.featured
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UserRole;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_transition_actor_permits() {
        let owner = UserId::new();
        let player = Actor::new(owner, UserRole::Player);
        let admin = Actor::new(UserId::new(), UserRole::Admin);
        let stranger = Actor::new(UserId::new(), UserRole::Player);

        assert!(TransitionActor::Owner.permits(&player, &owner));
        assert!(!TransitionActor::Owner.permits(&admin, &owner));
        assert!(TransitionActor::Admin.permits(&admin, &owner));
        assert!(!TransitionActor::Admin.permits(&player, &owner));
        assert!(TransitionActor::OwnerOrAdmin.permits(&admin, &owner));
        assert!(!TransitionActor::OwnerOrAdmin.permits(&stranger, &owner));
    }

    fn staking(buy_in: f64, markup: f64) -> ListingDetails {
        ListingDetails::Staking(StakingDetails {
            game_type: "Tournament".to_string(),
            event_venue_details: "WSOP Main Event, Las Vegas".to_string(),
            total_buy_in: buy_in,
            markup,
            percentage_for_sale: 50.0,
            min_purchase_percentage: 1.0,
            max_purchase_percentage: 10.0,
        })
    }

    fn listing(details: ListingDetails, seq: u64) -> Listing {
        Listing {
            id: ListingId::new(),
            owner: UserId::new(),
            title: "Staking for the Main Event".to_string(),
            description: "Deep stack specialist".to_string(),
            details,
            payment_methods: ["PayPal".to_string()].into_iter().collect(),
            status: ListingStatus::Active,
            featured: false,
            rejection_reason: None,
            created: Stamp::new(Utc.timestamp_opt(1_700_000_000, 0).unwrap(), seq),
        }
    }

    #[test]
    fn test_cost_per_percent() {
        let l = listing(staking(10_000.0, 1.25), 0);
        assert_eq!(l.cost_per_percent(), Some(125.0));
    }

    #[test]
    fn test_coaching_has_no_cost_per_percent() {
        let l = listing(
            ListingDetails::Coaching(CoachingDetails {
                service_type: "Coaching".to_string(),
                price: CoachingPrice::PerHour(150.0),
                session_duration: None,
            }),
            0,
        );
        assert_eq!(l.cost_per_percent(), None);
        assert_eq!(l.listing_type(), ListingType::Coaching);
    }

    #[test]
    fn test_buy_in_ranges() {
        assert!(BuyInRange::Low.contains(100.0));
        assert!(!BuyInRange::Low.contains(100.5));
        assert!(BuyInRange::Mid.contains(101.0));
        assert!(BuyInRange::Mid.contains(1000.0));
        assert!(BuyInRange::High.contains(1000.01));
    }

    #[test]
    fn test_completed_never_reactivates() {
        assert!(!ListingStatus::Completed.can_transition_to(ListingStatus::Active));
        assert!(ListingStatus::Completed.valid_transitions().is_empty());
        assert!(ListingStatus::Cancelled.valid_transitions().is_empty());
    }

    #[test]
    fn test_transition_actors() {
        use ListingStatus::*;
        assert_eq!(PendingApproval.transition_actor(Active), Some(TransitionActor::Admin));
        assert_eq!(Active.transition_actor(Paused), Some(TransitionActor::OwnerOrAdmin));
        assert_eq!(Paused.transition_actor(Completed), Some(TransitionActor::Owner));
        assert_eq!(Rejected.transition_actor(Rejected), Some(TransitionActor::Admin));
        assert_eq!(Active.transition_actor(Active), None);
    }

    #[test]
    fn test_deletable_states() {
        use ListingStatus::*;
        assert!(!Active.is_deletable());
        assert!(!Completed.is_deletable());
        for s in [PendingApproval, Paused, Rejected, Cancelled] {
            assert!(s.is_deletable());
        }
    }

    #[test]
    fn test_new_listing_validation() {
        let mut input = NewListing {
            title: "Main Event".to_string(),
            description: "Action for sale".to_string(),
            details: staking(10_000.0, 1.2),
            payment_methods: vec!["Crypto".to_string()],
        };
        assert!(input.validate().is_ok());

        input.payment_methods.clear();
        assert!(matches!(
            input.validate(),
            Err(FeltError::Validation { ref field, .. }) if field == "payment_methods"
        ));

        input.payment_methods.push("Crypto".to_string());
        input.details = staking(10_000.0, 0.0);
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_staking_percentages_must_nest() {
        let mut details = match staking(500.0, 1.1) {
            ListingDetails::Staking(s) => s,
            ListingDetails::Coaching(_) => unreachable!(),
        };
        details.max_purchase_percentage = 60.0;
        assert!(ListingDetails::Staking(details).validate().is_err());
    }

    #[test]
    fn test_filter_buy_in_excludes_coaching() {
        let coaching = listing(
            ListingDetails::Coaching(CoachingDetails {
                service_type: "Hand History Review".to_string(),
                price: CoachingPrice::PerSession(200.0),
                session_duration: Some("2 hours".to_string()),
            }),
            0,
        );
        let filter = ListingFilter::new().with_buy_in(BuyInRange::Low);
        assert!(!filter.matches(&coaching));
        assert!(ListingFilter::new().with_game("hand").matches(&coaching));
    }

    #[test]
    fn test_filter_statuses() {
        let mut l = listing(staking(50.0, 1.0), 0);
        let browse = ListingFilter::browse();
        assert!(browse.matches(&l));
        l.status = ListingStatus::Paused;
        assert!(!browse.matches(&l));
    }

    #[test]
    fn test_featured_first_sort() {
        let a = listing(staking(50.0, 1.0), 1);
        let mut b = listing(staking(50.0, 1.0), 0);
        b.featured = true;
        assert_eq!(ListingSort::Newest.compare(&a, &b), Ordering::Less);
        assert_eq!(ListingSort::FeaturedFirst.compare(&a, &b), Ordering::Greater);
    }

    proptest::proptest! {
        #[test]
        fn prop_text_match_is_case_insensitive(word in "[a-zA-Z]{1,12}") {
            let mut l = listing(staking(50.0, 1.0), 0);
            l.description = format!("prefix {} suffix", word);
            proptest::prop_assert!(l.matches_text(&word.to_uppercase()));
            proptest::prop_assert!(l.matches_text(&word.to_lowercase()));
        }
    }
}
