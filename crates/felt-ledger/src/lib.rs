//! Felt Ledger - Append-only rating ledger
//!
//! The ledger is:
//! - Append-only (ratings are never edited or deleted)
//! - Indexed by ratee and by rater
//! - Unique per (rater, ratee, listing) triple
//! - The only writer of aggregate reputation
//!
//! # Invariants
//!
//! 1. A user's aggregate is a pure function of the ledger contents
//! 2. Aggregates are recomputed in full under the write lock, never incremented
//! 3. Appends are atomic: no partially applied rating is observable

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use felt_types::{
    FeltError, ListingId, NewRating, Rating, RatingFilter, RatingId, RatingSide, Reputation,
    Result, Stamp, UserId,
};
use tokio::sync::RwLock;

/// Everything guarded by the ledger's single write lock
#[derive(Default)]
struct LedgerState {
    /// All ratings (append-only)
    entries: Vec<Rating>,
    /// ratee -> entry positions
    by_ratee: HashMap<UserId, Vec<usize>>,
    /// rater -> entry positions
    by_rater: HashMap<UserId, Vec<usize>>,
    /// (rater, ratee, listing) triples already rated
    triples: HashSet<(UserId, UserId, ListingId)>,
    /// Stored aggregates, rewritten after every append
    aggregates: HashMap<UserId, Reputation>,
    sequence: u64,
}

impl LedgerState {
    fn scores_for(&self, ratee: &UserId) -> impl Iterator<Item = u8> + '_ {
        self.by_ratee
            .get(ratee)
            .into_iter()
            .flatten()
            .map(|&i| self.entries[i].score)
    }
}

/// The Felt rating ledger
///
/// Thread-safe and designed for concurrent access. Clones share state.
#[derive(Clone, Default)]
pub struct RatingLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl RatingLedger {
    /// Create a new in-memory ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rating and recompute the ratee's aggregate.
    ///
    /// Fails with `Validation` for an out-of-range score, a self-rating, or a
    /// second rating of the same ratee by the same rater on the same listing.
    pub async fn submit(&self, input: NewRating) -> Result<Rating> {
        input.validate()?;

        let mut state = self.state.write().await;

        let triple = (input.rater, input.ratee, input.listing);
        if state.triples.contains(&triple) {
            return Err(FeltError::validation(
                "rating",
                format!(
                    "{} already rated {} for listing {}",
                    input.rater, input.ratee, input.listing
                ),
            ));
        }

        state.sequence += 1;
        let rating = Rating {
            id: RatingId::new(),
            rater: input.rater,
            ratee: input.ratee,
            listing: input.listing,
            score: input.score,
            comment: input.comment,
            aspects: input.aspects,
            created: Stamp::now(state.sequence),
        };

        let position = state.entries.len();
        state.entries.push(rating.clone());
        state.by_ratee.entry(rating.ratee).or_default().push(position);
        state.by_rater.entry(rating.rater).or_default().push(position);
        state.triples.insert(triple);

        let aggregate = Reputation::from_scores(state.scores_for(&rating.ratee));
        state.aggregates.insert(rating.ratee, aggregate);

        tracing::info!(
            rating_id = %rating.id,
            rater = %rating.rater,
            ratee = %rating.ratee,
            listing_id = %rating.listing,
            score = rating.score,
            average = aggregate.average_score,
            count = aggregate.count,
            "Rating appended"
        );

        Ok(rating)
    }

    /// Ratings where `user` is on the side selected by `filter`, newest first
    pub async fn ratings_for(&self, user: &UserId, filter: RatingFilter) -> Vec<Rating> {
        let state = self.state.read().await;
        let index = match filter.side {
            RatingSide::AsRatee => &state.by_ratee,
            RatingSide::AsRater => &state.by_rater,
        };
        let mut ratings: Vec<Rating> = index
            .get(user)
            .into_iter()
            .flatten()
            .map(|&i| &state.entries[i])
            .filter(|r| filter.matches(user, r))
            .cloned()
            .collect();
        ratings.sort_by(|a, b| b.created.cmp(&a.created));

        tracing::debug!(user = %user, side = ?filter.side, count = ratings.len(), "Ratings queried");
        ratings
    }

    /// Stored aggregate reputation of a user (zero if never rated)
    pub async fn reputation(&self, user: &UserId) -> Reputation {
        let state = self.state.read().await;
        state.aggregates.get(user).copied().unwrap_or_default()
    }

    /// Re-derive a user's aggregate straight from the ledger entries.
    ///
    /// Always equals [`RatingLedger::reputation`]; exposed for audits.
    pub async fn derive_reputation(&self, user: &UserId) -> Reputation {
        let state = self.state.read().await;
        Reputation::from_scores(
            state
                .entries
                .iter()
                .filter(|r| &r.ratee == user)
                .map(|r| r.score),
        )
    }

    /// Whether `rater` already rated `ratee` for `listing`
    pub async fn has_rated(&self, rater: &UserId, ratee: &UserId, listing: &ListingId) -> bool {
        let state = self.state.read().await;
        state.triples.contains(&(*rater, *ratee, *listing))
    }

    /// Get the total number of ratings
    pub async fn entry_count(&self) -> usize {
        self.state.read().await.entries.len()
    }

    /// Get recent ratings (newest first)
    pub async fn recent(&self, limit: usize) -> Vec<Rating> {
        let state = self.state.read().await;
        state.entries.iter().rev().take(limit).cloned().collect()
    }
}
