//! Listing registry
//!
//! Owns listing entities and drives them through the moderation state
//! machine. Every mutation runs under the registry's write lock, so no
//! partially applied change is observable.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use felt_types::*;
use tokio::sync::RwLock;

/// Listing registry trait
#[async_trait::async_trait]
pub trait ListingRegistry: Send + Sync {
    /// Post a listing; it always starts in `PendingApproval`
    async fn create(&self, owner: &Actor, input: NewListing) -> Result<Listing>;

    /// Get a listing by id
    async fn get(&self, id: &ListingId) -> Result<Listing>;

    /// Move a listing to `target`.
    ///
    /// `reason` is stored when the target is `Rejected` and cleared on every
    /// other transition. The returned record carries the status the listing
    /// held when the change was applied.
    async fn transition(
        &self,
        id: &ListingId,
        actor: &Actor,
        target: ListingStatus,
        reason: Option<String>,
    ) -> Result<Transitioned>;

    /// Flip the featured flag (Admin, any status)
    async fn toggle_feature(&self, id: &ListingId, actor: &Actor) -> Result<Listing>;

    /// Remove a listing; only its owner, only outside Active/Completed
    async fn delete(&self, id: &ListingId, actor: &Actor) -> Result<Listing>;

    /// Query listings
    async fn list(&self, filter: &ListingFilter) -> Vec<Listing>;
}

/// A committed status change
#[derive(Debug, Clone)]
pub struct Transitioned {
    pub from: ListingStatus,
    pub listing: Listing,
}

#[derive(Default)]
struct RegistryState {
    listings: HashMap<ListingId, Listing>,
    sequence: u64,
}

/// In-memory listing registry. Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryListingRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl InMemoryListingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of resolvable listings
    pub async fn len(&self) -> usize {
        self.state.read().await.listings.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait::async_trait]
impl ListingRegistry for InMemoryListingRegistry {
    async fn create(&self, owner: &Actor, input: NewListing) -> Result<Listing> {
        if owner.role != UserRole::Player {
            return Err(FeltError::unauthorized(format!(
                "only players can post listings, not {}",
                owner.role
            )));
        }
        input.validate()?;

        let mut state = self.state.write().await;
        state.sequence += 1;

        let payment_methods: BTreeSet<String> = input
            .payment_methods
            .into_iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();

        let listing = Listing {
            id: ListingId::new(),
            owner: owner.id,
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            details: input.details,
            payment_methods,
            status: ListingStatus::PendingApproval,
            featured: false,
            rejection_reason: None,
            created: Stamp::now(state.sequence),
        };
        state.listings.insert(listing.id, listing.clone());

        tracing::info!(
            listing_id = %listing.id,
            owner = %listing.owner,
            listing_type = %listing.listing_type(),
            "Listing created"
        );
        Ok(listing)
    }

    async fn get(&self, id: &ListingId) -> Result<Listing> {
        let state = self.state.read().await;
        state
            .listings
            .get(id)
            .cloned()
            .ok_or_else(|| FeltError::not_found("Listing", id))
    }

    async fn transition(
        &self,
        id: &ListingId,
        actor: &Actor,
        target: ListingStatus,
        reason: Option<String>,
    ) -> Result<Transitioned> {
        let mut state = self.state.write().await;
        let listing = state
            .listings
            .get_mut(id)
            .ok_or_else(|| FeltError::not_found("Listing", id))?;

        let from = listing.status;
        let allowed = from
            .transition_actor(target)
            .ok_or_else(|| FeltError::InvalidTransition {
                listing_id: id.to_string(),
                from,
                to: target,
            })?;

        if !allowed.permits(actor, &listing.owner) {
            return Err(FeltError::unauthorized(format!(
                "{} {} may not move listing {} from {} to {}",
                actor.role, actor.id, id, from, target
            )));
        }

        listing.status = target;
        listing.rejection_reason = match target {
            ListingStatus::Rejected => reason
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
            _ => None,
        };

        tracing::info!(
            listing_id = %id,
            actor = %actor.id,
            from = %from,
            to = %target,
            reason = ?listing.rejection_reason,
            "Listing transitioned"
        );
        Ok(Transitioned {
            from,
            listing: listing.clone(),
        })
    }

    async fn toggle_feature(&self, id: &ListingId, actor: &Actor) -> Result<Listing> {
        let mut state = self.state.write().await;
        let listing = state
            .listings
            .get_mut(id)
            .ok_or_else(|| FeltError::not_found("Listing", id))?;

        if !actor.is_admin() {
            return Err(FeltError::unauthorized("only admins can feature listings"));
        }

        listing.featured = !listing.featured;
        tracing::info!(listing_id = %id, featured = listing.featured, "Listing feature toggled");
        Ok(listing.clone())
    }

    async fn delete(&self, id: &ListingId, actor: &Actor) -> Result<Listing> {
        let mut state = self.state.write().await;
        let listing = state
            .listings
            .get(id)
            .ok_or_else(|| FeltError::not_found("Listing", id))?;

        if listing.owner != actor.id {
            return Err(FeltError::unauthorized("only the owner can delete a listing"));
        }
        if !listing.status.is_deletable() {
            return Err(FeltError::NotDeletable {
                listing_id: id.to_string(),
                status: listing.status,
            });
        }

        let removed = state
            .listings
            .remove(id)
            .ok_or_else(|| FeltError::not_found("Listing", id))?;
        tracing::info!(listing_id = %id, status = %removed.status, "Listing deleted");
        Ok(removed)
    }

    async fn list(&self, filter: &ListingFilter) -> Vec<Listing> {
        let state = self.state.read().await;
        let mut listings: Vec<Listing> = state
            .listings
            .values()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect();
        listings.sort_by(|a, b| filter.sort.compare(a, b));

        tracing::debug!(count = listings.len(), sort = ?filter.sort, "Listings queried");
        listings
    }
}
