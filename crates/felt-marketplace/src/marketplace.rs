//! The marketplace facade
//!
//! Every operation resolves the acting user from the identity provider and
//! delegates to the component that owns the entity. Events are emitted only
//! after the owning component has committed.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use felt_ledger::RatingLedger;
use felt_llm::{EnhancementCategory, LLMRouter, LlmTextEnhancer, TextEnhancer};
use felt_types::*;
use tokio::sync::{broadcast, RwLock};

use crate::config::{EnhancementConfig, MarketplaceConfig};
use crate::conversations::{ConversationStore, InMemoryConversationStore, SendOutcome};
use crate::events::{EventBus, MarketplaceEvent};
use crate::policy;
use crate::registry::{InMemoryListingRegistry, ListingRegistry, Transitioned};
use crate::users::{IdentityProvider, UserDirectory, UserView};

/// Felt marketplace: listings, ratings and conversations behind one API
pub struct Marketplace {
    pub(crate) listings: Arc<dyn ListingRegistry>,
    pub(crate) conversations: Arc<dyn ConversationStore>,
    pub(crate) ledger: RatingLedger,
    pub(crate) users: UserDirectory,
    identity: Arc<dyn IdentityProvider>,
    enhancer: Option<Arc<dyn TextEnhancer>>,
    events: EventBus,
    /// Status changes take this exclusively; opening a listing conversation
    /// holds it shared from the status check until the conversation exists.
    status_gate: RwLock<()>,
}

impl Marketplace {
    /// In-memory marketplace configured from `config`
    pub fn new(config: &MarketplaceConfig, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            listings: Arc::new(InMemoryListingRegistry::new()),
            conversations: Arc::new(InMemoryConversationStore::new()),
            ledger: RatingLedger::new(),
            users: UserDirectory::new(),
            identity,
            enhancer: build_enhancer(&config.enhancement),
            events: EventBus::new(config.event_capacity),
            status_gate: RwLock::new(()),
        }
    }

    /// Replace the text enhancer (`None` disables enhancement)
    pub fn with_enhancer(mut self, enhancer: Option<Arc<dyn TextEnhancer>>) -> Self {
        self.enhancer = enhancer;
        self
    }

    /// Use a different listing registry
    pub fn with_listing_registry(mut self, listings: Arc<dyn ListingRegistry>) -> Self {
        self.listings = listings;
        self
    }

    /// Use a different conversation store
    pub fn with_conversation_store(mut self, conversations: Arc<dyn ConversationStore>) -> Self {
        self.conversations = conversations;
        self
    }

    pub fn users(&self) -> &UserDirectory {
        &self.users
    }

    pub fn ledger(&self) -> &RatingLedger {
        &self.ledger
    }

    /// Subscribe to marketplace events
    pub fn subscribe(&self) -> broadcast::Receiver<MarketplaceEvent> {
        self.events.subscribe()
    }

    fn actor(&self) -> Result<Actor> {
        self.identity
            .current_user()
            .ok_or_else(|| FeltError::unauthorized("no user is signed in"))
    }

    // ========================================================================
    // Listings
    // ========================================================================

    /// Post a listing as the current player
    pub async fn create_listing(&self, input: NewListing) -> Result<Listing> {
        let actor = self.actor()?;
        let listing = self.listings.create(&actor, input).await?;
        self.events.emit(MarketplaceEvent::ListingCreated {
            listing_id: listing.id,
            owner: listing.owner,
            listing_type: listing.listing_type(),
            timestamp: Utc::now(),
        });
        Ok(listing)
    }

    pub async fn get_listing(&self, id: &ListingId) -> Result<Listing> {
        self.listings.get(id).await
    }

    /// Move a listing through the moderation state machine
    pub async fn transition_listing(
        &self,
        id: &ListingId,
        target: ListingStatus,
        reason: Option<String>,
    ) -> Result<Listing> {
        let actor = self.actor()?;
        let _gate = self.status_gate.write().await;
        let Transitioned { from, listing } =
            self.listings.transition(id, &actor, target, reason).await?;
        self.events.emit(MarketplaceEvent::ListingTransitioned {
            listing_id: listing.id,
            actor: actor.id,
            from,
            to: listing.status,
            reason: listing.rejection_reason.clone(),
            timestamp: Utc::now(),
        });
        Ok(listing)
    }

    pub async fn toggle_feature(&self, id: &ListingId) -> Result<Listing> {
        let actor = self.actor()?;
        let listing = self.listings.toggle_feature(id, &actor).await?;
        self.events.emit(MarketplaceEvent::ListingFeatured {
            listing_id: listing.id,
            featured: listing.featured,
            timestamp: Utc::now(),
        });
        Ok(listing)
    }

    pub async fn delete_listing(&self, id: &ListingId) -> Result<()> {
        let actor = self.actor()?;
        let removed = self.listings.delete(id, &actor).await?;
        self.events.emit(MarketplaceEvent::ListingDeleted {
            listing_id: removed.id,
            status: removed.status,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    pub async fn list_listings(&self, filter: &ListingFilter) -> Vec<Listing> {
        self.listings.list(filter).await
    }

    /// Rewrite listing text through the enhancement collaborator.
    ///
    /// Never touches marketplace state; fails with `ServiceUnavailable` when
    /// no enhancer is configured.
    pub async fn enhance_description(
        &self,
        text: &str,
        category: EnhancementCategory,
    ) -> Result<String> {
        let Some(enhancer) = &self.enhancer else {
            tracing::warn!("Enhancement requested but no enhancer is configured");
            return Err(FeltError::service_unavailable("text enhancement is not configured"));
        };
        enhancer.enhance(text, category).await.map_err(FeltError::from)
    }

    // ========================================================================
    // Ratings
    // ========================================================================

    /// Rate the other side of a completed deal as the current user
    pub async fn submit_rating(&self, input: NewRating) -> Result<Rating> {
        let actor = self.actor()?;
        if actor.id != input.rater {
            return Err(FeltError::unauthorized("ratings can only be given as yourself"));
        }

        let listing = self.listings.get(&input.listing).await?;
        let rater = self.users.get(&input.rater)?;
        let ratee = self.users.get(&input.ratee)?;
        let key = ConversationKey::new(rater.id, ratee.id, Some(listing.id))?;
        let has_deal_thread = self.conversations.find(&key).await.is_some();

        policy::check_rating(&listing, &rater, &ratee, &input, has_deal_thread)?;

        let rating = self.ledger.submit(input).await?;
        let reputation = self.ledger.reputation(&rating.ratee).await;
        self.events.emit(MarketplaceEvent::RatingSubmitted {
            rating_id: rating.id,
            rater: rating.rater,
            ratee: rating.ratee,
            listing_id: rating.listing,
            score: rating.score,
            new_average: reputation.average_score,
            new_count: reputation.count,
            timestamp: Utc::now(),
        });
        Ok(rating)
    }

    pub async fn ratings_for(&self, user: &UserId, filter: RatingFilter) -> Vec<Rating> {
        self.ledger.ratings_for(user, filter).await
    }

    pub async fn reputation(&self, user: &UserId) -> Reputation {
        self.ledger.reputation(user).await
    }

    /// Whether the current user already rated `ratee` for `listing`
    pub async fn has_rated(&self, ratee: &UserId, listing: &ListingId) -> Result<bool> {
        let actor = self.actor()?;
        Ok(self.ledger.has_rated(&actor.id, ratee, listing).await)
    }

    /// Profile joined with reputation
    pub async fn user_view(&self, id: &UserId) -> Result<UserView> {
        let profile = self.users.get(id)?;
        let reputation = self.ledger.reputation(id).await;
        Ok(UserView {
            profile,
            reputation,
        })
    }

    // ========================================================================
    // Conversations
    // ========================================================================

    /// Durable conversation between `a` and `b`, or a transient one to
    /// compose into. The current user must be one of them.
    pub async fn find_or_prepare_conversation(
        &self,
        a: &UserId,
        b: &UserId,
        listing: Option<ListingId>,
    ) -> Result<ConversationView> {
        let actor = self.actor()?;
        if &actor.id != a && &actor.id != b {
            return Err(FeltError::unauthorized(
                "only participants can open a conversation",
            ));
        }
        self.users.get(a)?;
        self.users.get(b)?;
        if let Some(listing_id) = &listing {
            self.listings.get(listing_id).await?;
        }
        self.conversations.find_or_prepare(*a, *b, listing).await
    }

    /// Send a message as the current user
    pub async fn send_message(&self, target: ConversationTarget, body: &str) -> Result<SendOutcome> {
        let actor = self.actor()?;

        let _gate = match &target {
            ConversationTarget::Key(key) if key.listing().is_some() => {
                Some(self.status_gate.read().await)
            }
            _ => None,
        };

        if let ConversationTarget::Key(key) = &target {
            if let Some(counterpart) = key.counterpart(&actor.id) {
                self.users.get(&counterpart)?;
            }
            if let Some(listing_id) = key.listing() {
                if self.conversations.find(key).await.is_none() {
                    let listing = self.listings.get(&listing_id).await?;
                    let [a, b] = key.participants();
                    policy::check_new_conversation(&listing, &a, &b)?;
                }
            }
        }

        let outcome = self.conversations.send_message(target, actor.id, body).await?;

        let timestamp = Utc::now();
        if outcome.materialized {
            self.events.emit(MarketplaceEvent::ConversationMaterialized {
                conversation_id: outcome.conversation.id,
                participants: outcome.conversation.key.participants(),
                listing_id: outcome.conversation.key.listing(),
                timestamp,
            });
        }
        self.events.emit(MarketplaceEvent::MessageSent {
            conversation_id: outcome.conversation.id,
            message_id: outcome.message.id,
            sender: outcome.message.sender,
            receiver: outcome.message.receiver,
            timestamp,
        });
        Ok(outcome)
    }

    /// Messages of a conversation the current user takes part in, oldest first
    pub async fn messages_in(&self, id: &ConversationId) -> Result<Vec<Message>> {
        let actor = self.actor()?;
        let conversation = self.conversations.get(id).await?;
        if !conversation.key.involves(&actor.id) && !actor.is_admin() {
            return Err(FeltError::unauthorized("not a participant of this conversation"));
        }
        self.conversations.messages_in(id).await
    }

    /// Inbox of `user`, most recent activity first
    pub async fn conversations_for(&self, user: &UserId) -> Result<Vec<Conversation>> {
        let actor = self.actor()?;
        if &actor.id != user && !actor.is_admin() {
            return Err(FeltError::unauthorized("inboxes are private"));
        }
        Ok(self.conversations.conversations_for(user).await)
    }

    /// Mark the current user's incoming messages in a conversation as read
    pub async fn mark_read(&self, id: &ConversationId) -> Result<usize> {
        let actor = self.actor()?;
        let count = self.conversations.mark_read(id, &actor.id).await?;
        if count > 0 {
            self.events.emit(MarketplaceEvent::MessagesRead {
                conversation_id: *id,
                reader: actor.id,
                count,
                timestamp: Utc::now(),
            });
        }
        Ok(count)
    }

    /// Unread messages addressed to the current user
    pub async fn unread_count(&self) -> Result<usize> {
        let actor = self.actor()?;
        Ok(self.conversations.unread_count(&actor.id).await)
    }
}

fn build_enhancer(config: &EnhancementConfig) -> Option<Arc<dyn TextEnhancer>> {
    if !config.enabled {
        tracing::info!("Text enhancement disabled");
        return None;
    }
    let router = LLMRouter::from_kind(config.provider);
    tracing::info!(provider = %router.kind(), "Text enhancement enabled");
    let enhancer = LlmTextEnhancer::new(router.provider().clone())
        .with_timeout(Duration::from_secs(config.timeout_secs))
        .with_max_input_chars(config.max_input_chars);
    Some(Arc::new(enhancer))
}
