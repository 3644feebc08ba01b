//! Marketplace events for refresh-style consumers
//!
//! Every committed mutation is broadcast to all subscribers. Sending with no
//! subscribers is not an error.

use chrono::{DateTime, Utc};
use felt_types::{
    ConversationId, ListingId, ListingStatus, ListingType, MessageId, RatingId, UserId,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Marketplace-wide events emitted after a mutation commits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MarketplaceEvent {
    /// A player posted a listing (always PendingApproval)
    ListingCreated {
        listing_id: ListingId,
        owner: UserId,
        listing_type: ListingType,
        timestamp: DateTime<Utc>,
    },

    /// A listing moved between statuses
    ListingTransitioned {
        listing_id: ListingId,
        actor: UserId,
        from: ListingStatus,
        to: ListingStatus,
        reason: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// Admin flipped the featured flag
    ListingFeatured {
        listing_id: ListingId,
        featured: bool,
        timestamp: DateTime<Utc>,
    },

    /// Owner removed a listing
    ListingDeleted {
        listing_id: ListingId,
        status: ListingStatus,
        timestamp: DateTime<Utc>,
    },

    /// Rating appended to the ledger
    RatingSubmitted {
        rating_id: RatingId,
        rater: UserId,
        ratee: UserId,
        listing_id: ListingId,
        score: u8,
        new_average: f64,
        new_count: u32,
        timestamp: DateTime<Utc>,
    },

    /// A transient conversation became durable
    ConversationMaterialized {
        conversation_id: ConversationId,
        participants: [UserId; 2],
        listing_id: Option<ListingId>,
        timestamp: DateTime<Utc>,
    },

    /// Message appended to a durable conversation
    MessageSent {
        conversation_id: ConversationId,
        message_id: MessageId,
        sender: UserId,
        receiver: UserId,
        timestamp: DateTime<Utc>,
    },

    /// A reader caught up on a conversation
    MessagesRead {
        conversation_id: ConversationId,
        reader: UserId,
        count: usize,
        timestamp: DateTime<Utc>,
    },
}

impl MarketplaceEvent {
    /// Get the timestamp of this event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            MarketplaceEvent::ListingCreated { timestamp, .. } => *timestamp,
            MarketplaceEvent::ListingTransitioned { timestamp, .. } => *timestamp,
            MarketplaceEvent::ListingFeatured { timestamp, .. } => *timestamp,
            MarketplaceEvent::ListingDeleted { timestamp, .. } => *timestamp,
            MarketplaceEvent::RatingSubmitted { timestamp, .. } => *timestamp,
            MarketplaceEvent::ConversationMaterialized { timestamp, .. } => *timestamp,
            MarketplaceEvent::MessageSent { timestamp, .. } => *timestamp,
            MarketplaceEvent::MessagesRead { timestamp, .. } => *timestamp,
        }
    }

    /// Get a short description for logging
    pub fn summary(&self) -> String {
        match self {
            MarketplaceEvent::ListingCreated { listing_id, listing_type, .. } => {
                format!("{} listing {} posted", listing_type, listing_id)
            }
            MarketplaceEvent::ListingTransitioned { listing_id, from, to, .. } => {
                format!("Listing {}: {} -> {}", listing_id, from, to)
            }
            MarketplaceEvent::ListingFeatured { listing_id, featured, .. } => {
                if *featured {
                    format!("Listing {} featured", listing_id)
                } else {
                    format!("Listing {} unfeatured", listing_id)
                }
            }
            MarketplaceEvent::ListingDeleted { listing_id, .. } => {
                format!("Listing {} deleted", listing_id)
            }
            MarketplaceEvent::RatingSubmitted { ratee, score, new_average, new_count, .. } => {
                format!(
                    "{} rated {} (now {:.1} over {})",
                    ratee, score, new_average, new_count
                )
            }
            MarketplaceEvent::ConversationMaterialized { conversation_id, .. } => {
                format!("Conversation {} started", conversation_id)
            }
            MarketplaceEvent::MessageSent { conversation_id, sender, .. } => {
                format!("{} wrote in {}", sender, conversation_id)
            }
            MarketplaceEvent::MessagesRead { conversation_id, reader, count, .. } => {
                format!("{} read {} message(s) in {}", reader, count, conversation_id)
            }
        }
    }
}

/// Broadcast bus for [`MarketplaceEvent`]s. Clones share the channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<MarketplaceEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Broadcast an event
    pub fn emit(&self, event: MarketplaceEvent) {
        tracing::trace!(event = %event.summary(), "Marketplace event");
        // Ignore send errors (no receivers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to marketplace events
    pub fn subscribe(&self) -> broadcast::Receiver<MarketplaceEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(4);
        bus.emit(MarketplaceEvent::ListingDeleted {
            listing_id: ListingId::new(),
            status: ListingStatus::Paused,
            timestamp: Utc::now(),
        });
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let listing_id = ListingId::new();
        bus.emit(MarketplaceEvent::ListingFeatured {
            listing_id,
            featured: true,
            timestamp: Utc::now(),
        });

        match rx.recv().await.unwrap() {
            MarketplaceEvent::ListingFeatured { listing_id: id, featured, .. } => {
                assert_eq!(id, listing_id);
                assert!(featured);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = MarketplaceEvent::MessagesRead {
            conversation_id: ConversationId::new(),
            reader: UserId::new(),
            count: 2,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "MessagesRead");
        assert_eq!(json["count"], 2);
    }
}
