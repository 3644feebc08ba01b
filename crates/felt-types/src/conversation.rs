//! Conversation and message types for Felt
//!
//! A conversation is logically identified by its unordered participant pair
//! plus an optional listing. It is either transient (computed for display,
//! never stored) or durable (persisted once its first message is sent).

use crate::{ConversationId, FeltError, ListingId, MessageId, Result, Stamp, UserId};
use serde::{Deserialize, Serialize};

/// Logical identity of a conversation.
///
/// The participant pair is stored in canonical order, so `(a, b)` and
/// `(b, a)` produce the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    low: UserId,
    high: UserId,
    listing: Option<ListingId>,
}

impl ConversationKey {
    pub fn new(a: UserId, b: UserId, listing: Option<ListingId>) -> Result<Self> {
        if a == b {
            return Err(FeltError::validation(
                "participants",
                "a conversation needs two distinct participants",
            ));
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        Ok(Self { low, high, listing })
    }

    pub fn participants(&self) -> [UserId; 2] {
        [self.low, self.high]
    }

    pub fn listing(&self) -> Option<ListingId> {
        self.listing
    }

    pub fn involves(&self, user: &UserId) -> bool {
        &self.low == user || &self.high == user
    }

    /// The participant that is not `user`
    pub fn counterpart(&self, user: &UserId) -> Option<UserId> {
        if &self.low == user {
            Some(self.high)
        } else if &self.high == user {
            Some(self.low)
        } else {
            None
        }
    }
}

/// A message inside a durable conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation: ConversationId,
    pub sender: UserId,
    pub receiver: UserId,
    pub body: String,
    pub sent: Stamp,
    /// Delivery state; flipped by the receiver
    pub read: bool,
}

/// A durable conversation record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub key: ConversationKey,
    /// Most recent message; always present once durable
    pub last_message: Message,
    pub created: Stamp,
}

/// A conversation as seen by a caller: either not yet persisted, or durable
/// with its message history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase")]
pub enum ConversationView {
    Transient {
        key: ConversationKey,
    },
    Durable {
        conversation: Conversation,
        messages: Vec<Message>,
    },
}

impl ConversationView {
    pub fn key(&self) -> &ConversationKey {
        match self {
            Self::Transient { key } => key,
            Self::Durable { conversation, .. } => &conversation.key,
        }
    }

    pub fn id(&self) -> Option<ConversationId> {
        match self {
            Self::Transient { .. } => None,
            Self::Durable { conversation, .. } => Some(conversation.id),
        }
    }

    pub fn messages(&self) -> &[Message] {
        match self {
            Self::Transient { .. } => &[],
            Self::Durable { messages, .. } => messages,
        }
    }

    pub fn is_durable(&self) -> bool {
        matches!(self, Self::Durable { .. })
    }

    /// Address this conversation for a send
    pub fn target(&self) -> ConversationTarget {
        match self {
            Self::Transient { key } => ConversationTarget::Key(*key),
            Self::Durable { conversation, .. } => ConversationTarget::Id(conversation.id),
        }
    }
}

/// Where a message should go: a logical key (materializing if needed) or a
/// known durable conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversationTarget {
    Key(ConversationKey),
    Id(ConversationId),
}

impl From<ConversationKey> for ConversationTarget {
    fn from(key: ConversationKey) -> Self {
        Self::Key(key)
    }
}

impl From<ConversationId> for ConversationTarget {
    fn from(id: ConversationId) -> Self {
        Self::Id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_unordered() {
        let a = UserId::new();
        let b = UserId::new();
        let listing = Some(ListingId::new());
        assert_eq!(
            ConversationKey::new(a, b, listing).unwrap(),
            ConversationKey::new(b, a, listing).unwrap()
        );
    }

    #[test]
    fn test_key_distinguishes_listing_context() {
        let a = UserId::new();
        let b = UserId::new();
        let general = ConversationKey::new(a, b, None).unwrap();
        let scoped = ConversationKey::new(a, b, Some(ListingId::new())).unwrap();
        assert_ne!(general, scoped);
    }

    #[test]
    fn test_key_rejects_single_participant() {
        let a = UserId::new();
        assert!(ConversationKey::new(a, a, None).is_err());
    }

    #[test]
    fn test_counterpart() {
        let a = UserId::new();
        let b = UserId::new();
        let key = ConversationKey::new(a, b, None).unwrap();
        assert_eq!(key.counterpart(&a), Some(b));
        assert_eq!(key.counterpart(&b), Some(a));
        assert_eq!(key.counterpart(&UserId::new()), None);
    }

    #[test]
    fn test_transient_view_has_no_identity() {
        let key = ConversationKey::new(UserId::new(), UserId::new(), None).unwrap();
        let view = ConversationView::Transient { key };
        assert!(view.id().is_none());
        assert!(view.messages().is_empty());
        assert_eq!(view.target(), ConversationTarget::Key(key));
    }
}
