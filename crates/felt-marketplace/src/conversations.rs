//! Conversation store
//!
//! Conversations are looked up by their logical key (unordered participant
//! pair plus optional listing). A conversation only becomes durable when its
//! first message is sent; before that it is handed out as a transient view
//! and never stored.
//!
//! # Invariants
//!
//! 1. At most one durable conversation per logical key
//! 2. Check-key-else-create runs as one step under the store's write lock
//! 3. Message stamps are non-decreasing within a conversation

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use felt_types::*;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Result of a successful send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOutcome {
    /// The conversation after the append
    pub conversation: Conversation,
    pub message: Message,
    /// True when this send turned a transient conversation durable
    pub materialized: bool,
}

/// Conversation store trait
#[async_trait::async_trait]
pub trait ConversationStore: Send + Sync {
    /// Durable conversation for the key, or a transient view if none exists
    async fn find_or_prepare(
        &self,
        a: UserId,
        b: UserId,
        listing: Option<ListingId>,
    ) -> Result<ConversationView>;

    /// Durable conversation for an exact key, if one exists
    async fn find(&self, key: &ConversationKey) -> Option<Conversation>;

    /// Get a durable conversation by id
    async fn get(&self, id: &ConversationId) -> Result<Conversation>;

    /// Append a message, materializing the conversation if needed
    async fn send_message(
        &self,
        target: ConversationTarget,
        sender: UserId,
        body: &str,
    ) -> Result<SendOutcome>;

    /// Messages of a conversation, oldest first
    async fn messages_in(&self, id: &ConversationId) -> Result<Vec<Message>>;

    /// Durable conversations of a user, most recent activity first
    async fn conversations_for(&self, user: &UserId) -> Vec<Conversation>;

    /// Mark every message addressed to `reader` as read; returns how many flipped
    async fn mark_read(&self, id: &ConversationId, reader: &UserId) -> Result<usize>;

    /// Unread messages addressed to `user` across all conversations
    async fn unread_count(&self, user: &UserId) -> usize;
}

#[derive(Default)]
struct StoreState {
    conversations: HashMap<ConversationId, Conversation>,
    messages: HashMap<ConversationId, Vec<Message>>,
    /// logical key -> durable id
    by_key: HashMap<ConversationKey, ConversationId>,
    /// participant -> durable ids
    by_user: HashMap<UserId, HashSet<ConversationId>>,
    sequence: u64,
}

impl StoreState {
    fn view(&self, id: &ConversationId) -> Option<ConversationView> {
        let conversation = self.conversations.get(id)?.clone();
        let messages = self.messages.get(id).cloned().unwrap_or_default();
        Some(ConversationView::Durable {
            conversation,
            messages,
        })
    }
}

/// In-memory conversation store. Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryConversationStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of durable conversations
    pub async fn conversation_count(&self) -> usize {
        self.state.read().await.conversations.len()
    }
}

#[async_trait::async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn find_or_prepare(
        &self,
        a: UserId,
        b: UserId,
        listing: Option<ListingId>,
    ) -> Result<ConversationView> {
        let key = ConversationKey::new(a, b, listing)?;
        let state = self.state.read().await;
        let view = state
            .by_key
            .get(&key)
            .and_then(|id| state.view(id))
            .unwrap_or(ConversationView::Transient { key });

        tracing::debug!(durable = view.is_durable(), listing = ?listing, "Conversation prepared");
        Ok(view)
    }

    async fn find(&self, key: &ConversationKey) -> Option<Conversation> {
        let state = self.state.read().await;
        state
            .by_key
            .get(key)
            .and_then(|id| state.conversations.get(id))
            .cloned()
    }

    async fn get(&self, id: &ConversationId) -> Result<Conversation> {
        let state = self.state.read().await;
        state
            .conversations
            .get(id)
            .cloned()
            .ok_or_else(|| FeltError::not_found("Conversation", id))
    }

    async fn send_message(
        &self,
        target: ConversationTarget,
        sender: UserId,
        body: &str,
    ) -> Result<SendOutcome> {
        let body = body.trim();
        if body.is_empty() {
            return Err(FeltError::validation("body", "message must not be empty"));
        }

        let mut state = self.state.write().await;

        // Resolve the target to (key, existing durable id) under the lock
        let (key, existing) = match target {
            ConversationTarget::Key(key) => (key, state.by_key.get(&key).copied()),
            ConversationTarget::Id(id) => {
                let conversation = state
                    .conversations
                    .get(&id)
                    .ok_or_else(|| FeltError::not_found("Conversation", id))?;
                (conversation.key, Some(id))
            }
        };

        let receiver = key.counterpart(&sender).ok_or_else(|| {
            FeltError::unauthorized(format!("{} is not a participant of this conversation", sender))
        })?;

        state.sequence += 1;
        let sequence = state.sequence;
        let materialized = existing.is_none();
        let conversation_id = existing.unwrap_or_default();

        let floor = state
            .conversations
            .get(&conversation_id)
            .map(|c| c.last_message.sent);
        let message = Message {
            id: MessageId::new(),
            conversation: conversation_id,
            sender,
            receiver,
            body: body.to_string(),
            sent: Stamp::not_before(floor.as_ref(), sequence),
            read: false,
        };

        if materialized {
            state.conversations.insert(
                conversation_id,
                Conversation {
                    id: conversation_id,
                    key,
                    last_message: message.clone(),
                    created: message.sent,
                },
            );
            state.by_key.insert(key, conversation_id);
            for participant in key.participants() {
                state
                    .by_user
                    .entry(participant)
                    .or_default()
                    .insert(conversation_id);
            }
            tracing::info!(
                conversation_id = %conversation_id,
                listing = ?key.listing(),
                "Conversation materialized"
            );
        }

        state
            .messages
            .entry(conversation_id)
            .or_default()
            .push(message.clone());
        let conversation = state
            .conversations
            .get_mut(&conversation_id)
            .ok_or_else(|| FeltError::not_found("Conversation", conversation_id))?;
        conversation.last_message = message.clone();
        let conversation = conversation.clone();

        tracing::info!(
            conversation_id = %conversation_id,
            message_id = %message.id,
            sender = %sender,
            receiver = %receiver,
            "Message appended"
        );

        Ok(SendOutcome {
            conversation,
            message,
            materialized,
        })
    }

    async fn messages_in(&self, id: &ConversationId) -> Result<Vec<Message>> {
        let state = self.state.read().await;
        if !state.conversations.contains_key(id) {
            return Err(FeltError::not_found("Conversation", id));
        }
        Ok(state.messages.get(id).cloned().unwrap_or_default())
    }

    async fn conversations_for(&self, user: &UserId) -> Vec<Conversation> {
        let state = self.state.read().await;
        let mut conversations: Vec<Conversation> = state
            .by_user
            .get(user)
            .into_iter()
            .flatten()
            .filter_map(|id| state.conversations.get(id))
            .cloned()
            .collect();
        conversations.sort_by(|a, b| b.last_message.sent.cmp(&a.last_message.sent));

        tracing::debug!(user = %user, count = conversations.len(), "Inbox queried");
        conversations
    }

    async fn mark_read(&self, id: &ConversationId, reader: &UserId) -> Result<usize> {
        let mut state = self.state.write().await;
        let state = &mut *state;

        let conversation = state
            .conversations
            .get_mut(id)
            .ok_or_else(|| FeltError::not_found("Conversation", id))?;
        if !conversation.key.involves(reader) {
            return Err(FeltError::unauthorized(format!(
                "{} is not a participant of this conversation",
                reader
            )));
        }

        let mut flipped = 0;
        for message in state.messages.get_mut(id).into_iter().flatten() {
            if &message.receiver == reader && !message.read {
                message.read = true;
                flipped += 1;
            }
        }
        if &conversation.last_message.receiver == reader {
            conversation.last_message.read = true;
        }

        if flipped > 0 {
            tracing::debug!(conversation_id = %id, reader = %reader, count = flipped, "Messages read");
        }
        Ok(flipped)
    }

    async fn unread_count(&self, user: &UserId) -> usize {
        let state = self.state.read().await;
        state
            .by_user
            .get(user)
            .into_iter()
            .flatten()
            .filter_map(|id| state.messages.get(id))
            .flatten()
            .filter(|m| &m.receiver == user && !m.read)
            .count()
    }
}
