//! Racing callers against the same conversation key, the same listing and
//! the same ratee

use std::sync::Arc;

use felt_marketplace::*;
use felt_types::{
    CoachingDetails, CoachingPrice, ConversationId, ListingDetails, ListingId, Message, Result,
    UserId,
};

/// Registry that hands control back to the scheduler before every read and
/// status change, widening any window between them.
#[derive(Default)]
struct YieldingRegistry(InMemoryListingRegistry);

#[async_trait::async_trait]
impl ListingRegistry for YieldingRegistry {
    async fn create(&self, owner: &Actor, input: NewListing) -> Result<Listing> {
        self.0.create(owner, input).await
    }

    async fn get(&self, id: &ListingId) -> Result<Listing> {
        tokio::task::yield_now().await;
        self.0.get(id).await
    }

    async fn transition(
        &self,
        id: &ListingId,
        actor: &Actor,
        target: ListingStatus,
        reason: Option<String>,
    ) -> Result<Transitioned> {
        tokio::task::yield_now().await;
        self.0.transition(id, actor, target, reason).await
    }

    async fn toggle_feature(&self, id: &ListingId, actor: &Actor) -> Result<Listing> {
        self.0.toggle_feature(id, actor).await
    }

    async fn delete(&self, id: &ListingId, actor: &Actor) -> Result<Listing> {
        self.0.delete(id, actor).await
    }

    async fn list(&self, filter: &ListingFilter) -> Vec<Listing> {
        self.0.list(filter).await
    }
}

/// Store that yields before appending a message
#[derive(Default)]
struct YieldingStore(InMemoryConversationStore);

#[async_trait::async_trait]
impl ConversationStore for YieldingStore {
    async fn find_or_prepare(
        &self,
        a: UserId,
        b: UserId,
        listing: Option<ListingId>,
    ) -> Result<ConversationView> {
        self.0.find_or_prepare(a, b, listing).await
    }

    async fn find(&self, key: &ConversationKey) -> Option<Conversation> {
        self.0.find(key).await
    }

    async fn get(&self, id: &ConversationId) -> Result<Conversation> {
        self.0.get(id).await
    }

    async fn send_message(
        &self,
        target: ConversationTarget,
        sender: UserId,
        body: &str,
    ) -> Result<SendOutcome> {
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        self.0.send_message(target, sender, body).await
    }

    async fn messages_in(&self, id: &ConversationId) -> Result<Vec<Message>> {
        self.0.messages_in(id).await
    }

    async fn conversations_for(&self, user: &UserId) -> Vec<Conversation> {
        self.0.conversations_for(user).await
    }

    async fn mark_read(&self, id: &ConversationId, reader: &UserId) -> Result<usize> {
        self.0.mark_read(id, reader).await
    }

    async fn unread_count(&self, user: &UserId) -> usize {
        self.0.unread_count(user).await
    }
}

fn drain(events: &mut tokio::sync::broadcast::Receiver<MarketplaceEvent>) -> Vec<MarketplaceEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

async fn active_listing(market: &Marketplace, identity: &MockIdentity) -> (UserProfile, UserProfile, Listing) {
    let player = market
        .users()
        .register(UserProfile::new("CardSharkGrrl", UserRole::Player))
        .unwrap();
    let backer = market
        .users()
        .register(UserProfile::new("StakeKing", UserRole::Backer))
        .unwrap();
    let admin = market
        .users()
        .register(UserProfile::new("MarketplaceAdmin", UserRole::Admin))
        .unwrap();

    identity.login_as(&player);
    let listing = market
        .create_listing(NewListing {
            title: "Advanced PLO Cash Game Coaching".to_string(),
            description: "One-on-one PLO coaching".to_string(),
            details: ListingDetails::Coaching(CoachingDetails {
                service_type: "Coaching".to_string(),
                price: CoachingPrice::PerHour(150.0),
                session_duration: Some("60-90 minutes".to_string()),
            }),
            payment_methods: vec!["Bank Transfer".to_string()],
        })
        .await
        .unwrap();
    identity.login_as(&admin);
    let listing = market
        .transition_listing(&listing.id, ListingStatus::Active, None)
        .await
        .unwrap();
    (player, backer, listing)
}

#[tokio::test]
async fn test_two_first_messages_make_one_conversation() {
    let identity = MockIdentity::new();
    let market = Marketplace::new(&MarketplaceConfig::default(), Arc::new(identity.clone()));
    let (player, backer, listing) = active_listing(&market, &identity).await;

    identity.login_as(&backer);
    let key = ConversationKey::new(backer.id, player.id, Some(listing.id)).unwrap();

    let (first, second) = tokio::join!(
        market.send_message(key.into(), "Is 5% still available?"),
        market.send_message(key.into(), "Also interested in a package deal"),
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first.conversation.id, second.conversation.id);
    assert_eq!(
        [first.materialized, second.materialized]
            .iter()
            .filter(|m| **m)
            .count(),
        1
    );

    let inbox = market.conversations_for(&backer.id).await.unwrap();
    assert_eq!(inbox.len(), 1);

    let messages = market.messages_in(&inbox[0].id).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].sent <= messages[1].sent);
    let ids: Vec<_> = messages.iter().map(|m| m.id).collect();
    assert!(ids.contains(&first.message.id) && ids.contains(&second.message.id));
    assert_eq!(inbox[0].last_message.id, messages[1].id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_first_messages_across_threads() {
    let identity = MockIdentity::new();
    let market = Arc::new(Marketplace::new(
        &MarketplaceConfig::default(),
        Arc::new(identity.clone()),
    ));
    let (player, backer, listing) = active_listing(&market, &identity).await;
    identity.login_as(&backer);
    let key = ConversationKey::new(player.id, backer.id, Some(listing.id)).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let market = market.clone();
            tokio::spawn(async move {
                market
                    .send_message(key.into(), &format!("offer #{}", i))
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let inbox = market.conversations_for(&backer.id).await.unwrap();
    assert_eq!(inbox.len(), 1);
    let messages = market.messages_in(&inbox[0].id).await.unwrap();
    assert_eq!(messages.len(), 8);
    assert!(messages.windows(2).all(|w| w[0].sent <= w[1].sent));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_ratings_keep_aggregate_exact() {
    let ledger = felt_ledger::RatingLedger::new();
    let player = felt_types::UserId::new();
    let scores: Vec<u8> = (0..40).map(|i| (i % 5 + 1) as u8).collect();

    let handles: Vec<_> = scores
        .iter()
        .map(|score| {
            let ledger = ledger.clone();
            let score = *score;
            tokio::spawn(async move {
                ledger
                    .submit(NewRating::new(
                        felt_types::UserId::new(),
                        player,
                        felt_types::ListingId::new(),
                        score,
                    ))
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let reputation = ledger.reputation(&player).await;
    assert_eq!(reputation.count, 40);
    assert_eq!(reputation.average_score, 3.0);
    assert_eq!(reputation, ledger.derive_reputation(&player).await);
}

#[tokio::test]
async fn test_racing_transitions_report_their_real_predecessor() {
    let identity = MockIdentity::new();
    let market = Marketplace::new(&MarketplaceConfig::default(), Arc::new(identity.clone()))
        .with_listing_registry(Arc::new(YieldingRegistry::default()));
    let (_, _, listing) = active_listing(&market, &identity).await;
    let mut events = market.subscribe();

    let (paused, rejected) = tokio::join!(
        market.transition_listing(&listing.id, ListingStatus::Paused, None),
        market.transition_listing(
            &listing.id,
            ListingStatus::Rejected,
            Some("Duplicate listing".to_string())
        ),
    );
    assert_eq!(paused.unwrap().status, ListingStatus::Paused);
    assert_eq!(rejected.unwrap().status, ListingStatus::Rejected);

    let moves: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|event| match event {
            MarketplaceEvent::ListingTransitioned { from, to, .. } => Some((from, to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        moves,
        vec![
            (ListingStatus::Active, ListingStatus::Paused),
            (ListingStatus::Paused, ListingStatus::Rejected),
        ]
    );
}

#[tokio::test]
async fn test_pause_waits_for_listing_conversation_being_opened() {
    let identity = MockIdentity::new();
    let market = Marketplace::new(&MarketplaceConfig::default(), Arc::new(identity.clone()))
        .with_conversation_store(Arc::new(YieldingStore::default()));
    let (player, _, listing) = active_listing(&market, &identity).await;
    let admin = identity.current_user().unwrap();
    let key = ConversationKey::new(admin.id, player.id, Some(listing.id)).unwrap();
    let mut events = market.subscribe();

    let (sent, paused) = tokio::join!(
        market.send_message(key.into(), "Can you share the full schedule?"),
        market.transition_listing(&listing.id, ListingStatus::Paused, None),
    );
    assert!(sent.unwrap().materialized);
    assert_eq!(paused.unwrap().status, ListingStatus::Paused);

    let order: Vec<&str> = drain(&mut events)
        .iter()
        .map(|event| match event {
            MarketplaceEvent::ConversationMaterialized { .. } => "materialized",
            MarketplaceEvent::MessageSent { .. } => "message",
            MarketplaceEvent::ListingTransitioned { .. } => "transitioned",
            _ => "other",
        })
        .collect();
    assert_eq!(order, vec!["materialized", "message", "transitioned"]);
}
