//! Demo data
//!
//! Loads a small, realistic marketplace: five users, seven listings across
//! every status, three historical ratings and two conversations. Data is
//! written straight into the components with explicit actors, so no identity
//! is needed and no events are emitted.

use felt_types::*;

use crate::marketplace::Marketplace;

/// Handles to the seeded entities
#[derive(Debug, Clone)]
pub struct DemoData {
    pub player: UserProfile,
    pub backer: UserProfile,
    pub admin: UserProfile,
    pub plo_player: UserProfile,
    pub high_roller: UserProfile,
    pub main_event: ListingId,
    pub plo_coaching: ListingId,
    pub mtt_review: ListingId,
    pub online_series: ListingId,
    pub local_series: ListingId,
    pub circuit_event: ListingId,
    pub vague_proposal: ListingId,
}

fn staking(
    game_type: &str,
    venue: &str,
    total_buy_in: f64,
    markup: f64,
    sale: f64,
    min: f64,
    max: f64,
) -> ListingDetails {
    ListingDetails::Staking(StakingDetails {
        game_type: game_type.to_string(),
        event_venue_details: venue.to_string(),
        total_buy_in,
        markup,
        percentage_for_sale: sale,
        min_purchase_percentage: min,
        max_purchase_percentage: max,
    })
}

fn listing(title: &str, description: &str, details: ListingDetails, payment: &[&str]) -> NewListing {
    NewListing {
        title: title.to_string(),
        description: description.to_string(),
        details,
        payment_methods: payment.iter().map(|p| p.to_string()).collect(),
    }
}

fn users() -> [UserProfile; 5] {
    [
        UserProfile::new("PokerPro123", UserRole::Player)
            .with_bio(
                "Experienced NLH tournament player with multiple cashes in major events. \
                 Looking for backers for upcoming series. Also offering coaching for \
                 mid-stakes players.",
            )
            .with_preferred_games(vec!["NLH Tournaments".into(), "MTT Series".into()])
            .with_verification_links(VerificationLinks {
                hendon_mob: Some("https://pokerdb.thehendonmob.com/player.php?a=r&n=12345".into()),
                twitter: Some("https://twitter.com/pokerpro123".into()),
                ..Default::default()
            }),
        UserProfile::new("StakeKing", UserRole::Backer)
            .with_bio("Active backer looking for talented players with solid results and good markup.")
            .with_preferred_games(vec!["NLH Tournaments".into()]),
        UserProfile::new("MarketplaceAdmin", UserRole::Admin)
            .with_bio("Felt Marketplace Administrator."),
        UserProfile::new("CardSharkGrrl", UserRole::Player)
            .with_bio("PLO specialist, crushing online cash games. Offering advanced PLO coaching.")
            .with_preferred_games(vec!["PLO Cash".into(), "Online Poker".into()])
            .with_verification_links(VerificationLinks {
                shark_scope: Some(
                    "https://www.sharkscope.com/#Player-Statistics//networks/Unknown/players/CardSharkGrrl"
                        .into(),
                ),
                ..Default::default()
            }),
        UserProfile::new("HighRollerInvest", UserRole::Backer)
            .with_bio(
                "Looking for long-term staking arrangements with proven winners in high stakes MTTs.",
            )
            .with_preferred_games(vec!["High Stakes MTTs".into()]),
    ]
}

/// Load the demo data set into a fresh marketplace
pub async fn load_demo(market: &Marketplace) -> Result<DemoData> {
    let [player, backer, admin, plo_player, high_roller] = users();
    for profile in [&player, &backer, &admin, &plo_player, &high_roller] {
        market.users.register(profile.clone())?;
    }
    let (p1, p2, moderator) = (player.actor(), plo_player.actor(), admin.actor());
    let registry = &market.listings;

    let main_event = registry
        .create(
            &p1,
            listing(
                "Staking for 2024 WSOP Main Event",
                "Selling action for the WSOP 2024 Main Event. Proven track record in deep stack \
                 tournaments. Includes regular updates throughout the event. Looking for serious backers.",
                staking("Tournament", "WSOP Main Event, Las Vegas", 10_000.0, 1.25, 50.0, 1.0, 10.0),
                &["PayPal", "Crypto"],
            ),
        )
        .await?
        .id;
    registry
        .transition(&main_event, &moderator, ListingStatus::Active, None)
        .await?;
    registry.toggle_feature(&main_event, &moderator).await?;

    let plo_coaching = registry
        .create(
            &p2,
            listing(
                "Advanced PLO Cash Game Coaching",
                "One-on-one PLO coaching for players looking to move up in stakes. Hand history \
                 reviews, GTO concepts, and mental game. Customized sessions based on your needs.",
                ListingDetails::Coaching(CoachingDetails {
                    service_type: "Coaching".into(),
                    price: CoachingPrice::PerHour(150.0),
                    session_duration: Some("60-90 minutes".into()),
                }),
                &["Bank Transfer"],
            ),
        )
        .await?
        .id;
    registry
        .transition(&plo_coaching, &moderator, ListingStatus::Active, None)
        .await?;

    let mtt_review = registry
        .create(
            &p1,
            listing(
                "NLH Mid-Stakes Tournament Coaching",
                "Coaching for NLH MTT players struggling to break through mid-stakes. Focus on \
                 preflop strategy, ICM, and final table play. Will review your database and \
                 provide actionable advice.",
                ListingDetails::Coaching(CoachingDetails {
                    service_type: "Hand History Review".into(),
                    price: CoachingPrice::PerSession(200.0),
                    session_duration: Some("2 hours (approx)".into()),
                }),
                &["PayPal"],
            ),
        )
        .await?
        .id;

    let online_series = registry
        .create(
            &p2,
            listing(
                "Staking for Online High Roller Series",
                "Looking for backers for the upcoming 'Titans of Poker' online series. Average \
                 buy-in $1k. Strong ROI in similar fields. Full schedule and past results \
                 available on request.",
                staking("Online Series", "GG Poker - Titans of Poker Series", 25_000.0, 1.15, 60.0, 2.0, 20.0),
                &["Crypto (USDT/BTC)"],
            ),
        )
        .await?
        .id;
    registry
        .transition(&online_series, &moderator, ListingStatus::Active, None)
        .await?;

    let local_series = registry
        .create(
            &p1,
            listing(
                "Paused Staking Package for Local Series",
                "This package is currently on hold. Will resume soon.",
                staking("Tournament Series", "Local Casino Fest", 1_000.0, 1.1, 30.0, 5.0, 10.0),
                &["Cash"],
            ),
        )
        .await?
        .id;
    registry
        .transition(&local_series, &moderator, ListingStatus::Active, None)
        .await?;
    registry
        .transition(&local_series, &p1, ListingStatus::Paused, None)
        .await?;

    let circuit_event = registry
        .create(
            &p1,
            listing(
                "Completed WSOP Circuit Event Staking",
                "This staking for the WSOP Circuit event has been completed. Thanks to all backers!",
                staking("Tournament", "WSOP Circuit - Online", 500.0, 1.2, 40.0, 2.0, 10.0),
                &["PayPal"],
            ),
        )
        .await?
        .id;
    registry
        .transition(&circuit_event, &moderator, ListingStatus::Active, None)
        .await?;
    registry
        .transition(&circuit_event, &p1, ListingStatus::Completed, None)
        .await?;

    let vague_proposal = registry
        .create(
            &p2,
            listing(
                "Unclear Staking Proposal",
                "Requesting stake for 'various online games', markup 1.5. No schedule.",
                staking("Online Cash", "Various", 1_000.0, 1.5, 20.0, 5.0, 20.0),
                &["Crypto"],
            ),
        )
        .await?
        .id;
    registry
        .transition(
            &vague_proposal,
            &moderator,
            ListingStatus::Rejected,
            Some(
                "Listing details are too vague. Please provide a specific schedule and game types."
                    .into(),
            ),
        )
        .await?;

    // Historical ratings predate the current deal flow and go straight to the ledger
    market
        .ledger
        .submit(
            NewRating::new(backer.id, player.id, main_event, 5)
                .with_comment(
                    "Excellent communication and updates throughout the tournament. Very professional!",
                )
                .with_aspect(RatingAspect::Professionalism, 5)
                .with_aspect(RatingAspect::Transparency, 5)
                .with_aspect(RatingAspect::Communication, 5),
        )
        .await?;
    market
        .ledger
        .submit(
            NewRating::new(player.id, backer.id, main_event, 5)
                .with_comment("Payment was prompt. Great backer to work with.")
                .with_aspect(RatingAspect::PaymentSpeed, 5)
                .with_aspect(RatingAspect::Communication, 5),
        )
        .await?;
    market
        .ledger
        .submit(
            NewRating::new(backer.id, plo_player.id, plo_coaching, 4)
                .with_comment("Very insightful PLO coaching, helped my game a lot!")
                .with_aspect(RatingAspect::Professionalism, 4)
                .with_aspect(RatingAspect::Communication, 5),
        )
        .await?;

    let store = &market.conversations;
    let main_event_thread = ConversationKey::new(backer.id, player.id, Some(main_event))?;
    let first = store
        .send_message(
            main_event_thread.into(),
            backer.id,
            "Hi, interested in your WSOP Main Event package. Can you share more details on your \
             past results in similar events?",
        )
        .await?;
    store
        .send_message(
            first.conversation.id.into(),
            player.id,
            "Sure! I can send over my Hendon Mob and a summary. What percentage are you considering?",
        )
        .await?;
    store.mark_read(&first.conversation.id, &player.id).await?;

    let plo_thread = ConversationKey::new(plo_player.id, backer.id, Some(plo_coaching))?;
    let pitch = store
        .send_message(
            plo_thread.into(),
            plo_player.id,
            "Hey, I saw your profile. I offer PLO coaching if you are interested in improving \
             that part of your game.",
        )
        .await?;
    store.mark_read(&pitch.conversation.id, &backer.id).await?;

    let listings = registry.list(&ListingFilter::new()).await.len();
    let ratings = market.ledger.entry_count().await;
    tracing::info!(
        users = market.users.len(),
        listings,
        ratings,
        "Demo data loaded"
    );

    Ok(DemoData {
        player,
        backer,
        admin,
        plo_player,
        high_roller,
        main_event,
        plo_coaching,
        mtt_review,
        online_series,
        local_series,
        circuit_event,
        vague_proposal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarketplaceConfig;
    use crate::users::MockIdentity;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_demo_covers_every_status() {
        let market = Marketplace::new(&MarketplaceConfig::default(), Arc::new(MockIdentity::new()));
        let demo = load_demo(&market).await.unwrap();

        let all = market.list_listings(&ListingFilter::new()).await;
        assert_eq!(all.len(), 7);
        for status in [
            ListingStatus::PendingApproval,
            ListingStatus::Active,
            ListingStatus::Paused,
            ListingStatus::Completed,
            ListingStatus::Rejected,
        ] {
            assert!(all.iter().any(|l| l.status == status), "missing {}", status);
        }

        let main_event = market.get_listing(&demo.main_event).await.unwrap();
        assert!(main_event.featured);
        assert_eq!(main_event.cost_per_percent(), Some(125.0));

        let rejected = market.get_listing(&demo.vague_proposal).await.unwrap();
        assert!(rejected.rejection_reason.is_some());

        assert_eq!(market.reputation(&demo.player.id).await.average_score, 5.0);
        assert_eq!(market.reputation(&demo.plo_player.id).await.count, 1);
        assert_eq!(market.users().len(), 5);
    }
}
