//! Felt Demo
//!
//! Loads the demo marketplace and walks one staking deal end to end: a
//! player posts, an admin approves, a backer gets in touch, the player
//! completes and the backer leaves a rating.
//!
//! # Usage
//!
//! ```bash
//! # Seeded run with the offline enhancer
//! felt-demo
//!
//! # JSON logs, Ollama rewriting the listing text
//! felt-demo --log-format json --provider ollama
//!
//! # Environment overrides
//! FELT__MARKETPLACE__EVENT_CAPACITY=64 felt-demo
//! ```

mod config;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use felt_llm::ProviderKind;
use felt_marketplace::{
    load_demo, EnhancementCategory, ListingFilter, ListingStatus, Marketplace, MockIdentity,
    NewListing, NewRating, RatingFilter,
};
use felt_types::{ListingDetails, RatingAspect, StakingDetails};

use crate::config::{DemoConfig, LogFormat, LoggingConfig};

/// Felt Demo - staking deal walk-through
#[derive(Parser, Debug)]
#[command(name = "felt-demo")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML, JSON, or YAML)
    #[arg(short, long, env = "FELT_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "FELT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format
    #[arg(long, env = "FELT_LOG_FORMAT", value_enum)]
    log_format: Option<LogFormat>,

    /// Enhancement provider (ollama, openai_compat, gemini, deterministic)
    #[arg(long)]
    provider: Option<String>,

    /// Start from an empty marketplace
    #[arg(long)]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut demo_config = DemoConfig::load(args.config.as_deref())?;
    if let Some(level) = args.log_level {
        demo_config.logging.level = level;
    }
    if let Some(format) = args.log_format {
        demo_config.logging.format = format;
    }
    if let Some(provider) = args.provider {
        demo_config.marketplace.enhancement.provider = provider.parse::<ProviderKind>()?;
    }
    if args.no_seed {
        demo_config.marketplace.seed_demo_data = false;
    }

    init_logging(&demo_config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        provider = %demo_config.marketplace.enhancement.provider,
        "Starting Felt demo"
    );

    let identity = MockIdentity::new();
    let market = Marketplace::new(&demo_config.marketplace, Arc::new(identity.clone()));
    let mut events = market.subscribe();

    if !demo_config.marketplace.seed_demo_data {
        tracing::info!("Seeding disabled, nothing to walk through");
        return Ok(());
    }

    let demo = load_demo(&market).await?;
    let browse = market.list_listings(&ListingFilter::browse()).await;
    println!("Browse view ({} listings):", browse.len());
    for listing in &browse {
        println!("  [{}] {}{}", listing.status, listing.title, if listing.featured { " *" } else { "" });
    }

    // Player drafts a listing and has the text polished
    identity.login_as(&demo.player);
    let draft = "selling action for the main event, regular updates, proven deep stack results";
    let description = match market
        .enhance_description(draft, EnhancementCategory::Staking)
        .await
    {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "Enhancement failed, keeping the draft");
            draft.to_string()
        }
    };

    let listing = market
        .create_listing(NewListing {
            title: "Staking for 2025 WSOP Main Event".to_string(),
            description,
            details: ListingDetails::Staking(StakingDetails {
                game_type: "Tournament".to_string(),
                event_venue_details: "WSOP Main Event, Las Vegas".to_string(),
                total_buy_in: 10_000.0,
                markup: 1.25,
                percentage_for_sale: 50.0,
                min_purchase_percentage: 1.0,
                max_purchase_percentage: 10.0,
            }),
            payment_methods: vec!["PayPal".to_string(), "Crypto".to_string()],
        })
        .await?;
    println!(
        "\n{} posted '{}' ({}), cost per 1%: {:.2}",
        demo.player.username,
        listing.title,
        listing.status,
        listing.cost_per_percent().unwrap_or_default()
    );

    identity.login_as(&demo.admin);
    let listing = market
        .transition_listing(&listing.id, ListingStatus::Active, None)
        .await?;
    println!("{} approved it: {}", demo.admin.username, listing.status);

    identity.login_as(&demo.backer);
    let view = market
        .find_or_prepare_conversation(&demo.backer.id, &demo.player.id, Some(listing.id))
        .await?;
    let sent = market
        .send_message(view.target(), "I'd like 5% of your Main Event")
        .await?;
    println!(
        "{} messaged {} (new conversation: {})",
        demo.backer.username, demo.player.username, sent.materialized
    );

    identity.login_as(&demo.player);
    println!("{} has {} unread", demo.player.username, market.unread_count().await?);
    market.mark_read(&sent.conversation.id).await?;
    let listing = market
        .transition_listing(&listing.id, ListingStatus::Completed, None)
        .await?;
    println!("{} marked the deal {}", demo.player.username, listing.status);

    let prior = market.reputation(&demo.player.id).await;
    identity.login_as(&demo.backer);
    let rating = market
        .submit_rating(
            NewRating::new(demo.backer.id, demo.player.id, listing.id, 5)
                .with_comment("Great updates, paid out fast")
                .with_aspect(RatingAspect::Professionalism, 5)
                .with_aspect(RatingAspect::Transparency, 4)
                .with_aspect(RatingAspect::Communication, 5),
        )
        .await?;
    let reputation = market.reputation(&demo.player.id).await;
    println!(
        "{} rated {} {}/5: reputation {:.1} ({}) -> {:.1} ({})",
        demo.backer.username,
        demo.player.username,
        rating.score,
        prior.average_score,
        prior.count,
        reputation.average_score,
        reputation.count
    );

    let received = market
        .ratings_for(&demo.player.id, RatingFilter::received())
        .await;
    println!("{} has {} ratings on record", demo.player.username, received.len());
    println!(
        "Listing still visible as {}",
        market.get_listing(&listing.id).await?.status
    );

    println!("\nEvents:");
    while let Ok(event) = events.try_recv() {
        println!("  {}", event.summary());
    }

    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format {
        LogFormat::Json => {
            subscriber
                .with(fmt::layer().json().with_target(true))
                .init();
        }
        LogFormat::Pretty => {
            subscriber
                .with(fmt::layer().pretty().with_target(true))
                .init();
        }
    }

    Ok(())
}
