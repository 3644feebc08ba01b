//! Felt Marketplace - The engagement engine
//!
//! Three components, each owning its entities exclusively:
//! - Listing Registry: moderation state machine, browse queries
//! - Conversation Store: lazy materialization on first message
//! - Rating Ledger (from `felt-ledger`): append-only ratings and reputation
//!
//! The [`Marketplace`] facade resolves the acting user, applies the shared
//! policy gates and broadcasts [`MarketplaceEvent`]s after each commit.

pub use felt_types::{
    Actor, Conversation, ConversationKey, ConversationTarget, ConversationView, FeltError,
    Listing, ListingFilter, ListingStatus, Message, NewListing, NewRating, Rating, RatingFilter,
    Reputation, Result, UserProfile, UserRole,
};
pub use felt_llm::{EnhancementCategory, TextEnhancer};

pub mod config;
pub mod conversations;
pub mod events;
pub mod marketplace;
pub mod policy;
pub mod registry;
pub mod seed;
pub mod users;

pub use config::*;
pub use conversations::*;
pub use events::*;
pub use marketplace::*;
pub use registry::*;
pub use seed::*;
pub use users::*;
