//! Core domain types for tally, a thumbs up/down counter for trivia items.
//!
//! This crate defines the data model shared by the store, the server and
//! the command-line client:
//! - Content-addressed item identity and best-effort user identity
//! - Votes, intents and the toggle state machine
//! - Aggregate tallies and the read-path summary
//! - Configuration shared by the binaries

pub mod config;
pub mod error;
pub mod identity;
pub mod rating;

pub use error::{Error, Result};
pub use identity::{ItemIdentity, ItemKey, UserId};
pub use rating::{
    ItemStats, RatingIntent, RatingSummary, Tally, Transition, TransitionKind, Vote,
};

/// Upper bound on rows returned by the stats leaderboard.
pub const MAX_STATS_ITEMS: u32 = 100;
