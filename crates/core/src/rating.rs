//! Votes, tallies and the toggle state machine.
//!
//! A user holds at most one vote per item. Asking for the vote already held
//! retracts it, asking for the other one switches, and an explicit clear
//! retracts whatever is held. Every backend plans its writes through
//! [`Transition::plan`] so they all follow the same table.

use crate::identity::ItemKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single user's vote on an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Up,
    Down,
}

impl Vote {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vote {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(crate::Error::InvalidRating(format!(
                "expected \"up\" or \"down\", got {other:?}"
            ))),
        }
    }
}

/// What a client asked the write path to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RatingIntent {
    /// Cast this vote, or retract it if it is already held.
    Set(Vote),
    /// Retract any vote currently held.
    Clear,
}

impl From<Option<Vote>> for RatingIntent {
    fn from(value: Option<Vote>) -> Self {
        match value {
            Some(vote) => Self::Set(vote),
            None => Self::Clear,
        }
    }
}

/// Classification of a planned transition, used for logging and metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionKind {
    /// No vote before, one after.
    Cast,
    /// A vote before, none after.
    Retract,
    /// One vote replaced by the other.
    Switch,
    /// Nothing to write.
    Unchanged,
}

impl TransitionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cast => "cast",
            Self::Retract => "retract",
            Self::Switch => "switch",
            Self::Unchanged => "unchanged",
        }
    }
}

/// The per-user state change for one write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub previous: Option<Vote>,
    pub next: Option<Vote>,
}

impl Transition {
    /// Plan the transition from the user's current vote.
    pub fn plan(current: Option<Vote>, intent: RatingIntent) -> Self {
        let next = match intent {
            RatingIntent::Clear => None,
            RatingIntent::Set(vote) if current == Some(vote) => None,
            RatingIntent::Set(vote) => Some(vote),
        };
        Self {
            previous: current,
            next,
        }
    }

    /// The vote whose counter must be decremented, if any.
    pub fn removed(&self) -> Option<Vote> {
        self.previous.filter(|p| self.next != Some(*p))
    }

    /// The vote whose counter must be incremented, if any.
    pub fn added(&self) -> Option<Vote> {
        self.next.filter(|n| self.previous != Some(*n))
    }

    /// Signed change to apply to the (up, down) counters.
    pub fn counter_deltas(&self) -> (i64, i64) {
        let mut up = 0;
        let mut down = 0;
        for (vote, delta) in [(self.removed(), -1), (self.added(), 1)] {
            match vote {
                Some(Vote::Up) => up += delta,
                Some(Vote::Down) => down += delta,
                None => {}
            }
        }
        (up, down)
    }

    pub fn kind(&self) -> TransitionKind {
        match (self.removed(), self.added()) {
            (None, Some(_)) => TransitionKind::Cast,
            (Some(_), None) => TransitionKind::Retract,
            (Some(_), Some(_)) => TransitionKind::Switch,
            (None, None) => TransitionKind::Unchanged,
        }
    }
}

/// Aggregate vote counts for one item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub thumbs_up: u64,
    pub thumbs_down: u64,
}

impl Tally {
    pub fn new(thumbs_up: u64, thumbs_down: u64) -> Self {
        Self {
            thumbs_up,
            thumbs_down,
        }
    }

    pub fn total(&self) -> u64 {
        self.thumbs_up.saturating_add(self.thumbs_down)
    }

    /// Apply a transition. Decrements saturate at zero.
    pub fn apply(mut self, transition: &Transition) -> Self {
        if let Some(vote) = transition.removed() {
            let counter = self.counter_mut(vote);
            *counter = counter.saturating_sub(1);
        }
        if let Some(vote) = transition.added() {
            let counter = self.counter_mut(vote);
            *counter = counter.saturating_add(1);
        }
        self
    }

    fn counter_mut(&mut self, vote: Vote) -> &mut u64 {
        match vote {
            Vote::Up => &mut self.thumbs_up,
            Vote::Down => &mut self.thumbs_down,
        }
    }
}

/// Read-path view of an item for one user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub thumbs_up: u64,
    pub thumbs_down: u64,
    pub user_rating: Option<Vote>,
}

impl RatingSummary {
    pub fn new(tally: Tally, user_rating: Option<Vote>) -> Self {
        Self {
            thumbs_up: tally.thumbs_up,
            thumbs_down: tally.thumbs_down,
            user_rating,
        }
    }

    pub fn tally(&self) -> Tally {
        Tally::new(self.thumbs_up, self.thumbs_down)
    }
}

/// One leaderboard row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStats {
    pub item_key: ItemKey,
    pub thumbs_up: u64,
    pub thumbs_down: u64,
}

impl ItemStats {
    pub fn total(&self) -> u64 {
        self.thumbs_up.saturating_add(self.thumbs_down)
    }
}
