//! Repository traits for rating operations.

pub mod ratings;
pub mod stats;

pub use ratings::RatingRepo;
pub use stats::StatsRepo;
