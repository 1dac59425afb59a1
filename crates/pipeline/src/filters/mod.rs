//! Filter implementations for the record pipeline.
//!
//! This module contains all the concrete filter implementations
//! that can be composed into a FilterPipeline.

pub mod already_watched;
pub mod genre_membership;
pub mod minimum_rating;
pub mod mood_threshold;
pub mod studio_membership;
pub mod year_range;

// Re-export for convenience
pub use already_watched::AlreadyWatchedFilter;
pub use genre_membership::GenreMembershipFilter;
pub use minimum_rating::MinimumRatingFilter;
pub use mood_threshold::MoodThresholdFilter;
pub use studio_membership::StudioMembershipFilter;
pub use year_range::YearRangeFilter;
