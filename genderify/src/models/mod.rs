//! Data models for artist resolution

pub mod artist;
pub mod resolution;

pub use artist::{ArtistIdentity, GenderLabel};
pub use resolution::{MemberDistribution, ResolutionResult, ResolutionStatus};
