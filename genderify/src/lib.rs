//! genderify library interface
//!
//! Exposes the resolution engine for the binary and for integration testing.

pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod sources;

pub use crate::db::CacheStore;
pub use crate::error::{ResolveError, ResolveResult};
pub use crate::models::{ArtistIdentity, GenderLabel, MemberDistribution, ResolutionResult, ResolutionStatus};
pub use crate::services::{BatchSession, Genderifier, GenderifierOptions};
