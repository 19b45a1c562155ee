//! # Genderify Common Library
//!
//! Shared code for the genderify workspace:
//! - Error and result types
//! - Configuration file model and tiered path / credential resolution

pub mod config;
pub mod error;

pub use error::{Error, Result};
