//! Error types for the region cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the region cache.
///
/// Lookups never produce an error: a missing region or key is a plain miss.
/// Only region provisioning can fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Region does not exist and the strict policy forbids creating it
    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    /// A region cannot be created with zero capacity
    #[error("Invalid capacity for region '{region}': capacity must be at least 1")]
    InvalidCapacity { region: String },
}

// == Result Type Alias ==
/// Convenience Result type for the region cache.
pub type Result<T> = std::result::Result<T, CacheError>;
