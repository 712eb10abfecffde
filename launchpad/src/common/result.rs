//! Common Result Type

use super::error::LoadError;

/// Result type for every step of a load attempt
pub type LoadResult<T> = Result<T, LoadError>;
