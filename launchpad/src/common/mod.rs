//! Common Utilities
//!
//! Error types, HTTP client construction and paths shared across the loader.

pub mod error;
pub mod http;
pub mod paths;
pub mod result;

pub use error::{ErrorKind, LoadError};
pub use http::{create_http_client, create_http_client_with_timeout};
pub use paths::{cache_dir, launchpad_dir};
pub use result::LoadResult;
