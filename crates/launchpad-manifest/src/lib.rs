//! Application manifest model and validation.
//!
//! A manifest names the asset files and DOM mount points an application
//! needs at boot. This crate owns its shape and the compatibility rules; it
//! does no I/O.

pub mod error;
pub mod range;
pub mod types;
pub mod validate;

pub use error::ManifestError;
pub use range::{RangeParseError, SupportedRange};
pub use types::{Manifest, DEFAULT_MANIFEST_FILE, DEFAULT_SUPPORTED_VERSION};
pub use validate::validate_manifest;
