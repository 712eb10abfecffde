use thiserror::Error;

/// Reasons a fetched manifest is rejected before any asset is loaded.
///
/// The `Display` text of each variant is shown to end users as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("Could not load manifest. Please check your connection and try again.")]
    Missing,

    #[error("Failed to parse manifest.")]
    Parse,

    #[error("Your application version is too low. Please visit the App Store and update your application.")]
    VersionIncompatible {
        found: Option<String>,
        required: String,
    },

    #[error("Expected appManifest.files to be an object")]
    FilesNotObject,

    #[error("Expected appManifest.domNodes to be an array")]
    DomNodesNotArray,
}

impl ManifestError {
    /// Whether the manifest was present but shaped wrong.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::FilesNotObject | Self::DomNodesNotArray)
    }
}
