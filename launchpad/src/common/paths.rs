//! Path Utilities
//!
//! Common path resolution for Launchpad directories.

use std::path::PathBuf;

/// Get the Launchpad base directory (`~/.launchpad/`)
pub fn launchpad_dir() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Could not determine home directory")?;
    Ok(home.join(".launchpad"))
}

/// Get the persistent asset cache directory (`~/.launchpad/cache/`)
pub fn cache_dir() -> Result<PathBuf, String> {
    Ok(launchpad_dir()?.join("cache"))
}
