//! # Local Storage
//!
//! Filename derivation and presence checks for the wallpaper directory.
//!
//! Filenames are derived purely from an image's date and title, so the same
//! image always maps to the same file. The scan loop relies on that to
//! pre-select only images that are not on disk yet, and the download loop to
//! write each image to its one canonical destination.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Derives the destination filename for an image.
///
/// Every space in the title becomes an underscore; no other sanitization is
/// applied. Titles containing characters a filesystem rejects are a known
/// edge case.
///
/// # Example
/// ```
/// use bingwall::storage::derive_filename;
///
/// assert_eq!(
///     derive_filename("20240115", "Aurora over Norway"),
///     "20240115_Aurora_over_Norway.jpg"
/// );
/// ```
pub fn derive_filename(date: &str, title: &str) -> String {
    format!("{}_{}.jpg", date, title.replace(' ', "_"))
}

/// Checks whether a filename already exists in the target directory.
///
/// A check that cannot be performed (unreadable directory, permission
/// failure) reads as "absent", so the image stays offered for download
/// rather than being silently skipped.
pub fn is_present(dir: &Path, filename: &str) -> bool {
    dir.join(filename).exists()
}

/// Writes image bytes into the target directory, overwriting any existing
/// file with the same name.
///
/// The directory is created first if it does not exist.
pub fn write_image(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let path = dir.join(filename);
    std::fs::write(&path, bytes)?;
    Ok(path)
}
