//! Directory emulation over the flat entry namespace.
//!
//! Zip containers have no directories, only entry names. A directory is an
//! entry whose name ends with [`SEPARATOR`]; every rule about that naming
//! convention lives in this module.

use crate::{Error, Result};
use std::borrow::Cow;
use zipfs_archive::SEPARATOR;

/// Append the separator to `path` unless it already ends with one.
///
/// The empty path is the container root and stays empty.
pub fn normalize_directory_name(path: &str) -> Cow<'_, str> {
    if path.is_empty() || path.ends_with(SEPARATOR) {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("{}{}", path, SEPARATOR))
    }
}

/// Whether `name` lies below the directory `prefix` (normalized form).
///
/// The directory's own marker is not a descendant.
pub(crate) fn is_descendant_of(name: &str, prefix: &str) -> bool {
    name.len() > prefix.len() && name.starts_with(prefix)
}

/// The immediate child of `prefix` that `name` belongs to.
///
/// Files directly in the directory and markers of direct subdirectories are
/// their own child. Deeper entries yield the marker name of the direct
/// subdirectory that contains them, whether or not that marker exists.
pub(crate) fn immediate_child<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = name.strip_prefix(prefix)?;
    if rest.is_empty() {
        return None;
    }
    match rest.find(SEPARATOR) {
        None => Some(name),
        Some(pos) => Some(&name[..prefix.len() + pos + 1]),
    }
}

/// Check a name that is about to become a file entry.
pub(crate) fn validate_file_name(path: &str) -> Result<()> {
    validate_components(path)?;
    if path.ends_with(SEPARATOR) {
        return Err(Error::InvalidArgument(format!(
            "file name ends with a separator: {}",
            path
        )));
    }
    Ok(())
}

/// Check a name that is about to become a directory marker.
pub(crate) fn validate_directory_name(path: &str) -> Result<()> {
    validate_components(path.strip_suffix(SEPARATOR).unwrap_or(path))
}

fn validate_components(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(Error::InvalidArgument("empty path".to_string()));
    }
    if path.starts_with(SEPARATOR) || path.starts_with('\\') {
        return Err(Error::InvalidArgument(format!("absolute path: {}", path)));
    }
    for component in path.split(SEPARATOR) {
        match component {
            "" => {
                return Err(Error::InvalidArgument(format!(
                    "empty path component: {}",
                    path
                )))
            }
            "." | ".." => {
                return Err(Error::InvalidArgument(format!(
                    "relative path component in: {}",
                    path
                )))
            }
            _ => {}
        }
    }
    Ok(())
}
