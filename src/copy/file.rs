//! Regular file copy.
//!
//! Content lands in a temporary file next to the destination and is renamed
//! into place, so an interrupted copy never leaves a truncated file under the
//! final name. Ownership, mode and times are applied by the caller afterwards.

use crate::error::{Error, Result};
use std::fs::{File, Metadata};
use std::path::Path;

use super::reflink::ReflinkProbe;
use super::utils::{copy_file_contents, remove_existing_non_dir};

/// Copy the contents of the regular file `src` to `dst`.
///
/// An existing non-directory at `dst` is replaced. Returns the number of
/// bytes written.
///
/// # Errors
///
/// - [`Error::IsADirectory`] if `dst` is an existing directory
/// - [`Error::TempFile`] if the temporary file cannot be created
/// - [`Error::Persist`] if the final rename fails
/// - [`Error::Io`] for read/write failures
pub(crate) fn copy_regular_file(
    src: &Path,
    dst: &Path,
    src_meta: &Metadata,
    buffer: &mut Vec<u8>,
    reflink: &mut ReflinkProbe,
) -> Result<u64> {
    remove_existing_non_dir(dst)?;

    let dst_parent = match dst.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    // Instant copy on CoW filesystems
    if reflink.try_clone(src, dst, dst_parent) {
        return Ok(src_meta.len());
    }

    let src_file = File::open(src)?;

    let temp_file = tempfile::NamedTempFile::new_in(dst_parent).map_err(|e| Error::TempFile {
        path: dst_parent.to_path_buf(),
        source: e,
    })?;

    let bytes = copy_file_contents(&src_file, temp_file.as_file(), src_meta.len(), buffer)?;

    temp_file.persist(dst).map_err(|e| Error::Persist {
        path: dst.to_path_buf(),
        source: e.error,
    })?;

    Ok(bytes)
}

// =============================================================================
// Tests
// =============================================================================
