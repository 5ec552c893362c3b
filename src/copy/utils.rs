//! Utility functions for file copy operations.
//!
//! This module contains helpers used by the entry copier: content transfer,
//! directory creation with ownership, and replacement of existing targets.

use crate::error::{Error, Result};
use crate::options::ChownOpt;
use crate::utils::path::{ends_in_dot_component, parent_dir};
use std::fs::{self, DirBuilder, File};
use std::io::{self, Read, Write};
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

/// Size of the reusable buffer used when the kernel cannot copy for us.
pub(crate) const COPY_BUFFER_SIZE: usize = 128 * 1024;

// =============================================================================
// File content copying
// =============================================================================

/// Copy file contents using the best available method.
///
/// On Linux 4.5+, uses `copy_file_range` for zero-copy kernel-to-kernel transfer.
/// Falls back to a userspace copy through `buffer` on other platforms or when
/// the kernel refuses.
pub(crate) fn copy_file_contents(
    src: &File,
    dst: &File,
    len: u64,
    buffer: &mut Vec<u8>,
) -> io::Result<u64> {
    #[cfg(target_os = "linux")]
    {
        copy_file_range_all(src, dst, len, buffer)
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = len;
        copy_with_buffer(src, dst, buffer)
    }
}

/// Linux-specific: copy using copy_file_range(2) syscall.
///
/// Falls back to the buffered copy if nothing was transferred yet and the
/// filesystem pair does not support it (e.g., cross-filesystem).
#[cfg(target_os = "linux")]
fn copy_file_range_all(
    src: &File,
    dst: &File,
    len: u64,
    buffer: &mut Vec<u8>,
) -> io::Result<u64> {
    use std::os::unix::io::AsRawFd;

    let src_fd = src.as_raw_fd();
    let dst_fd = dst.as_raw_fd();
    let mut remaining = len;
    let mut copied: u64 = 0;

    while remaining > 0 {
        let chunk_size = remaining.min(128 * 1024 * 1024) as usize;

        // SAFETY: both descriptors are open for the lifetime of the borrowed
        // files, and null offsets make the kernel use and advance the file
        // positions.
        let result = unsafe {
            libc::copy_file_range(
                src_fd,
                std::ptr::null_mut(),
                dst_fd,
                std::ptr::null_mut(),
                chunk_size,
                0,
            )
        };

        if result < 0 {
            let err = io::Error::last_os_error();
            if copied == 0
                && matches!(
                    err.raw_os_error(),
                    Some(libc::EXDEV)
                        | Some(libc::ENOSYS)
                        | Some(libc::EINVAL)
                        | Some(libc::EOPNOTSUPP)
                        | Some(libc::EPERM)
                )
            {
                return copy_with_buffer(src, dst, buffer);
            }
            return Err(err);
        }

        if result == 0 {
            // EOF reached (file may have been truncated)
            break;
        }

        let bytes_copied = result as u64;
        copied += bytes_copied;
        remaining = remaining.saturating_sub(bytes_copied);
    }

    Ok(copied)
}

/// Userspace copy through a buffer that is reused across files.
pub(crate) fn copy_with_buffer(
    mut src: &File,
    mut dst: &File,
    buffer: &mut Vec<u8>,
) -> io::Result<u64> {
    if buffer.len() < COPY_BUFFER_SIZE {
        buffer.resize(COPY_BUFFER_SIZE, 0);
    }
    let mut total = 0u64;
    loop {
        let n = match src.read(buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        dst.write_all(&buffer[..n])?;
        total += n as u64;
    }
    Ok(total)
}

// =============================================================================
// Directory utilities
// =============================================================================

/// Create `path` and any missing parents with mode 0755.
///
/// Every directory created here is chowned to `chown` when set; directories
/// that already existed are left alone.
pub(crate) fn create_dir_all_owned(path: &Path, chown: Option<ChownOpt>) -> Result<()> {
    // `out/.` and `sub/..` exist once the prefix does
    if ends_in_dot_component(path) {
        let prefix = parent_dir(path);
        if prefix != path {
            return create_dir_all_owned(&prefix, chown);
        }
    }
    let mut missing: Vec<PathBuf> = Vec::new();
    let mut cursor = Some(path);
    while let Some(dir) = cursor {
        if dir.as_os_str().is_empty() {
            break;
        }
        match fs::symlink_metadata(dir) {
            Ok(meta) if meta.is_dir() => break,
            // A symlink to a directory counts as existing
            Ok(meta) if meta.file_type().is_symlink() && dir.is_dir() => break,
            Ok(_) => return Err(Error::NotADirectory(dir.to_path_buf())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => missing.push(dir.to_path_buf()),
            Err(e) => {
                return Err(Error::CreateDir {
                    path: dir.to_path_buf(),
                    source: e,
                });
            }
        }
        cursor = dir.parent();
    }

    for dir in missing.iter().rev() {
        match DirBuilder::new().mode(0o755).create(dir) {
            Ok(()) => {}
            // Lost a race with another creator; fine as long as it is a directory
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => continue,
            Err(e) => {
                return Err(Error::CreateDir {
                    path: dir.clone(),
                    source: e,
                });
            }
        }
        if let Some(owner) = chown {
            std::os::unix::fs::lchown(dir, Some(owner.uid), Some(owner.gid)).map_err(|e| {
                Error::Chown {
                    path: dir.clone(),
                    source: e,
                }
            })?;
        }
    }
    Ok(())
}

/// Like [`create_dir_all_owned`], but `path` itself is chowned even when it
/// already existed.
pub(crate) fn ensure_dir(path: &Path, chown: Option<ChownOpt>) -> Result<()> {
    create_dir_all_owned(path, chown)?;
    if let Some(owner) = chown {
        std::os::unix::fs::lchown(path, Some(owner.uid), Some(owner.gid)).map_err(|e| {
            Error::Chown {
                path: path.to_path_buf(),
                source: e,
            }
        })?;
    }
    Ok(())
}

/// Make room for a non-directory entry at `path`.
///
/// Existing files, symlinks, and special files are removed; an existing
/// directory is an error.
pub(crate) fn remove_existing_non_dir(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => Err(Error::IsADirectory(path.to_path_buf())),
        Ok(_) => fs::remove_file(path).map_err(Error::from),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Tests
// =============================================================================
