//! Tree copy with attribute preservation.
//!
//! [`copy_path`] copies one source path into a destination the way a
//! Dockerfile `COPY` does: a trailing `/.` on a directory copies its contents,
//! a directory or `/`-terminated destination receives the source under its own
//! name, and anything else is copied *to* the destination name.
//!
//! Entries are visited depth-first in name order. Directory attributes are
//! applied after their children, so read-only directories can still be
//! filled. Symlinks inside the tree are recreated, never followed; hard links
//! between copied files are preserved.

use crate::error::{Error, Result};
use crate::options::CopyOptions;
use crate::utils::path::{
    clean, ends_in_dot_component, has_contents_marker, has_trailing_separator,
};
use std::collections::HashMap;
use std::fs::{self, DirBuilder, Metadata};
use std::io;
use std::os::unix::fs::{DirBuilderExt, FileTypeExt, MetadataExt, symlink};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::attrs::{copy_mode_and_times, copy_owner, copy_xattrs};
use super::file::copy_regular_file;
use super::reflink::ReflinkProbe;
use super::utils::{create_dir_all_owned, remove_existing_non_dir};

/// Statistics from a copy operation.
///
/// Returned by [`copy_path`] to provide information about what was copied.
///
/// # Example
///
/// ```no_run
/// use addcopy::{CopyOptions, copy_path};
/// use std::path::Path;
///
/// let stats = copy_path(Path::new("src/."), Path::new("dst/"), &CopyOptions::default())?;
/// println!("Copied {} files ({} bytes)", stats.files_copied, stats.bytes_copied);
/// # Ok::<(), addcopy::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CopyStats {
    /// Number of regular files copied
    pub files_copied: u64,
    /// Number of symlinks recreated
    pub symlinks_copied: u64,
    /// Number of hard links recreated instead of copying the file again
    pub hardlinks_created: u64,
    /// Number of FIFOs and device nodes recreated
    pub special_files_created: u64,
    /// Number of directories created
    pub dirs_created: u64,
    /// Total bytes copied
    pub bytes_copied: u64,
    /// Extended-attribute failures the error handler chose to ignore
    pub xattr_errors_ignored: u64,
    /// Duration of the copy operation
    pub duration: Duration,
}

impl CopyStats {
    /// Add another copy's counters to this one.
    pub fn merge(&mut self, other: &CopyStats) {
        self.files_copied += other.files_copied;
        self.symlinks_copied += other.symlinks_copied;
        self.hardlinks_created += other.hardlinks_created;
        self.special_files_created += other.special_files_created;
        self.dirs_created += other.dirs_created;
        self.bytes_copied += other.bytes_copied;
        self.xattr_errors_ignored += other.xattr_errors_ignored;
        self.duration += other.duration;
    }
}

/// Copy `src` to `dst`, preserving ownership, mode, times and extended
/// attributes.
///
/// # Target selection
///
/// | `src` | `dst` | Written to |
/// |-------|-------|-----------|
/// | `dir/.` | any | `dst` itself receives the contents of `dir` |
/// | `name` | existing directory, or ends in `/` | `dst/name` |
/// | `name` | anything else | `dst` |
///
/// Missing parents of the target are created with mode 0755 (owned by
/// `options.chown` when set). A symlink given as `src` is followed; symlinks
/// found inside a copied directory are recreated as-is.
///
/// Existing non-directories at a target are replaced. Copying a directory
/// onto an existing non-directory fails with [`Error::NotADirectory`].
///
/// # Errors
///
/// - [`Error::SourceNotFound`] if `src` does not exist
/// - [`Error::UnsupportedFileType`] for sockets
/// - [`Error::Cancelled`] if the cancellation token fires between entries
/// - [`Error::Xattr`] only if the configured handler returns it
/// - any entry-level error ([`Error::Chown`], [`Error::Mknod`], ...)
pub fn copy_path(src: &Path, dst: &Path, options: &CopyOptions) -> Result<CopyStats> {
    let start_time = Instant::now();

    let src_meta = fs::metadata(src).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            Error::SourceNotFound(src.to_path_buf())
        } else {
            Error::Stat {
                path: src.to_path_buf(),
                source: e,
            }
        }
    })?;

    let target = copy_target(src, dst, &src_meta);
    if let Some(parent) = target.parent() {
        create_dir_all_owned(parent, options.chown)?;
    }

    // Read from the link target so names and xattrs come from the real entry
    let entry_src = match fs::symlink_metadata(src) {
        Ok(meta) if meta.file_type().is_symlink() => fs::canonicalize(src)?,
        _ => src.to_path_buf(),
    };

    tracing::debug!(
        src = %src.display(),
        target = %target.display(),
        "copying"
    );

    let mut copier = Copier::new(options);
    copier.copy_entry(&entry_src, &target, &src_meta)?;

    let mut stats = copier.stats;
    stats.duration = start_time.elapsed();
    Ok(stats)
}

/// Where `src` lands when copied to `dst`.
fn copy_target(src: &Path, dst: &Path, src_meta: &Metadata) -> PathBuf {
    // `out/.` and `sub/..` name directories even before they exist
    if ends_in_dot_component(dst) {
        let dir = clean(dst);
        return match src.file_name() {
            Some(name) if !has_contents_marker(src) => dir.join(name),
            _ => dir,
        };
    }
    if src_meta.is_dir() && has_contents_marker(src) {
        return dst.to_path_buf();
    }
    let into_dir = has_trailing_separator(dst) || dst.is_dir();
    match src.file_name() {
        Some(name) if into_dir => dst.join(name),
        _ => dst.to_path_buf(),
    }
}

/// State carried across the entries of one [`copy_path`] call.
struct Copier<'a> {
    options: &'a CopyOptions,
    /// Reused for every userspace content copy
    buffer: Vec<u8>,
    reflink: ReflinkProbe,
    /// (dev, ino) of multiply-linked sources -> first destination written
    links: HashMap<(u64, u64), PathBuf>,
    stats: CopyStats,
}

impl<'a> Copier<'a> {
    fn new(options: &'a CopyOptions) -> Self {
        Self {
            options,
            buffer: Vec::new(),
            reflink: ReflinkProbe::default(),
            links: HashMap::new(),
            stats: CopyStats::default(),
        }
    }

    fn copy_entry(&mut self, src: &Path, dst: &Path, meta: &Metadata) -> Result<()> {
        self.options.check_cancelled()?;

        let file_type = meta.file_type();
        if file_type.is_dir() {
            return self.copy_dir(src, dst, meta);
        }

        if file_type.is_symlink() {
            copy_symlink(src, dst)?;
            self.stats.symlinks_copied += 1;
        } else if file_type.is_file() {
            let link_key = (meta.nlink() > 1).then(|| (meta.dev(), meta.ino()));
            if let Some(first) = link_key.and_then(|key| self.links.get(&key)) {
                remove_existing_non_dir(dst)?;
                fs::hard_link(first, dst)?;
                self.stats.hardlinks_created += 1;
                // Same inode; attributes are already in place
                return Ok(());
            }

            let bytes =
                copy_regular_file(src, dst, meta, &mut self.buffer, &mut self.reflink)?;
            self.stats.files_copied += 1;
            self.stats.bytes_copied += bytes;
            if let Some(key) = link_key {
                self.links.insert(key, dst.to_path_buf());
            }
        } else if file_type.is_fifo() || file_type.is_char_device() || file_type.is_block_device()
        {
            create_node(dst, meta)?;
            self.stats.special_files_created += 1;
        } else {
            return Err(Error::UnsupportedFileType(src.to_path_buf()));
        }

        self.copy_attributes(src, dst, meta)
    }

    fn copy_dir(&mut self, src: &Path, dst: &Path, meta: &Metadata) -> Result<()> {
        // Follows symlinks: an existing link to a directory is filled in place
        match fs::metadata(dst) {
            Ok(existing) if existing.is_dir() => {}
            Ok(_) => return Err(Error::NotADirectory(dst.to_path_buf())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                DirBuilder::new()
                    .mode(0o755)
                    .create(dst)
                    .map_err(|e| Error::CreateDir {
                        path: dst.to_path_buf(),
                        source: e,
                    })?;
                self.stats.dirs_created += 1;
            }
            Err(e) => return Err(e.into()),
        }

        let mut entries = fs::read_dir(src)?.collect::<io::Result<Vec<_>>>()?;
        entries.sort_by_key(fs::DirEntry::file_name);

        for entry in entries {
            let child_src = entry.path();
            let child_meta = fs::symlink_metadata(&child_src).map_err(|e| Error::Stat {
                path: child_src.clone(),
                source: e,
            })?;
            self.copy_entry(&child_src, &dst.join(entry.file_name()), &child_meta)?;
        }

        self.copy_attributes(src, dst, meta)
    }

    fn copy_attributes(&mut self, src: &Path, dst: &Path, meta: &Metadata) -> Result<()> {
        copy_owner(meta, dst, self.options.chown)?;
        self.stats.xattr_errors_ignored +=
            copy_xattrs(dst, src, self.options.xattr_error_handler)?;
        copy_mode_and_times(meta, dst)
    }
}

fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    let target = fs::read_link(src)?;
    remove_existing_non_dir(dst)?;
    symlink(&target, dst).map_err(|e| Error::Symlink {
        path: dst.to_path_buf(),
        target,
        source: e,
    })
}

/// Recreate a FIFO or device node with the source's type, mode and device.
fn create_node(dst: &Path, meta: &Metadata) -> Result<()> {
    use nix::sys::stat::{Mode, SFlag, mknod};

    remove_existing_non_dir(dst)?;
    let mode = meta.mode() as libc::mode_t;
    let kind = SFlag::from_bits_truncate(mode & libc::S_IFMT);
    let perm = Mode::from_bits_truncate(mode & 0o7777);
    mknod(dst, kind, perm, meta.rdev() as libc::dev_t).map_err(|errno| Error::Mknod {
        path: dst.to_path_buf(),
        source: io::Error::from(errno),
    })
}

// =============================================================================
// Tests
// =============================================================================
