//! Destination resolution.
//!
//! Turns the raw `sources... dest` argument list into normalized sources and
//! a [`ResolvedDestination`]: whether the destination is a container for
//! several outputs, which directory must exist before anything is written,
//! and where symlinked destinations really point (resolved inside
//! [`CopyOptions::root`]).
//!
//! Resolution only reads the filesystem; it never creates anything.

use crate::error::{Error, Result};
use crate::options::CopyOptions;
use crate::utils::path::{
    clean, contents_of, has_trailing_separator, parent_dir, root_path, with_trailing_separator,
};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One source argument after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceEntry {
    /// The path as given
    pub original: PathBuf,
    /// The path handed to the copy engine (`dir/.` for directories)
    pub normalized: PathBuf,
    /// Whether the source is a directory whose contents are merged
    pub is_directory_like: bool,
}

/// Where a request writes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolvedDestination {
    /// Directory that must exist before copying (the parent of `original`
    /// when copying a single file to a new name)
    pub path: PathBuf,
    /// Destination after symlink resolution, trailing `/` preserved
    pub original: PathBuf,
    /// Whether `original` receives possibly several outputs
    pub is_directory: bool,
}

/// Normalized sources plus their destination.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Resolved {
    /// Sources in argument order
    pub sources: Vec<SourceEntry>,
    /// The destination
    pub destination: ResolvedDestination,
}

/// Resolve `sources` and `dest` for a copy request.
///
/// The destination is treated as a directory when it ends with `/`, when
/// more than one source is given, or when any source is a directory.
/// Otherwise the destination names the file to write and
/// [`ResolvedDestination::path`] is its parent.
///
/// # Errors
///
/// - [`Error::SourceNotFound`] / [`Error::Stat`] if a source cannot be `lstat`ed
/// - [`Error::UnsafeDestination`] if a symlinked destination cannot be
///   resolved inside `options.root`
///
/// # Example
///
/// ```no_run
/// use addcopy::{CopyOptions, resolve};
/// use std::path::{Path, PathBuf};
///
/// let resolved = resolve(
///     &[PathBuf::from("a.txt")],
///     Path::new("out/b.txt"),
///     &CopyOptions::default(),
/// )?;
/// assert_eq!(resolved.destination.path, PathBuf::from("out"));
/// assert!(!resolved.destination.is_directory);
/// # Ok::<(), addcopy::Error>(())
/// ```
pub fn resolve<P: AsRef<Path>>(
    sources: &[P],
    dest: &Path,
    options: &CopyOptions,
) -> Result<Resolved> {
    let mut is_directory = false;
    let mut entries = Vec::with_capacity(sources.len());

    for source in sources {
        let source = source.as_ref();
        let meta = fs::symlink_metadata(source).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                Error::SourceNotFound(source.to_path_buf())
            } else {
                Error::Stat {
                    path: source.to_path_buf(),
                    source: e,
                }
            }
        })?;

        let entry = if meta.is_dir() {
            is_directory = true;
            SourceEntry {
                original: source.to_path_buf(),
                normalized: contents_of(source),
                is_directory_like: true,
            }
        } else {
            SourceEntry {
                original: source.to_path_buf(),
                normalized: source.to_path_buf(),
                is_directory_like: false,
            }
        };
        entries.push(entry);
    }

    if entries.len() > 1 {
        is_directory = true;
    }

    let original = resolve_symlinked_destination(dest, &options.root)?;
    if has_trailing_separator(&original) {
        is_directory = true;
    }

    let path = if is_directory {
        original.clone()
    } else {
        parent_dir(&original)
    };

    tracing::debug!(
        dest = %dest.display(),
        original = %original.display(),
        path = %path.display(),
        is_directory,
        "resolved destination"
    );

    Ok(Resolved {
        sources: entries,
        destination: ResolvedDestination {
            path,
            original,
            is_directory,
        },
    })
}

/// Follow `dest` inside `root` when it is an existing symlink.
///
/// Anything else, including a missing destination, is returned unchanged.
fn resolve_symlinked_destination(dest: &Path, root: &Path) -> Result<PathBuf> {
    // lstat on `link/` would follow the link
    let is_symlink = fs::symlink_metadata(clean(dest))
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false);
    if !is_symlink {
        return Ok(dest.to_path_buf());
    }

    let unsafe_destination = |reason: String| Error::UnsafeDestination {
        path: dest.to_path_buf(),
        reason,
    };

    let absolute = if dest.is_absolute() {
        dest.to_path_buf()
    } else {
        env::current_dir()
            .map_err(|e| unsafe_destination(e.to_string()))?
            .join(dest)
    };
    let resolved =
        root_path(root, &clean(&absolute)).map_err(|e| unsafe_destination(e.to_string()))?;

    tracing::debug!(
        dest = %dest.display(),
        resolved = %resolved.display(),
        "destination is a symlink"
    );

    if has_trailing_separator(dest) {
        Ok(with_trailing_separator(&resolved))
    } else {
        Ok(resolved)
    }
}
