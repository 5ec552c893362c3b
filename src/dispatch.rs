//! Copy/unpack decisions.
//!
//! Given a [`Resolved`] request, decide per source whether it is copied with
//! the attribute-preserving engine or extracted with the archive tool. The
//! rules are applied in order:
//!
//! 1. The working destination directory is created (owned by `chown` if set).
//! 2. With `unpack`, if the destination is an existing directory, every
//!    source that is an archive is extracted into it and every other source
//!    is copied into it.
//! 3. With `unpack`, a single archive source is extracted into the
//!    destination, which becomes a directory.
//! 4. Otherwise every source is copied.
//!
//! Sources are processed one after another; the first failure ends the
//! request and earlier results stay on disk.

use crate::copy::utils::ensure_dir;
use crate::copy::{CopyStats, copy_path};
use crate::detect::{ArchiveType, detect_archive_type};
use crate::error::{Error, Result};
use crate::options::CopyOptions;
use crate::resolve::{Resolved, SourceEntry, resolve};
use crate::unpack::extract_archive;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// What happened to one source.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "action", rename_all = "snake_case"))]
pub enum ActionKind {
    /// Copied with the attribute-preserving engine
    Copied {
        /// What the copy wrote
        stats: CopyStats,
    },
    /// Extracted with the archive tool
    Extracted {
        /// Detected format of the archive
        archive_type: ArchiveType,
    },
}

/// One processed source.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceAction {
    /// Source as handed to the engine
    pub source: PathBuf,
    /// Destination it was copied or extracted to
    pub destination: PathBuf,
    /// Copy or extraction
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub kind: ActionKind,
}

/// Outcome of a whole request, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CopyReport {
    /// One entry per source
    pub actions: Vec<SourceAction>,
    /// Wall time of the request
    pub duration: Duration,
}

impl CopyReport {
    /// Sum of the copy statistics of every copied source.
    #[must_use]
    pub fn totals(&self) -> CopyStats {
        let mut totals = CopyStats::default();
        for action in &self.actions {
            if let ActionKind::Copied { stats } = &action.kind {
                totals.merge(stats);
            }
        }
        totals.duration = self.duration;
        totals
    }

    /// Number of sources that were extracted.
    #[must_use]
    pub fn archives_extracted(&self) -> usize {
        self.actions
            .iter()
            .filter(|action| matches!(action.kind, ActionKind::Extracted { .. }))
            .count()
    }
}

/// Copy with Dockerfile `COPY`/`ADD` semantics.
///
/// `args` is `sources... dest`, as on a command line.
///
/// # Errors
///
/// Returns [`Error::InvalidArgs`] for fewer than two arguments, and any error
/// from [`resolve`] or [`dispatch`].
///
/// # Example
///
/// ```no_run
/// use addcopy::{CopyOptions, copy};
///
/// let report = copy(&["rootfs.tar.gz", "out"], &CopyOptions::default().with_unpack())?;
/// println!("{} archive(s) extracted", report.archives_extracted());
/// # Ok::<(), addcopy::Error>(())
/// ```
pub fn copy<S: AsRef<Path>>(args: &[S], options: &CopyOptions) -> Result<CopyReport> {
    let Some((dest, sources)) = args.split_last() else {
        return Err(Error::InvalidArgs { count: 0 });
    };
    if sources.is_empty() {
        return Err(Error::InvalidArgs { count: args.len() });
    }

    let resolved = resolve(sources, dest.as_ref(), options)?;
    dispatch(&resolved, options)
}

/// Copy or extract every source of `resolved`.
///
/// # Errors
///
/// The first failing source ends the request. Copy failures are wrapped in
/// [`Error::CopySource`]; extraction failures are [`Error::ExtractSpawn`] or
/// [`Error::ExtractFailed`]. Cancellation is checked before each source.
pub fn dispatch(resolved: &Resolved, options: &CopyOptions) -> Result<CopyReport> {
    let start_time = Instant::now();
    let destination = &resolved.destination;

    if options.chown.is_some() && !nix::unistd::geteuid().is_root() {
        options.warn("--chown without root privileges: ownership changes will likely fail");
    }

    ensure_dir(&destination.path, options.chown)?;

    let mut report = CopyReport::default();
    let target = destination.original.as_path();

    if options.unpack && target.is_dir() {
        for source in &resolved.sources {
            options.check_cancelled()?;
            let archive_type = detect_archive_type(&source.normalized);
            if archive_type.is_archive() {
                report.actions.push(extract(source, target, archive_type, options)?);
            } else {
                report.actions.push(copy_source(source, target, options)?);
            }
        }
    } else if let Some((source, archive_type)) = single_archive(resolved, options) {
        report.actions.push(extract(source, target, archive_type, options)?);
    } else {
        for source in &resolved.sources {
            options.check_cancelled()?;
            report.actions.push(copy_source(source, target, options)?);
        }
    }

    report.duration = start_time.elapsed();
    Ok(report)
}

/// The only source, when unpacking is on and it is an archive.
fn single_archive<'a>(
    resolved: &'a Resolved,
    options: &CopyOptions,
) -> Option<(&'a SourceEntry, ArchiveType)> {
    if !options.unpack {
        return None;
    }
    let [source] = resolved.sources.as_slice() else {
        return None;
    };
    let archive_type = detect_archive_type(&source.normalized);
    archive_type.is_archive().then_some((source, archive_type))
}

fn extract(
    source: &SourceEntry,
    dest: &Path,
    archive_type: ArchiveType,
    options: &CopyOptions,
) -> Result<SourceAction> {
    tracing::debug!(
        src = %source.normalized.display(),
        dest = %dest.display(),
        %archive_type,
        "extracting"
    );
    extract_archive(&source.normalized, dest, archive_type, options)?;
    Ok(SourceAction {
        source: source.normalized.clone(),
        destination: dest.to_path_buf(),
        kind: ActionKind::Extracted { archive_type },
    })
}

fn copy_source(source: &SourceEntry, dest: &Path, options: &CopyOptions) -> Result<SourceAction> {
    let stats = copy_path(&source.normalized, dest, options).map_err(|e| Error::CopySource {
        src: source.normalized.clone(),
        dst: dest.to_path_buf(),
        source: Box::new(e),
    })?;
    Ok(SourceAction {
        source: source.normalized.clone(),
        destination: dest.to_path_buf(),
        kind: ActionKind::Copied { stats },
    })
}
