//! # addcopy
//!
//! Dockerfile `ADD`/`COPY` semantics as a library.
//!
//! ## Core Features
//!
//! - **Destination resolution**: trailing `/`, multiple sources, directory
//!   sources and symlinked destinations decide where things land, exactly as
//!   in an image build
//! - **Root-jailed symlinks**: a symlinked destination is followed as if a
//!   configured root were `/`, so it can never point outside of it
//! - **Archive detection by content**: gzip, bzip2 and xz compressed (or plain)
//!   tarballs are recognized by their bytes and a verified tar header, never by
//!   file name
//! - **Unpacking**: archives are extracted with the system `tar`, which is
//!   killed if the request is cancelled
//! - **Attribute preserving**: ownership, mode bits, timestamps, extended
//!   attributes, symlinks, hard links, FIFOs and device nodes are reproduced
//! - **Ownership override**: `--chown user:group` semantics for every entry
//! - **Atomic writes**: regular files are written to a temp file and renamed
//! - **Reflink support**: instant copy-on-write on btrfs/XFS/APFS
//!
//! ## Quick Start with Builder API
//!
//! ```no_run
//! use addcopy::CopyBuilder;
//!
//! // COPY config.toml app/ /srv/
//! let report = CopyBuilder::new(["config.toml", "app/"], "/srv/").run()?;
//! println!("Copied {} files ({} bytes)",
//!     report.totals().files_copied, report.totals().bytes_copied);
//! # Ok::<(), addcopy::Error>(())
//! ```
//!
//! ## Function API
//!
//! [`copy`] takes a command-line style argument list; [`resolve`] and
//! [`dispatch`] expose the two phases separately:
//!
//! ```no_run
//! use addcopy::{CopyOptions, dispatch, parse_chown, resolve};
//! use std::path::{Path, PathBuf};
//!
//! let options = CopyOptions::default()
//!     .with_unpack()
//!     .with_chown(parse_chown("app:app")?)
//!     .with_root("/srv/rootfs");
//!
//! let resolved = resolve(&[PathBuf::from("rootfs.tar.gz")], Path::new("/srv/rootfs/"), &options)?;
//! let report = dispatch(&resolved, &options)?;
//! println!("{} archive(s) extracted", report.archives_extracted());
//! # Ok::<(), addcopy::Error>(())
//! ```
//!
//! ## Cancellation
//!
//! Pass a [`CancellationToken`] through [`CopyOptions::with_cancel_token`].
//! Copies stop before the next entry, extraction kills the archive tool.
//! [`InterruptState`] turns repeated termination signals into
//! cancel-then-force-exit decisions.
//!
//! ## Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `progress` | Spinner helper with indicatif |
//! | `reflink` | Copy-on-write cloning of regular files |
//! | `serde` | Serialize/Deserialize for reports and options data |
//! | `full` | Enable all optional features |

#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(not(unix))]
compile_error!("addcopy reproduces Unix file attributes and only supports Unix targets");

mod builder;
mod cancel;
mod copy;
mod detect;
mod dispatch;
mod error;
mod options;
mod resolve;
mod unpack;
mod user;
mod utils;

#[cfg(feature = "progress")]
mod progress;

pub use builder::CopyBuilder;
pub use cancel::{CancellationToken, DEFAULT_INTERRUPT_LIMIT, Interrupt, InterruptState};
pub use copy::{CopyStats, copy_path};
pub use detect::{
    ArchiveType, detect_archive_type, detect_archive_type_from_reader, detect_compression,
};
pub use dispatch::{ActionKind, CopyReport, SourceAction, copy, dispatch};
pub use error::{Error, ErrorCode, Result};
pub use options::{ChownOpt, CopyOptions, XattrErrorHandler, log_xattr_error, propagate_xattr_error};
pub use resolve::{Resolved, ResolvedDestination, SourceEntry, resolve};
pub use unpack::{extract_archive, tar_args};
pub use user::parse_chown;
pub use utils::path::root_path;

#[cfg(feature = "progress")]
#[cfg_attr(docsrs, doc(cfg(feature = "progress")))]
pub use progress::create_spinner;
