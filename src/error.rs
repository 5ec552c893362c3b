//! Error types for addcopy.
//!
//! This module provides the [`Error`] enum containing all possible errors
//! that can occur while resolving, copying, or extracting, the [`Result`]
//! type alias, and the machine-readable [`ErrorCode`] categories.
//!
//! # Error Categories
//!
//! | Category | Errors |
//! |----------|--------|
//! | Input | [`Error::InvalidArgs`] |
//! | Validation | [`Error::SourceNotFound`], [`Error::Stat`], [`Error::NotADirectory`], [`Error::IsADirectory`], [`Error::UnsupportedFileType`] |
//! | Safety | [`Error::UnsafeDestination`] |
//! | Ownership | [`Error::UnknownUser`], [`Error::UnknownGroup`], [`Error::UserLookup`] |
//! | Entry copy | [`Error::CreateDir`], [`Error::Chown`], [`Error::Chmod`], [`Error::SetTimes`], [`Error::Symlink`], [`Error::Mknod`], [`Error::TempFile`], [`Error::Persist`], [`Error::Io`] |
//! | Extended attributes | [`Error::Xattr`] |
//! | Extraction | [`Error::ExtractSpawn`], [`Error::ExtractFailed`] |
//! | Context | [`Error::CopySource`] |
//! | Control | [`Error::Cancelled`] |

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type for addcopy operations.
///
/// This is a type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable, machine-readable error category.
///
/// Used by the CLI to prefix messages (`error[source_not_found]: ...`) and to
/// pick an exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ErrorCode {
    /// Malformed arguments
    InvalidInput,
    /// A source does not exist
    SourceNotFound,
    /// The OS refused an operation
    PermissionDenied,
    /// A symlinked destination could not be resolved inside the root
    UnsafeDestination,
    /// `--chown` did not resolve to a user/group
    Ownership,
    /// The archive tool failed
    ExtractFailed,
    /// The request was interrupted
    Cancelled,
    /// Any other I/O failure
    IoError,
}

impl ErrorCode {
    /// Snake-case name of the category.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::SourceNotFound => "source_not_found",
            Self::PermissionDenied => "permission_denied",
            Self::UnsafeDestination => "unsafe_destination",
            Self::Ownership => "ownership",
            Self::ExtractFailed => "extract_failed",
            Self::Cancelled => "cancelled",
            Self::IoError => "io_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during a copy request.
///
/// All errors include relevant path information to aid debugging.
/// Use the [`std::error::Error`] trait methods to access underlying
/// causes where applicable.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Fewer than two arguments (at least one source and a destination)
    #[error("invalid args: expected at least one source and a destination, got {count} argument(s)")]
    InvalidArgs {
        /// Number of arguments received
        count: usize,
    },

    /// Source path does not exist
    #[error("Source path does not exist: {0}")]
    SourceNotFound(PathBuf),

    /// Source exists but could not be inspected
    #[error("lstat {path}: {source}")]
    Stat {
        /// The path being inspected
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// A symlinked destination could not be resolved inside the root
    #[error("unsafe destination {path}: {reason}")]
    UnsafeDestination {
        /// The destination as given
        path: PathBuf,
        /// Why resolution failed
        reason: String,
    },

    /// `--chown` user name is not known to the system
    #[error("unknown user: {0}")]
    UnknownUser(String),

    /// `--chown` group name is not known to the system
    #[error("unknown group: {0}")]
    UnknownGroup(String),

    /// The user/group database lookup itself failed
    #[error("failed to look up {name}: {source}")]
    UserLookup {
        /// The user or group name
        name: String,
        /// Underlying error
        source: io::Error,
    },

    /// Destination exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A non-directory entry would replace an existing directory
    #[error("Destination is a directory: {0}")]
    IsADirectory(PathBuf),

    /// Source entry is of a kind that cannot be recreated (e.g. a socket)
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(PathBuf),

    /// Failed to create a directory
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        /// Directory being created
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Failed to change ownership
    #[error("failed to chown {path}: {source}")]
    Chown {
        /// Target path
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Failed to change mode bits
    #[error("failed to chmod {path}: {source}")]
    Chmod {
        /// Target path
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Failed to set access/modification times
    #[error("failed to utime {path}: {source}")]
    SetTimes {
        /// Target path
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Failed to recreate a symlink
    #[error("failed to create symlink {path} -> {target}: {source}")]
    Symlink {
        /// Link being created
        path: PathBuf,
        /// Link target text
        target: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Failed to recreate a device node or FIFO
    #[error("failed to mknod {path}: {source}")]
    Mknod {
        /// Node being created
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Failed to copy one extended attribute
    #[error("failed to copy xattr {key} from {src} to {dst}: {source}")]
    Xattr {
        /// Source entry
        src: PathBuf,
        /// Destination entry
        dst: PathBuf,
        /// Attribute name (empty when listing failed)
        key: String,
        /// Underlying error
        source: io::Error,
    },

    /// Failed to create temporary file
    #[error("Failed to create temporary file in {path}: {source}")]
    TempFile {
        /// Directory where temp file creation was attempted
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Failed to persist temporary file
    #[error("Failed to persist temporary file to {path}: {source}")]
    Persist {
        /// Target path
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// The archive tool could not be started or waited on
    #[error("failed to run {program} for {src} -> {dst}: {source}")]
    ExtractSpawn {
        /// Program that was invoked
        program: PathBuf,
        /// Archive being extracted
        src: PathBuf,
        /// Extraction directory
        dst: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// The archive tool exited unsuccessfully
    #[error("failed to extract {src} to {dst}: {status}")]
    ExtractFailed {
        /// Archive being extracted
        src: PathBuf,
        /// Extraction directory
        dst: PathBuf,
        /// Exit status of the tool
        status: ExitStatus,
    },

    /// A single source failed; wraps the underlying error with both paths
    #[error("failed to copy {src} to {dst}: {source}")]
    CopySource {
        /// Source as passed to the copy engine
        src: PathBuf,
        /// Destination as passed to the copy engine
        dst: PathBuf,
        /// Underlying error
        source: Box<Error>,
    },

    /// Operation was cancelled via cancellation token
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// The stable category of this error.
    ///
    /// [`Error::CopySource`] reports the category of the error it wraps.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgs { .. } => ErrorCode::InvalidInput,
            Self::SourceNotFound(_) => ErrorCode::SourceNotFound,
            Self::UnsafeDestination { .. } => ErrorCode::UnsafeDestination,
            Self::UnknownUser(_) | Self::UnknownGroup(_) | Self::UserLookup { .. } => {
                ErrorCode::Ownership
            }
            Self::ExtractSpawn { .. } | Self::ExtractFailed { .. } => ErrorCode::ExtractFailed,
            Self::Cancelled => ErrorCode::Cancelled,
            Self::CopySource { source, .. } => source.code(),
            Self::NotADirectory(_) | Self::IsADirectory(_) | Self::UnsupportedFileType(_) => {
                ErrorCode::IoError
            }
            Self::Io(source)
            | Self::Stat { source, .. }
            | Self::CreateDir { source, .. }
            | Self::Chown { source, .. }
            | Self::Chmod { source, .. }
            | Self::SetTimes { source, .. }
            | Self::Symlink { source, .. }
            | Self::Mknod { source, .. }
            | Self::Xattr { source, .. }
            | Self::TempFile { source, .. }
            | Self::Persist { source, .. } => io_error_code(source),
        }
    }

    /// Whether this error, or the error it wraps, is [`Error::Cancelled`].
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.code() == ErrorCode::Cancelled
    }
}

fn io_error_code(error: &io::Error) -> ErrorCode {
    match error.kind() {
        io::ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
        io::ErrorKind::NotFound => ErrorCode::SourceNotFound,
        _ => ErrorCode::IoError,
    }
}
