//! Configuration options for copy requests.
//!
//! This module provides [`CopyOptions`] for configuring a request,
//! [`ChownOpt`] for the ownership override, and the extended-attribute
//! error policy type [`XattrErrorHandler`].
//!
//! # Example
//!
//! ```
//! use addcopy::{ChownOpt, CopyOptions};
//!
//! let options = CopyOptions::default()
//!     .with_unpack()
//!     .with_chown(ChownOpt { uid: 1000, gid: 1000 })
//!     .with_root("/srv/build");
//! ```

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Ownership applied to every copied entry instead of the source's own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChownOpt {
    /// Owning user id
    pub uid: u32,
    /// Owning group id
    pub gid: u32,
}

/// Policy for a failed extended-attribute copy.
///
/// Called with the destination entry, the source entry, the attribute name
/// (empty when listing the source's attributes failed) and the error.
/// Returning `Ok(())` suppresses the failure and the copy continues with the
/// remaining attributes and entries; returning `Err` aborts the request.
pub type XattrErrorHandler = fn(dst: &Path, src: &Path, key: &str, error: Error) -> Result<()>;

/// Default [`XattrErrorHandler`]: log a warning and continue.
pub fn log_xattr_error(dst: &Path, src: &Path, key: &str, error: Error) -> Result<()> {
    tracing::warn!(
        dst = %dst.display(),
        src = %src.display(),
        key,
        "{}",
        error
    );
    Ok(())
}

/// [`XattrErrorHandler`] that treats every extended-attribute failure as fatal.
pub fn propagate_xattr_error(_dst: &Path, _src: &Path, _key: &str, error: Error) -> Result<()> {
    Err(error)
}

/// Options for a copy request.
///
/// Use [`Default::default()`] to get sensible defaults, then customize
/// using the builder methods.
///
/// # Default Values
///
/// | Field | Default | Description |
/// |-------|---------|-------------|
/// | `unpack` | `false` | Copy archives verbatim |
/// | `chown` | `None` | Keep source ownership |
/// | `root` | `/` | Boundary for symlinked destinations |
/// | `xattr_error_handler` | [`log_xattr_error`] | Log and continue |
/// | `cancel_token` | `None` | Not cancellable |
/// | `tar_program` | `tar` | Archive tool used for extraction |
/// | `verbose_extract` | `true` | Pass `-v` to the archive tool |
#[derive(Debug, Clone)]
pub struct CopyOptions {
    /// Extract recognized archives instead of copying them (default: false)
    pub unpack: bool,

    /// Ownership override for every copied entry and created directory
    pub chown: Option<ChownOpt>,

    /// Directory that symlinked destinations are resolved inside of
    ///
    /// A destination that is a symlink is followed as if `root` were `/`,
    /// so `..` and absolute link targets can never leave it.
    pub root: PathBuf,

    /// What to do when an extended attribute cannot be copied
    pub xattr_error_handler: XattrErrorHandler,

    /// Cancellation token checked between entries and while extracting
    pub cancel_token: Option<CancellationToken>,

    /// Archive tool invoked for extraction (default: `tar`)
    pub tar_program: PathBuf,

    /// List extracted entries on stdout (default: true)
    pub verbose_extract: bool,

    /// Callback for warnings (optional)
    ///
    /// If not set, warnings are logged via tracing.
    pub warn_handler: Option<fn(&str)>,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            unpack: false,
            chown: None,
            root: PathBuf::from("/"),
            xattr_error_handler: log_xattr_error,
            cancel_token: None,
            tar_program: PathBuf::from("tar"),
            verbose_extract: true,
            warn_handler: None,
        }
    }
}

impl CopyOptions {
    /// Extract recognized archives
    #[must_use]
    pub fn with_unpack(mut self) -> Self {
        self.unpack = true;
        self
    }

    /// Override ownership of everything written
    #[must_use]
    pub fn with_chown(mut self, chown: ChownOpt) -> Self {
        self.chown = Some(chown);
        self
    }

    /// Set the boundary for symlinked destinations
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Replace the extended-attribute error policy
    #[must_use]
    pub fn with_xattr_error_handler(mut self, handler: XattrErrorHandler) -> Self {
        self.xattr_error_handler = handler;
        self
    }

    /// Set a cancellation token for cooperative cancellation
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    /// Use a different archive tool
    #[must_use]
    pub fn with_tar_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.tar_program = program.into();
        self
    }

    /// Do not pass `-v` to the archive tool
    #[must_use]
    pub fn without_verbose_extract(mut self) -> Self {
        self.verbose_extract = false;
        self
    }

    /// Create options with a warning handler
    #[must_use]
    pub fn with_warn_handler(mut self, handler: fn(&str)) -> Self {
        self.warn_handler = Some(handler);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel_token
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    pub(crate) fn check_cancelled(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    pub(crate) fn warn(&self, msg: &str) {
        if let Some(handler) = self.warn_handler {
            handler(msg);
        } else {
            tracing::warn!("{}", msg);
        }
    }
}
