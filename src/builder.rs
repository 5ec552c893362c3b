//! Builder API for ergonomic copy requests.
//!
//! The builder pattern provides a fluent interface for configuring and executing
//! a request. This is often more convenient than manually constructing
//! [`CopyOptions`] and calling [`resolve`](crate::resolve) and
//! [`dispatch`](crate::dispatch) yourself.
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```no_run
//! use addcopy::CopyBuilder;
//!
//! // COPY app/ /srv/app/
//! let report = CopyBuilder::new(["app/"], "/srv/app/").run()?;
//! println!("Copied {} files", report.totals().files_copied);
//! # Ok::<(), addcopy::Error>(())
//! ```
//!
//! ## ADD with Ownership
//!
//! ```no_run
//! use addcopy::{ChownOpt, CopyBuilder};
//!
//! let report = CopyBuilder::new(["rootfs.tar.xz", "motd"], "/srv/image/")
//!     .unpack()                                // Extract the tarball
//!     .chown(ChownOpt { uid: 1000, gid: 1000 }) // Own everything as 1000:1000
//!     .root("/srv")                            // Keep symlinked dests inside /srv
//!     .run()?;
//! # Ok::<(), addcopy::Error>(())
//! ```

use crate::cancel::CancellationToken;
use crate::dispatch::{CopyReport, dispatch};
use crate::error::Result;
use crate::options::{ChownOpt, CopyOptions, XattrErrorHandler};
use crate::resolve::{Resolved, resolve};
use std::path::{Path, PathBuf};

/// A builder for configuring and executing a copy request.
///
/// # Example
///
/// ```no_run
/// use addcopy::CopyBuilder;
///
/// let report = CopyBuilder::new(["a.txt", "b.txt"], "out")
///     .on_warning(|msg| eprintln!("warning: {msg}"))
///     .run()?;
/// # Ok::<(), addcopy::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct CopyBuilder {
    sources: Vec<PathBuf>,
    dest: PathBuf,
    options: CopyOptions,
}

impl CopyBuilder {
    /// Create a new `CopyBuilder` for `sources` and a destination.
    ///
    /// Uses default options (no unpacking, source ownership, root `/`).
    pub fn new<I, P, Q>(sources: I, dest: Q) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        Self {
            sources: sources
                .into_iter()
                .map(|p| p.as_ref().to_path_buf())
                .collect(),
            dest: dest.as_ref().to_path_buf(),
            options: CopyOptions::default(),
        }
    }

    /// Extract recognized archives instead of copying them.
    #[must_use]
    pub fn unpack(mut self) -> Self {
        self.options = self.options.with_unpack();
        self
    }

    /// Own every written entry and created directory as `owner`.
    #[must_use]
    pub fn chown(mut self, owner: ChownOpt) -> Self {
        self.options = self.options.with_chown(owner);
        self
    }

    /// Resolve symlinked destinations inside `root`.
    #[must_use]
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.options = self.options.with_root(root);
        self
    }

    /// Set a cancellation token for cooperative cancellation.
    ///
    /// When the token is cancelled, the request stops before the next entry
    /// (or kills a running extraction) and returns [`Error::Cancelled`](crate::Error::Cancelled).
    ///
    /// # Example
    ///
    /// ```no_run
    /// use addcopy::{CancellationToken, CopyBuilder};
    ///
    /// let token = CancellationToken::new();
    /// let handle = token.clone();
    ///
    /// // In another thread or signal handler:
    /// // handle.cancel();
    ///
    /// let result = CopyBuilder::new(["src/"], "dst/")
    ///     .cancel_token(token)
    ///     .run();
    /// ```
    #[must_use]
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.options = self.options.with_cancel_token(token);
        self
    }

    /// Replace the extended-attribute error policy.
    #[must_use]
    pub fn xattr_error_handler(mut self, handler: XattrErrorHandler) -> Self {
        self.options = self.options.with_xattr_error_handler(handler);
        self
    }

    /// Use a different archive tool for extraction.
    #[must_use]
    pub fn tar_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.options = self.options.with_tar_program(program);
        self
    }

    /// Don't let the archive tool list extracted entries.
    #[must_use]
    pub fn quiet_extract(mut self) -> Self {
        self.options = self.options.without_verbose_extract();
        self
    }

    /// Set a warning handler.
    ///
    /// If not set, warnings are logged via tracing.
    #[must_use]
    pub fn on_warning(mut self, handler: fn(&str)) -> Self {
        self.options = self.options.with_warn_handler(handler);
        self
    }

    /// Get a reference to the current options.
    pub fn options(&self) -> &CopyOptions {
        &self.options
    }

    /// Resolve the request without writing anything.
    ///
    /// # Errors
    ///
    /// See [`resolve`](crate::resolve).
    pub fn resolve(&self) -> Result<Resolved> {
        resolve(&self.sources, &self.dest, &self.options)
    }

    /// Execute the request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgs`](crate::Error::InvalidArgs) without
    /// sources, otherwise see [`resolve`](crate::resolve) and
    /// [`dispatch`](crate::dispatch).
    pub fn run(self) -> Result<CopyReport> {
        if self.sources.is_empty() {
            return Err(crate::Error::InvalidArgs { count: 1 });
        }
        let resolved = self.resolve()?;
        dispatch(&resolved, &self.options)
    }
}
