//! Attribute-preserving copy engine.
//!
//! [`copy_path`] copies files, directories, symlinks, hard links, FIFOs and
//! device nodes, replicating ownership, mode bits, timestamps and extended
//! attributes. Regular files are written atomically (temp file + rename).

mod attrs;
mod dir;
mod file;
mod reflink;
pub(crate) mod utils;

// Re-export public API
pub use dir::{CopyStats, copy_path};
