//! Ownership, mode, timestamp, and extended-attribute replication.
//!
//! Attributes are read from the source's `lstat` metadata and applied to the
//! destination without following symlinks, in a fixed order: owner, extended
//! attributes, mode (skipped for symlinks), then access/modification times.
//! Extended attributes go in while the entry is still writable, one key at a
//! time, so a single unsupported key does not hide the others.

use crate::error::{Error, Result};
use crate::options::{ChownOpt, XattrErrorHandler};
use filetime::FileTime;
use std::fs::{self, Metadata, Permissions};
use std::os::unix::fs::{MetadataExt, PermissionsExt, lchown};
use std::path::Path;

/// Permission, setuid, setgid and sticky bits.
const MODE_MASK: u32 = 0o7777;

/// Apply the owner from `meta` to `dst`.
///
/// `chown` replaces the source's uid/gid when set.
pub(crate) fn copy_owner(meta: &Metadata, dst: &Path, chown: Option<ChownOpt>) -> Result<()> {
    let (uid, gid) = match chown {
        Some(owner) => (owner.uid, owner.gid),
        None => (meta.uid(), meta.gid()),
    };
    lchown(dst, Some(uid), Some(gid)).map_err(|e| Error::Chown {
        path: dst.to_path_buf(),
        source: e,
    })
}

/// Apply mode and times from `meta` to `dst`.
///
/// Runs last: the mode may drop write access, and any later change would
/// bump the times again.
pub(crate) fn copy_mode_and_times(meta: &Metadata, dst: &Path) -> Result<()> {
    // chmod would follow the link
    if !meta.file_type().is_symlink() {
        fs::set_permissions(dst, Permissions::from_mode(meta.mode() & MODE_MASK)).map_err(
            |e| Error::Chmod {
                path: dst.to_path_buf(),
                source: e,
            },
        )?;
    }

    let atime = FileTime::from_last_access_time(meta);
    let mtime = FileTime::from_last_modification_time(meta);
    filetime::set_symlink_file_times(dst, atime, mtime).map_err(|e| Error::SetTimes {
        path: dst.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

/// Copy every extended attribute of `src` onto `dst`.
///
/// Failures are routed through `handler`; the returned count is the number
/// of failures it chose to suppress.
pub(crate) fn copy_xattrs(dst: &Path, src: &Path, handler: XattrErrorHandler) -> Result<u64> {
    let mut suppressed = 0u64;

    let names = match xattr::list(src) {
        Ok(names) => names,
        Err(e) => {
            report(handler, dst, src, "", e)?;
            return Ok(1);
        }
    };

    for name in names {
        let key = name.to_string_lossy();
        let value = match xattr::get(src, &name) {
            Ok(Some(value)) => value,
            // Removed between list and get
            Ok(None) => continue,
            Err(e) => {
                report(handler, dst, src, &key, e)?;
                suppressed += 1;
                continue;
            }
        };
        if let Err(e) = xattr::set(dst, &name, &value) {
            report(handler, dst, src, &key, e)?;
            suppressed += 1;
        }
    }

    Ok(suppressed)
}

fn report(
    handler: XattrErrorHandler,
    dst: &Path,
    src: &Path,
    key: &str,
    source: std::io::Error,
) -> Result<()> {
    let error = Error::Xattr {
        src: src.to_path_buf(),
        dst: dst.to_path_buf(),
        key: key.to_owned(),
        source,
    };
    handler(dst, src, key, error)
}
