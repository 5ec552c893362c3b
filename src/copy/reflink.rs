//! Copy-on-write cloning of regular files.
//!
//! With the `reflink` feature on Linux and macOS, a regular file whose
//! destination directory lives on a CoW-capable filesystem (Btrfs, XFS,
//! APFS) is cloned instead of copied. Filesystem support is probed once per
//! device and remembered for the rest of the request.

use std::path::Path;

/// Per-request memo of which destination devices accept reflinks.
#[derive(Debug, Default)]
pub(crate) struct ReflinkProbe {
    #[cfg(all(feature = "reflink", any(target_os = "linux", target_os = "macos")))]
    by_device: std::collections::HashMap<u64, bool>,
}

impl ReflinkProbe {
    /// Try to clone `src` to the not-yet-existing `dst` inside `dst_dir`.
    ///
    /// Returns `false` when cloning is unavailable or failed; the caller then
    /// falls back to a regular copy. A failed attempt never leaves `dst` behind.
    #[cfg(all(feature = "reflink", any(target_os = "linux", target_os = "macos")))]
    pub(crate) fn try_clone(&mut self, src: &Path, dst: &Path, dst_dir: &Path) -> bool {
        use std::os::unix::fs::MetadataExt;

        let device = match dst_dir.metadata() {
            Ok(meta) => meta.dev(),
            Err(_) => return false,
        };
        let supported = *self
            .by_device
            .entry(device)
            .or_insert_with(|| platform::filesystem_supports_reflink(dst_dir));
        if !supported {
            return false;
        }

        match reflink_copy::reflink(src, dst) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(src = %src.display(), error = %e, "reflink failed, copying");
                // Cross-device or unsupported for this pair; don't retry on this device
                self.by_device.insert(device, false);
                match std::fs::remove_file(dst) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => {
                        tracing::debug!(
                            dst = %dst.display(),
                            error = %e,
                            "partial clone left behind"
                        );
                    }
                }
                false
            }
        }
    }

    #[cfg(not(all(feature = "reflink", any(target_os = "linux", target_os = "macos"))))]
    pub(crate) fn try_clone(&mut self, _src: &Path, _dst: &Path, _dst_dir: &Path) -> bool {
        false
    }
}

#[cfg(all(feature = "reflink", target_os = "linux"))]
mod platform {
    use nix::sys::statfs::{BTRFS_SUPER_MAGIC, XFS_SUPER_MAGIC, statfs};
    use std::path::Path;

    /// Btrfs always clones; XFS only when created with `reflink=1`, which
    /// the clone attempt itself will tell us.
    pub(super) fn filesystem_supports_reflink(dir: &Path) -> bool {
        match statfs(dir) {
            Ok(stat) => {
                let fs_type = stat.filesystem_type();
                fs_type == BTRFS_SUPER_MAGIC || fs_type == XFS_SUPER_MAGIC
            }
            Err(_) => false,
        }
    }
}

#[cfg(all(feature = "reflink", target_os = "macos"))]
mod platform {
    use std::path::Path;

    // APFS is the default on every supported macOS; clonefile reports
    // anything else and the probe remembers it.
    pub(super) fn filesystem_supports_reflink(_dir: &Path) -> bool {
        true
    }
}
