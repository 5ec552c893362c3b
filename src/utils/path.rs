//! Path utilities.
//!
//! `std::path` normalizes trailing separators and `.` components away, but
//! Dockerfile copy semantics depend on both (`dest/` vs `dest`, `dir/.` vs
//! `dir`). The helpers here work on the raw bytes where that matters.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Component, Path, PathBuf};

/// Maximum number of symlinks followed while resolving one path.
const MAX_SYMLINK_HOPS: usize = 255;

/// Suffix that marks a directory source as "copy contents, not the directory".
pub const CONTENTS_MARKER: &str = "/.";

/// Whether `path` was written with a trailing `/`.
#[inline]
pub fn has_trailing_separator(path: &Path) -> bool {
    path.as_os_str().as_bytes().ends_with(b"/")
}

/// Whether `path` ends with the `/.` contents marker.
#[inline]
pub fn has_contents_marker(path: &Path) -> bool {
    path.as_os_str().as_bytes().ends_with(CONTENTS_MARKER.as_bytes())
}

/// Append a `/` to `path` unless it already has one.
pub fn with_trailing_separator(path: &Path) -> PathBuf {
    if has_trailing_separator(path) {
        return path.to_path_buf();
    }
    let mut bytes = path.as_os_str().as_bytes().to_vec();
    bytes.push(b'/');
    PathBuf::from(OsString::from_vec(bytes))
}

/// Lexically clean `path`: collapse repeated separators, drop `.`, resolve
/// `..` against preceding names, and never climb above `/`.
///
/// An empty result becomes `.`. Nothing is read from the filesystem.
pub fn clean(path: &Path) -> PathBuf {
    let mut rooted = false;
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
    // count of leading ".." that could not be resolved (relative paths only)
    let mut leading_parents = 0usize;

    for component in path.components() {
        match component {
            Component::RootDir | Component::Prefix(_) => rooted = true,
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() && !rooted {
                    leading_parents += 1;
                }
            }
            Component::Normal(name) => parts.push(name),
        }
    }

    let mut out = if rooted {
        PathBuf::from("/")
    } else {
        PathBuf::new()
    };
    for _ in 0..leading_parents {
        out.push("..");
    }
    for part in parts {
        out.push(part);
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Append the `/.` contents marker to the cleaned form of `path`.
pub fn contents_of(path: &Path) -> PathBuf {
    let cleaned = clean(path);
    let mut bytes = cleaned.into_os_string().into_vec();
    if bytes != b"/" {
        bytes.push(b'/');
    }
    bytes.push(b'.');
    PathBuf::from(OsString::from_vec(bytes))
}

/// Everything up to the last `/` of `path`, then cleaned: `a/b` → `a`,
/// `b` → `.`, `/b` → `/`, `out/.` → `out`, `x/sub/..` → `x/sub`.
///
/// The split happens on the raw bytes, so a trailing `.` or `..` counts as
/// the final name rather than being folded into the directory first.
pub fn parent_dir(path: &Path) -> PathBuf {
    let bytes = path.as_os_str().as_bytes();
    let dir = match bytes.iter().rposition(|&b| b == b'/') {
        Some(i) => &bytes[..=i],
        None => &[][..],
    };
    clean(Path::new(std::ffi::OsStr::from_bytes(dir)))
}

/// Whether the last component of `path`, as written, is `.` or `..`.
pub fn ends_in_dot_component(path: &Path) -> bool {
    let bytes = path.as_os_str().as_bytes();
    let name = match bytes.iter().rposition(|&b| b == b'/') {
        Some(i) => &bytes[i + 1..],
        None => bytes,
    };
    name == b"." || name == b".."
}

/// Resolve `path` as if `root` were the filesystem root.
///
/// Every existing symlink along the way is followed, but `..` never climbs
/// above `root` and absolute link targets restart from `root`. Components that
/// do not exist are kept as written. The result is `root` joined with the
/// resolved path.
///
/// An absolute `path` that already lies under `root` is taken relative to
/// `root`; any other absolute path is re-rooted under it.
///
/// # Errors
///
/// Returns an error if more than 255 symlinks are followed or a path
/// component cannot be inspected for a reason other than not existing.
pub fn root_path(root: &Path, path: &Path) -> io::Result<PathBuf> {
    let relative = path.strip_prefix(root).unwrap_or(path);

    // Pending components, processed from the back of the vector.
    let mut pending: Vec<OsString> = Vec::new();
    push_components(&mut pending, relative);

    let mut resolved = PathBuf::new();
    let mut hops = 0usize;

    while let Some(name) = pending.pop() {
        if name == ".." {
            resolved.pop();
            continue;
        }

        let candidate = root.join(&resolved).join(&name);
        let meta = match fs::symlink_metadata(&candidate) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                resolved.push(&name);
                continue;
            }
            Err(e) => return Err(e),
        };

        if !meta.file_type().is_symlink() {
            resolved.push(&name);
            continue;
        }

        hops += 1;
        if hops > MAX_SYMLINK_HOPS {
            return Err(io::Error::other(format!(
                "too many links resolving {}",
                path.display()
            )));
        }

        let target = fs::read_link(&candidate)?;
        if target.has_root() {
            resolved = PathBuf::new();
        }
        push_components(&mut pending, &target);
    }

    Ok(root.join(resolved))
}

/// Push the meaningful components of `path` onto `pending` so that popping
/// yields them front to back.
fn push_components(pending: &mut Vec<OsString>, path: &Path) {
    let names: Vec<OsString> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_os_string()),
            Component::ParentDir => Some(OsString::from("..")),
            Component::RootDir | Component::CurDir | Component::Prefix(_) => None,
        })
        .collect();
    pending.extend(names.into_iter().rev());
}
