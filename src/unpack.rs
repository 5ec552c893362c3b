//! Archive extraction through an external `tar`.
//!
//! The archive tool runs as a child process with inherited stdout/stderr so
//! its listing and diagnostics reach the user directly. The child is polled
//! rather than waited on, so a cancelled request kills it instead of leaving
//! it running.

use crate::copy::utils::ensure_dir;
use crate::detect::ArchiveType;
use crate::error::{Error, Result};
use crate::options::CopyOptions;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

/// How often a running extraction checks for cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Arguments for extracting `src` into `dest`: `-xv[z|j|J]f src -C dest`.
pub fn tar_args(
    archive_type: ArchiveType,
    src: &Path,
    dest: &Path,
    verbose: bool,
) -> Vec<OsString> {
    let mut flags = String::from("-x");
    if verbose {
        flags.push('v');
    }
    if let Some(flag) = archive_type.tar_flag() {
        flags.push(flag);
    }
    flags.push('f');

    vec![
        OsString::from(flags),
        src.as_os_str().to_os_string(),
        OsString::from("-C"),
        dest.as_os_str().to_os_string(),
    ]
}

/// Extract the archive `src` into `dest`.
///
/// `dest` is created first (mode 0755) and chowned to `options.chown` when
/// set. Ownership of the extracted entries is left to the archive tool.
///
/// # Errors
///
/// - [`Error::ExtractSpawn`] if the tool cannot be started or waited on
/// - [`Error::ExtractFailed`] if it exits unsuccessfully
/// - [`Error::Cancelled`] if cancellation is requested while it runs; the
///   child is killed and reaped first
pub fn extract_archive(
    src: &Path,
    dest: &Path,
    archive_type: ArchiveType,
    options: &CopyOptions,
) -> Result<()> {
    options.check_cancelled()?;
    ensure_dir(dest, options.chown)?;

    let args = tar_args(archive_type, src, dest, options.verbose_extract);
    tracing::info!(
        program = %options.tar_program.display(),
        ?args,
        "exec"
    );

    let spawn_error = |source: std::io::Error| Error::ExtractSpawn {
        program: options.tar_program.clone(),
        src: src.to_path_buf(),
        dst: dest.to_path_buf(),
        source,
    };

    let mut child = Command::new(&options.tar_program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(spawn_error)?;

    let status: ExitStatus = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(spawn_error(e));
            }
        }
        if options.is_cancelled() {
            tracing::debug!(src = %src.display(), "cancelling extraction");
            let _ = child.kill();
            // reap zombie
            let _ = child.wait();
            return Err(Error::Cancelled);
        }
        thread::sleep(POLL_INTERVAL);
    };

    if !status.success() {
        return Err(Error::ExtractFailed {
            src: src.to_path_buf(),
            dst: dest.to_path_buf(),
            status,
        });
    }
    Ok(())
}
