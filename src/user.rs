//! `--chown` value parsing.
//!
//! Accepts `user`, `user:group`, `uid`, `uid:gid` and mixed forms. Names are
//! looked up in the system user/group database. Without a group part the gid
//! is the same number as the resolved uid.

use crate::error::{Error, Result};
use crate::options::ChownOpt;
use nix::unistd::{Group, User};
use std::io;

/// Parse an ownership string into a [`ChownOpt`].
///
/// # Errors
///
/// - [`Error::UnknownUser`] / [`Error::UnknownGroup`] if a name does not exist
///   or a part is empty
/// - [`Error::UserLookup`] if the user/group database cannot be read
///
/// # Example
///
/// ```
/// use addcopy::{ChownOpt, parse_chown};
///
/// assert_eq!(parse_chown("1000:2000")?, ChownOpt { uid: 1000, gid: 2000 });
/// assert_eq!(parse_chown("1000")?, ChownOpt { uid: 1000, gid: 1000 });
/// # Ok::<(), addcopy::Error>(())
/// ```
pub fn parse_chown(spec: &str) -> Result<ChownOpt> {
    let (user, group) = match spec.split_once(':') {
        Some((user, group)) => (user, Some(group)),
        None => (spec, None),
    };

    let uid = resolve_uid(user)?;
    let gid = match group {
        Some(group) => resolve_gid(group)?,
        None => uid,
    };

    tracing::debug!(spec, uid, gid, "resolved ownership");
    Ok(ChownOpt { uid, gid })
}

fn resolve_uid(user: &str) -> Result<u32> {
    if user.is_empty() {
        return Err(Error::UnknownUser(user.to_owned()));
    }
    if let Ok(uid) = user.parse::<u32>() {
        return Ok(uid);
    }
    match User::from_name(user) {
        Ok(Some(found)) => Ok(found.uid.as_raw()),
        Ok(None) => Err(Error::UnknownUser(user.to_owned())),
        Err(errno) => Err(Error::UserLookup {
            name: user.to_owned(),
            source: io::Error::from(errno),
        }),
    }
}

fn resolve_gid(group: &str) -> Result<u32> {
    if group.is_empty() {
        return Err(Error::UnknownGroup(group.to_owned()));
    }
    if let Ok(gid) = group.parse::<u32>() {
        return Ok(gid);
    }
    match Group::from_name(group) {
        Ok(Some(found)) => Ok(found.gid.as_raw()),
        Ok(None) => Err(Error::UnknownGroup(group.to_owned())),
        Err(errno) => Err(Error::UserLookup {
            name: group.to_owned(),
            source: io::Error::from(errno),
        }),
    }
}
