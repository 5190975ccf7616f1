//! Effective access rights for the current process and for Everyone.
//!
//! An unreadable security descriptor means "no access" rather than an
//! error: the checks fail closed. Failures further along (opening or
//! duplicating the process token, reading effective rights) are fatal.

use crate::error::Result;
use crate::native::{
    NativeQuery, SecurityDescriptor, SecurityInfo, FILE_ALL_ACCESS, FILE_GENERIC_EXECUTE,
    FILE_GENERIC_READ, FILE_GENERIC_WRITE, FILE_READ_DATA, FILE_WRITE_DATA, GENERIC_ALL,
    GENERIC_EXECUTE, GENERIC_READ, GENERIC_WRITE,
};
use tracing::debug;

/// Whose access is being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    /// The current process, through an impersonation copy of its token
    CurrentProcess,
    /// The well-known Everyone SID (`S-1-1-0`)
    Everyone,
}

/// Generic-to-specific mapping for file objects.
const FILE_GENERIC_MAPPING: [(u32, u32); 4] = [
    (GENERIC_READ, FILE_GENERIC_READ),
    (GENERIC_WRITE, FILE_GENERIC_WRITE),
    (GENERIC_EXECUTE, FILE_GENERIC_EXECUTE),
    (GENERIC_ALL, FILE_ALL_ACCESS),
];

const DESCRIPTOR_INFO: SecurityInfo = SecurityInfo::OWNER
    .union(SecurityInfo::GROUP)
    .union(SecurityInfo::DACL);

/// Replace generic rights with their file-specific equivalents, as
/// `MapGenericMask` does. Specific bits pass through unchanged.
pub fn map_generic_mask(desired: u32) -> u32 {
    FILE_GENERIC_MAPPING
        .iter()
        .fold(desired, |mask, &(generic, specific)| {
            if mask & generic != 0 {
                (mask & !generic) | specific
            } else {
                mask
            }
        })
}

/// Check whether `subject` is granted all of `desired` on `path`.
pub fn check_access<Q: NativeQuery>(
    query: &Q,
    path: &str,
    desired: u32,
    subject: Subject,
) -> Result<bool> {
    match fetch_descriptor(query, path) {
        Some(descriptor) => check_descriptor(query, &descriptor, desired, subject),
        None => Ok(false),
    }
}

fn fetch_descriptor<Q: NativeQuery>(query: &Q, path: &str) -> Option<SecurityDescriptor> {
    match query.file_security(path, DESCRIPTOR_INFO) {
        Ok(descriptor) => Some(descriptor),
        Err(err) => {
            debug!(path = %path, error = %err, "Security descriptor unavailable, denying access");
            None
        }
    }
}

fn check_descriptor<Q: NativeQuery>(
    query: &Q,
    descriptor: &SecurityDescriptor,
    desired: u32,
    subject: Subject,
) -> Result<bool> {
    match subject {
        Subject::CurrentProcess => Ok(query.access_check(descriptor, map_generic_mask(desired))?),
        Subject::Everyone => match query.everyone_rights(descriptor)? {
            Some(rights) => Ok(rights & desired == desired),
            None => Ok(false),
        },
    }
}

/// The four access predicates a snapshot carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessRights {
    pub readable: bool,
    pub writable: bool,
    pub world_readable: bool,
    pub world_writable: bool,
}

/// Evaluate every access predicate for `path` with one descriptor fetch.
///
/// A readonly regular file is never writable. Directories ignore the
/// readonly attribute.
pub fn evaluate<Q: NativeQuery>(
    query: &Q,
    path: &str,
    directory: bool,
    readonly: bool,
) -> Result<AccessRights> {
    let descriptor = match fetch_descriptor(query, path) {
        Some(descriptor) => descriptor,
        None => return Ok(AccessRights::default()),
    };

    let readable = check_descriptor(query, &descriptor, GENERIC_READ, Subject::CurrentProcess)?;
    let mut writable =
        check_descriptor(query, &descriptor, GENERIC_WRITE, Subject::CurrentProcess)?;
    if !directory && readonly {
        writable = false;
    }

    let world_readable = check_descriptor(query, &descriptor, FILE_READ_DATA, Subject::Everyone)?;
    let world_writable =
        check_descriptor(query, &descriptor, FILE_WRITE_DATA, Subject::Everyone)?;

    Ok(AccessRights {
        readable,
        writable,
        world_readable,
        world_writable,
    })
}
