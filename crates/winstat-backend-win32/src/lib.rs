//! # winstat Win32 Backend
//!
//! This crate provides the Windows implementation of the `NativeQuery`
//! trait from `winstat-core`. It talks to the wide-character Win32 API
//! through the `windows` crate:
//!
//! - **Files** (`file.rs`): `CreateFileW`, `GetFileType`, `FindFirstFileW`,
//!   `GetFileInformationByHandle` and the alternate stream enumeration
//! - **Volumes** (`volume.rs`): `GetDriveTypeW` and `GetDiskFreeSpaceW`
//! - **Security** (`security.rs`): security descriptors, process token SIDs,
//!   `AccessCheck` and effective rights for Everyone
//! - **Utilities** (`winapi_utils.rs`): RAII guards and string conversion
//!
//! All unsafe code lives in those modules. On other platforms a stub
//! backend is compiled instead, whose every call fails with
//! `ERROR_CALL_NOT_IMPLEMENTED`.

#[cfg(windows)]
mod file;
#[cfg(windows)]
mod security;
#[cfg(windows)]
mod volume;
#[cfg(windows)]
mod winapi_utils;

#[cfg(windows)]
mod backend;

#[cfg(windows)]
pub use backend::Win32Query;

#[cfg(not(windows))]
mod stub;

#[cfg(not(windows))]
pub use stub::Win32Query;

/// Win32 error rendering
pub mod error;

use std::path::Path;
use winstat_core::{Result, Snapshot};

/// Capture a snapshot of `path` with the native backend.
///
/// Shorthand for `Win32Query::new().stat(path)`.
pub fn stat(path: impl AsRef<Path>) -> Result<Snapshot> {
    Win32Query::new().stat(path)
}
