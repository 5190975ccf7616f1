//! Win32 implementation of `NativeQuery`.

use crate::winapi_utils::{ErrorModeGuard, SafeHandle};
use crate::{file, security, volume};
use std::path::Path;
use tracing::debug;
use winstat_core::native::{
    ClusterGeometry, FileTypeProbe, FindRecord, HandleRecord, NativeQuery, NativeResult,
    SecurityDescriptor, SecurityInfo, TokenKind,
};
use winstat_core::{Result, Snapshot};

/// Native metadata queries through the wide-character Win32 API.
///
/// Holds no state; every call opens and releases its own handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32Query;

impl Win32Query {
    pub fn new() -> Self {
        Win32Query
    }

    /// Capture a snapshot of `path`.
    ///
    /// Critical-error dialogs (such as "no disk in drive") are suppressed
    /// for the duration of the query.
    pub fn stat(&self, path: impl AsRef<Path>) -> Result<Snapshot> {
        let _error_mode = ErrorModeGuard::new();
        debug!(path = %path.as_ref().display(), "Native stat");
        winstat_core::stat(self, path)
    }
}

impl NativeQuery for Win32Query {
    type Handle = SafeHandle;

    fn open_handle(&self, path: &str) -> NativeResult<SafeHandle> {
        file::open_handle(path)
    }

    fn file_type(&self, handle: &SafeHandle) -> FileTypeProbe {
        file::file_type(handle)
    }

    fn find_first(&self, path: &str) -> NativeResult<FindRecord> {
        file::find_first(path)
    }

    fn handle_info(&self, handle: &SafeHandle) -> NativeResult<HandleRecord> {
        file::handle_info(handle)
    }

    fn drive_type(&self, root: &str) -> u32 {
        volume::drive_type(root)
    }

    fn disk_free_space(&self, root: &str) -> NativeResult<ClusterGeometry> {
        volume::disk_free_space(root)
    }

    fn file_security(&self, path: &str, info: SecurityInfo) -> NativeResult<SecurityDescriptor> {
        security::file_security(path, info)
    }

    fn token_sid(&self, kind: TokenKind) -> NativeResult<String> {
        security::token_sid(kind)
    }

    fn access_check(&self, descriptor: &SecurityDescriptor, desired: u32) -> NativeResult<bool> {
        security::access_check(descriptor, desired)
    }

    fn everyone_rights(&self, descriptor: &SecurityDescriptor) -> NativeResult<Option<u32>> {
        security::everyone_rights(descriptor)
    }

    fn stream_names(&self, path: &str) -> NativeResult<Vec<String>> {
        file::stream_names(path)
    }
}
