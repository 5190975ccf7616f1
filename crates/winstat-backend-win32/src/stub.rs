//! Stub implementation for non-Windows platforms.

use crate::error::win32_error;
use std::path::Path;
use winstat_core::error::ERROR_CALL_NOT_IMPLEMENTED;
use winstat_core::native::{
    ClusterGeometry, FileTypeProbe, FindRecord, HandleRecord, NativeQuery, NativeResult,
    SecurityDescriptor, SecurityInfo, TokenKind,
};
use winstat_core::{NativeError, Result, Snapshot};

/// Stub Win32 backend for non-Windows platforms.
///
/// This allows the crate to compile on non-Windows platforms,
/// but every query fails with `ERROR_CALL_NOT_IMPLEMENTED`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32Query;

/// Stands in for a file handle; never constructed.
#[derive(Debug)]
pub struct StubHandle;

fn unavailable(function: &str) -> NativeError {
    win32_error(function, ERROR_CALL_NOT_IMPLEMENTED)
}

impl Win32Query {
    pub fn new() -> Self {
        Win32Query
    }

    pub fn stat(&self, path: impl AsRef<Path>) -> Result<Snapshot> {
        winstat_core::stat(self, path)
    }
}

impl NativeQuery for Win32Query {
    type Handle = StubHandle;

    fn open_handle(&self, _path: &str) -> NativeResult<StubHandle> {
        Err(unavailable("CreateFileW"))
    }

    fn file_type(&self, _handle: &StubHandle) -> FileTypeProbe {
        FileTypeProbe {
            code: 0,
            last_error: ERROR_CALL_NOT_IMPLEMENTED,
        }
    }

    fn find_first(&self, _path: &str) -> NativeResult<FindRecord> {
        Err(unavailable("FindFirstFileW"))
    }

    fn handle_info(&self, _handle: &StubHandle) -> NativeResult<HandleRecord> {
        Err(unavailable("GetFileInformationByHandle"))
    }

    fn drive_type(&self, _root: &str) -> u32 {
        0
    }

    fn disk_free_space(&self, _root: &str) -> NativeResult<ClusterGeometry> {
        Err(unavailable("GetDiskFreeSpaceW"))
    }

    fn file_security(&self, _path: &str, _info: SecurityInfo) -> NativeResult<SecurityDescriptor> {
        Err(unavailable("GetFileSecurityW"))
    }

    fn token_sid(&self, _kind: TokenKind) -> NativeResult<String> {
        Err(unavailable("GetTokenInformation"))
    }

    fn access_check(&self, _descriptor: &SecurityDescriptor, _desired: u32) -> NativeResult<bool> {
        Err(unavailable("AccessCheck"))
    }

    fn everyone_rights(&self, _descriptor: &SecurityDescriptor) -> NativeResult<Option<u32>> {
        Err(unavailable("GetEffectiveRightsFromAclW"))
    }

    fn stream_names(&self, _path: &str) -> NativeResult<Vec<String>> {
        Err(unavailable("FindFirstStreamW"))
    }
}
