//! Native query capability trait.
//!
//! This module defines the interface through which the snapshot builder
//! talks to the operating system. The builder never calls Win32 directly;
//! everything goes through a `NativeQuery` implementation, which keeps the
//! reconciliation logic platform-agnostic and testable.
//!
//! ## Implementing a Backend
//!
//! Implementations report raw outcomes. They should not decide which
//! failures are tolerable: a sharing violation from `open_handle` is returned
//! as an error, and the builder decides to fall back to enumeration. The one
//! exception is the two-phase security descriptor fetch, where the expected
//! `ERROR_INSUFFICIENT_BUFFER` from the size probe is handled internally.

use crate::error::{NativeError, ERROR_FILE_NOT_FOUND, ERROR_NO_MORE_FILES, NO_ERROR};
use crate::types::FileType;
use bitflags::bitflags;

/// Result type for native calls
pub type NativeResult<T> = std::result::Result<T, NativeError>;

/// `IO_REPARSE_TAG_SYMLINK`
pub const IO_REPARSE_TAG_SYMLINK: u32 = 0xA000_000C;

/// The well-known NULL SID, used when the owner of an entry cannot be read.
pub const UNKNOWN_SID: &str = "S-1-0-0";

pub const GENERIC_READ: u32 = 0x8000_0000;
pub const GENERIC_WRITE: u32 = 0x4000_0000;
pub const GENERIC_EXECUTE: u32 = 0x2000_0000;
pub const GENERIC_ALL: u32 = 0x1000_0000;

pub const FILE_READ_DATA: u32 = 0x0001;
pub const FILE_WRITE_DATA: u32 = 0x0002;
pub const FILE_GENERIC_READ: u32 = 0x0012_0089;
pub const FILE_GENERIC_WRITE: u32 = 0x0012_0116;
pub const FILE_GENERIC_EXECUTE: u32 = 0x0012_00A0;
pub const FILE_ALL_ACCESS: u32 = 0x001F_01FF;

/// Raw FILETIME halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawFileTime {
    pub high: u32,
    pub low: u32,
}

impl RawFileTime {
    pub fn new(high: u32, low: u32) -> Self {
        RawFileTime { high, low }
    }

    pub fn to_unix(self) -> i64 {
        crate::codec::filetime_to_unix(self.high, self.low)
    }
}

/// What `GetFileType` returned, together with the thread's last error
/// captured immediately after the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTypeProbe {
    pub code: u32,
    pub last_error: u32,
}

impl FileTypeProbe {
    /// Decode the probe. An unknown type is only an error when the call
    /// also left a non-zero last error; on its own it is a valid answer.
    pub fn decode(self) -> NativeResult<FileType> {
        if self.code == FileType::UNKNOWN_CODE && self.last_error != NO_ERROR {
            return Err(NativeError::from_code("GetFileType", self.last_error));
        }
        Ok(FileType::from_code(self.code))
    }
}

/// One directory-enumeration entry (`WIN32_FIND_DATAW`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FindRecord {
    pub attributes: u32,
    pub creation_time: RawFileTime,
    pub last_access_time: RawFileTime,
    pub last_write_time: RawFileTime,
    pub size_high: u32,
    pub size_low: u32,
    /// `dwReserved0`: the reparse tag when the reparse-point bit is set
    pub reparse_tag: u32,
    pub file_name: String,
}

impl FindRecord {
    pub fn size(&self) -> u64 {
        crate::codec::size_from_parts(self.size_high, self.size_low)
    }

    /// Settle the outcome of a search that opened a valid handle.
    ///
    /// `first_error` is the last error captured right after
    /// `FindFirstFileW`. When it is `ERROR_FILE_NOT_FOUND` the entry is asked
    /// for again through `next`; a follow-up that finds no more entries
    /// keeps the first record.
    pub fn settle_search<F>(
        first: FindRecord,
        first_error: u32,
        next: F,
    ) -> NativeResult<FindRecord>
    where
        F: FnOnce() -> NativeResult<FindRecord>,
    {
        if first_error != ERROR_FILE_NOT_FOUND {
            return Ok(first);
        }
        match next() {
            Ok(record) => Ok(record),
            Err(err) if err.code == ERROR_NO_MORE_FILES => Ok(first),
            Err(err) => Err(err),
        }
    }
}

/// Information returned by `GetFileInformationByHandle`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HandleRecord {
    pub attributes: u32,
    pub creation_time: RawFileTime,
    pub last_access_time: RawFileTime,
    pub last_write_time: RawFileTime,
    pub volume_serial: u32,
    pub size_high: u32,
    pub size_low: u32,
    pub link_count: u32,
    pub index_high: u32,
    pub index_low: u32,
}

impl HandleRecord {
    pub fn size(&self) -> u64 {
        crate::codec::size_from_parts(self.size_high, self.size_low)
    }

    pub fn inode(&self) -> u64 {
        crate::codec::inode_from_parts(self.index_high, self.index_low)
    }
}

/// Cluster layout reported by `GetDiskFreeSpaceW`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterGeometry {
    pub sectors_per_cluster: u32,
    pub bytes_per_sector: u32,
}

impl ClusterGeometry {
    pub fn cluster_size(&self) -> u64 {
        u64::from(self.sectors_per_cluster) * u64::from(self.bytes_per_sector)
    }
}

bitflags! {
    /// Which parts of a security descriptor to fetch
    /// (`OWNER_SECURITY_INFORMATION` and friends).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SecurityInfo: u32 {
        const OWNER = 0x1;
        const GROUP = 0x2;
        const DACL = 0x4;
    }
}

/// A self-relative security descriptor plus the SID strings that were
/// requested with it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecurityDescriptor {
    /// Self-relative descriptor bytes, as returned by `GetFileSecurityW`
    pub raw: Vec<u8>,
    pub owner_sid: Option<String>,
    pub group_sid: Option<String>,
}

/// Which SID to read from the current process token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    User,
    PrimaryGroup,
}

/// Native capability interface consumed by the snapshot builder.
///
/// ## Resource Handling
///
/// `Handle` must release its native resource on drop. The builder holds at
/// most one handle per query and drops it before returning, on every path.
pub trait NativeQuery {
    /// An open file handle
    type Handle;

    /// Open `path` with backup semantics and without following reparse
    /// points. Desired access is zero and the share mode is read.
    fn open_handle(&self, path: &str) -> NativeResult<Self::Handle>;

    /// Query the file type of an open handle.
    fn file_type(&self, handle: &Self::Handle) -> FileTypeProbe;

    /// Find the directory entry for `path`.
    ///
    /// Fails only when the entry does not exist at all.
    fn find_first(&self, path: &str) -> NativeResult<FindRecord>;

    /// Read full information for an open handle.
    fn handle_info(&self, handle: &Self::Handle) -> NativeResult<HandleRecord>;

    /// The `DRIVE_*` code of a root path. Never fails; unknown roots give 0.
    fn drive_type(&self, root: &str) -> u32;

    /// Cluster geometry of the volume at `root`.
    fn disk_free_space(&self, root: &str) -> NativeResult<ClusterGeometry>;

    /// Fetch a security descriptor for `path`.
    fn file_security(&self, path: &str, info: SecurityInfo) -> NativeResult<SecurityDescriptor>;

    /// The string SID of the current process user or primary group.
    fn token_sid(&self, kind: TokenKind) -> NativeResult<String>;

    /// Run an access check of `desired` (already mapped to specific rights)
    /// for an impersonation copy of the process token.
    fn access_check(&self, descriptor: &SecurityDescriptor, desired: u32) -> NativeResult<bool>;

    /// Effective rights of the Everyone SID under the descriptor's DACL, or
    /// `None` when the descriptor carries no DACL.
    fn everyone_rights(&self, descriptor: &SecurityDescriptor) -> NativeResult<Option<u32>>;

    /// Raw alternate stream names of `path`, e.g. `":Zone.Identifier:$DATA"`.
    fn stream_names(&self, path: &str) -> NativeResult<Vec<String>>;
}
