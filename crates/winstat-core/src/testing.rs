//! In-memory `NativeQuery` used by unit tests.
//!
//! Entries are keyed by normalized path. Every call is logged so tests can
//! assert which native paths the builder took, and live handles are counted
//! so tests can assert that every handle was released.

use crate::error::{NativeError, ERROR_FILE_NOT_FOUND, ERROR_HANDLE_EOF, ERROR_PATH_NOT_FOUND};
use crate::native::{
    ClusterGeometry, FileTypeProbe, FindRecord, HandleRecord, NativeQuery, NativeResult,
    RawFileTime, SecurityDescriptor, SecurityInfo, TokenKind, FILE_ALL_ACCESS,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

pub const USER_SID: &str = "S-1-5-21-1004336348-1177238915-682003330-1001";
pub const GROUP_SID: &str = "S-1-5-21-1004336348-1177238915-682003330-513";

/// 2020-01-01T00:00:00Z as a FILETIME.
pub const FILETIME_2020: u64 = 132_223_104_000_000_000;
pub const UNIX_2020: i64 = 1_577_836_800;

fn filetime(ticks: u64) -> RawFileTime {
    RawFileTime::new((ticks >> 32) as u32, ticks as u32)
}

#[derive(Debug, Clone)]
pub struct MockEntry {
    pub open_error: Option<u32>,
    pub file_type: FileTypeProbe,
    pub find: Result<FindRecord, u32>,
    pub info: Result<HandleRecord, u32>,
    pub security: Result<(String, String), u32>,
    pub granted: u32,
    pub everyone: Option<u32>,
    pub streams: Result<Vec<String>, u32>,
}

impl MockEntry {
    /// A regular file of `size` bytes with the archive bit set.
    pub fn file(size: u64) -> Self {
        Self::with_attributes(0x20, size)
    }

    pub fn directory() -> Self {
        Self::with_attributes(0x10, 0)
    }

    fn with_attributes(attributes: u32, size: u64) -> Self {
        let size_high = (size >> 32) as u32;
        let size_low = size as u32;
        let find = FindRecord {
            attributes,
            creation_time: filetime(FILETIME_2020),
            last_access_time: filetime(FILETIME_2020 + 20_000_000),
            last_write_time: filetime(FILETIME_2020 + 10_000_000),
            size_high,
            size_low,
            reparse_tag: 0,
            file_name: String::new(),
        };
        let info = HandleRecord {
            attributes,
            creation_time: find.creation_time,
            last_access_time: find.last_access_time,
            last_write_time: find.last_write_time,
            volume_serial: 0xABCD_1234,
            size_high,
            size_low,
            link_count: 1,
            index_high: 0x0001_0000,
            index_low: 42,
        };
        MockEntry {
            open_error: None,
            file_type: FileTypeProbe {
                code: 1,
                last_error: 0,
            },
            find: Ok(find),
            info: Ok(info),
            security: Ok((USER_SID.to_string(), GROUP_SID.to_string())),
            granted: FILE_ALL_ACCESS,
            everyone: Some(0x0012_0089),
            streams: Err(ERROR_HANDLE_EOF),
        }
    }

    /// A character device such as `NUL`: the handle opens, but neither
    /// enumeration nor by-handle information is available.
    pub fn char_device() -> Self {
        MockEntry {
            open_error: None,
            file_type: FileTypeProbe {
                code: 2,
                last_error: 0,
            },
            find: Err(ERROR_FILE_NOT_FOUND),
            info: Err(1),
            security: Err(87),
            granted: 0,
            everyone: None,
            streams: Err(1),
        }
    }

    /// Opening the file fails with a sharing violation.
    pub fn locked(mut self) -> Self {
        self.open_error = Some(32);
        self
    }

    pub fn with_open_error(mut self, code: u32) -> Self {
        self.open_error = Some(code);
        self
    }

    pub fn with_file_type(mut self, code: u32, last_error: u32) -> Self {
        self.file_type = FileTypeProbe { code, last_error };
        self
    }

    pub fn with_attribute_bits(mut self, bits: u32) -> Self {
        if let Ok(find) = self.find.as_mut() {
            find.attributes |= bits;
        }
        if let Ok(info) = self.info.as_mut() {
            info.attributes |= bits;
        }
        self
    }

    pub fn with_reparse_tag(mut self, tag: u32) -> Self {
        if let Ok(find) = self.find.as_mut() {
            find.reparse_tag = tag;
        }
        self
    }

    pub fn with_links(mut self, count: u32) -> Self {
        if let Ok(info) = self.info.as_mut() {
            info.link_count = count;
        }
        self
    }

    pub fn with_find_error(mut self, code: u32) -> Self {
        self.find = Err(code);
        self
    }

    pub fn with_info_error(mut self, code: u32) -> Self {
        self.info = Err(code);
        self
    }

    pub fn with_security_error(mut self, code: u32) -> Self {
        self.security = Err(code);
        self
    }

    pub fn with_owner(mut self, owner: &str, group: &str) -> Self {
        self.security = Ok((owner.to_string(), group.to_string()));
        self
    }

    pub fn with_everyone(mut self, rights: Option<u32>) -> Self {
        self.everyone = rights;
        self
    }

    pub fn with_streams(mut self, streams: &[&str]) -> Self {
        self.streams = Ok(streams.iter().map(|s| s.to_string()).collect());
        self
    }
}

/// A handle that decrements the live-handle count when dropped.
#[derive(Debug)]
pub struct MockHandle {
    path: String,
    live: Rc<Cell<usize>>,
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

pub struct MockQuery {
    entries: HashMap<String, MockEntry>,
    drives: HashMap<String, u32>,
    geometry: HashMap<String, Result<ClusterGeometry, u32>>,
    token_error: Option<u32>,
    granted_override: Cell<Option<u32>>,
    access_error: RefCell<Option<NativeError>>,
    live: Rc<Cell<usize>>,
    opened: Cell<usize>,
    calls: RefCell<Vec<String>>,
}

impl MockQuery {
    /// A query with a fixed `C:\` drive using 4096-byte clusters.
    pub fn new() -> Self {
        let mut drives = HashMap::new();
        drives.insert("C:\\".to_string(), 3);
        let mut geometry = HashMap::new();
        geometry.insert(
            "C:\\".to_string(),
            Ok(ClusterGeometry {
                sectors_per_cluster: 8,
                bytes_per_sector: 512,
            }),
        );
        MockQuery {
            entries: HashMap::new(),
            drives,
            geometry,
            token_error: None,
            granted_override: Cell::new(None),
            access_error: RefCell::new(None),
            live: Rc::new(Cell::new(0)),
            opened: Cell::new(0),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_entry(mut self, path: &str, entry: MockEntry) -> Self {
        self.entries.insert(path.to_string(), entry);
        self
    }

    pub fn with_drive(mut self, root: &str, drive_type: u32, geometry: Result<ClusterGeometry, u32>) -> Self {
        self.drives.insert(root.to_string(), drive_type);
        self.geometry.insert(root.to_string(), geometry);
        self
    }

    pub fn with_token_error(mut self, code: u32) -> Self {
        self.token_error = Some(code);
        self
    }

    pub fn set_granted(&self, granted: u32) {
        self.granted_override.set(Some(granted));
    }

    pub fn fail_access_check(&self, err: NativeError) {
        *self.access_error.borrow_mut() = Some(err);
    }

    /// Handles currently open.
    pub fn live_handles(&self) -> usize {
        self.live.get()
    }

    /// Handles opened over the lifetime of this mock.
    pub fn opened_handles(&self) -> usize {
        self.opened.get()
    }

    pub fn called(&self, function: &str) -> bool {
        self.calls.borrow().iter().any(|c| c == function)
    }

    pub fn call_count(&self, function: &str) -> usize {
        self.calls.borrow().iter().filter(|c| *c == function).count()
    }

    fn record(&self, function: &str) {
        self.calls.borrow_mut().push(function.to_string());
    }

    fn entry(&self, function: &str, path: &str) -> NativeResult<&MockEntry> {
        self.entries
            .get(path)
            .ok_or_else(|| NativeError::from_code(function, ERROR_FILE_NOT_FOUND))
    }

    fn entry_for_descriptor(&self, descriptor: &SecurityDescriptor) -> Option<&MockEntry> {
        let path = String::from_utf8_lossy(&descriptor.raw);
        self.entries.get(path.as_ref())
    }
}

impl Default for MockQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeQuery for MockQuery {
    type Handle = MockHandle;

    fn open_handle(&self, path: &str) -> NativeResult<MockHandle> {
        self.record("CreateFileW");
        let entry = self.entry("CreateFileW", path)?;
        if let Some(code) = entry.open_error {
            return Err(NativeError::from_code("CreateFileW", code));
        }
        self.live.set(self.live.get() + 1);
        self.opened.set(self.opened.get() + 1);
        Ok(MockHandle {
            path: path.to_string(),
            live: Rc::clone(&self.live),
        })
    }

    fn file_type(&self, handle: &MockHandle) -> FileTypeProbe {
        self.record("GetFileType");
        self.entries
            .get(&handle.path)
            .map(|e| e.file_type)
            .unwrap_or(FileTypeProbe {
                code: 0,
                last_error: 6,
            })
    }

    fn find_first(&self, path: &str) -> NativeResult<FindRecord> {
        self.record("FindFirstFileW");
        let entry = self.entry("FindFirstFileW", path)?;
        entry
            .find
            .clone()
            .map_err(|code| NativeError::from_code("FindFirstFileW", code))
    }

    fn handle_info(&self, handle: &MockHandle) -> NativeResult<HandleRecord> {
        self.record("GetFileInformationByHandle");
        let entry = self.entry("GetFileInformationByHandle", &handle.path)?;
        entry
            .info
            .clone()
            .map_err(|code| NativeError::from_code("GetFileInformationByHandle", code))
    }

    fn drive_type(&self, root: &str) -> u32 {
        self.record("GetDriveTypeW");
        self.drives.get(root).copied().unwrap_or(0)
    }

    fn disk_free_space(&self, root: &str) -> NativeResult<ClusterGeometry> {
        self.record("GetDiskFreeSpaceW");
        match self.geometry.get(root) {
            Some(Ok(geometry)) => Ok(*geometry),
            Some(Err(code)) => Err(NativeError::from_code("GetDiskFreeSpaceW", *code)),
            None => Err(NativeError::from_code("GetDiskFreeSpaceW", ERROR_PATH_NOT_FOUND)),
        }
    }

    fn file_security(&self, path: &str, info: SecurityInfo) -> NativeResult<SecurityDescriptor> {
        self.record("GetFileSecurityW");
        let entry = self.entry("GetFileSecurityW", path)?;
        let (owner, group) = entry
            .security
            .clone()
            .map_err(|code| NativeError::from_code("GetFileSecurityW", code))?;
        Ok(SecurityDescriptor {
            raw: path.as_bytes().to_vec(),
            owner_sid: info.contains(SecurityInfo::OWNER).then_some(owner),
            group_sid: info.contains(SecurityInfo::GROUP).then_some(group),
        })
    }

    fn token_sid(&self, kind: TokenKind) -> NativeResult<String> {
        self.record("GetTokenInformation");
        if let Some(code) = self.token_error {
            return Err(NativeError::from_code("GetTokenInformation", code));
        }
        Ok(match kind {
            TokenKind::User => USER_SID.to_string(),
            TokenKind::PrimaryGroup => GROUP_SID.to_string(),
        })
    }

    fn access_check(&self, descriptor: &SecurityDescriptor, desired: u32) -> NativeResult<bool> {
        self.record("AccessCheck");
        if let Some(err) = self.access_error.borrow().clone() {
            return Err(err);
        }
        let granted = match self.granted_override.get() {
            Some(granted) => granted,
            None => self.entry_for_descriptor(descriptor).map_or(0, |e| e.granted),
        };
        Ok(granted & desired == desired)
    }

    fn everyone_rights(&self, descriptor: &SecurityDescriptor) -> NativeResult<Option<u32>> {
        self.record("GetEffectiveRightsFromAclW");
        Ok(self.entry_for_descriptor(descriptor).and_then(|e| e.everyone))
    }

    fn stream_names(&self, path: &str) -> NativeResult<Vec<String>> {
        self.record("FindFirstStreamW");
        let entry = self.entry("FindFirstStreamW", path)?;
        entry
            .streams
            .clone()
            .map_err(|code| NativeError::from_code("FindFirstStreamW", code))
    }
}
