//! Snapshot construction.
//!
//! The builder asks a [`NativeQuery`] for every piece of metadata Windows can
//! give about a path, decides which failures are tolerable, and fuses the
//! answers into one [`Snapshot`].
//!
//! ## Failure classification
//!
//! | call | outcome | result |
//! |---|---|---|
//! | owner/group descriptor | sharing violation | `S-1-0-0` for both SIDs |
//! | owner/group descriptor | not found | `NotFound` |
//! | open handle | sharing violation | no handle, enumeration fallback |
//! | open handle | not found | `NotFound` |
//! | free space | error on a UNC root | `blksize` is `None` |
//! | free space | error on any other root | fatal |
//! | file type | unknown plus last error | fatal |
//! | enumeration | error on a char device or pipe with a handle | zeroed record |
//! | enumeration | not found | `NotFound` |
//! | enumeration | drive root of a CD-ROM or RAM disk | not attempted, the handle is read |
//! | stream names | any error | no streams |
//!
//! Anything else is returned as `StatError::SystemCall`.

use crate::access;
use crate::codec;
use crate::error::{Result, StatError};
use crate::native::{
    FindRecord, HandleRecord, NativeQuery, SecurityInfo, TokenKind, IO_REPARSE_TAG_SYMLINK,
    UNKNOWN_SID,
};
use crate::path;
use crate::snapshot::Snapshot;
use crate::types::{DriveType, FileType};
use std::path::Path;
use tracing::{debug, warn};

/// Capture a [`Snapshot`] of `path`.
///
/// Every handle acquired along the way is released before this returns,
/// whether it succeeds or fails.
pub fn stat<Q: NativeQuery>(query: &Q, path: impl AsRef<Path>) -> Result<Snapshot> {
    let path = path::normalize(validate(path.as_ref())?);
    debug!(path = %path, "Querying metadata");

    let (user_sid, group_sid) = identity(query, &path)?;
    let process_user = query.token_sid(TokenKind::User)?;
    let process_group = query.token_sid(TokenKind::PrimaryGroup)?;

    let handle = open(query, &path)?;

    let root = path::root_of(&path);
    let drive = root
        .as_deref()
        .map_or(DriveType::Unknown, |root| DriveType::from_code(query.drive_type(root)));
    let blockdev = drive.is_block_device();
    let blksize = cluster_size(query, root.as_deref())?;

    let file_type = match &handle {
        Some(handle) => query.file_type(handle).decode()?,
        None => FileType::Unknown,
    };
    let chardev = file_type == FileType::Char;
    let pipe = file_type == FileType::Pipe;

    let has_handle = handle.is_some();
    // A bare drive root cannot be enumerated, so it always reads through its handle.
    let device = (blockdev || chardev || pipe) && drive != DriveType::Removable;
    let special = !has_handle || (device && !path::is_root(&path));
    let raw = match &handle {
        Some(handle) if !special => {
            let record = query
                .handle_info(handle)
                .map_err(|e| StatError::from_native(e, &path))?;
            RawMetadata::from_handle(record)
        }
        _ => {
            let tolerate = has_handle && (chardev || pipe);
            RawMetadata::from_find(enumerate(query, &path, tolerate)?)
        }
    };
    drop(handle);

    let attributes = codec::decode_attributes(raw.attributes);
    let directory = attributes.is_directory();
    let readonly = attributes.is_readonly();
    // Without a handle the type is unknown; anything but a directory counts.
    let regular = if has_handle {
        file_type == FileType::Disk
    } else {
        !directory
    };

    let symlink = attributes.is_reparse_point() && is_symlink(query, &path, raw.reparse_tag)?;
    let executable = codec::is_executable_name(&path);
    let mode = codec::synthesize_mode(readonly, directory, executable);
    let rights = access::evaluate(query, &path, directory, readonly)?;
    let streams = streams(query, &path);

    let snapshot = Snapshot {
        attributes,
        atime: raw.atime,
        mtime: raw.mtime,
        ctime: raw.ctime,
        size: raw.size,
        blksize,
        blocks: codec::block_count(raw.size, blksize),
        file_type,
        blockdev,
        chardev,
        pipe,
        regular,
        nlink: raw.nlink,
        ino: raw.ino,
        volume_serial: raw.volume_serial,
        uid: codec::sid_rid(&user_sid),
        gid: codec::sid_rid(&group_sid),
        owned: user_sid == process_user,
        grpowned: group_sid == process_group,
        user_sid,
        group_sid,
        mode,
        symlink,
        executable,
        readable: rights.readable,
        writable: rights.writable,
        world_readable: rights.world_readable,
        world_writable: rights.world_writable,
        streams,
        path,
    };

    debug!(
        path = %snapshot.path,
        size = snapshot.size,
        mode = snapshot.mode,
        special,
        "Metadata captured"
    );
    Ok(snapshot)
}

fn validate(path: &Path) -> Result<&str> {
    let path = path
        .to_str()
        .ok_or_else(|| StatError::invalid_argument("path is not valid UTF-8"))?;
    if path.is_empty() {
        return Err(StatError::invalid_argument("path is empty"));
    }
    if path.contains('\0') {
        return Err(StatError::invalid_argument("path contains a NUL character"));
    }
    Ok(path)
}

/// Owner and group SID strings of `path`.
fn identity<Q: NativeQuery>(query: &Q, path: &str) -> Result<(String, String)> {
    if path::is_reserved_device(path) {
        return Ok((UNKNOWN_SID.to_string(), UNKNOWN_SID.to_string()));
    }

    match query.file_security(path, SecurityInfo::OWNER | SecurityInfo::GROUP) {
        Ok(descriptor) => Ok((
            descriptor.owner_sid.unwrap_or_else(|| UNKNOWN_SID.to_string()),
            descriptor.group_sid.unwrap_or_else(|| UNKNOWN_SID.to_string()),
        )),
        Err(err) if err.is_sharing_violation() => {
            debug!(path = %path, "File is locked, owner unknown");
            Ok((UNKNOWN_SID.to_string(), UNKNOWN_SID.to_string()))
        }
        Err(err) => Err(StatError::from_native(err, path)),
    }
}

fn open<Q: NativeQuery>(query: &Q, path: &str) -> Result<Option<Q::Handle>> {
    match query.open_handle(path) {
        Ok(handle) => Ok(Some(handle)),
        Err(err) if err.is_sharing_violation() => {
            debug!(path = %path, "File is locked, falling back to enumeration");
            Ok(None)
        }
        Err(err) => Err(StatError::from_native(err, path)),
    }
}

fn cluster_size<Q: NativeQuery>(query: &Q, root: Option<&str>) -> Result<Option<u64>> {
    let Some(root) = root else {
        return Ok(None);
    };

    match query.disk_free_space(root) {
        Ok(geometry) => Ok(Some(geometry.cluster_size())),
        Err(err) if path::is_unc(root) => {
            warn!(root = %root, error = %err, "Cluster size unavailable for share");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

fn enumerate<Q: NativeQuery>(query: &Q, path: &str, tolerate: bool) -> Result<FindRecord> {
    match query.find_first(path) {
        Ok(record) => Ok(record),
        Err(err) if tolerate => {
            debug!(path = %path, error = %err, "Device has no directory entry");
            Ok(FindRecord::default())
        }
        Err(err) => Err(StatError::from_native(err, path)),
    }
}

fn is_symlink<Q: NativeQuery>(query: &Q, path: &str, known_tag: Option<u32>) -> Result<bool> {
    let tag = match known_tag {
        Some(tag) => tag,
        None => {
            query
                .find_first(path)
                .map_err(|e| StatError::from_native(e, path))?
                .reparse_tag
        }
    };
    Ok(tag == IO_REPARSE_TAG_SYMLINK)
}

/// Alternate stream names with the `:` prefix and `:$DATA` suffix removed.
fn streams<Q: NativeQuery>(query: &Q, path: &str) -> Vec<String> {
    match query.stream_names(path) {
        Ok(names) => names
            .iter()
            .map(|name| {
                let name = name.strip_prefix(':').unwrap_or(name);
                name.strip_suffix(":$DATA").unwrap_or(name).to_string()
            })
            .filter(|name| !name.is_empty())
            .collect(),
        Err(err) => {
            debug!(path = %path, error = %err, "No alternate streams");
            Vec::new()
        }
    }
}

/// The fields both native records can supply, already decoded.
struct RawMetadata {
    attributes: u32,
    atime: i64,
    mtime: i64,
    ctime: i64,
    size: u64,
    nlink: u32,
    ino: Option<u64>,
    volume_serial: Option<u32>,
    /// Only enumeration reports the reparse tag.
    reparse_tag: Option<u32>,
}

impl RawMetadata {
    fn from_find(record: FindRecord) -> Self {
        RawMetadata {
            attributes: record.attributes,
            atime: record.last_access_time.to_unix(),
            mtime: record.last_write_time.to_unix(),
            ctime: record.creation_time.to_unix(),
            size: record.size(),
            nlink: 1,
            ino: None,
            volume_serial: None,
            reparse_tag: Some(record.reparse_tag),
        }
    }

    fn from_handle(record: HandleRecord) -> Self {
        RawMetadata {
            attributes: record.attributes,
            atime: record.last_access_time.to_unix(),
            mtime: record.last_write_time.to_unix(),
            ctime: record.creation_time.to_unix(),
            size: record.size(),
            nlink: record.link_count,
            ino: Some(record.inode()),
            volume_serial: Some(record.volume_serial),
            reparse_tag: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{
        ERROR_ACCESS_DENIED, ERROR_BAD_NETPATH, ERROR_FILE_NOT_FOUND, ERROR_SHARING_VIOLATION,
    };
    use crate::native::ClusterGeometry;
    use crate::testing::{MockEntry, MockQuery, GROUP_SID, UNIX_2020, USER_SID};
    use crate::types::DevFormat;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn test_regular_file() {
        init_tracing();
        let query = MockQuery::new().with_entry("C:\\test\\file.txt", MockEntry::file(21));

        let snap = stat(&query, "C:\\test\\file.txt").unwrap();
        assert_eq!(snap.path(), "C:\\test\\file.txt");
        assert_eq!(snap.size(), 21);
        assert_eq!(snap.blksize(), Some(4096));
        assert_eq!(snap.blocks(), Some(1));
        assert_eq!(snap.mode(), 33188);
        assert_eq!(snap.nlink(), 1);
        assert_eq!(snap.ino(), Some((0x0001_0000u64 << 32) | 42));
        assert_eq!(snap.volume_serial(), Some(0xABCD_1234));
        assert_eq!(snap.ctime(), UNIX_2020);
        assert_eq!(snap.mtime(), UNIX_2020 + 1);
        assert_eq!(snap.atime(), UNIX_2020 + 2);
        assert_eq!(snap.uid(), 1001);
        assert_eq!(snap.gid(), 513);
        assert_eq!(snap.user_sid(), USER_SID);
        assert_eq!(snap.group_sid(), GROUP_SID);
        assert!(snap.is_owned());
        assert!(snap.is_group_owned());
        assert!(snap.is_regular_file());
        assert!(snap.is_archive());
        assert!(!snap.is_directory());
        assert!(!snap.is_symlink());
        assert!(!snap.is_executable());
        assert!(snap.is_readable());
        assert!(snap.is_writable());
        assert!(snap.is_world_readable());
        assert!(!snap.is_world_writable());
        assert!(snap.streams().is_empty());
        assert_eq!(snap.dev(DevFormat::Letter).unwrap().to_string(), "C:");

        assert!(query.called("GetFileInformationByHandle"));
        assert_eq!(query.opened_handles(), 1);
        assert_eq!(query.live_handles(), 0);
    }

    #[test]
    fn test_mode_constants() {
        let query = MockQuery::new()
            .with_entry("C:\\bin\\tool.EXE", MockEntry::file(10))
            .with_entry("C:\\bin\\run.cmd", MockEntry::file(10))
            .with_entry("C:\\dir", MockEntry::directory())
            .with_entry("C:\\ro.txt", MockEntry::file(10).with_attribute_bits(0x1));

        assert_eq!(stat(&query, "C:\\bin\\tool.EXE").unwrap().mode(), 33261);
        assert!(stat(&query, "C:\\bin\\run.cmd").unwrap().is_executable());
        assert_eq!(stat(&query, "C:\\dir").unwrap().mode(), 16877);
        assert_eq!(stat(&query, "C:\\ro.txt").unwrap().mode(), 33060);
    }

    #[test]
    fn test_readonly_writability() {
        let query = MockQuery::new()
            .with_entry("C:\\ro.txt", MockEntry::file(10).with_attribute_bits(0x1))
            .with_entry("C:\\rodir", MockEntry::directory().with_attribute_bits(0x1));

        let file = stat(&query, "C:\\ro.txt").unwrap();
        assert!(file.is_readonly());
        assert!(!file.is_writable());
        assert!(!file.is_writable_real());

        let dir = stat(&query, "C:\\rodir").unwrap();
        assert!(dir.is_readonly());
        assert!(dir.is_writable());
    }

    #[test]
    fn test_directory_is_regular_with_handle() {
        let query = MockQuery::new().with_entry("C:\\dir", MockEntry::directory());

        let snap = stat(&query, "C:\\dir").unwrap();
        assert!(snap.is_directory());
        assert!(snap.is_regular_file());
        assert_eq!(snap.file_type_name(), "directory");
        assert_eq!(snap.blocks(), Some(0));
    }

    #[test]
    fn test_forward_slashes_and_trailing_separator() {
        let query = MockQuery::new().with_entry("C:\\data\\dir", MockEntry::directory());

        let snap = stat(&query, "C:/data/dir/").unwrap();
        assert_eq!(snap.path(), "C:\\data\\dir");
    }

    #[test]
    fn test_locked_file_falls_back_to_enumeration() {
        init_tracing();
        let query = MockQuery::new().with_entry(
            "C:\\pagefile.sys",
            MockEntry::file(8192)
                .locked()
                .with_security_error(ERROR_SHARING_VIOLATION),
        );

        let snap = stat(&query, "C:\\pagefile.sys").unwrap();
        assert_eq!(snap.size(), 8192);
        assert_eq!(snap.blocks(), Some(2));
        assert_eq!(snap.nlink(), 1);
        assert_eq!(snap.ino(), None);
        assert_eq!(snap.volume_serial(), None);
        assert_eq!(snap.user_sid(), UNKNOWN_SID);
        assert_eq!(snap.uid(), 0);
        assert_eq!(snap.gid(), 0);
        assert!(!snap.is_owned());
        assert!(snap.is_regular_file());
        assert_eq!(snap.file_type(), FileType::Unknown);
        assert!(!snap.is_readable());
        assert!(!snap.is_writable());

        assert!(query.called("FindFirstFileW"));
        assert!(!query.called("GetFileInformationByHandle"));
        assert!(!query.called("GetFileType"));
        assert_eq!(query.opened_handles(), 0);
    }

    #[test]
    fn test_locked_directory_is_not_regular() {
        let query = MockQuery::new().with_entry("C:\\busy", MockEntry::directory().locked());

        let snap = stat(&query, "C:\\busy").unwrap();
        assert!(snap.is_directory());
        assert!(!snap.is_regular_file());
    }

    #[test]
    fn test_nul_device() {
        init_tracing();
        let query = MockQuery::new().with_entry("NUL", MockEntry::char_device());

        let snap = stat(&query, "NUL").unwrap();
        assert!(snap.is_char_device());
        assert!(!snap.is_regular_file());
        assert!(!snap.is_block_device());
        assert!(!snap.is_pipe());
        assert_eq!(snap.file_type_name(), "characterSpecial");
        assert_eq!(snap.size(), 0);
        assert!(snap.is_zero_size());
        assert_eq!(snap.nlink(), 1);
        assert_eq!(snap.ino(), None);
        assert_eq!(snap.atime(), 0);
        assert_eq!(snap.accessed_at(), None);
        assert_eq!(snap.blksize(), None);
        assert_eq!(snap.blocks(), None);
        assert_eq!(snap.user_sid(), UNKNOWN_SID);
        assert_eq!(snap.dev(DevFormat::Letter), None);
        assert!(!snap.is_readable());

        // Only the access evaluator asks for a descriptor.
        assert_eq!(query.call_count("GetFileSecurityW"), 1);
        assert!(!query.called("GetFileInformationByHandle"));
        assert_eq!(query.opened_handles(), 1);
        assert_eq!(query.live_handles(), 0);
    }

    #[test]
    fn test_locked_file_enumeration_failure_is_fatal() {
        // A locked entry whose enumeration also fails has nothing to fall back on.
        let query = MockQuery::new().with_entry(
            "C:\\gone.txt",
            MockEntry::file(1).locked().with_find_error(ERROR_ACCESS_DENIED),
        );

        let err = stat(&query, "C:\\gone.txt").unwrap_err();
        assert_eq!(err.code(), Some(ERROR_ACCESS_DENIED));
    }

    #[test]
    fn test_pipe_uses_enumeration() {
        let query = MockQuery::new().with_entry(
            "C:\\pipe",
            MockEntry::file(0)
                .with_file_type(FileType::PIPE_CODE, 0)
                .with_find_error(1),
        );

        let snap = stat(&query, "C:\\pipe").unwrap();
        assert!(snap.is_pipe());
        assert!(snap.is_socket());
        assert!(!snap.is_regular_file());
        assert_eq!(snap.ino(), None);
        assert_eq!(query.live_handles(), 0);
    }

    #[test]
    fn test_unc_path_without_cluster_size() {
        let query = MockQuery::new()
            .with_drive("\\\\server\\share\\", 4, Err(ERROR_BAD_NETPATH))
            .with_entry("\\\\server\\share\\file.txt", MockEntry::file(5000));

        let snap = stat(&query, "\\\\server\\share\\file.txt").unwrap();
        assert_eq!(snap.size(), 5000);
        assert_eq!(snap.blksize(), None);
        assert_eq!(snap.blocks(), None);
        assert_eq!(snap.dev(DevFormat::Number), None);
        assert!(snap.ino().is_some());
    }

    #[test]
    fn test_free_space_failure_on_drive_is_fatal() {
        let query = MockQuery::new()
            .with_drive("D:\\", 3, Err(21))
            .with_entry("D:\\file.txt", MockEntry::file(1));

        let err = stat(&query, "D:\\file.txt").unwrap_err();
        match err {
            StatError::SystemCall { function, code, .. } => {
                assert_eq!(function, "GetDiskFreeSpaceW");
                assert_eq!(code, 21);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(query.opened_handles(), 1);
        assert_eq!(query.live_handles(), 0);
    }

    #[test]
    fn test_zero_cluster_size() {
        let query = MockQuery::new()
            .with_drive(
                "G:\\",
                3,
                Ok(ClusterGeometry {
                    sectors_per_cluster: 0,
                    bytes_per_sector: 512,
                }),
            )
            .with_entry("G:\\file.txt", MockEntry::file(100));

        let snap = stat(&query, "G:\\file.txt").unwrap();
        assert_eq!(snap.blksize(), Some(0));
        assert_eq!(snap.blocks(), Some(0));
    }

    #[test]
    fn test_block_arithmetic() {
        let query = MockQuery::new()
            .with_entry("C:\\a", MockEntry::file(4096))
            .with_entry("C:\\b", MockEntry::file(4097))
            .with_entry("C:\\c", MockEntry::file(0));

        assert_eq!(stat(&query, "C:\\a").unwrap().blocks(), Some(1));
        assert_eq!(stat(&query, "C:\\b").unwrap().blocks(), Some(2));

        let empty = stat(&query, "C:\\c").unwrap();
        assert_eq!(empty.blocks(), Some(0));
        assert_eq!(empty.nonzero_size(), None);
        assert!(empty.is_zero_size());
    }

    #[test]
    fn test_removable_drive_uses_handle() {
        let geometry = Ok(ClusterGeometry {
            sectors_per_cluster: 1,
            bytes_per_sector: 512,
        });
        let query = MockQuery::new()
            .with_drive("E:\\", 2, geometry)
            .with_entry("E:\\photo.jpg", MockEntry::file(1000));

        let snap = stat(&query, "E:\\photo.jpg").unwrap();
        assert!(snap.is_block_device());
        assert!(snap.ino().is_some());
        assert_eq!(snap.blocks(), Some(2));
    }

    #[test]
    fn test_cdrom_uses_enumeration() {
        let geometry = Ok(ClusterGeometry {
            sectors_per_cluster: 1,
            bytes_per_sector: 2048,
        });
        let query = MockQuery::new()
            .with_drive("F:\\", 5, geometry)
            .with_entry("F:\\setup.exe", MockEntry::file(4096));

        let snap = stat(&query, "F:\\setup.exe").unwrap();
        assert!(snap.is_block_device());
        assert_eq!(snap.ino(), None);
        assert_eq!(snap.nlink(), 1);
        assert_eq!(snap.blocks(), Some(2));
        assert!(!query.called("GetFileInformationByHandle"));
        assert_eq!(query.live_handles(), 0);
    }

    #[test]
    fn test_cdrom_root_uses_handle() {
        let geometry = Ok(ClusterGeometry {
            sectors_per_cluster: 1,
            bytes_per_sector: 2048,
        });
        let query = MockQuery::new()
            .with_drive("F:\\", 5, geometry)
            .with_entry(
                "F:\\",
                MockEntry::directory().with_find_error(ERROR_FILE_NOT_FOUND),
            );

        let snap = stat(&query, "F:\\").unwrap();
        assert!(snap.is_block_device());
        assert!(snap.is_directory());
        assert!(snap.ino().is_some());
        assert!(query.called("GetFileInformationByHandle"));
        assert_eq!(query.live_handles(), 0);
    }

    #[test]
    fn test_ramdisk_root_uses_handle() {
        let query = MockQuery::new()
            .with_drive(
                "R:\\",
                6,
                Ok(ClusterGeometry {
                    sectors_per_cluster: 8,
                    bytes_per_sector: 512,
                }),
            )
            .with_entry(
                "R:\\",
                MockEntry::directory().with_find_error(ERROR_FILE_NOT_FOUND),
            );

        let snap = stat(&query, "R:\\").unwrap();
        assert!(snap.is_block_device());
        assert_eq!(snap.blksize(), Some(4096));
    }

    #[test]
    fn test_hard_links() {
        let query = MockQuery::new().with_entry("C:\\linked", MockEntry::file(1).with_links(3));
        assert_eq!(stat(&query, "C:\\linked").unwrap().nlink(), 3);
    }

    #[test]
    fn test_symlink_detection() {
        let query = MockQuery::new()
            .with_entry(
                "C:\\link",
                MockEntry::file(0)
                    .with_attribute_bits(0x400)
                    .with_reparse_tag(IO_REPARSE_TAG_SYMLINK),
            )
            .with_entry(
                "C:\\mount",
                MockEntry::directory()
                    .with_attribute_bits(0x400)
                    .with_reparse_tag(0xA000_0003),
            );

        let link = stat(&query, "C:\\link").unwrap();
        assert!(link.is_symlink());
        assert!(link.is_reparse_point());
        assert_eq!(link.file_type_name(), "link");

        let mount = stat(&query, "C:\\mount").unwrap();
        assert!(!mount.is_symlink());
        assert!(mount.is_reparse_point());
    }

    #[test]
    fn test_reparse_tag_not_read_without_reparse_bit() {
        let query = MockQuery::new().with_entry(
            "C:\\plain",
            MockEntry::file(0).with_reparse_tag(IO_REPARSE_TAG_SYMLINK),
        );

        assert!(!stat(&query, "C:\\plain").unwrap().is_symlink());
        assert!(!query.called("FindFirstFileW"));
    }

    #[test]
    fn test_alternate_streams() {
        let query = MockQuery::new().with_entry(
            "C:\\download.zip",
            MockEntry::file(10).with_streams(&[
                "::$DATA",
                ":Zone.Identifier:$DATA",
                ":notes:$DATA",
            ]),
        );

        let snap = stat(&query, "C:\\download.zip").unwrap();
        assert_eq!(snap.streams(), ["Zone.Identifier", "notes"]);
    }

    #[test]
    fn test_not_found() {
        let query = MockQuery::new();

        let err = stat(&query, "C:\\missing.txt").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(query.opened_handles(), 0);
    }

    #[test]
    fn test_open_failure_is_fatal() {
        let query = MockQuery::new().with_entry(
            "C:\\denied",
            MockEntry::file(1).with_open_error(ERROR_ACCESS_DENIED),
        );

        let err = stat(&query, "C:\\denied").unwrap_err();
        assert_eq!(err.code(), Some(ERROR_ACCESS_DENIED));
    }

    #[test]
    fn test_handle_info_failure_releases_handle() {
        let query = MockQuery::new().with_entry("C:\\broken", MockEntry::file(1).with_info_error(1));

        let err = stat(&query, "C:\\broken").unwrap_err();
        match err {
            StatError::SystemCall { function, .. } => {
                assert_eq!(function, "GetFileInformationByHandle")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(query.opened_handles(), 1);
        assert_eq!(query.live_handles(), 0);
    }

    #[test]
    fn test_file_type_failure_is_fatal() {
        let query = MockQuery::new().with_entry("C:\\odd", MockEntry::file(1).with_file_type(0, 6));

        let err = stat(&query, "C:\\odd").unwrap_err();
        assert_eq!(err.code(), Some(6));
        assert_eq!(query.live_handles(), 0);
    }

    #[test]
    fn test_unknown_file_type_without_error() {
        let query = MockQuery::new().with_entry("C:\\odd", MockEntry::file(1).with_file_type(0, 0));

        let snap = stat(&query, "C:\\odd").unwrap();
        assert_eq!(snap.file_type(), FileType::Unknown);
        assert!(!snap.is_regular_file());
        assert_eq!(snap.file_type_name(), "unknown");
    }

    #[test]
    fn test_identity_failure_is_fatal() {
        let query = MockQuery::new().with_entry(
            "C:\\secret",
            MockEntry::file(1).with_security_error(ERROR_ACCESS_DENIED),
        );

        let err = stat(&query, "C:\\secret").unwrap_err();
        assert_eq!(err.code(), Some(ERROR_ACCESS_DENIED));
        assert_eq!(query.opened_handles(), 0);
    }

    #[test]
    fn test_token_failure_is_fatal() {
        let query = MockQuery::new()
            .with_entry("C:\\file", MockEntry::file(1))
            .with_token_error(ERROR_ACCESS_DENIED);

        let err = stat(&query, "C:\\file").unwrap_err();
        assert_eq!(err.code(), Some(ERROR_ACCESS_DENIED));
    }

    #[test]
    fn test_foreign_owner() {
        let query = MockQuery::new().with_entry(
            "C:\\Windows",
            MockEntry::directory().with_owner(
                "S-1-5-80-956008885-3418522649-1831038044-1853292631-2271478464",
                "S-1-5-18",
            ),
        );

        let snap = stat(&query, "C:\\Windows").unwrap();
        assert!(!snap.is_owned());
        assert!(!snap.is_group_owned());
        assert_eq!(snap.uid(), 2_271_478_464);
        assert_eq!(snap.gid(), 18);
    }

    #[test]
    fn test_invalid_arguments() {
        let query = MockQuery::new();

        assert!(matches!(
            stat(&query, "").unwrap_err(),
            StatError::InvalidArgument { .. }
        ));
        assert!(matches!(
            stat(&query, "C:\\a\0b").unwrap_err(),
            StatError::InvalidArgument { .. }
        ));
        assert_eq!(query.call_count("GetFileSecurityW"), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let query = MockQuery::new();
        let path = Path::new(OsStr::from_bytes(b"C:\\\xff\xfe"));
        assert!(matches!(
            stat(&query, path).unwrap_err(),
            StatError::InvalidArgument { .. }
        ));
    }

    #[test]
    fn test_repeated_queries_agree() {
        let query = MockQuery::new().with_entry("C:\\same.txt", MockEntry::file(99));

        let first = stat(&query, "C:\\same.txt").unwrap();
        let second = Snapshot::query(&query, "C:\\same.txt").unwrap();
        assert_eq!(first, second);
        assert_eq!(query.live_handles(), 0);
    }

    #[test]
    fn test_mtime_is_within_creation_and_now() {
        let query = MockQuery::new().with_entry("C:\\file", MockEntry::file(1));

        let snap = stat(&query, "C:\\file").unwrap();
        let now = chrono::Utc::now().timestamp();
        assert!(snap.mtime() >= snap.ctime());
        assert!(snap.mtime() <= now);
    }
}
