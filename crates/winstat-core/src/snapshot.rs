//! The immutable result of one metadata query.
//!
//! A `Snapshot` exposes the shape of a POSIX `stat` result. Fields Windows
//! cannot supply are fixed sentinels: `dev_major`/`dev_minor` are always
//! `None`, and the setuid, setgid and sticky predicates are always `false`.

use crate::codec;
use crate::error::Result;
use crate::native::NativeQuery;
use crate::path;
use crate::types::{DevFormat, DeviceId, FileAttributes, FileType};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Point-in-time metadata for a single path.
///
/// Build one with [`Snapshot::query`] or [`crate::stat`]. There are no
/// setters; a new query always produces a new snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub(crate) path: String,
    pub(crate) attributes: FileAttributes,
    pub(crate) atime: i64,
    pub(crate) mtime: i64,
    pub(crate) ctime: i64,
    pub(crate) size: u64,
    pub(crate) blksize: Option<u64>,
    pub(crate) blocks: Option<u64>,
    pub(crate) file_type: FileType,
    pub(crate) blockdev: bool,
    pub(crate) chardev: bool,
    pub(crate) pipe: bool,
    pub(crate) regular: bool,
    pub(crate) nlink: u32,
    pub(crate) ino: Option<u64>,
    pub(crate) volume_serial: Option<u32>,
    pub(crate) user_sid: String,
    pub(crate) group_sid: String,
    pub(crate) uid: u32,
    pub(crate) gid: u32,
    pub(crate) owned: bool,
    pub(crate) grpowned: bool,
    pub(crate) mode: u32,
    pub(crate) symlink: bool,
    pub(crate) executable: bool,
    pub(crate) readable: bool,
    pub(crate) writable: bool,
    pub(crate) world_readable: bool,
    pub(crate) world_writable: bool,
    pub(crate) streams: Vec<String>,
}

impl Snapshot {
    /// Query `path` through `query` and capture its metadata.
    pub fn query<Q: NativeQuery>(query: &Q, path: impl AsRef<std::path::Path>) -> Result<Self> {
        crate::builder::stat(query, path)
    }

    /// The normalized path this snapshot describes.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn attributes(&self) -> FileAttributes {
        self.attributes
    }

    // === Times ===

    /// Last access time in seconds since the epoch; 0 if unavailable.
    pub fn atime(&self) -> i64 {
        self.atime
    }

    /// Last write time in seconds since the epoch; 0 if unavailable.
    pub fn mtime(&self) -> i64 {
        self.mtime
    }

    /// Creation time in seconds since the epoch; 0 if unavailable.
    ///
    /// Windows has no inode change time, so this is the creation time.
    pub fn ctime(&self) -> i64 {
        self.ctime
    }

    pub fn accessed_at(&self) -> Option<DateTime<Utc>> {
        codec::unix_to_datetime(self.atime)
    }

    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        codec::unix_to_datetime(self.mtime)
    }

    pub fn changed_at(&self) -> Option<DateTime<Utc>> {
        codec::unix_to_datetime(self.ctime)
    }

    /// Order two snapshots by modification time.
    pub fn compare_by_modified_time(&self, other: &Snapshot) -> Ordering {
        self.mtime.cmp(&other.mtime)
    }

    // === Size and blocks ===

    pub fn size(&self) -> u64 {
        self.size
    }

    /// The size, or `None` when it is zero.
    pub fn nonzero_size(&self) -> Option<u64> {
        (self.size > 0).then_some(self.size)
    }

    pub fn is_zero_size(&self) -> bool {
        self.size == 0
    }

    /// Cluster size of the volume, if it could be determined.
    pub fn blksize(&self) -> Option<u64> {
        self.blksize
    }

    /// Number of clusters the file occupies, rounded up.
    pub fn blocks(&self) -> Option<u64> {
        self.blocks
    }

    // === Device and identity ===

    /// The drive this entry lives on, as a letter (`"C:"`) or a zero-based
    /// number (`2`). `None` for UNC paths and bare device names.
    pub fn dev(&self, format: DevFormat) -> Option<DeviceId> {
        match format {
            DevFormat::Letter => self.drive_letter().map(DeviceId::Letter),
            DevFormat::Number => self.drive_number().map(DeviceId::Number),
        }
    }

    pub fn drive_letter(&self) -> Option<String> {
        path::drive_letter(&self.path)
    }

    pub fn drive_number(&self) -> Option<u32> {
        path::drive_number(&self.path)
    }

    pub fn dev_major(&self) -> Option<u32> {
        None
    }

    pub fn dev_minor(&self) -> Option<u32> {
        None
    }

    /// The volume serial number; `None` for special devices and locked files.
    pub fn volume_serial(&self) -> Option<u32> {
        self.volume_serial
    }

    /// Alias for [`Snapshot::volume_serial`].
    pub fn rdev(&self) -> Option<u32> {
        self.volume_serial
    }

    pub fn rdev_major(&self) -> Option<u32> {
        None
    }

    pub fn rdev_minor(&self) -> Option<u32> {
        None
    }

    /// The 64-bit file index; `None` for special devices and locked files.
    pub fn ino(&self) -> Option<u64> {
        self.ino
    }

    pub fn nlink(&self) -> u32 {
        self.nlink
    }

    /// RID of the owner SID.
    pub fn uid(&self) -> u32 {
        self.uid
    }

    pub fn user_sid(&self) -> &str {
        &self.user_sid
    }

    /// RID of the primary group SID.
    pub fn gid(&self) -> u32 {
        self.gid
    }

    pub fn group_sid(&self) -> &str {
        &self.group_sid
    }

    /// True if the owner is the user running this process.
    pub fn is_owned(&self) -> bool {
        self.owned
    }

    /// True if the group is the primary group of this process.
    pub fn is_group_owned(&self) -> bool {
        self.grpowned
    }

    pub fn mode(&self) -> u32 {
        self.mode
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// The kind of entry, in the vocabulary of POSIX `ftype`.
    pub fn file_type_name(&self) -> &'static str {
        if self.is_directory() {
            "directory"
        } else if self.chardev {
            "characterSpecial"
        } else if self.pipe {
            "fifo"
        } else if self.symlink {
            "link"
        } else if self.regular {
            "file"
        } else {
            "unknown"
        }
    }

    // === Type predicates ===

    pub fn is_block_device(&self) -> bool {
        self.blockdev
    }

    pub fn is_char_device(&self) -> bool {
        self.chardev
    }

    pub fn is_pipe(&self) -> bool {
        self.pipe
    }

    /// Windows has no sockets in the filesystem; this is [`Snapshot::is_pipe`].
    pub fn is_socket(&self) -> bool {
        self.pipe
    }

    pub fn is_regular_file(&self) -> bool {
        self.regular
    }

    pub fn is_directory(&self) -> bool {
        self.attributes.is_directory()
    }

    pub fn is_symlink(&self) -> bool {
        self.symlink
    }

    pub fn is_executable(&self) -> bool {
        self.executable
    }

    /// Same as [`Snapshot::is_executable`].
    pub fn is_executable_real(&self) -> bool {
        self.executable
    }

    // === Attribute predicates ===

    pub fn is_archive(&self) -> bool {
        self.attributes.is_archive()
    }

    pub fn is_compressed(&self) -> bool {
        self.attributes.is_compressed()
    }

    pub fn is_encrypted(&self) -> bool {
        self.attributes.is_encrypted()
    }

    pub fn is_hidden(&self) -> bool {
        self.attributes.is_hidden()
    }

    pub fn is_content_indexed(&self) -> bool {
        self.attributes.is_content_indexed()
    }

    pub fn is_normal(&self) -> bool {
        self.attributes.is_normal()
    }

    pub fn is_offline(&self) -> bool {
        self.attributes.is_offline()
    }

    pub fn is_readonly(&self) -> bool {
        self.attributes.is_readonly()
    }

    pub fn is_reparse_point(&self) -> bool {
        self.attributes.is_reparse_point()
    }

    pub fn is_sparse(&self) -> bool {
        self.attributes.is_sparse()
    }

    pub fn is_system(&self) -> bool {
        self.attributes.is_system()
    }

    pub fn is_temporary(&self) -> bool {
        self.attributes.is_temporary()
    }

    // === Access ===

    pub fn is_readable(&self) -> bool {
        self.readable
    }

    /// Windows makes no real/effective distinction.
    pub fn is_readable_real(&self) -> bool {
        self.readable
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn is_writable_real(&self) -> bool {
        self.writable
    }

    pub fn is_world_readable(&self) -> bool {
        self.world_readable
    }

    pub fn is_world_writable(&self) -> bool {
        self.world_writable
    }

    pub fn is_setuid(&self) -> bool {
        false
    }

    pub fn is_setgid(&self) -> bool {
        false
    }

    pub fn is_sticky(&self) -> bool {
        false
    }

    /// Names of alternate data streams, e.g. `"Zone.Identifier"`.
    pub fn streams(&self) -> &[String] {
        &self.streams
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#<Snapshot path={:?} ftype={} mode={:o} size={} nlink={} uid={} gid={} mtime={}",
            self.path,
            self.file_type_name(),
            self.mode,
            self.size,
            self.nlink,
            self.uid,
            self.gid,
            self.mtime
        )?;
        if let Some(ino) = self.ino {
            write!(f, " ino={}", ino)?;
        }
        if let Some(blksize) = self.blksize {
            write!(f, " blksize={}", blksize)?;
        }
        write!(f, ">")
    }
}
