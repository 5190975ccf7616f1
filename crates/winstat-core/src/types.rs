//! Core data types for winstat.
//!
//! These are the decoded forms of the raw words native calls hand back:
//! attribute bitsets, file type codes and drive type codes.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// Native file attribute flags (`FILE_ATTRIBUTE_*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct FileAttributes: u32 {
        const READONLY = 0x0000_0001;
        const HIDDEN = 0x0000_0002;
        const SYSTEM = 0x0000_0004;
        const DIRECTORY = 0x0000_0010;
        const ARCHIVE = 0x0000_0020;
        const ENCRYPTED = 0x0000_0040;
        const NORMAL = 0x0000_0080;
        const TEMPORARY = 0x0000_0100;
        const SPARSE_FILE = 0x0000_0200;
        const REPARSE_POINT = 0x0000_0400;
        const COMPRESSED = 0x0000_0800;
        const OFFLINE = 0x0000_1000;
        const NOT_CONTENT_INDEXED = 0x0000_2000;

        // Bits this crate does not name are kept as-is.
        const _ = !0;
    }
}

impl FileAttributes {
    pub fn is_readonly(&self) -> bool {
        self.contains(FileAttributes::READONLY)
    }

    pub fn is_hidden(&self) -> bool {
        self.contains(FileAttributes::HIDDEN)
    }

    pub fn is_system(&self) -> bool {
        self.contains(FileAttributes::SYSTEM)
    }

    pub fn is_directory(&self) -> bool {
        self.contains(FileAttributes::DIRECTORY)
    }

    pub fn is_archive(&self) -> bool {
        self.contains(FileAttributes::ARCHIVE)
    }

    pub fn is_encrypted(&self) -> bool {
        self.contains(FileAttributes::ENCRYPTED)
    }

    pub fn is_normal(&self) -> bool {
        self.contains(FileAttributes::NORMAL)
    }

    pub fn is_temporary(&self) -> bool {
        self.contains(FileAttributes::TEMPORARY)
    }

    pub fn is_sparse(&self) -> bool {
        self.contains(FileAttributes::SPARSE_FILE)
    }

    pub fn is_reparse_point(&self) -> bool {
        self.contains(FileAttributes::REPARSE_POINT)
    }

    pub fn is_compressed(&self) -> bool {
        self.contains(FileAttributes::COMPRESSED)
    }

    pub fn is_offline(&self) -> bool {
        self.contains(FileAttributes::OFFLINE)
    }

    /// The flag means "not indexed"; this predicate is its negation.
    pub fn is_content_indexed(&self) -> bool {
        !self.contains(FileAttributes::NOT_CONTENT_INDEXED)
    }
}

/// What `GetFileType` reports for an open handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    #[default]
    Unknown,
    Disk,
    Char,
    Pipe,
    Remote,
}

impl FileType {
    pub const UNKNOWN_CODE: u32 = 0x0000;
    pub const DISK_CODE: u32 = 0x0001;
    pub const CHAR_CODE: u32 = 0x0002;
    pub const PIPE_CODE: u32 = 0x0003;
    pub const REMOTE_CODE: u32 = 0x8000;

    /// Decode a `FILE_TYPE_*` value. Unrecognized codes map to `Unknown`.
    pub fn from_code(code: u32) -> Self {
        match code {
            Self::DISK_CODE => FileType::Disk,
            Self::CHAR_CODE => FileType::Char,
            Self::PIPE_CODE => FileType::Pipe,
            Self::REMOTE_CODE => FileType::Remote,
            _ => FileType::Unknown,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::Unknown => write!(f, "unknown"),
            FileType::Disk => write!(f, "disk"),
            FileType::Char => write!(f, "char"),
            FileType::Pipe => write!(f, "pipe"),
            FileType::Remote => write!(f, "remote"),
        }
    }
}

/// What `GetDriveType` reports for a root path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveType {
    #[default]
    Unknown,
    NoRootDir,
    Removable,
    Fixed,
    Remote,
    CdRom,
    RamDisk,
}

impl DriveType {
    /// Decode a `DRIVE_*` value.
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => DriveType::NoRootDir,
            2 => DriveType::Removable,
            3 => DriveType::Fixed,
            4 => DriveType::Remote,
            5 => DriveType::CdRom,
            6 => DriveType::RamDisk,
            _ => DriveType::Unknown,
        }
    }

    /// Removable media, CD-ROM drives and RAM disks count as block devices.
    pub fn is_block_device(&self) -> bool {
        matches!(
            self,
            DriveType::Removable | DriveType::CdRom | DriveType::RamDisk
        )
    }
}

/// Which form `Snapshot::dev` should take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevFormat {
    /// Drive letter with colon, e.g. `"C:"`
    Letter,
    /// Zero-based drive number, e.g. `2` for `C:`
    Number,
}

/// The device an entry lives on, in the form requested by [`DevFormat`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DeviceId {
    Letter(String),
    Number(u32),
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceId::Letter(letter) => write!(f, "{}", letter),
            DeviceId::Number(n) => write!(f, "{}", n),
        }
    }
}
