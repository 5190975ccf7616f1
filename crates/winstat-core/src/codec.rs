//! Pure conversions from native words to stat fields.
//!
//! FILETIME timestamps, attribute words, synthesized permission bits and the
//! small arithmetic helpers the builder needs. Nothing here touches the OS.

use crate::types::FileAttributes;
use chrono::{DateTime, TimeZone, Utc};

/// 100-nanosecond ticks per second.
pub const TICKS_PER_SECOND: u64 = 10_000_000;

/// Seconds between 1601-01-01 and 1970-01-01.
pub const EPOCH_DIFFERENCE_SECS: i64 = 11_644_473_600;

pub const S_IFMT: u32 = 0o170000;
pub const S_IFDIR: u32 = 0o040000;
pub const S_IFREG: u32 = 0o100000;
pub const S_IREAD: u32 = 0o400;
pub const S_IWRITE: u32 = 0o200;
pub const S_IEXEC: u32 = 0o100;
pub const S_IWUSR: u32 = S_IWRITE;
pub const S_IWGRP: u32 = 0o020;
pub const S_IWOTH: u32 = 0o002;

/// Extensions treated as executable, lowercase without the dot.
pub const EXECUTABLE_EXTENSIONS: [&str; 4] = ["bat", "cmd", "com", "exe"];

/// Convert a split FILETIME to seconds since the Unix epoch.
///
/// A zero FILETIME means "unset" and maps to 0 rather than a date in 1601.
pub fn filetime_to_unix(high: u32, low: u32) -> i64 {
    let ticks = (u64::from(high) << 32) | u64::from(low);
    if ticks == 0 {
        return 0;
    }
    (ticks / TICKS_PER_SECOND) as i64 - EPOCH_DIFFERENCE_SECS
}

/// Inverse of [`filetime_to_unix`] at one-second granularity.
///
/// Times before 1601 clamp to zero ticks; times past the FILETIME range clamp
/// to the largest value.
pub fn unix_to_filetime(secs: i64) -> (u32, u32) {
    if secs == 0 {
        return (0, 0);
    }
    let since_1601 = secs.saturating_add(EPOCH_DIFFERENCE_SECS).max(0) as u64;
    let ticks = since_1601.saturating_mul(TICKS_PER_SECOND);
    ((ticks >> 32) as u32, ticks as u32)
}

/// Seconds since the epoch as a UTC timestamp; `None` for the unset value 0.
pub fn unix_to_datetime(secs: i64) -> Option<DateTime<Utc>> {
    if secs == 0 {
        return None;
    }
    Utc.timestamp_opt(secs, 0).single()
}

pub fn decode_attributes(word: u32) -> FileAttributes {
    FileAttributes::from_bits_retain(word)
}

/// Build POSIX-style mode bits from what Windows can tell us.
///
/// Owner bits are copied into the group and other slots, then group and
/// other write are always cleared.
pub fn synthesize_mode(readonly: bool, directory: bool, executable: bool) -> u32 {
    let mut mode = 0;

    if readonly {
        mode |= S_IREAD;
    } else {
        mode |= S_IREAD | S_IWRITE | S_IWUSR;
    }

    if directory {
        mode |= S_IFDIR | S_IEXEC;
    } else {
        mode |= S_IFREG;
    }

    if executable {
        mode |= S_IEXEC;
    }

    mode |= (mode & 0o700) >> 3;
    mode |= (mode & 0o700) >> 6;
    mode &= !(S_IWGRP | S_IWOTH);

    mode
}

/// Combine a high/low DWORD pair as `high * 2^32 + low`.
pub fn size_from_parts(high: u32, low: u32) -> u64 {
    (u64::from(high) << 32) | u64::from(low)
}

/// Combine the file index halves into a 64-bit inode number.
pub fn inode_from_parts(high: u32, low: u32) -> u64 {
    (u64::from(high) << 32) | u64::from(low)
}

/// `ceil(size / blksize)`, with 0 for a zero block size.
pub fn block_count(size: u64, blksize: Option<u64>) -> Option<u64> {
    match blksize {
        None => None,
        Some(0) => Some(0),
        Some(bs) => Some(size.div_ceil(bs)),
    }
}

/// True if the file name ends in one of [`EXECUTABLE_EXTENSIONS`].
pub fn is_executable_name(path: &str) -> bool {
    let name = path.rsplit(['\\', '/']).next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => EXECUTABLE_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known)),
        _ => false,
    }
}

/// The RID of a SID string: its final numeric component.
///
/// `"S-1-5-21-...-1001"` yields 1001. Malformed strings yield 0.
pub fn sid_rid(sid: &str) -> u32 {
    sid.rsplit('-')
        .next()
        .and_then(|rid| rid.parse().ok())
        .unwrap_or(0)
}
