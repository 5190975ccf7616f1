//! Path handling for Windows-style paths.
//!
//! These helpers operate on strings only so that they behave the same on
//! every host: separator normalization, root extraction, UNC detection and
//! drive letters.

/// DOS device names that exist in every directory.
const RESERVED_DEVICE_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Convert forward slashes to backslashes and strip trailing separators.
///
/// Root paths keep their trailing separator (`C:\`, `\`, `\\server\share\`).
pub fn normalize(path: &str) -> String {
    let mut normalized = path.replace('/', "\\");

    while normalized.ends_with('\\') && !is_root(&normalized) {
        normalized.pop();
    }

    normalized
}

/// True if `path` is already the root of its volume or share.
pub fn is_root(path: &str) -> bool {
    match root_of(path) {
        Some(root) => root == path,
        None => path == "\\",
    }
}

/// True for `\\server\share` style paths (but not `\\?\` or `\\.\` device paths).
pub fn is_unc(path: &str) -> bool {
    let path = path.replace('/', "\\");
    if let Some(rest) = path.strip_prefix("\\\\?\\UNC\\") {
        return !rest.is_empty();
    }
    path.starts_with("\\\\") && !path.starts_with("\\\\?\\") && !path.starts_with("\\\\.\\")
}

/// The root portion of a path, with trailing separator.
///
/// - `C:\dir\file` → `C:\`
/// - `\\server\share\dir` → `\\server\share\`
/// - `\\?\C:\dir` → `\\?\C:\`
///
/// Relative paths and bare device names have no root.
pub fn root_of(path: &str) -> Option<String> {
    let path = path.replace('/', "\\");

    if let Some(rest) = path.strip_prefix("\\\\?\\UNC\\") {
        return unc_root(rest).map(|share| format!("\\\\?\\UNC\\{}", share));
    }

    if let Some(rest) = path
        .strip_prefix("\\\\?\\")
        .or_else(|| path.strip_prefix("\\\\.\\"))
    {
        let prefix = &path[..4];
        return drive_prefix(rest).map(|drive| format!("{}{}\\", prefix, drive));
    }

    if let Some(rest) = path.strip_prefix("\\\\") {
        return unc_root(rest).map(|share| format!("\\\\{}", share));
    }

    drive_prefix(&path).map(|drive| format!("{}\\", drive))
}

/// `server\share\...` → `server\share\`
fn unc_root(rest: &str) -> Option<String> {
    let mut parts = rest.split('\\');
    let server = parts.next().filter(|s| !s.is_empty())?;
    let share = parts.next().filter(|s| !s.is_empty())?;
    Some(format!("{}\\{}\\", server, share))
}

/// The `X:` prefix of a path, if it starts with a drive letter.
fn drive_prefix(path: &str) -> Option<&str> {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        Some(&path[..2])
    } else {
        None
    }
}

/// The drive letter of a path as `"C:"`, uppercased.
pub fn drive_letter(path: &str) -> Option<String> {
    let path = path.replace('/', "\\");
    let rest = path
        .strip_prefix("\\\\?\\")
        .or_else(|| path.strip_prefix("\\\\.\\"))
        .unwrap_or(&path);
    drive_prefix(rest).map(|drive| drive.to_ascii_uppercase())
}

/// Zero-based drive number: `A:` is 0, `C:` is 2.
pub fn drive_number(path: &str) -> Option<u32> {
    drive_letter(path).map(|drive| u32::from(drive.as_bytes()[0] - b'A'))
}

/// True if the final component is a reserved DOS device name such as `NUL`.
///
/// Extensions are ignored, as Windows does: `nul.txt` is still the null
/// device.
pub fn is_reserved_device(path: &str) -> bool {
    let path = path.replace('/', "\\");
    let name = path
        .strip_prefix("\\\\.\\")
        .unwrap_or(&path)
        .rsplit('\\')
        .next()
        .unwrap_or("");
    let stem = name.split('.').next().unwrap_or("").trim_end();
    RESERVED_DEVICE_NAMES
        .iter()
        .any(|device| stem.eq_ignore_ascii_case(device))
}
