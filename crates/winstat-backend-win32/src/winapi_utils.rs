//! Low-level Windows API utilities.
//!
//! RAII guards for the handles this crate opens, plus UTF-16 conversion.

use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;
use std::ptr;
use windows::core::PWSTR;
use windows::Win32::Foundation::{
    CloseHandle, LocalFree, BOOL, HANDLE, HLOCAL, INVALID_HANDLE_VALUE,
};
use windows::Win32::Storage::FileSystem::FindClose;
use windows::Win32::System::Diagnostics::Debug::{
    SetErrorMode, SEM_FAILCRITICALERRORS, THREAD_ERROR_MODE,
};

/// RAII wrapper for Windows HANDLE.
///
/// Automatically closes the handle when dropped.
#[derive(Debug)]
pub struct SafeHandle(pub HANDLE);

impl SafeHandle {
    /// Get the raw handle value.
    pub fn as_raw(&self) -> HANDLE {
        self.0
    }

    /// Check if the handle is valid.
    pub fn is_valid(&self) -> bool {
        self.0 != INVALID_HANDLE_VALUE && self.0 .0 != ptr::null_mut()
    }
}

impl Drop for SafeHandle {
    fn drop(&mut self) {
        if self.is_valid() {
            unsafe {
                let _ = CloseHandle(self.0);
            }
        }
    }
}

/// A search handle from `FindFirstFileW` or `FindFirstStreamW`, closed with
/// `FindClose` on drop.
pub struct FindGuard(pub HANDLE);

impl Drop for FindGuard {
    fn drop(&mut self) {
        if !self.0.is_invalid() {
            unsafe {
                let _ = FindClose(self.0);
            }
        }
    }
}

/// A string allocated by the system (e.g. `ConvertSidToStringSidW`), freed
/// with `LocalFree` on drop.
pub struct LocalString(pub PWSTR);

impl LocalString {
    pub fn to_string_lossy(&self) -> String {
        if self.0.is_null() {
            return String::new();
        }
        unsafe { String::from_utf16_lossy(self.0.as_wide()) }
    }
}

impl Drop for LocalString {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe {
                let _ = LocalFree(HLOCAL(self.0 .0 as _));
            }
        }
    }
}

/// Suppresses the critical-error dialog (e.g. "no disk in drive") while
/// alive, restoring the previous error mode on drop.
pub struct ErrorModeGuard {
    previous: u32,
}

impl ErrorModeGuard {
    pub fn new() -> Self {
        let previous = unsafe { SetErrorMode(SEM_FAILCRITICALERRORS) };
        ErrorModeGuard { previous }
    }
}

impl Drop for ErrorModeGuard {
    fn drop(&mut self) {
        unsafe {
            SetErrorMode(THREAD_ERROR_MODE(self.previous));
        }
    }
}

/// Success of a Win32 call, whether it is bound as returning `BOOL` or
/// `Result<()>`.
pub trait Win32Status {
    fn succeeded(self) -> bool;
}

impl Win32Status for BOOL {
    fn succeeded(self) -> bool {
        self.as_bool()
    }
}

impl Win32Status for windows::core::Result<()> {
    fn succeeded(self) -> bool {
        self.is_ok()
    }
}

/// Convert a Rust string to a null-terminated wide string (UTF-16).
pub fn to_wide_string(s: &str) -> Vec<u16> {
    OsStr::new(s)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

/// Convert a fixed-size, null-terminated UTF-16 buffer to a string.
pub fn from_wide_buffer(buffer: &[u16]) -> String {
    let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    String::from_utf16_lossy(&buffer[..len])
}
