//! Win32 error codes as `NativeError`s with readable messages.

use winstat_core::NativeError;

/// Build an error for `function` from the calling thread's last error.
#[cfg(windows)]
pub fn last_error(function: &str) -> NativeError {
    use windows::Win32::Foundation::GetLastError;

    let code = unsafe { GetLastError().0 };
    win32_error(function, code)
}

/// Build an error for `function` from an explicit Win32 error code.
pub fn win32_error(function: &str, code: u32) -> NativeError {
    NativeError::new(function, code, format_win32_error(code))
}

/// Format a Win32 error code to a human-readable message
#[cfg(windows)]
fn format_win32_error(code: u32) -> String {
    use windows::core::PWSTR;
    use windows::Win32::System::Diagnostics::Debug::{
        FormatMessageW, FORMAT_MESSAGE_FROM_SYSTEM, FORMAT_MESSAGE_IGNORE_INSERTS,
    };

    let mut buffer = [0u16; 512];
    let len = unsafe {
        FormatMessageW(
            FORMAT_MESSAGE_FROM_SYSTEM | FORMAT_MESSAGE_IGNORE_INSERTS,
            None,
            code,
            0,
            PWSTR(buffer.as_mut_ptr()),
            buffer.len() as u32,
            None,
        )
    };

    if len == 0 {
        return format!("Unknown error ({})", code);
    }

    String::from_utf16_lossy(&buffer[..len as usize])
        .trim()
        .to_string()
}

#[cfg(not(windows))]
fn format_win32_error(_code: u32) -> String {
    "Windows API not available".to_string()
}
