//! Per-file queries: handles, file type, enumeration records and streams.

use crate::error::{last_error, win32_error};
use crate::winapi_utils::{from_wide_buffer, to_wide_string, FindGuard, SafeHandle};
use std::ffi::c_void;
use tracing::debug;
use windows::core::PCWSTR;
use windows::Win32::Foundation::{GetLastError, SetLastError, FILETIME, WIN32_ERROR};
use windows::Win32::Storage::FileSystem::{
    CreateFileW, FindFirstFileW, FindFirstStreamW, FindNextFileW, FindNextStreamW,
    FindStreamInfoStandard, GetFileInformationByHandle, GetFileType,
    BY_HANDLE_FILE_INFORMATION, FILE_FLAG_BACKUP_SEMANTICS, FILE_FLAG_OPEN_REPARSE_POINT,
    FILE_SHARE_READ, OPEN_EXISTING, WIN32_FIND_DATAW, WIN32_FIND_STREAM_DATA,
};
use winstat_core::error::{ERROR_HANDLE_EOF, NO_ERROR};
use winstat_core::native::{FileTypeProbe, FindRecord, HandleRecord, NativeResult, RawFileTime};

fn raw_time(ft: FILETIME) -> RawFileTime {
    RawFileTime::new(ft.dwHighDateTime, ft.dwLowDateTime)
}

/// Open `path` for metadata only, without following reparse points.
///
/// Backup semantics allow directories to be opened as well as files.
pub fn open_handle(path: &str) -> NativeResult<SafeHandle> {
    let wide_path = to_wide_string(path);

    // SAFETY: the path buffer is null-terminated and outlives the call. The
    // returned handle is wrapped in SafeHandle for cleanup.
    let handle = unsafe {
        CreateFileW(
            PCWSTR(wide_path.as_ptr()),
            0,
            FILE_SHARE_READ,
            None,
            OPEN_EXISTING,
            FILE_FLAG_BACKUP_SEMANTICS | FILE_FLAG_OPEN_REPARSE_POINT,
            None,
        )
    };

    match handle {
        Ok(h) => Ok(SafeHandle(h)),
        Err(_) => Err(last_error("CreateFileW")),
    }
}

/// `GetFileType`, with the last error captured right after the call.
pub fn file_type(handle: &SafeHandle) -> FileTypeProbe {
    unsafe {
        SetLastError(WIN32_ERROR(NO_ERROR));
        let code = GetFileType(handle.as_raw()).0;
        let last_error = GetLastError().0;
        FileTypeProbe { code, last_error }
    }
}

fn find_record(data: &WIN32_FIND_DATAW) -> FindRecord {
    FindRecord {
        attributes: data.dwFileAttributes,
        creation_time: raw_time(data.ftCreationTime),
        last_access_time: raw_time(data.ftLastAccessTime),
        last_write_time: raw_time(data.ftLastWriteTime),
        size_high: data.nFileSizeHigh,
        size_low: data.nFileSizeLow,
        reparse_tag: data.dwReserved0,
        file_name: from_wide_buffer(&data.cFileName),
    }
}

/// The directory entry for `path`.
pub fn find_first(path: &str) -> NativeResult<FindRecord> {
    let wide_path = to_wide_string(path);
    let mut data = WIN32_FIND_DATAW::default();

    let (handle, first_error) = unsafe {
        SetLastError(WIN32_ERROR(NO_ERROR));
        let handle = FindFirstFileW(PCWSTR(wide_path.as_ptr()), &mut data);
        (handle, GetLastError().0)
    };
    let guard = match handle {
        Ok(h) => FindGuard(h),
        Err(_) => return Err(win32_error("FindFirstFileW", first_error)),
    };

    // Some redirectors hand back a valid search handle together with
    // ERROR_FILE_NOT_FOUND; the entry then comes from the next call.
    FindRecord::settle_search(find_record(&data), first_error, || {
        debug!(path = %path, "FindFirstFileW returned no entry, retrying");
        let mut next = WIN32_FIND_DATAW::default();
        if unsafe { FindNextFileW(guard.0, &mut next) }.is_err() {
            return Err(last_error("FindNextFileW"));
        }
        Ok(find_record(&next))
    })
}

pub fn handle_info(handle: &SafeHandle) -> NativeResult<HandleRecord> {
    let mut info = BY_HANDLE_FILE_INFORMATION::default();

    if unsafe { GetFileInformationByHandle(handle.as_raw(), &mut info) }.is_err() {
        return Err(last_error("GetFileInformationByHandle"));
    }

    Ok(HandleRecord {
        attributes: info.dwFileAttributes,
        creation_time: raw_time(info.ftCreationTime),
        last_access_time: raw_time(info.ftLastAccessTime),
        last_write_time: raw_time(info.ftLastWriteTime),
        volume_serial: info.dwVolumeSerialNumber,
        size_high: info.nFileSizeHigh,
        size_low: info.nFileSizeLow,
        link_count: info.nNumberOfLinks,
        index_high: info.nFileIndexHigh,
        index_low: info.nFileIndexLow,
    })
}

/// Raw stream names of `path`, including the unnamed `::$DATA` stream.
pub fn stream_names(path: &str) -> NativeResult<Vec<String>> {
    let wide_path = to_wide_string(path);
    let mut data = WIN32_FIND_STREAM_DATA::default();

    let handle = unsafe {
        FindFirstStreamW(
            PCWSTR(wide_path.as_ptr()),
            FindStreamInfoStandard,
            &mut data as *mut _ as *mut c_void,
            0,
        )
    };
    let guard = match handle {
        Ok(h) => FindGuard(h),
        Err(_) => {
            let err = last_error("FindFirstStreamW");
            return if err.code == ERROR_HANDLE_EOF {
                Ok(Vec::new())
            } else {
                Err(err)
            };
        }
    };

    let mut names = vec![from_wide_buffer(&data.cStreamName)];
    loop {
        data = WIN32_FIND_STREAM_DATA::default();
        if unsafe { FindNextStreamW(guard.0, &mut data as *mut _ as *mut c_void) }.is_err() {
            let err = last_error("FindNextStreamW");
            if err.code == ERROR_HANDLE_EOF {
                break;
            }
            return Err(err);
        }
        names.push(from_wide_buffer(&data.cStreamName));
    }

    Ok(names)
}
