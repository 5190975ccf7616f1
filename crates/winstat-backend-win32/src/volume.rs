//! Volume queries for the root a path lives under.

use crate::error::last_error;
use crate::winapi_utils::to_wide_string;
use windows::core::PCWSTR;
use windows::Win32::Storage::FileSystem::{GetDiskFreeSpaceW, GetDriveTypeW};
use winstat_core::native::{ClusterGeometry, NativeResult};

/// `DRIVE_*` code for a root path such as `C:\` or `\\server\share\`.
pub fn drive_type(root: &str) -> u32 {
    let wide_root = to_wide_string(root);
    unsafe { GetDriveTypeW(PCWSTR(wide_root.as_ptr())) }
}

pub fn disk_free_space(root: &str) -> NativeResult<ClusterGeometry> {
    let wide_root = to_wide_string(root);
    let mut sectors_per_cluster = 0u32;
    let mut bytes_per_sector = 0u32;
    let mut free_clusters = 0u32;
    let mut total_clusters = 0u32;

    let result = unsafe {
        GetDiskFreeSpaceW(
            PCWSTR(wide_root.as_ptr()),
            Some(&mut sectors_per_cluster),
            Some(&mut bytes_per_sector),
            Some(&mut free_clusters),
            Some(&mut total_clusters),
        )
    };

    if result.is_err() {
        return Err(last_error("GetDiskFreeSpaceW"));
    }

    Ok(ClusterGeometry {
        sectors_per_cluster,
        bytes_per_sector,
    })
}
