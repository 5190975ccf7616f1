//! Security descriptors, process token SIDs and access checks.

use crate::error::{last_error, win32_error};
use crate::winapi_utils::{to_wide_string, LocalString, SafeHandle, Win32Status};
use std::ffi::c_void;
use std::{mem, ptr};
use windows::core::{PCWSTR, PWSTR};
use windows::Win32::Foundation::{BOOL, ERROR_SUCCESS, HANDLE, PSID};
use windows::Win32::Security::Authorization::{
    BuildTrusteeWithSidW, ConvertSidToStringSidW, GetEffectiveRightsFromAclW, TRUSTEE_W,
};
use windows::Win32::Security::{
    AccessCheck, CreateWellKnownSid, DuplicateToken, GetFileSecurityW, GetSecurityDescriptorDacl,
    GetSecurityDescriptorGroup, GetSecurityDescriptorOwner, GetTokenInformation,
    SecurityImpersonation, TokenPrimaryGroup, TokenUser, WinWorldSid, ACL, GENERIC_MAPPING,
    PRIVILEGE_SET, PSECURITY_DESCRIPTOR, TOKEN_ACCESS_MASK, TOKEN_DUPLICATE, TOKEN_IMPERSONATE,
    TOKEN_PRIMARY_GROUP, TOKEN_QUERY, TOKEN_USER,
};
use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};
use winstat_core::native::{
    NativeResult, SecurityDescriptor, SecurityInfo, TokenKind, FILE_ALL_ACCESS,
    FILE_GENERIC_EXECUTE, FILE_GENERIC_READ, FILE_GENERIC_WRITE,
};

/// `SECURITY_MAX_SID_SIZE`
const SECURITY_MAX_SID_SIZE: usize = 68;

const ERROR_INVALID_SID: u32 = 1337;

const FILE_MAPPING: GENERIC_MAPPING = GENERIC_MAPPING {
    GenericRead: FILE_GENERIC_READ,
    GenericWrite: FILE_GENERIC_WRITE,
    GenericExecute: FILE_GENERIC_EXECUTE,
    GenericAll: FILE_ALL_ACCESS,
};

fn descriptor_ptr(descriptor: &SecurityDescriptor) -> PSECURITY_DESCRIPTOR {
    PSECURITY_DESCRIPTOR(descriptor.raw.as_ptr() as *mut c_void)
}

/// Fetch the parts of `path`'s security descriptor named by `info`.
///
/// The first call only asks for the required size; it is expected to fail
/// with `ERROR_INSUFFICIENT_BUFFER`.
pub fn file_security(path: &str, info: SecurityInfo) -> NativeResult<SecurityDescriptor> {
    let wide_path = to_wide_string(path);
    let mut needed = 0u32;

    let probe = unsafe {
        GetFileSecurityW(
            PCWSTR(wide_path.as_ptr()),
            info.bits(),
            PSECURITY_DESCRIPTOR::default(),
            0,
            &mut needed,
        )
    };
    if !probe.succeeded() {
        let err = last_error("GetFileSecurityW");
        if !err.is_insufficient_buffer() {
            return Err(err);
        }
    }

    let mut raw = vec![0u8; needed as usize];
    let fetched = unsafe {
        GetFileSecurityW(
            PCWSTR(wide_path.as_ptr()),
            info.bits(),
            PSECURITY_DESCRIPTOR(raw.as_mut_ptr() as *mut c_void),
            needed,
            &mut needed,
        )
    };
    if !fetched.succeeded() {
        return Err(last_error("GetFileSecurityW"));
    }

    let mut descriptor = SecurityDescriptor {
        raw,
        owner_sid: None,
        group_sid: None,
    };

    if info.contains(SecurityInfo::OWNER) {
        let mut owner = PSID::default();
        let mut defaulted = BOOL::default();
        let descriptor_raw = descriptor_ptr(&descriptor);
        unsafe { GetSecurityDescriptorOwner(descriptor_raw, &mut owner, &mut defaulted) }
            .map_err(|_| last_error("GetSecurityDescriptorOwner"))?;
        descriptor.owner_sid = sid_to_string(owner)?;
    }

    if info.contains(SecurityInfo::GROUP) {
        let mut group = PSID::default();
        let mut defaulted = BOOL::default();
        let descriptor_raw = descriptor_ptr(&descriptor);
        unsafe { GetSecurityDescriptorGroup(descriptor_raw, &mut group, &mut defaulted) }
            .map_err(|_| last_error("GetSecurityDescriptorGroup"))?;
        descriptor.group_sid = sid_to_string(group)?;
    }

    Ok(descriptor)
}

/// `S-1-...` form of a SID; `None` for a null SID.
fn sid_to_string(sid: PSID) -> NativeResult<Option<String>> {
    if sid.0.is_null() {
        return Ok(None);
    }

    let mut string_sid = PWSTR::null();
    unsafe { ConvertSidToStringSidW(sid, &mut string_sid) }
        .map_err(|_| last_error("ConvertSidToStringSidW"))?;
    Ok(Some(LocalString(string_sid).to_string_lossy()))
}

fn open_process_token(access: TOKEN_ACCESS_MASK) -> NativeResult<SafeHandle> {
    let mut token = HANDLE::default();
    unsafe { OpenProcessToken(GetCurrentProcess(), access, &mut token) }
        .map_err(|_| last_error("OpenProcessToken"))?;
    Ok(SafeHandle(token))
}

/// The user or primary group SID of the current process token.
pub fn token_sid(kind: TokenKind) -> NativeResult<String> {
    let token = open_process_token(TOKEN_QUERY)?;
    let class = match kind {
        TokenKind::User => TokenUser,
        TokenKind::PrimaryGroup => TokenPrimaryGroup,
    };

    let mut needed = 0u32;
    if unsafe { GetTokenInformation(token.as_raw(), class, None, 0, &mut needed) }.is_err() {
        let err = last_error("GetTokenInformation");
        if !err.is_insufficient_buffer() {
            return Err(err);
        }
    }

    // u64 storage keeps the pointer-bearing token structs aligned.
    let mut buffer = vec![0u64; (needed as usize).div_ceil(mem::size_of::<u64>())];
    unsafe {
        GetTokenInformation(
            token.as_raw(),
            class,
            Some(buffer.as_mut_ptr() as *mut c_void),
            needed,
            &mut needed,
        )
    }
    .map_err(|_| last_error("GetTokenInformation"))?;

    let sid = match kind {
        TokenKind::User => unsafe { (*(buffer.as_ptr() as *const TOKEN_USER)).User.Sid },
        TokenKind::PrimaryGroup => unsafe {
            (*(buffer.as_ptr() as *const TOKEN_PRIMARY_GROUP)).PrimaryGroup
        },
    };

    sid_to_string(sid)?.ok_or_else(|| win32_error("GetTokenInformation", ERROR_INVALID_SID))
}

/// `AccessCheck` for an impersonation copy of the process token.
///
/// `desired` must already be mapped to file-specific rights.
pub fn access_check(descriptor: &SecurityDescriptor, desired: u32) -> NativeResult<bool> {
    let token = open_process_token(TOKEN_IMPERSONATE | TOKEN_QUERY | TOKEN_DUPLICATE)?;

    let mut duplicate = HANDLE::default();
    unsafe { DuplicateToken(token.as_raw(), SecurityImpersonation, &mut duplicate) }
        .map_err(|_| last_error("DuplicateToken"))?;
    let duplicate = SafeHandle(duplicate);

    let mut privileges = PRIVILEGE_SET::default();
    let mut privileges_len = mem::size_of::<PRIVILEGE_SET>() as u32;
    let mut granted = 0u32;
    let mut status = BOOL::default();

    unsafe {
        AccessCheck(
            descriptor_ptr(descriptor),
            duplicate.as_raw(),
            desired,
            &FILE_MAPPING,
            Some(&mut privileges),
            &mut privileges_len,
            &mut granted,
            &mut status,
        )
    }
    .map_err(|_| last_error("AccessCheck"))?;

    Ok(status.as_bool())
}

/// Effective rights of the Everyone SID under the descriptor's DACL.
pub fn everyone_rights(descriptor: &SecurityDescriptor) -> NativeResult<Option<u32>> {
    let mut present = BOOL::default();
    let mut defaulted = BOOL::default();
    let mut dacl: *mut ACL = ptr::null_mut();

    unsafe {
        GetSecurityDescriptorDacl(
            descriptor_ptr(descriptor),
            &mut present,
            &mut dacl,
            &mut defaulted,
        )
    }
    .map_err(|_| last_error("GetSecurityDescriptorDacl"))?;

    if !present.as_bool() || dacl.is_null() {
        return Ok(None);
    }

    let mut sid_buffer = [0u8; SECURITY_MAX_SID_SIZE];
    let mut sid_len = SECURITY_MAX_SID_SIZE as u32;
    let everyone = PSID(sid_buffer.as_mut_ptr() as *mut c_void);
    unsafe { CreateWellKnownSid(WinWorldSid, PSID::default(), everyone, &mut sid_len) }
        .map_err(|_| last_error("CreateWellKnownSid"))?;

    let mut trustee = TRUSTEE_W::default();
    unsafe { BuildTrusteeWithSidW(&mut trustee, everyone) };

    let mut rights = 0u32;
    let status = unsafe { GetEffectiveRightsFromAclW(dacl, &trustee, &mut rights) };
    if status != ERROR_SUCCESS {
        return Err(win32_error("GetEffectiveRightsFromAclW", status.0));
    }

    Ok(Some(rights))
}
