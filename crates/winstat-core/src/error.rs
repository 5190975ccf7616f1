//! Error types for winstat core operations.
//!
//! Library errors are `thiserror` enums. `NativeError` is what a
//! [`NativeQuery`](crate::native::NativeQuery) implementation reports; the
//! snapshot builder classifies each one into a substituted value, a missing
//! field, or a `StatError` returned to the caller.

use std::path::Path;
use thiserror::Error;

/// Result type alias using StatError
pub type Result<T> = std::result::Result<T, StatError>;

pub const NO_ERROR: u32 = 0;
pub const ERROR_FILE_NOT_FOUND: u32 = 2;
pub const ERROR_PATH_NOT_FOUND: u32 = 3;
pub const ERROR_ACCESS_DENIED: u32 = 5;
pub const ERROR_NO_MORE_FILES: u32 = 18;
pub const ERROR_SHARING_VIOLATION: u32 = 32;
pub const ERROR_HANDLE_EOF: u32 = 38;
pub const ERROR_BAD_NETPATH: u32 = 53;
pub const ERROR_INVALID_NAME: u32 = 123;
pub const ERROR_INSUFFICIENT_BUFFER: u32 = 122;
pub const ERROR_CALL_NOT_IMPLEMENTED: u32 = 120;

/// A failed native call: the function that failed and its Win32 error code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{function} failed with code {code}: {message}")]
pub struct NativeError {
    pub function: String,
    pub code: u32,
    pub message: String,
}

impl NativeError {
    pub fn new(function: impl Into<String>, code: u32, message: impl Into<String>) -> Self {
        NativeError {
            function: function.into(),
            code,
            message: message.into(),
        }
    }

    /// Create an error without a rendered system message
    pub fn from_code(function: impl Into<String>, code: u32) -> Self {
        NativeError::new(function, code, format!("Win32 error {}", code))
    }

    /// The file is held open by another process without read sharing.
    pub fn is_sharing_violation(&self) -> bool {
        self.code == ERROR_SHARING_VIOLATION
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self.code,
            ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND | ERROR_BAD_NETPATH | ERROR_INVALID_NAME
        )
    }

    pub fn is_insufficient_buffer(&self) -> bool {
        self.code == ERROR_INSUFFICIENT_BUFFER
    }
}

/// Errors surfaced by a snapshot query.
#[derive(Error, Debug)]
pub enum StatError {
    /// The path names no filesystem entry and no known device
    #[error("no such file or directory: {path}")]
    NotFound { path: String },

    /// The argument cannot name a path
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// A native call failed outside of its tolerated cases
    #[error("system call error: {function} failed with code {code}: {message}")]
    SystemCall {
        function: String,
        code: u32,
        message: String,
    },

    /// Configuration file parsing failed
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StatError {
    /// Classify a native failure for `path`: missing entries become
    /// `NotFound`, everything else a `SystemCall` error.
    pub fn from_native(err: NativeError, path: &str) -> Self {
        if err.is_not_found() {
            StatError::NotFound {
                path: path.to_string(),
            }
        } else {
            StatError::SystemCall {
                function: err.function,
                code: err.code,
                message: err.message,
            }
        }
    }

    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        StatError::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// The native error code, if this error came from a native call.
    pub fn code(&self) -> Option<u32> {
        match self {
            StatError::SystemCall { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StatError::NotFound { .. })
    }

    pub fn config_path(path: &Path, reason: impl std::fmt::Display) -> Self {
        StatError::Config {
            reason: format!("{}: {}", path.display(), reason),
        }
    }
}

impl From<NativeError> for StatError {
    fn from(err: NativeError) -> Self {
        StatError::SystemCall {
            function: err.function,
            code: err.code,
            message: err.message,
        }
    }
}
