//! # winstat Core Library
//!
//! This crate turns the partial, sometimes conflicting answers of several
//! Windows metadata APIs into one immutable, POSIX-`stat`-shaped
//! [`Snapshot`]. It is platform-agnostic: every native call goes through the
//! [`NativeQuery`] trait, implemented for real by `winstat-backend-win32`.
//!
//! ## Architecture
//!
//! - **Native** (`native`): The capability trait and the raw records it returns
//! - **Codec** (`codec`): FILETIME conversion, mode synthesis, size arithmetic
//! - **Path** (`path`): Separator normalization, roots, UNC and device names
//! - **Access** (`access`): Effective read/write rights for the process and Everyone
//! - **Builder** (`builder`): Queries a path and classifies every failure
//! - **Snapshot** (`snapshot`): The immutable result and its accessors
//! - **Config** (`config`): Configuration management
//!
//! ## Example
//!
//! ```rust,ignore
//! use winstat_core::{stat, DevFormat};
//!
//! let snapshot = stat(&query, r"C:\Windows\notepad.exe")?;
//! println!("{} bytes, mode {:o}", snapshot.size(), snapshot.mode());
//! println!("on drive {:?}", snapshot.dev(DevFormat::Letter));
//! ```

pub mod access;
pub mod builder;
pub mod codec;
pub mod config;
pub mod error;
pub mod native;
pub mod path;
pub mod snapshot;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use builder::stat;
pub use config::{Config, OutputFormat};
pub use error::{NativeError, Result, StatError};
pub use native::NativeQuery;
pub use snapshot::Snapshot;
pub use types::{DevFormat, DeviceId, DriveType, FileAttributes, FileType};
