/*!
 * Filesystem Types
 * Shared types for guarded filesystem operations
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use thiserror::Error;

/// Filesystem operation result
pub type FsResult<T> = Result<T, FsError>;

/// Errors raised by the filesystem primitives themselves
///
/// Serializable so a worker process can hand it back to its supervisor
/// without losing the variant.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
pub enum FsError {
    #[error("Not found: {0}")]
    #[diagnostic(code(fs::not_found))]
    NotFound(String),

    #[error("Already exists: {0}")]
    #[diagnostic(
        code(fs::already_exists),
        help("Pass an existing-file policy (skip, overwrite, update) to replace or keep it.")
    )]
    AlreadyExists(String),

    #[error("Permission denied: {0}")]
    #[diagnostic(code(fs::permission_denied))]
    PermissionDenied(String),

    #[error("Not a directory: {0}")]
    #[diagnostic(code(fs::not_a_directory))]
    NotADirectory(String),

    #[error("Is a directory: {0}")]
    #[diagnostic(code(fs::is_a_directory))]
    IsADirectory(String),

    #[error("Invalid argument: {0}")]
    #[diagnostic(code(fs::invalid_argument))]
    InvalidArgument(String),

    #[error("Not supported: {0}")]
    #[diagnostic(code(fs::not_supported))]
    NotSupported(String),

    #[error("I/O error: {0}")]
    #[diagnostic(code(fs::io_error))]
    IoError(String),
}

impl FsError {
    /// Convert an `io::Error` raised while touching `path`
    pub fn from_io(e: io::Error, path: &Path) -> Self {
        Self::from_io_context(e, path.display().to_string())
    }

    /// Convert an `io::Error` with a caller-built context such as `src -> dst`
    pub fn from_io_context(e: io::Error, context: String) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound(context),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(context),
            io::ErrorKind::AlreadyExists => Self::AlreadyExists(context),
            io::ErrorKind::InvalidInput => Self::InvalidArgument(format!("{}: {}", context, e)),
            io::ErrorKind::Unsupported => Self::NotSupported(format!("{}: {}", context, e)),
            _ => Self::IoError(format!("{}: {}", context, e)),
        }
    }
}

/// What to do when a copy target already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistingPolicy {
    /// Fail with `AlreadyExists`
    #[default]
    Error,
    /// Keep the existing file
    Skip,
    /// Replace the existing file
    Overwrite,
    /// Replace only if the source is newer
    Update,
}

/// How to treat symbolic links met during a copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymlinkPolicy {
    /// Copy what the link points to
    #[default]
    Follow,
    /// Recreate the link itself
    Copy,
    /// Leave links out
    Skip,
}

/// Copy behavior for files and directory trees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyOptions {
    /// Descend into subdirectories
    pub recursive: bool,
    pub existing: ExistingPolicy,
    pub symlinks: SymlinkPolicy,
    /// Recreate the directory structure without copying files
    pub directories_only: bool,
}

impl CopyOptions {
    /// Recursive copy, fail on existing files, follow links
    pub const fn recursive() -> Self {
        Self {
            recursive: true,
            existing: ExistingPolicy::Error,
            symlinks: SymlinkPolicy::Follow,
            directories_only: false,
        }
    }

    /// Copy only the top level of a directory
    pub const fn shallow() -> Self {
        Self {
            recursive: false,
            ..Self::recursive()
        }
    }

    pub fn with_existing(mut self, existing: ExistingPolicy) -> Self {
        self.existing = existing;
        self
    }

    pub fn with_symlinks(mut self, symlinks: SymlinkPolicy) -> Self {
        self.symlinks = symlinks;
        self
    }

    pub fn directories_only(mut self) -> Self {
        self.directories_only = true;
        self
    }
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self::recursive()
    }
}
