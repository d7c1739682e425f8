/*!
 * Guarded Operations
 *
 * Argument-captured filesystem calls. Each operation is a plain value that
 * can run on a guard thread or be shipped to a worker process, and carries
 * nothing beyond its paths and options.
 */

use super::local;
use super::types::{CopyOptions, FsError, FsResult};
use crate::core::guard::StatusPayload;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A deferred filesystem computation with a typed result
pub trait Operation: Clone + Send + 'static {
    /// Result type, also marshaled back from worker processes
    type Output: Serialize + DeserializeOwned + StatusPayload + fmt::Debug + Send + 'static;

    /// Name used in logs and error messages
    const NAME: &'static str;

    /// Run the primitive on the current thread, blocking as long as it blocks
    fn run(&self) -> FsResult<Self::Output>;

    /// Wire form sent to a worker process
    fn to_request(&self) -> FsOperation;

    /// Path reported in errors
    fn path(&self) -> &Path;
}

/// Size in bytes of a regular file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeQuery {
    pub path: PathBuf,
}

impl SizeQuery {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Operation for SizeQuery {
    type Output = u64;
    const NAME: &'static str = "file_size";

    fn run(&self) -> FsResult<u64> {
        local::file_size(&self.path)
    }

    fn to_request(&self) -> FsOperation {
        FsOperation::Size(self.clone())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Whether a path exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistsCheck {
    pub path: PathBuf,
}

impl ExistsCheck {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Operation for ExistsCheck {
    type Output = bool;
    const NAME: &'static str = "exists";

    fn run(&self) -> FsResult<bool> {
        local::exists(&self.path)
    }

    fn to_request(&self) -> FsOperation {
        FsOperation::Exists(self.clone())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Copy of a file or directory tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyTree {
    pub src: PathBuf,
    pub dst: PathBuf,
    pub options: CopyOptions,
}

impl CopyTree {
    pub fn new(src: impl Into<PathBuf>, dst: impl Into<PathBuf>, options: CopyOptions) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
            options,
        }
    }
}

impl Operation for CopyTree {
    type Output = ();
    const NAME: &'static str = "copy";

    fn run(&self) -> FsResult<()> {
        local::copy(&self.src, &self.dst, &self.options)
    }

    fn to_request(&self) -> FsOperation {
        FsOperation::Copy(self.clone())
    }

    fn path(&self) -> &Path {
        &self.src
    }
}

/// Any guarded operation, as sent to a worker process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FsOperation {
    Size(SizeQuery),
    Exists(ExistsCheck),
    Copy(CopyTree),
}

impl FsOperation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Size(_) => SizeQuery::NAME,
            Self::Exists(_) => ExistsCheck::NAME,
            Self::Copy(_) => CopyTree::NAME,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Size(op) => op.path(),
            Self::Exists(op) => op.path(),
            Self::Copy(op) => op.path(),
        }
    }

    /// Run the operation and encode `Result<Output, FsError>` for the wire
    pub fn run_encoded(&self) -> Result<Vec<u8>, bincode::Error> {
        match self {
            Self::Size(op) => encode_result(op),
            Self::Exists(op) => encode_result(op),
            Self::Copy(op) => encode_result(op),
        }
    }
}

fn encode_result<O: Operation>(op: &O) -> Result<Vec<u8>, bincode::Error> {
    let result: Result<O::Output, FsError> = op.run();
    bincode::serialize(&result)
}
