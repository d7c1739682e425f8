/*!
 * Guarded Filesystem
 * Size, existence and copy operations behind thread and process guards
 */

pub mod local;
pub mod ops;
mod safe;
pub mod types;

// Re-exports
pub use ops::{CopyTree, ExistsCheck, FsOperation, Operation, SizeQuery};
pub use safe::SafeFileSystem;
pub use types::{CopyOptions, ExistingPolicy, FsError, FsResult, SymlinkPolicy};
