/*!
 * Local Filesystem Primitives
 * Unguarded size, existence and copy calls over std::fs
 *
 * These block for as long as the underlying mount blocks. Callers are
 * expected to reach them through a guard.
 */

use super::types::{CopyOptions, ExistingPolicy, FsError, FsResult, SymlinkPolicy};
use std::fs;
use std::io;
use std::path::Path;
use tracing::trace;

/// Size in bytes of a regular file
pub fn file_size(path: &Path) -> FsResult<u64> {
    let metadata = fs::metadata(path).map_err(|e| FsError::from_io(e, path))?;
    if metadata.is_dir() {
        return Err(FsError::IsADirectory(path.display().to_string()));
    }
    if !metadata.is_file() {
        return Err(FsError::InvalidArgument(format!(
            "{}: not a regular file",
            path.display()
        )));
    }
    Ok(metadata.len())
}

/// Whether `path` exists
///
/// A missing path is `Ok(false)`; any other failure to stat is an error.
pub fn exists(path: &Path) -> FsResult<bool> {
    path.try_exists().map_err(|e| FsError::from_io(e, path))
}

/// Copy `src` to `dst` according to `options`
///
/// - A file copied onto an existing directory lands inside it under its own name.
/// - A directory is copied into `dst`, creating it if needed. Subdirectories are
///   only descended into when `options.recursive` is set.
pub fn copy(src: &Path, dst: &Path, options: &CopyOptions) -> FsResult<()> {
    let metadata = stat(src, options.symlinks)?;
    let file_type = metadata.file_type();

    if file_type.is_symlink() {
        return copy_symlink(src, dst, options.symlinks);
    }
    if file_type.is_file() {
        if options.directories_only {
            return Ok(());
        }
        let target = if dst.is_dir() {
            match src.file_name() {
                Some(name) => dst.join(name),
                None => {
                    return Err(FsError::InvalidArgument(format!(
                        "{}: source has no file name",
                        src.display()
                    )))
                }
            }
        } else {
            dst.to_path_buf()
        };
        return copy_file(src, &target, options.existing);
    }
    if file_type.is_dir() {
        return copy_dir(src, dst, options);
    }

    Err(FsError::NotSupported(format!(
        "{}: cannot copy special file",
        src.display()
    )))
}

fn stat(path: &Path, symlinks: SymlinkPolicy) -> FsResult<fs::Metadata> {
    let result = match symlinks {
        SymlinkPolicy::Follow => fs::metadata(path),
        SymlinkPolicy::Copy | SymlinkPolicy::Skip => fs::symlink_metadata(path),
    };
    result.map_err(|e| FsError::from_io(e, path))
}

fn copy_dir(src: &Path, dst: &Path, options: &CopyOptions) -> FsResult<()> {
    match fs::create_dir(dst) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            if !dst.is_dir() {
                return Err(FsError::NotADirectory(dst.display().to_string()));
            }
        }
        Err(e) => return Err(FsError::from_io(e, dst)),
    }

    let entries = fs::read_dir(src).map_err(|e| FsError::from_io(e, src))?;
    for entry in entries {
        let entry = entry.map_err(|e| FsError::from_io(e, src))?;
        let child_src = entry.path();
        let child_dst = dst.join(entry.file_name());
        let file_type = stat(&child_src, options.symlinks)?.file_type();

        if file_type.is_dir() {
            if options.recursive {
                copy_dir(&child_src, &child_dst, options)?;
            } else {
                trace!(path = %child_src.display(), "non-recursive copy, skipping subdirectory");
            }
        } else if file_type.is_symlink() {
            copy_symlink(&child_src, &child_dst, options.symlinks)?;
        } else if file_type.is_file() {
            if !options.directories_only {
                copy_file(&child_src, &child_dst, options.existing)?;
            }
        } else {
            trace!(path = %child_src.display(), "skipping special file");
        }
    }
    Ok(())
}

fn copy_file(src: &Path, dst: &Path, existing: ExistingPolicy) -> FsResult<()> {
    match fs::metadata(dst) {
        Ok(dst_meta) => {
            if dst_meta.is_dir() {
                return Err(FsError::IsADirectory(dst.display().to_string()));
            }
            if is_same_file(src, dst) {
                return Err(FsError::InvalidArgument(format!(
                    "{}: source and destination are the same file",
                    src.display()
                )));
            }
            match existing {
                ExistingPolicy::Error => {
                    return Err(FsError::AlreadyExists(dst.display().to_string()))
                }
                ExistingPolicy::Skip => return Ok(()),
                ExistingPolicy::Overwrite => {}
                ExistingPolicy::Update => {
                    if !is_newer(src, &dst_meta)? {
                        return Ok(());
                    }
                }
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(FsError::from_io(e, dst)),
    }

    let mut reader = fs::File::open(src).map_err(|e| FsError::from_io(e, src))?;
    let permissions = reader
        .metadata()
        .map_err(|e| FsError::from_io(e, src))?
        .permissions();
    let mut writer = fs::File::create(dst).map_err(|e| FsError::from_io(e, dst))?;
    io::copy(&mut reader, &mut writer).map_err(|e| {
        FsError::from_io_context(e, format!("{} -> {}", src.display(), dst.display()))
    })?;
    fs::set_permissions(dst, permissions).map_err(|e| FsError::from_io(e, dst))
}

fn copy_symlink(src: &Path, dst: &Path, symlinks: SymlinkPolicy) -> FsResult<()> {
    match symlinks {
        SymlinkPolicy::Skip => Ok(()),
        SymlinkPolicy::Follow => Err(FsError::InvalidArgument(format!(
            "{}: dangling symlink",
            src.display()
        ))),
        SymlinkPolicy::Copy => {
            let target = fs::read_link(src).map_err(|e| FsError::from_io(e, src))?;
            create_symlink(&target, dst)
        }
    }
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> FsResult<()> {
    std::os::unix::fs::symlink(target, link).map_err(|e| FsError::from_io(e, link))
}

#[cfg(not(unix))]
fn create_symlink(_target: &Path, link: &Path) -> FsResult<()> {
    Err(FsError::NotSupported(format!(
        "{}: symlink copies are only supported on unix",
        link.display()
    )))
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn is_newer(src: &Path, dst_meta: &fs::Metadata) -> FsResult<bool> {
    let src_meta = fs::metadata(src).map_err(|e| FsError::from_io(e, src))?;
    match (src_meta.modified(), dst_meta.modified()) {
        (Ok(src_time), Ok(dst_time)) => Ok(src_time > dst_time),
        // Without timestamps there is nothing to compare, copy anyway
        _ => Ok(true),
    }
}
