//! Error taxonomy (C12) and the process-wide last-error slot (C11).

use std::cell::Cell;

/// Every way a `sectorfs` operation can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FsError {
    #[error("boot/sync failed or the backing file does not describe a valid filesystem")]
    General,
    #[error("create failed: bad path, parent not a directory, name collision, or no free inodes")]
    Create,
    #[error("no such file")]
    NoSuchFile,
    #[error("no such directory")]
    NoSuchDir,
    #[error("file is open")]
    FileInUse,
    #[error("write would exceed the maximum file size")]
    FileTooBig,
    #[error("no free data blocks")]
    NoSpace,
    #[error("open-file table is full")]
    TooManyOpenFiles,
    #[error("bad file descriptor")]
    BadFd,
    #[error("seek offset out of bounds")]
    SeekOutOfBounds,
    #[error("directory is not empty")]
    DirNotEmpty,
    #[error("cannot remove the root directory")]
    RootDir,
    #[error("buffer too small for directory contents")]
    BufferTooSmall,
}

pub type FsResult<T> = Result<T, FsError>;

thread_local! {
    static LAST_ERROR: Cell<Option<FsError>> = const { Cell::new(None) };
}

/// Records `err` in the process-wide last-error slot and returns it, so call sites can
/// write `return Err(set_errno(FsError::Create))`.
pub(crate) fn set_errno(err: FsError) -> FsError {
    LAST_ERROR.with(|slot| slot.set(Some(err)));
    log::warn!("sectorfs error: {err}");
    err
}

/// Inspects the last error set by a failing call on this thread.
pub fn last_error() -> Option<FsError> {
    LAST_ERROR.with(|slot| slot.get())
}
