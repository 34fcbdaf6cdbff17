//! A user-space, block-structured filesystem over a single fixed-size backing file.
//!
//! The backing file is viewed as a fixed array of equal-sized sectors, partitioned
//! into five regions (superblock, inode bitmap, data-block bitmap, inode table, data),
//! and manipulated directly through raw sector I/O. There is no journaling, no
//! concurrent access, and no indirect blocks — every inode's data pointers are direct.
//!
//! [`Fs`] is the single entry point: boot a backing file, then create/open/read/write/
//! seek/close files and create/remove/read directories through it.

pub mod bitmap;
pub mod device;
pub mod dir;
pub mod error;
pub mod file;
pub mod fs;
pub mod inode;
pub mod layout;
pub mod path;

pub use error::{last_error, FsError, FsResult};
pub use fs::Fs;
