//! Compile-time layout constants and the region boundaries derived from them.
//!
//! The disk partitions into five contiguous regions, in this exact order: superblock,
//! inode bitmap, data-block bitmap, inode table, data region. Nothing here is
//! negotiable across mounts of the same backing file.

use crate::inode::DiskInode;

/// Bytes per sector.
pub const SECTOR_SIZE: usize = 512;
/// Device capacity in sectors.
pub const TOTAL_SECTORS: usize = 8192;
/// Cap on simultaneously allocated inodes.
pub const MAX_FILES: usize = 1024;
/// Cap on data blocks per file (all pointers are direct).
pub const MAX_SECTORS_PER_FILE: usize = 32;
/// Cap on the open-file table.
pub const MAX_OPEN_FILES: usize = 256;
/// Including the null terminator.
pub const MAX_NAME: usize = 16;
/// Including the null terminator.
pub const MAX_PATH: usize = 256;
/// 32-bit on-disk sentinel, written to sector 0's first four bytes.
pub const OS_MAGIC: u32 = 0xdead_beef;

/// Dirent record size: 16-byte name + 4-byte child inode number.
pub const DIRENT_SIZE: usize = MAX_NAME + 4;
/// Dirents packed per sector of a directory's data.
pub const DIRENTS_PER_SECTOR: usize = SECTOR_SIZE / DIRENT_SIZE;

/// Inode records packed per sector; an inode must never straddle a sector boundary.
pub const INODES_PER_SECTOR: usize = SECTOR_SIZE / core::mem::size_of::<DiskInode>();

/// Superblock occupies sector 0.
pub const SUPERBLOCK_START_SECTOR: usize = 0;

/// Inode bitmap: 1 bit per inode, rounded up to whole sectors.
pub const INODE_BITMAP_START_SECTOR: usize = SUPERBLOCK_START_SECTOR + 1;
pub const INODE_BITMAP_SIZE: usize = MAX_FILES.div_ceil(8);
pub const INODE_BITMAP_SECTORS: usize = INODE_BITMAP_SIZE.div_ceil(SECTOR_SIZE);

/// Data-block bitmap: 1 bit per sector of the whole device, rounded up.
pub const DATA_BITMAP_START_SECTOR: usize = INODE_BITMAP_START_SECTOR + INODE_BITMAP_SECTORS;
pub const DATA_BITMAP_SIZE: usize = TOTAL_SECTORS.div_ceil(8);
pub const DATA_BITMAP_SECTORS: usize = DATA_BITMAP_SIZE.div_ceil(SECTOR_SIZE);

/// Inode table: packed inodes, no inode straddles a sector boundary.
pub const INODE_TABLE_START_SECTOR: usize = DATA_BITMAP_START_SECTOR + DATA_BITMAP_SECTORS;
pub const INODE_TABLE_SECTORS: usize = MAX_FILES.div_ceil(INODES_PER_SECTOR);

/// Data region: everything after the inode table.
pub const DATABLOCK_START_SECTOR: usize = INODE_TABLE_START_SECTOR + INODE_TABLE_SECTORS;

/// Root inode number; its bitmap bit is permanently set after format.
pub const ROOT_INODE: u32 = 0;
