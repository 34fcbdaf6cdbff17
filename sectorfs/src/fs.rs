//! Boot/sync (C10) and the create/remove protocol (C7), plus the public API surface
//! that composes C3-C9 behind one explicit filesystem instance.

use std::path::{Path, PathBuf};

use crate::bitmap::BitmapRegion;
use crate::device::SectorDevice;
use crate::dir;
use crate::error::{set_errno, FsError, FsResult};
use crate::file::{self, OpenFileTable};
use crate::inode::{read_inode, write_inode, DiskInode, InodeCache, InodeType};
use crate::layout::{
    DATABLOCK_START_SECTOR, DATA_BITMAP_SECTORS, DATA_BITMAP_START_SECTOR, INODE_BITMAP_SECTORS,
    INODE_BITMAP_START_SECTOR, INODE_TABLE_SECTORS, MAX_FILES, OS_MAGIC, ROOT_INODE, SECTOR_SIZE,
    TOTAL_SECTORS,
};

fn inode_bitmap() -> BitmapRegion {
    BitmapRegion::new(INODE_BITMAP_START_SECTOR, INODE_BITMAP_SECTORS, MAX_FILES)
}

fn data_bitmap() -> BitmapRegion {
    BitmapRegion::new(DATA_BITMAP_START_SECTOR, DATA_BITMAP_SECTORS, TOTAL_SECTORS)
}

/// A single filesystem instance: the device image, the open-file table, and the
/// backing-file path it was booted from — replaces the process-wide globals the
/// reference implementation used, per the design note that an explicit instance value
/// should bundle this state instead.
pub struct Fs {
    dev: SectorDevice,
    open_files: OpenFileTable,
    backing_path: PathBuf,
}

impl Fs {
    /// Boots the filesystem backed by `path`: formats a fresh image if the file does
    /// not exist, or validates an existing one (size and magic).
    pub fn boot(path: impl AsRef<Path>) -> FsResult<Self> {
        let path = path.as_ref().to_path_buf();
        log::info!("boot: {}", path.display());

        let mut dev = SectorDevice::new();

        if !path.exists() {
            log::info!("boot: backing file does not exist, formatting a fresh image");
            format(&mut dev);
            dev.save(&path).map_err(|e| {
                log::error!("boot: failed to save fresh image: {e}");
                set_errno(FsError::General)
            })?;
        } else {
            dev.load(&path).map_err(|e| {
                log::error!("boot: failed to load backing file: {e}");
                set_errno(FsError::General)
            })?;

            let expected_len = (SECTOR_SIZE * TOTAL_SECTORS) as u64;
            let actual_len = std::fs::metadata(&path)
                .map(|m| m.len())
                .map_err(|_| set_errno(FsError::General))?;
            if actual_len != expected_len {
                return Err(set_errno(FsError::General));
            }

            let mut sector0 = [0u8; SECTOR_SIZE];
            dev.read_sector(0, &mut sector0);
            let magic = u32::from_le_bytes(sector0[0..4].try_into().unwrap());
            if magic != OS_MAGIC {
                return Err(set_errno(FsError::General));
            }
        }

        Ok(Self {
            dev,
            open_files: OpenFileTable::new(),
            backing_path: path,
        })
    }

    /// Saves the in-memory image to the backing file.
    pub fn sync(&self) -> FsResult<()> {
        self.dev.save(&self.backing_path).map_err(|e| {
            log::error!("sync: failed to save backing file: {e}");
            set_errno(FsError::General)
        })
    }

    // ---- files ----

    pub fn file_create(&mut self, path: &str) -> FsResult<()> {
        self.create(path, InodeType::File)
            .map(|_| ())
            .map_err(|_| set_errno(FsError::Create))
    }

    pub fn file_unlink(&mut self, path: &str) -> FsResult<()> {
        let mut cache = InodeCache::new();
        let resolved = crate::path::resolve(&self.dev, &mut cache, path)
            .map_err(|_| set_errno(FsError::NoSuchFile))?;
        let child = resolved.child.ok_or_else(|| set_errno(FsError::NoSuchFile))?;

        if self.open_files.is_open(child) {
            return Err(set_errno(FsError::FileInUse));
        }

        self.remove(resolved.parent, child, InodeType::File)
    }

    pub fn file_open(&mut self, path: &str) -> FsResult<usize> {
        let mut cache = InodeCache::new();
        let resolved = crate::path::resolve(&self.dev, &mut cache, path)
            .map_err(|_| set_errno(FsError::NoSuchFile))?;
        let child = resolved.child.ok_or_else(|| set_errno(FsError::NoSuchFile))?;

        let inode = read_inode(&self.dev, &mut cache, child);
        if inode.kind() != Some(InodeType::File) {
            return Err(set_errno(FsError::General));
        }

        self.open_files.open(child, inode.size())
    }

    pub fn file_close(&mut self, fd: usize) -> FsResult<()> {
        self.open_files.close(fd)
    }

    pub fn file_read(&mut self, fd: usize, buf: &mut [u8]) -> FsResult<usize> {
        let mut cache = InodeCache::new();
        file::read(&self.dev, &mut cache, &mut self.open_files, fd, buf)
    }

    pub fn file_write(&mut self, fd: usize, buf: &[u8]) -> FsResult<usize> {
        let mut cache = InodeCache::new();
        let bitmap = data_bitmap();
        file::write(&mut self.dev, &bitmap, &mut cache, &mut self.open_files, fd, buf)
    }

    pub fn file_seek(&mut self, fd: usize, offset: u32) -> FsResult<u32> {
        file::seek(&mut self.open_files, fd, offset)
    }

    // ---- directories ----

    pub fn dir_create(&mut self, path: &str) -> FsResult<()> {
        self.create(path, InodeType::Directory)
            .map(|_| ())
            .map_err(|_| set_errno(FsError::Create))
    }

    pub fn dir_unlink(&mut self, path: &str) -> FsResult<()> {
        if path == "/" {
            return Err(set_errno(FsError::RootDir));
        }

        let mut cache = InodeCache::new();
        let resolved = crate::path::resolve(&self.dev, &mut cache, path)
            .map_err(|_| set_errno(FsError::NoSuchDir))?;
        let child = resolved.child.ok_or_else(|| set_errno(FsError::NoSuchDir))?;

        self.remove(resolved.parent, child, InodeType::Directory)
    }

    pub fn dir_size(&mut self, path: &str) -> FsResult<usize> {
        let mut cache = InodeCache::new();
        let resolved = crate::path::resolve(&self.dev, &mut cache, path)
            .map_err(|_| set_errno(FsError::NoSuchDir))?;
        let child = resolved.child.ok_or_else(|| set_errno(FsError::NoSuchDir))?;
        let inode = read_inode(&self.dev, &mut cache, child);
        if inode.kind() != Some(InodeType::Directory) {
            return Err(set_errno(FsError::NoSuchDir));
        }
        Ok(inode.size() as usize * crate::layout::DIRENT_SIZE)
    }

    pub fn dir_read(&mut self, path: &str, buf: &mut [u8]) -> FsResult<usize> {
        let mut cache = InodeCache::new();
        let resolved = crate::path::resolve(&self.dev, &mut cache, path)
            .map_err(|_| set_errno(FsError::NoSuchDir))?;
        let child = resolved.child.ok_or_else(|| set_errno(FsError::NoSuchDir))?;
        let inode = read_inode(&self.dev, &mut cache, child);
        if inode.kind() != Some(InodeType::Directory) {
            return Err(set_errno(FsError::NoSuchDir));
        }
        dir::read_into(&self.dev, &mut cache, child, buf)
    }

    // ---- protocols ----

    fn create(&mut self, path: &str, kind: InodeType) -> FsResult<u32> {
        let mut cache = InodeCache::new();
        let resolved =
            crate::path::resolve(&self.dev, &mut cache, path).map_err(|_| FsError::Create)?;

        if resolved.child.is_some() {
            return Err(FsError::Create);
        }

        let bitmap = inode_bitmap();
        let new_inode = bitmap
            .first_unused(&mut self.dev)
            .ok_or(FsError::Create)? as u32;

        let disk_inode = DiskInode::new(kind);
        write_inode(&mut self.dev, &mut cache, new_inode, &disk_inode);

        let data_bitmap = data_bitmap();
        dir::append(
            &mut self.dev,
            &data_bitmap,
            &mut cache,
            resolved.parent,
            &resolved.name,
            new_inode,
        )
        .map_err(|_| FsError::Create)?;

        log::info!("create: path={path} inode={new_inode} kind={kind:?}");
        Ok(new_inode)
    }

    fn remove(&mut self, parent: u32, child: u32, expected: InodeType) -> FsResult<()> {
        let mut cache = InodeCache::new();
        let child_inode = read_inode(&self.dev, &mut cache, child);

        if child_inode.kind() != Some(expected) {
            return Err(set_errno(FsError::General));
        }

        if expected == InodeType::Directory && child_inode.data().iter().any(|&s| s != 0) {
            return Err(set_errno(FsError::DirNotEmpty));
        }

        let ibitmap = inode_bitmap();
        ibitmap.reset(&mut self.dev, child as usize);

        let dbitmap = data_bitmap();
        if expected == InodeType::File {
            for &sector in child_inode.data().iter() {
                if sector != 0 {
                    dbitmap.reset(&mut self.dev, sector as usize);
                }
            }
        }

        write_inode(&mut self.dev, &mut cache, child, &DiskInode::new(expected));

        dir::remove(&mut self.dev, &dbitmap, &mut cache, parent, child);
        log::info!("remove: parent={parent} child={child}");
        Ok(())
    }
}

/// Formats a fresh image in place: superblock, both bitmaps, and a zeroed inode table
/// with inode 0 (the root) written as an empty directory.
fn format(dev: &mut SectorDevice) {
    log::info!("format: writing a fresh filesystem image");

    let mut sector0 = [0u8; SECTOR_SIZE];
    sector0[0..4].copy_from_slice(&OS_MAGIC.to_le_bytes());
    dev.write_sector(0, &sector0);

    inode_bitmap().init(dev, 1);
    data_bitmap().init(dev, DATABLOCK_START_SECTOR);

    let zero = [0u8; SECTOR_SIZE];
    for s in 0..INODE_TABLE_SECTORS {
        dev.write_sector(crate::layout::INODE_TABLE_START_SECTOR + s, &zero);
    }

    let mut cache = InodeCache::new();
    write_inode(dev, &mut cache, ROOT_INODE, &DiskInode::new(InodeType::Directory));
}
