//! Directory operations (C5): dirent layout inside a directory's data blocks, and
//! append/scan/remove over that layout.
//!
//! A dirent is 20 bytes: a 16-byte null-padded name followed by a 4-byte child inode
//! number. The i-th dirent of a directory lives in `data[i / DIRENTS_PER_SECTOR]` at
//! offset `(i % DIRENTS_PER_SECTOR) * DIRENT_SIZE`.

use bytemuck::{Pod, Zeroable};

use crate::bitmap::BitmapRegion;
use crate::device::SectorDevice;
use crate::error::{set_errno, FsError, FsResult};
use crate::inode::{read_inode, write_inode, InodeCache};
use crate::layout::{DIRENTS_PER_SECTOR, DIRENT_SIZE, MAX_NAME, SECTOR_SIZE};

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct RawDirent {
    name: [u8; MAX_NAME],
    inode: u32,
}

const _: () = assert!(core::mem::size_of::<RawDirent>() == DIRENT_SIZE);

/// A decoded directory entry.
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub inode: u32,
}

impl RawDirent {
    fn encode(name: &str, inode: u32) -> Self {
        let mut buf = [0u8; MAX_NAME];
        let bytes = name.as_bytes();
        buf[..bytes.len()].copy_from_slice(bytes);
        Self { name: buf, inode }
    }

    fn name_str(&self) -> &str {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(MAX_NAME);
        core::str::from_utf8(&self.name[..end]).unwrap_or("")
    }
}

fn read_dirent(dev: &SectorDevice, sector: usize, offset: usize) -> RawDirent {
    let mut buf = [0u8; SECTOR_SIZE];
    dev.read_sector(sector, &mut buf);
    *bytemuck::from_bytes(&buf[offset..offset + DIRENT_SIZE])
}

fn write_dirent(dev: &mut SectorDevice, sector: usize, offset: usize, dirent: &RawDirent) {
    let mut buf = [0u8; SECTOR_SIZE];
    dev.read_sector(sector, &mut buf);
    buf[offset..offset + DIRENT_SIZE].copy_from_slice(bytemuck::bytes_of(dirent));
    dev.write_sector(sector, &buf);
}

fn entry_location(data: &[u32], index: usize) -> (usize, usize) {
    let group = index / DIRENTS_PER_SECTOR;
    let offset = (index % DIRENTS_PER_SECTOR) * DIRENT_SIZE;
    (data[group] as usize, offset)
}

/// Scans a directory for a child name. Returns `(dirent_index, child_inode)`.
pub fn scan(
    dev: &SectorDevice,
    cache: &mut InodeCache,
    parent: u32,
    name: &str,
) -> Option<(usize, u32)> {
    let parent_inode = read_inode(dev, cache, parent);
    let size = parent_inode.size() as usize;
    let data = *parent_inode.data();

    for index in 0..size {
        let (sector, offset) = entry_location(&data, index);
        let dirent = read_dirent(dev, sector, offset);
        if dirent.name_str() == name {
            return Some((index, dirent.inode));
        }
    }
    None
}

/// Lists every live entry of a directory, in storage order.
pub fn list(dev: &SectorDevice, cache: &mut InodeCache, parent: u32) -> Vec<DirEntry> {
    let parent_inode = read_inode(dev, cache, parent);
    let size = parent_inode.size() as usize;
    let data = *parent_inode.data();

    let mut out = Vec::with_capacity(size);
    for index in 0..size {
        let (sector, offset) = entry_location(&data, index);
        let dirent = read_dirent(dev, sector, offset);
        out.push(DirEntry {
            name: dirent.name_str().to_string(),
            inode: dirent.inode,
        });
    }
    out
}

/// Copies every live dirent of `parent` into `out` in on-disk wire format (20 bytes
/// each: 16-byte name, 4-byte inode), returning the entry count. Fails if `out` is
/// smaller than `size * DIRENT_SIZE`.
pub fn read_into(
    dev: &SectorDevice,
    cache: &mut InodeCache,
    parent: u32,
    out: &mut [u8],
) -> FsResult<usize> {
    let parent_inode = read_inode(dev, cache, parent);
    let size = parent_inode.size() as usize;
    let data = *parent_inode.data();

    let required = size * DIRENT_SIZE;
    if out.len() < required {
        return Err(set_errno(FsError::BufferTooSmall));
    }

    for index in 0..size {
        let (sector, offset) = entry_location(&data, index);
        let dirent = read_dirent(dev, sector, offset);
        out[index * DIRENT_SIZE..(index + 1) * DIRENT_SIZE].copy_from_slice(bytemuck::bytes_of(&dirent));
    }
    Ok(size)
}

/// Appends `(name, child)` to directory `parent`, allocating a new data block from
/// `data_bitmap` if the current last block is full.
pub fn append(
    dev: &mut SectorDevice,
    data_bitmap: &BitmapRegion,
    cache: &mut InodeCache,
    parent: u32,
    name: &str,
    child: u32,
) -> FsResult<()> {
    let mut parent_inode = read_inode(dev, cache, parent);
    let size = parent_inode.size() as usize;
    let group = size / DIRENTS_PER_SECTOR;

    if group * DIRENTS_PER_SECTOR == size {
        let bit = data_bitmap
            .first_unused(dev)
            .ok_or_else(|| set_errno(FsError::NoSpace))?;
        parent_inode.data_mut()[group] = bit as u32;
        dev.write_sector(bit, &[0u8; SECTOR_SIZE]);
    }

    let data = *parent_inode.data();
    let (sector, offset) = entry_location(&data, size);
    let dirent = RawDirent::encode(name, child);
    write_dirent(dev, sector, offset, &dirent);

    parent_inode.set_size((size + 1) as u32);
    write_inode(dev, cache, parent, &parent_inode);
    log::debug!("dir_append: parent={parent} name={name} child={child}");
    Ok(())
}

/// Removes the dirent whose child inode is `child`, compacting the array so it stays
/// hole-free. Releases any data block left fully empty by the compaction.
pub fn remove(
    dev: &mut SectorDevice,
    data_bitmap: &BitmapRegion,
    cache: &mut InodeCache,
    parent: u32,
    child: u32,
) {
    let mut parent_inode = read_inode(dev, cache, parent);
    let size = parent_inode.size() as usize;
    let data = *parent_inode.data();

    let Some(removed_index) = (0..size).find(|&i| {
        let (sector, offset) = entry_location(&data, i);
        read_dirent(dev, sector, offset).inode == child
    }) else {
        return;
    };

    for index in removed_index..size - 1 {
        let (src_sector, src_offset) = entry_location(&data, index + 1);
        let moved = read_dirent(dev, src_sector, src_offset);
        let (dst_sector, dst_offset) = entry_location(&data, index);
        write_dirent(dev, dst_sector, dst_offset, &moved);
    }

    let new_size = size - 1;
    parent_inode.set_size(new_size as u32);

    let old_groups = size.div_ceil(DIRENTS_PER_SECTOR);
    let new_groups = new_size.div_ceil(DIRENTS_PER_SECTOR);
    for group in new_groups..old_groups {
        let sector = parent_inode.data()[group];
        if sector != 0 {
            data_bitmap.reset(dev, sector as usize);
            parent_inode.data_mut()[group] = 0;
        }
    }

    write_inode(dev, cache, parent, &parent_inode);
    log::debug!("dir_remove: parent={parent} child={child}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inode::{write_inode, DiskInode, InodeType};
    use crate::layout::{DATABLOCK_START_SECTOR, DATA_BITMAP_SECTORS, DATA_BITMAP_START_SECTOR, TOTAL_SECTORS};

    fn data_bitmap() -> BitmapRegion {
        BitmapRegion::new(DATA_BITMAP_START_SECTOR, DATA_BITMAP_SECTORS, TOTAL_SECTORS)
    }

    fn setup() -> (SectorDevice, InodeCache, BitmapRegion) {
        let mut dev = SectorDevice::new();
        let bitmap = data_bitmap();
        bitmap.init(&mut dev, DATABLOCK_START_SECTOR);
        let mut cache = InodeCache::new();
        write_inode(&mut dev, &mut cache, 0, &DiskInode::new(InodeType::Directory));
        (dev, InodeCache::new(), bitmap)
    }

    #[test]
    fn append_then_scan_finds_entry() {
        let (mut dev, mut cache, bitmap) = setup();
        append(&mut dev, &bitmap, &mut cache, 0, "a", 5).unwrap();
        append(&mut dev, &bitmap, &mut cache, 0, "b", 6).unwrap();

        assert_eq!(scan(&dev, &mut cache, 0, "a"), Some((0, 5)));
        assert_eq!(scan(&dev, &mut cache, 0, "b"), Some((1, 6)));
        assert_eq!(scan(&dev, &mut cache, 0, "c"), None);
    }

    #[test]
    fn remove_compacts_entries() {
        let (mut dev, mut cache, bitmap) = setup();
        append(&mut dev, &bitmap, &mut cache, 0, "a", 5).unwrap();
        append(&mut dev, &bitmap, &mut cache, 0, "b", 6).unwrap();
        append(&mut dev, &bitmap, &mut cache, 0, "c", 7).unwrap();

        remove(&mut dev, &bitmap, &mut cache, 0, 6);

        let entries = list(&dev, &mut cache, 0);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "a");
        assert_eq!(entries[1].name, "c");
    }

    #[test]
    fn append_across_many_entries_uses_second_sector() {
        let (mut dev, mut cache, bitmap) = setup();
        for i in 0..(DIRENTS_PER_SECTOR + 5) {
            append(&mut dev, &bitmap, &mut cache, 0, &format!("f{i}"), i as u32 + 1).unwrap();
        }
        let entries = list(&dev, &mut cache, 0);
        assert_eq!(entries.len(), DIRENTS_PER_SECTOR + 5);
    }
}
