//! Inode table manager (C4): fixed-size inode records packed into region 4, addressed
//! by inode number through a one-sector read cache.

use bytemuck::{Pod, Zeroable};

use crate::device::SectorDevice;
use crate::layout::{INODES_PER_SECTOR, INODE_TABLE_START_SECTOR, MAX_SECTORS_PER_FILE, SECTOR_SIZE};

/// File vs. directory discriminator, stored as a raw `u32` on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeType {
    File,
    Directory,
}

impl InodeType {
    const FILE_TAG: u32 = 0;
    const DIR_TAG: u32 = 1;

    fn to_raw(self) -> u32 {
        match self {
            InodeType::File => Self::FILE_TAG,
            InodeType::Directory => Self::DIR_TAG,
        }
    }

    /// `None` for any tag other than the two live types — callers treat that as a
    /// corrupt / non-live inode.
    fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            Self::FILE_TAG => Some(InodeType::File),
            Self::DIR_TAG => Some(InodeType::Directory),
            _ => None,
        }
    }
}

/// On-disk inode record. Declaration order is the on-disk field order.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct DiskInode {
    size: u32,
    type_raw: u32,
    data: [u32; MAX_SECTORS_PER_FILE],
}

impl DiskInode {
    pub fn new(kind: InodeType) -> Self {
        Self {
            size: 0,
            type_raw: kind.to_raw(),
            data: [0u32; MAX_SECTORS_PER_FILE],
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn set_size(&mut self, size: u32) {
        self.size = size;
    }

    /// `None` means the record does not carry a recognized type — only meaningful to
    /// inspect when the inode's bitmap bit is set (live).
    pub fn kind(&self) -> Option<InodeType> {
        InodeType::from_raw(self.type_raw)
    }

    pub fn data(&self) -> &[u32; MAX_SECTORS_PER_FILE] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u32; MAX_SECTORS_PER_FILE] {
        &mut self.data
    }
}

/// Maps inode number `n` to its containing sector and intra-sector byte offset.
fn locate(n: u32) -> (usize, usize) {
    let n = n as usize;
    let sector = INODE_TABLE_START_SECTOR + n / INODES_PER_SECTOR;
    let offset = (n % INODES_PER_SECTOR) * core::mem::size_of::<DiskInode>();
    (sector, offset)
}

/// A one-sector read cache threaded through a single call (e.g. a path walk), so
/// repeatedly touching inodes in the same sector doesn't re-read it from the device.
pub struct InodeCache {
    cached_sector: Option<usize>,
    buf: [u8; SECTOR_SIZE],
}

impl Default for InodeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl InodeCache {
    pub fn new() -> Self {
        Self {
            cached_sector: None,
            buf: [0u8; SECTOR_SIZE],
        }
    }

    fn ensure(&mut self, dev: &SectorDevice, sector: usize) {
        if self.cached_sector != Some(sector) {
            dev.read_sector(sector, &mut self.buf);
            self.cached_sector = Some(sector);
        }
    }
}

/// Reads inode `n` from the table, using and refreshing `cache` as needed.
pub fn read_inode(dev: &SectorDevice, cache: &mut InodeCache, n: u32) -> DiskInode {
    let (sector, offset) = locate(n);
    cache.ensure(dev, sector);
    *bytemuck::from_bytes(&cache.buf[offset..offset + core::mem::size_of::<DiskInode>()])
}

/// Writes `inode` back into the table at number `n`, persisting the sector immediately
/// and updating `cache` in place.
pub fn write_inode(dev: &mut SectorDevice, cache: &mut InodeCache, n: u32, inode: &DiskInode) {
    let (sector, offset) = locate(n);
    cache.ensure(dev, sector);
    cache.buf[offset..offset + core::mem::size_of::<DiskInode>()]
        .copy_from_slice(bytemuck::bytes_of(inode));
    dev.write_sector(sector, &cache.buf);
    log::trace!("write_inode: n={n} size={} type={:?}", inode.size, inode.kind());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inode_never_straddles_a_sector() {
        assert!(core::mem::size_of::<DiskInode>() <= SECTOR_SIZE);
        assert!(INODES_PER_SECTOR >= 1);
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut dev = SectorDevice::new();
        let mut cache = InodeCache::new();

        let mut inode = DiskInode::new(InodeType::Directory);
        inode.set_size(40);
        inode.data_mut()[0] = 7;
        write_inode(&mut dev, &mut cache, 3, &inode);

        let mut cache2 = InodeCache::new();
        let read_back = read_inode(&dev, &mut cache2, 3);
        assert_eq!(read_back.size(), 40);
        assert_eq!(read_back.kind(), Some(InodeType::Directory));
        assert_eq!(read_back.data()[0], 7);
    }
}
