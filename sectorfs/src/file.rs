//! Open-file table (C8) and the read/write/seek engine (C9).
//!
//! The engine maps a byte offset within a file to a (block index, in-block offset)
//! pair and walks sectors directly — all inode data pointers are direct, so there is no
//! indirection level to chase.

use crate::bitmap::BitmapRegion;
use crate::device::SectorDevice;
use crate::error::{set_errno, FsError, FsResult};
use crate::inode::{read_inode, write_inode, InodeCache};
use crate::layout::{MAX_OPEN_FILES, MAX_SECTORS_PER_FILE, SECTOR_SIZE};

/// One entry of the open-file table. `inode == 0` marks a free slot — inode 0 is the
/// root directory and can never be opened as a file, so it doubles as the sentinel.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenFile {
    pub inode: u32,
    pub size: u32,
    pub pos: u32,
}

/// Per-process table of open descriptors.
pub struct OpenFileTable {
    entries: [OpenFile; MAX_OPEN_FILES],
}

impl OpenFileTable {
    pub fn new() -> Self {
        Self {
            entries: [OpenFile::default(); MAX_OPEN_FILES],
        }
    }

    pub fn open(&mut self, inode: u32, size: u32) -> FsResult<usize> {
        let slot = self
            .entries
            .iter()
            .position(|e| e.inode == 0)
            .ok_or_else(|| set_errno(FsError::TooManyOpenFiles))?;
        self.entries[slot] = OpenFile { inode, size, pos: 0 };
        log::debug!("file_open: fd={slot} inode={inode} size={size}");
        Ok(slot)
    }

    pub fn close(&mut self, fd: usize) -> FsResult<()> {
        let entry = self
            .entries
            .get_mut(fd)
            .filter(|e| e.inode != 0)
            .ok_or_else(|| set_errno(FsError::BadFd))?;
        entry.inode = 0;
        Ok(())
    }

    pub fn is_open(&self, inode: u32) -> bool {
        self.entries.iter().any(|e| e.inode == inode)
    }

    fn get(&self, fd: usize) -> FsResult<&OpenFile> {
        self.entries
            .get(fd)
            .filter(|e| e.inode != 0)
            .ok_or_else(|| set_errno(FsError::BadFd))
    }

    fn get_mut(&mut self, fd: usize) -> FsResult<&mut OpenFile> {
        self.entries
            .get_mut(fd)
            .filter(|e| e.inode != 0)
            .ok_or_else(|| set_errno(FsError::BadFd))
    }
}

impl Default for OpenFileTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits a byte range into (block index, in-block start offset, length) triples.
fn block_span(offset: u32, len: u32) -> impl Iterator<Item = (usize, usize, usize)> {
    let mut remaining = len;
    let mut pos = offset;
    std::iter::from_fn(move || {
        if remaining == 0 {
            return None;
        }
        let block = (pos / SECTOR_SIZE as u32) as usize;
        let in_block = (pos % SECTOR_SIZE as u32) as usize;
        let chunk = remaining.min(SECTOR_SIZE as u32 - in_block as u32);
        pos += chunk;
        remaining -= chunk;
        Some((block, in_block, chunk as usize))
    })
}

pub fn read(
    dev: &SectorDevice,
    cache: &mut InodeCache,
    table: &mut OpenFileTable,
    fd: usize,
    buf: &mut [u8],
) -> FsResult<usize> {
    let entry = *table.get(fd)?;
    let want = buf.len() as u32;
    let available = entry.size.saturating_sub(entry.pos);
    let n = want.min(available);

    let inode = read_inode(dev, cache, entry.inode);
    let data = *inode.data();

    let mut written = 0usize;
    for (block, in_block, len) in block_span(entry.pos, n) {
        let mut sector = [0u8; SECTOR_SIZE];
        dev.read_sector(data[block] as usize, &mut sector);
        buf[written..written + len].copy_from_slice(&sector[in_block..in_block + len]);
        written += len;
    }

    table.get_mut(fd)?.pos += n;
    log::trace!("file_read: fd={fd} requested={want} got={n}");
    Ok(n as usize)
}

pub fn write(
    dev: &mut SectorDevice,
    data_bitmap: &BitmapRegion,
    cache: &mut InodeCache,
    table: &mut OpenFileTable,
    fd: usize,
    buf: &[u8],
) -> FsResult<usize> {
    let entry = *table.get(fd)?;
    let n = buf.len() as u32;
    let write_end = entry.pos + n;

    if write_end as usize > MAX_SECTORS_PER_FILE * SECTOR_SIZE {
        return Err(set_errno(FsError::FileTooBig));
    }

    let mut inode = read_inode(dev, cache, entry.inode);
    let size = inode.size();

    let existing_blocks = if size == 0 {
        0
    } else {
        (size as usize - 1) / SECTOR_SIZE + 1
    };
    let needed_last_block = if n == 0 {
        existing_blocks
    } else {
        (write_end as usize - 1) / SECTOR_SIZE + 1
    };

    if needed_last_block > existing_blocks {
        let new_count = needed_last_block - existing_blocks;
        let chosen = data_bitmap
            .allocate_n(dev, new_count)
            .ok_or_else(|| set_errno(FsError::NoSpace))?;
        data_bitmap.set_bits(dev, &chosen);
        for (i, sector) in chosen.into_iter().enumerate() {
            inode.data_mut()[existing_blocks + i] = sector as u32;
        }
    }

    let data = *inode.data();
    let mut consumed = 0usize;
    for (block, in_block, len) in block_span(entry.pos, n) {
        let sector_index = data[block] as usize;
        let mut sector = [0u8; SECTOR_SIZE];
        dev.read_sector(sector_index, &mut sector);
        sector[in_block..in_block + len].copy_from_slice(&buf[consumed..consumed + len]);
        dev.write_sector(sector_index, &sector);
        consumed += len;
    }

    if write_end > size {
        inode.set_size(write_end);
    }
    write_inode(dev, cache, entry.inode, &inode);

    let entry = table.get_mut(fd)?;
    entry.pos += n;
    if write_end > entry.size {
        entry.size = write_end;
    }
    log::debug!("file_write: fd={fd} n={n} new_size={}", entry.size);
    Ok(n as usize)
}

pub fn seek(table: &mut OpenFileTable, fd: usize, offset: u32) -> FsResult<u32> {
    let entry = table.get_mut(fd)?;
    if offset > entry.size {
        return Err(set_errno(FsError::SeekOutOfBounds));
    }
    entry.pos = offset;
    Ok(offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_span_splits_across_sector_boundary() {
        let spans: Vec<_> = block_span(500, 40).collect();
        assert_eq!(spans, vec![(0, 500, 12), (1, 0, 28)]);
    }

    #[test]
    fn open_file_table_free_slot_reuse() {
        let mut table = OpenFileTable::new();
        let fd = table.open(5, 0).unwrap();
        assert!(table.is_open(5));
        table.close(fd).unwrap();
        assert!(!table.is_open(5));
        assert!(table.close(fd).is_err());
    }

    #[test]
    fn too_many_open_files() {
        let mut table = OpenFileTable::new();
        for i in 1..=MAX_OPEN_FILES as u32 {
            table.open(i, 0).unwrap();
        }
        assert!(table.open(999, 0).is_err());
    }
}
