//! The raw sector device (C1): a fixed-count array of equal-sized sectors, held entirely
//! in memory and loaded from / saved to a single host file as one unit.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

use crate::layout::{SECTOR_SIZE, TOTAL_SECTORS};

/// In-memory image of the backing device, `TOTAL_SECTORS * SECTOR_SIZE` bytes.
pub struct SectorDevice {
    image: Vec<u8>,
}

impl SectorDevice {
    /// A fresh, zeroed device image.
    pub fn new() -> Self {
        Self {
            image: vec![0u8; TOTAL_SECTORS * SECTOR_SIZE],
        }
    }

    /// Reads sector `index` into `buf`. `buf` must be exactly `SECTOR_SIZE` bytes.
    pub fn read_sector(&self, index: usize, buf: &mut [u8]) {
        debug_assert_eq!(buf.len(), SECTOR_SIZE);
        let start = index * SECTOR_SIZE;
        buf.copy_from_slice(&self.image[start..start + SECTOR_SIZE]);
    }

    /// Writes `buf` into sector `index`. `buf` must be exactly `SECTOR_SIZE` bytes.
    pub fn write_sector(&mut self, index: usize, buf: &[u8]) {
        debug_assert_eq!(buf.len(), SECTOR_SIZE);
        let start = index * SECTOR_SIZE;
        self.image[start..start + SECTOR_SIZE].copy_from_slice(buf);
    }

    /// Loads the whole device image from `path`. The file must be exactly
    /// `SECTOR_SIZE * TOTAL_SECTORS` bytes.
    pub fn load(&mut self, path: &Path) -> io::Result<()> {
        let mut file = File::open(path)?;
        let mut buf = Vec::with_capacity(self.image.len());
        file.read_to_end(&mut buf)?;
        if buf.len() != self.image.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "backing file is {} bytes, expected {}",
                    buf.len(),
                    self.image.len()
                ),
            ));
        }
        self.image = buf;
        Ok(())
    }

    /// Saves the whole device image to `path`, creating or truncating it.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.write_all(&self.image)?;
        file.sync_all()
    }
}

impl Default for SectorDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_sector() {
        let mut dev = SectorDevice::new();
        let mut buf = [0xABu8; SECTOR_SIZE];
        dev.write_sector(3, &buf);
        buf.fill(0);
        dev.read_sector(3, &mut buf);
        assert!(buf.iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn save_then_load_preserves_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disk.img");

        let mut dev = SectorDevice::new();
        dev.write_sector(0, &[0x42u8; SECTOR_SIZE]);
        dev.save(&path).unwrap();

        let mut loaded = SectorDevice::new();
        loaded.load(&path).unwrap();
        let mut buf = [0u8; SECTOR_SIZE];
        loaded.read_sector(0, &mut buf);
        assert!(buf.iter().all(|&b| b == 0x42));
    }
}
