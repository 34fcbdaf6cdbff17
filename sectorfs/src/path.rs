//! Path resolver (C6): parses an absolute path, walks it from the root one component at
//! a time, and classifies the outcome as found / last-missing / error.

use crate::device::SectorDevice;
use crate::dir::scan;
use crate::error::{set_errno, FsError, FsResult};
use crate::inode::{read_inode, InodeCache, InodeType};
use crate::layout::{MAX_NAME, ROOT_INODE};

/// The result of walking an absolute path.
pub struct Resolved {
    /// Inode of the parent of the last component (root-is-its-own-parent for `/`).
    pub parent: u32,
    /// Inode of the last component, if it exists.
    pub child: Option<u32>,
    /// The last path component's name (empty for `/` itself).
    pub name: String,
}

fn is_valid_component(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_NAME - 1 {
        return false;
    }
    name.bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-' || b == b'_')
}

/// Splits `path` into its non-empty components, treating runs of consecutive `/` as
/// one separator.
fn components(path: &str) -> Vec<&str> {
    path.split('/').filter(|c| !c.is_empty()).collect()
}

/// Resolves `path`, which must begin with `/`.
pub fn resolve(dev: &SectorDevice, cache: &mut InodeCache, path: &str) -> FsResult<Resolved> {
    if !path.starts_with('/') {
        return Err(set_errno(FsError::General));
    }

    let parts = components(path);
    if parts.is_empty() {
        return Ok(Resolved {
            parent: ROOT_INODE,
            child: Some(ROOT_INODE),
            name: String::new(),
        });
    }

    for part in &parts {
        if !is_valid_component(part) {
            return Err(set_errno(FsError::General));
        }
    }

    let mut current = ROOT_INODE;
    for part in &parts[..parts.len() - 1] {
        let inode = read_inode(dev, cache, current);
        if inode.kind() != Some(InodeType::Directory) {
            return Err(set_errno(FsError::General));
        }
        match scan(dev, cache, current, part) {
            Some((_, child)) => current = child,
            None => return Err(set_errno(FsError::General)),
        }
    }

    let last = parts[parts.len() - 1];
    let parent_inode = read_inode(dev, cache, current);
    if parent_inode.kind() != Some(InodeType::Directory) {
        return Err(set_errno(FsError::General));
    }

    let child = scan(dev, cache, current, last).map(|(_, inode)| inode);
    Ok(Resolved {
        parent: current,
        child,
        name: last.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::BitmapRegion;
    use crate::dir::append;
    use crate::inode::{write_inode, DiskInode};
    use crate::layout::{DATABLOCK_START_SECTOR, DATA_BITMAP_SECTORS, DATA_BITMAP_START_SECTOR, TOTAL_SECTORS};

    fn setup() -> (SectorDevice, InodeCache) {
        let mut dev = SectorDevice::new();
        let bitmap = BitmapRegion::new(DATA_BITMAP_START_SECTOR, DATA_BITMAP_SECTORS, TOTAL_SECTORS);
        bitmap.init(&mut dev, DATABLOCK_START_SECTOR);
        let mut cache = InodeCache::new();
        write_inode(&mut dev, &mut cache, 0, &DiskInode::new(InodeType::Directory));
        write_inode(&mut dev, &mut cache, 1, &DiskInode::new(InodeType::Directory));
        append(&mut dev, &bitmap, &mut cache, 0, "sub", 1).unwrap();
        write_inode(&mut dev, &mut cache, 2, &DiskInode::new(InodeType::File));
        append(&mut dev, &bitmap, &mut cache, 1, "found", 2).unwrap();
        (dev, InodeCache::new())
    }

    #[test]
    fn root_alone_resolves_to_itself() {
        let (dev, mut cache) = setup();
        let r = resolve(&dev, &mut cache, "/").unwrap();
        assert_eq!(r.parent, 0);
        assert_eq!(r.child, Some(0));
    }

    #[test]
    fn resolves_existing_nested_file() {
        let (dev, mut cache) = setup();
        let r = resolve(&dev, &mut cache, "/sub/found").unwrap();
        assert_eq!(r.parent, 1);
        assert_eq!(r.child, Some(2));
        assert_eq!(r.name, "found");
    }

    #[test]
    fn missing_last_component_has_no_child() {
        let (dev, mut cache) = setup();
        let r = resolve(&dev, &mut cache, "/sub/new").unwrap();
        assert_eq!(r.parent, 1);
        assert_eq!(r.child, None);
        assert_eq!(r.name, "new");
    }

    #[test]
    fn missing_intermediate_component_is_an_error() {
        let (dev, mut cache) = setup();
        assert!(resolve(&dev, &mut cache, "/nope/new").is_err());
    }

    #[test]
    fn walking_through_a_file_is_an_error() {
        let (dev, mut cache) = setup();
        assert!(resolve(&dev, &mut cache, "/sub/found/more").is_err());
    }
}
