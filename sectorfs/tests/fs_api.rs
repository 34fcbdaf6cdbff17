use sectorfs::{Fs, FsError};

fn boot() -> (Fs, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("disk0");
    let fs = Fs::boot(&path).unwrap();
    (fs, dir)
}

#[test]
fn boot_twice_on_the_same_file_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("disk0");

    {
        let mut fs = Fs::boot(&path).unwrap();
        fs.dir_create("/keep").unwrap();
        fs.sync().unwrap();
    }

    let mut fs = Fs::boot(&path).unwrap();
    assert_eq!(fs.dir_size("/").unwrap(), 20);
    let mut buf = [0u8; 20];
    assert_eq!(fs.dir_read("/", &mut buf).unwrap(), 1);
}

#[test]
fn creating_a_file_under_a_missing_directory_fails() {
    let (mut fs, _dir) = boot();
    assert_eq!(fs.file_create("/missing/x"), Err(FsError::Create));
}

#[test]
fn creating_a_name_that_already_exists_fails() {
    let (mut fs, _dir) = boot();
    fs.file_create("/a").unwrap();
    assert_eq!(fs.file_create("/a"), Err(FsError::Create));
}

#[test]
fn opening_a_directory_as_a_file_fails() {
    let (mut fs, _dir) = boot();
    fs.dir_create("/d").unwrap();
    assert_eq!(fs.file_open("/d"), Err(FsError::General));
}

#[test]
fn dir_size_and_dir_read_reject_a_file_path() {
    let (mut fs, _dir) = boot();
    fs.file_create("/f").unwrap();
    assert_eq!(fs.dir_size("/f"), Err(FsError::NoSuchDir));
    let mut buf = [0u8; 0];
    assert_eq!(fs.dir_read("/f", &mut buf), Err(FsError::NoSuchDir));
}

#[test]
fn reading_past_end_of_file_yields_short_read() {
    let (mut fs, _dir) = boot();
    fs.file_create("/x").unwrap();
    let fd = fs.file_open("/x").unwrap();
    fs.file_write(fd, b"abc").unwrap();
    fs.file_seek(fd, 0).unwrap();

    let mut buf = [0u8; 16];
    assert_eq!(fs.file_read(fd, &mut buf).unwrap(), 3);
    assert_eq!(&buf[..3], b"abc");
}

#[test]
fn seek_past_end_of_file_is_rejected() {
    let (mut fs, _dir) = boot();
    fs.file_create("/x").unwrap();
    let fd = fs.file_open("/x").unwrap();
    fs.file_write(fd, b"abc").unwrap();
    assert_eq!(fs.file_seek(fd, 4), Err(FsError::SeekOutOfBounds));
    assert_eq!(fs.file_seek(fd, 3), Ok(3));
}

#[test]
fn closed_descriptor_cannot_be_reused() {
    let (mut fs, _dir) = boot();
    fs.file_create("/x").unwrap();
    let fd = fs.file_open("/x").unwrap();
    fs.file_close(fd).unwrap();
    assert_eq!(fs.file_read(fd, &mut [0u8; 1]), Err(FsError::BadFd));
}

#[test]
fn unlinking_a_file_releases_its_data_blocks_for_reuse() {
    let (mut fs, _dir) = boot();
    fs.file_create("/big").unwrap();
    let fd = fs.file_open("/big").unwrap();
    let cap = sectorfs::layout::MAX_SECTORS_PER_FILE * sectorfs::layout::SECTOR_SIZE;
    fs.file_write(fd, &vec![1u8; cap]).unwrap();
    fs.file_close(fd).unwrap();
    fs.file_unlink("/big").unwrap();

    // the freed blocks must be available again for a second file of the same size.
    fs.file_create("/big2").unwrap();
    let fd2 = fs.file_open("/big2").unwrap();
    assert!(fs.file_write(fd2, &vec![2u8; cap]).is_ok());
}

#[test]
fn directory_tree_walk_resolves_nested_paths() {
    let (mut fs, _dir) = boot();
    fs.dir_create("/a").unwrap();
    fs.dir_create("/a/b").unwrap();
    fs.file_create("/a/b/c").unwrap();

    let fd = fs.file_open("/a/b/c").unwrap();
    assert_eq!(fs.file_write(fd, b"deep").unwrap(), 4);
}
