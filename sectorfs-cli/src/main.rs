//! `fsctl`: a multi-command front end over a sectorfs backing file.
//!
//! Every invocation boots the backing file (formatting it fresh if it doesn't exist
//! yet), runs exactly one command, and syncs the image back to disk before exiting.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sectorfs::{Fs, FsError};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Path to the backing file.
    #[arg(short, long, default_value = "default-disk")]
    disk: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a directory.
    Mkdir { path: String },
    /// Remove an empty directory.
    Rmdir { path: String },
    /// List a directory's entries.
    Ls { path: String },
    /// Create an empty file.
    Touch { path: String },
    /// Remove a file.
    Rm { path: String },
    /// Print a file's contents to stdout.
    Cat { path: String },
    /// Write literal text to a file, creating it if necessary.
    Write { path: String, text: String },
    /// Copy a host file's bytes into a sectorfs file.
    Import {
        path: String,
        /// Host file to read.
        from: PathBuf,
        /// Byte offset to re-copy a second pass from, mirroring the historical import tool.
        #[arg(long)]
        offset: Option<u32>,
        /// Byte count for the second pass; defaults to 1024 when `--offset` is given.
        #[arg(long)]
        size: Option<usize>,
    },
    /// Print an inode's kind and size.
    Stat { path: String },
}

const CHUNK: usize = 1024;

fn run(cli: &Cli) -> sectorfs::FsResult<()> {
    let mut fs = Fs::boot(&cli.disk)?;

    match &cli.command {
        Command::Mkdir { path } => fs.dir_create(path)?,
        Command::Rmdir { path } => fs.dir_unlink(path)?,
        Command::Touch { path } => fs.file_create(path)?,
        Command::Rm { path } => fs.file_unlink(path)?,

        Command::Ls { path } => {
            let size = fs.dir_size(path)?;
            let mut buf = vec![0u8; size];
            let count = fs.dir_read(path, &mut buf)?;
            for i in 0..count {
                let entry = &buf[i * 20..(i + 1) * 20];
                let end = entry[..16].iter().position(|&b| b == 0).unwrap_or(16);
                let name = String::from_utf8_lossy(&entry[..end]);
                let inode = u32::from_ne_bytes(entry[16..20].try_into().unwrap());
                println!("{name}\t{inode}");
            }
        }

        Command::Cat { path } => {
            let fd = fs.file_open(path)?;
            let mut buf = [0u8; CHUNK];
            let stdout = io::stdout();
            let mut out = stdout.lock();
            loop {
                let n = fs.file_read(fd, &mut buf)?;
                if n == 0 {
                    break;
                }
                out.write_all(&buf[..n]).map_err(|_| FsError::General)?;
            }
            fs.file_close(fd)?;
        }

        Command::Write { path, text } => {
            if fs.file_create(path).is_err() {
                // already exists; fall through and append from offset 0
            }
            let fd = fs.file_open(path)?;
            fs.file_write(fd, text.as_bytes())?;
            fs.file_close(fd)?;
        }

        Command::Import { path, from, offset, size } => {
            let mut host = File::open(from).map_err(|_| FsError::General)?;
            let mut contents = Vec::new();
            host.read_to_end(&mut contents).map_err(|_| FsError::General)?;

            if fs.file_create(path).is_err() {
                // already exists
            }
            let fd = fs.file_open(path)?;
            for chunk in contents.chunks(CHUNK) {
                fs.file_write(fd, chunk)?;
            }

            if let Some(offset) = offset {
                let frsz = size.unwrap_or(CHUNK).min(contents.len());
                fs.file_seek(fd, *offset)?;
                fs.file_write(fd, &contents[..frsz])?;
            }

            fs.file_close(fd)?;
        }

        Command::Stat { path } => {
            if let Ok(size) = fs.dir_size(path) {
                println!("{path}: directory, {size} bytes of dirents");
            } else {
                let fd = fs.file_open(path)?;
                let mut total = 0u32;
                let mut buf = [0u8; CHUNK];
                loop {
                    let n = fs.file_read(fd, &mut buf)?;
                    if n == 0 {
                        break;
                    }
                    total += n as u32;
                }
                fs.file_close(fd)?;
                println!("{path}: file, {total} bytes");
            }
        }
    }

    fs.sync()
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("fsctl: {e}");
            ExitCode::FAILURE
        }
    }
}
