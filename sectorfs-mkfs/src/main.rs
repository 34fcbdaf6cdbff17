//! Formats a fresh sectorfs backing file.
//!
//! Disk layout:
//! [ superblock | inode bitmap | data-block bitmap | inode table | data blocks ]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sectorfs::Fs;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Path to the backing file to format.
    #[arg(short, long)]
    disk: PathBuf,

    /// Overwrite an existing file, even if it already looks like a valid image.
    #[arg(short, long)]
    force: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    if cli.disk.exists() && cli.force {
        if let Err(e) = std::fs::remove_file(&cli.disk) {
            eprintln!("error: could not remove existing '{}': {e}", cli.disk.display());
            return ExitCode::FAILURE;
        }
    }

    match Fs::boot(&cli.disk) {
        Ok(_) => {
            println!("formatted {}", cli.disk.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: could not format '{}': {e}", cli.disk.display());
            ExitCode::FAILURE
        }
    }
}
