use clap::Parser;
use std::path::PathBuf;

use crate::{
    disk::types::DEFAULT_SECTOR_COUNT,
    fs::{
        config::{DEFAULT_BLOCK_SIZE, DEFAULT_INODE_AREA_BLOCKS},
        FormatParams,
    },
};

#[derive(Parser, Debug, Clone)]
#[command(name = "t2fs", version, about = "Interactive shell over a T2FS disk image")]
pub struct Cli {
    /// Disk image path, created when missing
    #[arg(long, short, default_value = "t2fs.img")]
    pub disk: PathBuf,

    /// Size in sectors of a newly created image
    #[arg(long, default_value_t = DEFAULT_SECTOR_COUNT)]
    pub sectors: u32,

    /// Sectors per block used when formatting
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
    pub block_size: u16,

    /// Blocks reserved for the inode area when formatting
    #[arg(long, default_value_t = DEFAULT_INODE_AREA_BLOCKS)]
    pub inode_blocks: u16,

    /// Work on a throwaway in-memory disk instead of an image file
    #[arg(long, short)]
    pub memory: bool,

    /// Skip the boot screen
    #[arg(long, short)]
    pub quiet: bool,
}

impl Cli {
    pub fn format_params(&self) -> FormatParams {
        FormatParams {
            block_size: self.block_size,
            inode_area_blocks: self.inode_blocks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["t2fs"]);
        assert_eq!(cli.disk, PathBuf::from("t2fs.img"));
        assert_eq!(cli.sectors, DEFAULT_SECTOR_COUNT);
        assert_eq!(cli.format_params().block_size, DEFAULT_BLOCK_SIZE);
        assert!(!cli.quiet);
        assert!(!cli.memory);
    }

    #[test]
    fn overrides() {
        let cli = Cli::parse_from([
            "t2fs",
            "-d",
            "x.img",
            "--block-size",
            "8",
            "--inode-blocks",
            "4",
            "-q",
            "-m",
        ]);
        assert_eq!(cli.disk, PathBuf::from("x.img"));
        let params = cli.format_params();
        assert_eq!(params.block_size, 8);
        assert_eq!(params.inode_area_blocks, 4);
        assert!(cli.quiet);
        assert!(cli.memory);
    }
}
