//! 磁盘几何信息：扇区、块、inode 三种编址之间的换算
//!
//! 几何信息只从超级块推导一次，之后不可变，由调用方以引用传入每个 I/O 操作。

use log::{error, info};

use crate::{
    disk::{SectorDevice, SECTOR_SIZE},
    fs::{
        config::{INODES_PER_SECTOR, SUPER_BLOCK_SECTOR},
        error::{FileSystemError, Result},
        super_block::SuperBlock,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub sectors_per_block: u32,
    pub free_blocks_bitmap_size: u32, // 块
    pub free_inode_bitmap_size: u32,  // 块
    pub block_bitmap_start_sector: u32,
    pub inode_bitmap_start_sector: u32,
    pub inode_table_start_sector: u32,
    pub inodes_per_sector: u32,
}

/// 块号换算为扇区号，超出 u32 扇区编址时视为超级块损坏
fn block_to_sector(block: u64, sectors_per_block: u64, area: &str) -> Result<u32> {
    u32::try_from(block * sectors_per_block).map_err(|_| {
        FileSystemError::Corrupted(format!(
            "{} at block {} is beyond the addressable sectors",
            area, block
        ))
    })
}

impl Geometry {
    pub fn from_super_block(sb: &SuperBlock) -> Result<Self> {
        let sectors_per_block = sb.block_size as u32;
        let free_blocks_bitmap_size = sb.free_blocks_bitmap_size as u32;
        let free_inode_bitmap_size = sb.free_inode_bitmap_size as u32;
        let spb = sectors_per_block as u64;

        Ok(Self {
            sectors_per_block,
            free_blocks_bitmap_size,
            free_inode_bitmap_size,
            block_bitmap_start_sector: block_to_sector(
                sb.superblock_size as u64,
                spb,
                "block bitmap",
            )?,
            inode_bitmap_start_sector: block_to_sector(
                sb.superblock_size as u64 + free_blocks_bitmap_size as u64,
                spb,
                "inode bitmap",
            )?,
            // inode 表从两个位图之后的下一个块开始
            inode_table_start_sector: block_to_sector(
                free_blocks_bitmap_size as u64 + free_inode_bitmap_size as u64 + 1,
                spb,
                "inode table",
            )?,
            inodes_per_sector: INODES_PER_SECTOR,
        })
    }

    /// 读取第 0 扇区并推导几何信息
    pub fn read<D: SectorDevice + ?Sized>(device: &D) -> Result<(Self, SuperBlock)> {
        let mut buf = [0u8; SECTOR_SIZE];
        if let Err(e) = device.read_sector(SUPER_BLOCK_SECTOR, &mut buf) {
            error!("[Geometry] superblock retrieved incorrectly: {}", e);
            return Err(FileSystemError::read(SUPER_BLOCK_SECTOR, e));
        }

        let sb = SuperBlock::decode(&buf)?;
        let geometry = Self::from_super_block(&sb)?;
        info!(
            "[Geometry] loaded: {} sectors/block, inode table at sector {}",
            geometry.sectors_per_block, geometry.inode_table_start_sector
        );
        Ok((geometry, sb))
    }

    /// 一个块的字节数
    pub fn block_bytes(&self) -> usize {
        self.sectors_per_block as usize * SECTOR_SIZE
    }

    /// inode 所在的扇区
    pub fn sector_for_inode(&self, id: u32) -> u32 {
        id / self.inodes_per_sector + self.inode_table_start_sector
    }

    /// inode 在扇区内的槽位，由扇区号反推，保证扇区只有一处计算
    pub fn offset_for_inode(&self, id: u32) -> u32 {
        let sector = self.sector_for_inode(id);
        id - self.inodes_per_sector * (sector - self.inode_table_start_sector)
    }
}
