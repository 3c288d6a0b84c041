use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    disk::{Sector, SECTOR_SIZE},
    fs::{
        config::{T2FS_ID, T2FS_VERSION},
        error::{FileSystemError, Result},
    },
};

/// 超级块在磁盘上占用的字节数（不含扇区剩余的填充）
pub const SUPER_BLOCK_BYTES: usize = 24;

/// 磁盘第 0 扇区的超级块，小端序
///
/// 除 `block_size`（以扇区计）外，各区域大小都以“块”为单位。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperBlock {
    pub id: [u8; 4],                  // 文件系统标识 "T2FS"
    pub version: u16,                 // 版本号
    pub superblock_size: u16,         // 超级块占用的块数
    pub free_blocks_bitmap_size: u16, // 数据块位图占用的块数
    pub free_inode_bitmap_size: u16,  // inode 位图占用的块数
    pub inode_area_size: u16,         // inode 区占用的块数
    pub block_size: u16,              // 每块包含的扇区数
    pub disk_size: u32,               // 分区总块数
    pub checksum: u32,                // 前 20 字节的校验和
}

impl SuperBlock {
    pub fn new(
        block_size: u16,
        free_blocks_bitmap_size: u16,
        free_inode_bitmap_size: u16,
        inode_area_size: u16,
        disk_size: u32,
    ) -> Self {
        let mut sb = Self {
            id: T2FS_ID,
            version: T2FS_VERSION,
            superblock_size: 1,
            free_blocks_bitmap_size,
            free_inode_bitmap_size,
            inode_area_size,
            block_size,
            disk_size,
            checksum: 0,
        };
        sb.checksum = sb.compute_checksum();
        sb
    }

    /// 从第 0 扇区解析超级块
    pub fn decode(sector: &Sector) -> Result<Self> {
        let sb: SuperBlock = bincode::deserialize(&sector[..SUPER_BLOCK_BYTES])
            .map_err(|e| FileSystemError::Corrupted(format!("unreadable superblock: {}", e)))?;

        if sb.id != T2FS_ID {
            return Err(FileSystemError::Corrupted(format!(
                "bad signature {:?}",
                String::from_utf8_lossy(&sb.id)
            )));
        }
        if sb.block_size == 0 {
            return Err(FileSystemError::Corrupted("block size is zero".to_string()));
        }
        if !sb.checksum_valid() {
            warn!(
                "[SuperBlock] checksum mismatch: stored {:#010x}, computed {:#010x}",
                sb.checksum,
                sb.compute_checksum()
            );
        }
        Ok(sb)
    }

    /// 编码为一个完整扇区，剩余部分以 0 填充
    pub fn encode(&self) -> Result<Sector> {
        let bytes = bincode::serialize(self)
            .map_err(|e| FileSystemError::Corrupted(format!("cannot encode superblock: {}", e)))?;
        let mut sector = [0u8; SECTOR_SIZE];
        sector[..bytes.len()].copy_from_slice(&bytes);
        Ok(sector)
    }

    /// 前 20 字节按 5 个小端 DWORD 相加后取反
    pub fn compute_checksum(&self) -> u32 {
        let mut head = [0u8; 20];
        head[0..4].copy_from_slice(&self.id);
        head[4..6].copy_from_slice(&self.version.to_le_bytes());
        head[6..8].copy_from_slice(&self.superblock_size.to_le_bytes());
        head[8..10].copy_from_slice(&self.free_blocks_bitmap_size.to_le_bytes());
        head[10..12].copy_from_slice(&self.free_inode_bitmap_size.to_le_bytes());
        head[12..14].copy_from_slice(&self.inode_area_size.to_le_bytes());
        head[14..16].copy_from_slice(&self.block_size.to_le_bytes());
        head[16..20].copy_from_slice(&self.disk_size.to_le_bytes());

        let sum = head
            .chunks_exact(4)
            .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
            .fold(0u32, |acc, w| acc.wrapping_add(w));
        !sum
    }

    pub fn checksum_valid(&self) -> bool {
        self.checksum == self.compute_checksum()
    }

    /// 元数据（超级块、两个位图、inode 区）占用的总块数
    pub fn metadata_blocks(&self) -> u32 {
        self.superblock_size as u32
            + self.free_blocks_bitmap_size as u32
            + self.free_inode_bitmap_size as u32
            + self.inode_area_size as u32
    }
}
