use crate::disk::SECTOR_SIZE;

/// 超级块所在的扇区
pub const SUPER_BLOCK_SECTOR: u32 = 0;

// 每个 Inode 32 字节，一个 256B 扇区可以存 8 个 Inode
pub const INODE_SIZE: usize = 32;
pub const INODES_PER_SECTOR: u32 = (SECTOR_SIZE / INODE_SIZE) as u32;

// 同时打开的文件数上限
pub const MAX_NUM_OF_OPEN_FILES: usize = 10;

/// 超级块签名与版本（2019/2 学期 → 0x7E32）
pub const T2FS_ID: [u8; 4] = *b"T2FS";
pub const T2FS_VERSION: u16 = 0x7E32;

/// 格式化时的默认参数
pub const DEFAULT_BLOCK_SIZE: u16 = 4; // 每块 4 个扇区
pub const DEFAULT_INODE_AREA_BLOCKS: u16 = 32;

/// 一个 Inode 记录的原始字节
pub type InodeRecord = [u8; INODE_SIZE];
