/// 每个扇区（Sector）的大小：256 字节
/// 设备只接受以“扇区”为单位的读写。
pub const SECTOR_SIZE: usize = 256;

/// 新建磁盘镜像时默认包含的扇区数：2MB / 256B = 8192 个扇区
pub const DEFAULT_SECTOR_COUNT: u32 = 2 * 1024 * 1024 / SECTOR_SIZE as u32;

/// 定义一个扇区类型（每个扇区 256 字节的字节数组）
/// 所有设备读写都以 Sector 为单位进行。
pub type Sector = [u8; SECTOR_SIZE];

/// 磁盘镜像总大小（单位：字节）
pub fn disk_size(sectors: u32) -> u64 {
    sectors as u64 * SECTOR_SIZE as u64
}
