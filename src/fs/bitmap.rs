use log::{debug, error};

use crate::{
    disk::{SectorDevice, SECTOR_SIZE},
    fs::{
        error::{FileSystemError, Result},
        geometry::Geometry,
        super_block::SuperBlock,
    },
};

/// 位图所描述的对象
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitmapKind {
    Inode,
    Block,
}

/// 位的状态：0 = 空闲，1 = 已用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitState {
    Free,
    Used,
}

/// 位图查找接口，只返回第一个处于指定状态的编号
pub trait BitmapSearch {
    fn find_free(&self, kind: BitmapKind, state: BitState) -> Option<u32>;
}

#[derive(Debug, Clone)]
pub struct Bitmap {
    pub bits: Vec<u8>,     // 位图数据，每个 bit 表示一个单元的状态
    pub total: u32,        // 单元总数
    pub start_sector: u32, // 位图在磁盘中的起始扇区
    pub sectors: u32,      // 位图占用的扇区数
}

impl Bitmap {
    pub fn new(total: u32, start_sector: u32, sectors: u32) -> Self {
        Self {
            bits: vec![0; (total as usize + 7) / 8],
            total,
            start_sector,
            sectors,
        }
    }

    /// 从磁盘读取位图，截掉多余的填充字节
    pub fn load<D: SectorDevice + ?Sized>(
        device: &D,
        total: u32,
        start_sector: u32,
        sectors: u32,
    ) -> Result<Self> {
        let mut bits = Vec::with_capacity(sectors as usize * SECTOR_SIZE);
        let mut buf = [0u8; SECTOR_SIZE];
        for i in 0..sectors {
            let sector = start_sector + i;
            device.read_sector(sector, &mut buf).map_err(|e| {
                error!("[Bitmap] sector {} not read properly: {}", sector, e);
                FileSystemError::read(sector, e)
            })?;
            bits.extend_from_slice(&buf);
        }
        bits.truncate((total as usize + 7) / 8);
        // 最后一个字节中超出 total 的填充位不属于任何单元
        if total % 8 != 0 {
            if let Some(last) = bits.last_mut() {
                *last &= (1u8 << (total % 8)) - 1;
            }
        }

        Ok(Self {
            bits,
            total,
            start_sector,
            sectors,
        })
    }

    /// 将位图写回磁盘，不足一个扇区的部分以 0 填充
    pub fn sync<D: SectorDevice + ?Sized>(&self, device: &D) -> Result<()> {
        for i in 0..self.sectors {
            let mut buf = [0u8; SECTOR_SIZE];
            let start = i as usize * SECTOR_SIZE;
            if start < self.bits.len() {
                let end = (start + SECTOR_SIZE).min(self.bits.len());
                buf[..end - start].copy_from_slice(&self.bits[start..end]);
            }
            let sector = self.start_sector + i;
            device.write_sector(sector, &buf).map_err(|e| {
                error!("[Bitmap] sector {} not written: {}", sector, e);
                FileSystemError::write(sector, e)
            })?;
        }
        debug!("[Bitmap] {} sectors synced from {}", self.sectors, self.start_sector);
        Ok(())
    }

    pub fn is_used(&self, index: u32) -> bool {
        if index >= self.total {
            return false;
        }
        self.bits[(index / 8) as usize] & (1 << (index % 8)) != 0
    }

    pub fn set(&mut self, index: u32) {
        if index < self.total {
            self.bits[(index / 8) as usize] |= 1 << (index % 8);
        }
    }

    #[cfg(test)]
    pub fn clear(&mut self, index: u32) {
        if index < self.total {
            self.bits[(index / 8) as usize] &= !(1 << (index % 8));
        }
    }

    /// 第一个处于 `state` 的位
    pub fn find(&self, state: BitState) -> Option<u32> {
        let skip = match state {
            BitState::Free => 0xFF,
            BitState::Used => 0x00,
        };
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, byte)| **byte != skip)
            .flat_map(|(byte_index, _)| (0..8).map(move |bit| (byte_index * 8 + bit) as u32))
            .take_while(|&index| index < self.total)
            .find(|&index| self.is_used(index) == (state == BitState::Used))
    }

    pub fn count(&self, state: BitState) -> u32 {
        let used = (0..self.total).filter(|&i| self.is_used(i)).count() as u32;
        match state {
            BitState::Used => used,
            BitState::Free => self.total - used,
        }
    }
}

/// 磁盘上的两张位图
#[derive(Debug, Clone)]
pub struct DiskBitmaps {
    pub blocks: Bitmap,
    pub inodes: Bitmap,
}

impl DiskBitmaps {
    /// 按超级块的布局创建全空的位图（格式化时使用）
    pub fn empty(sb: &SuperBlock, geometry: &Geometry) -> Self {
        let (block_total, inode_total) = Self::totals(sb, geometry);
        Self {
            blocks: Bitmap::new(
                block_total,
                geometry.block_bitmap_start_sector,
                geometry.free_blocks_bitmap_size * geometry.sectors_per_block,
            ),
            inodes: Bitmap::new(
                inode_total,
                geometry.inode_bitmap_start_sector,
                geometry.free_inode_bitmap_size * geometry.sectors_per_block,
            ),
        }
    }

    pub fn load<D: SectorDevice + ?Sized>(
        device: &D,
        sb: &SuperBlock,
        geometry: &Geometry,
    ) -> Result<Self> {
        let (block_total, inode_total) = Self::totals(sb, geometry);
        Ok(Self {
            blocks: Bitmap::load(
                device,
                block_total,
                geometry.block_bitmap_start_sector,
                geometry.free_blocks_bitmap_size * geometry.sectors_per_block,
            )?,
            inodes: Bitmap::load(
                device,
                inode_total,
                geometry.inode_bitmap_start_sector,
                geometry.free_inode_bitmap_size * geometry.sectors_per_block,
            )?,
        })
    }

    pub fn sync<D: SectorDevice + ?Sized>(&self, device: &D) -> Result<()> {
        self.blocks.sync(device)?;
        self.inodes.sync(device)
    }

    pub fn get(&self, kind: BitmapKind) -> &Bitmap {
        match kind {
            BitmapKind::Inode => &self.inodes,
            BitmapKind::Block => &self.blocks,
        }
    }

    pub fn get_mut(&mut self, kind: BitmapKind) -> &mut Bitmap {
        match kind {
            BitmapKind::Inode => &mut self.inodes,
            BitmapKind::Block => &mut self.blocks,
        }
    }

    // 单元总数不能超过位图区域能容纳的位数
    fn totals(sb: &SuperBlock, geometry: &Geometry) -> (u32, u32) {
        let bits_per_block = geometry.block_bytes() as u64 * 8;
        let blocks = (sb.disk_size as u64)
            .min(geometry.free_blocks_bitmap_size as u64 * bits_per_block);
        let inodes = (sb.inode_area_size as u64
            * geometry.sectors_per_block as u64
            * geometry.inodes_per_sector as u64)
            .min(geometry.free_inode_bitmap_size as u64 * bits_per_block);
        (
            u32::try_from(blocks).unwrap_or(u32::MAX),
            u32::try_from(inodes).unwrap_or(u32::MAX),
        )
    }
}

impl BitmapSearch for DiskBitmaps {
    fn find_free(&self, kind: BitmapKind, state: BitState) -> Option<u32> {
        self.get(kind).find(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::MemDisk;

    #[test]
    fn find_skips_full_bytes_and_respects_total() {
        let mut bitmap = Bitmap::new(12, 0, 1);
        for i in 0..10 {
            bitmap.set(i);
        }
        assert_eq!(bitmap.find(BitState::Free), Some(10));
        assert_eq!(bitmap.find(BitState::Used), Some(0));

        bitmap.set(10);
        bitmap.set(11);
        assert_eq!(bitmap.find(BitState::Free), None);
        assert_eq!(bitmap.count(BitState::Used), 12);
        assert_eq!(bitmap.count(BitState::Free), 0);

        bitmap.clear(3);
        assert_eq!(bitmap.find(BitState::Free), Some(3));
        assert!(!bitmap.is_used(3));
    }

    #[test]
    fn out_of_range_bits_are_ignored() {
        let mut bitmap = Bitmap::new(4, 0, 1);
        bitmap.set(5);
        assert!(!bitmap.is_used(5));
        assert_eq!(bitmap.count(BitState::Used), 0);
    }

    #[test]
    fn sync_then_load_preserves_bits() {
        let disk = MemDisk::new(8);
        let mut bitmap = Bitmap::new(3000, 2, 2);
        for i in [0, 9, 2047, 2048, 2999] {
            bitmap.set(i);
        }
        bitmap.sync(&disk).unwrap();

        let loaded = Bitmap::load(&disk, 3000, 2, 2).unwrap();
        assert_eq!(loaded.bits, bitmap.bits);
        assert_eq!(loaded.count(BitState::Used), 5);
    }

    #[test]
    fn padding_bits_on_disk_are_not_counted() {
        let disk = MemDisk::new(4);
        let mut sector = [0u8; SECTOR_SIZE];
        sector[1] = 0xFF;
        disk.write_sector(0, &sector).unwrap();

        let loaded = Bitmap::load(&disk, 12, 0, 1).unwrap();
        assert_eq!(loaded.count(BitState::Used), 4);
        assert_eq!(loaded.count(BitState::Free), 8);
        assert_eq!(loaded.bits, vec![0x00, 0x0F]);

        let mut small = Bitmap::new(3, 0, 1);
        small.bits[0] = 0xFF;
        assert_eq!(small.count(BitState::Used), 3);
        assert_eq!(small.count(BitState::Free), 0);
    }

    #[test]
    fn load_reports_failing_sector() {
        let disk = MemDisk::new(8);
        disk.fail_reads_at(3);
        assert!(matches!(
            Bitmap::load(&disk, 3000, 2, 2),
            Err(FileSystemError::DeviceRead { sector: 3, .. })
        ));
    }
}
