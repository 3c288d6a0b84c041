use std::io::Result;

use crate::disk::types::Sector;

/// 扇区设备：文件系统与底层虚拟磁盘之间唯一的读写接口
pub trait SectorDevice: Send + Sync {
    fn read_sector(&self, index: u32, buf: &mut Sector) -> Result<()>;
    fn write_sector(&self, index: u32, buf: &Sector) -> Result<()>;
    fn total_sectors(&self) -> u32;
}

impl<T: SectorDevice + ?Sized> SectorDevice for Box<T> {
    fn read_sector(&self, index: u32, buf: &mut Sector) -> Result<()> {
        (**self).read_sector(index, buf)
    }

    fn write_sector(&self, index: u32, buf: &Sector) -> Result<()> {
        (**self).write_sector(index, buf)
    }

    fn total_sectors(&self) -> u32 {
        (**self).total_sectors()
    }
}
