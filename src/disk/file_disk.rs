use std::{
    fs::{File, OpenOptions},
    io::{Error, ErrorKind, Read, Result, Seek, SeekFrom, Write},
    path::Path,
    sync::{Mutex, MutexGuard},
};

use log::{debug, info};

use crate::disk::{
    sector_device::SectorDevice,
    types::{disk_size, Sector, SECTOR_SIZE},
};

/// 以镜像文件模拟的扇区设备
#[derive(Debug)]
pub struct FileDisk {
    file: Mutex<File>,
    sectors: u32,
}

impl FileDisk {
    /// 打开（必要时创建）磁盘镜像，返回设备以及镜像是否为新建的
    pub fn open<P: AsRef<Path>>(path: P, sectors: u32) -> Result<(Self, bool)> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let len = file.metadata()?.len();
        let created = len == 0;
        let sectors = if len < disk_size(sectors) {
            info!("[FileDisk] allocating {} sectors for {}", sectors, path.display());
            file.set_len(disk_size(sectors))?;
            sectors
        } else {
            // 已有镜像以实际大小为准
            (len / SECTOR_SIZE as u64) as u32
        };

        Ok((
            Self {
                file: Mutex::new(file),
                sectors,
            },
            created,
        ))
    }

    fn lock(&self) -> Result<MutexGuard<'_, File>> {
        self.file
            .lock()
            .map_err(|_| Error::new(ErrorKind::Other, "disk image lock poisoned"))
    }

    fn check_range(&self, index: u32) -> Result<()> {
        if index >= self.sectors {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("sector {} beyond end of disk ({} sectors)", index, self.sectors),
            ));
        }
        Ok(())
    }
}

impl SectorDevice for FileDisk {
    fn read_sector(&self, index: u32, buf: &mut Sector) -> Result<()> {
        self.check_range(index)?;
        let mut file = self.lock()?;
        file.seek(SeekFrom::Start(index as u64 * SECTOR_SIZE as u64))?;
        file.read_exact(buf)?;
        debug!("[FileDisk] read sector {}", index);
        Ok(())
    }

    fn write_sector(&self, index: u32, buf: &Sector) -> Result<()> {
        self.check_range(index)?;
        let mut file = self.lock()?;
        file.seek(SeekFrom::Start(index as u64 * SECTOR_SIZE as u64))?;
        file.write_all(buf)?;
        debug!("[FileDisk] wrote sector {}", index);
        Ok(())
    }

    fn total_sectors(&self) -> u32 {
        self.sectors
    }
}
