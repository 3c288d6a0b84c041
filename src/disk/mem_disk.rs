use std::{
    collections::HashSet,
    io::{Error, ErrorKind, Result},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex, MutexGuard,
    },
};

use crate::disk::{
    sector_device::SectorDevice,
    types::{Sector, SECTOR_SIZE},
};

/// 内存中的扇区设备，可以注入读写故障
#[derive(Debug)]
pub struct MemDisk {
    sectors: Mutex<Vec<Sector>>,
    faults: Mutex<Faults>,
    writes: AtomicUsize,
}

#[derive(Debug, Default)]
struct Faults {
    read: HashSet<u32>,
    write: HashSet<u32>,
}

impl MemDisk {
    pub fn new(sectors: u32) -> Self {
        Self {
            sectors: Mutex::new(vec![[0u8; SECTOR_SIZE]; sectors as usize]),
            faults: Mutex::new(Faults::default()),
            writes: AtomicUsize::new(0),
        }
    }

    #[cfg(test)]
    /// 之后对该扇区的读取都会失败
    pub fn fail_reads_at(&self, index: u32) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.read.insert(index);
        }
    }

    #[cfg(test)]
    /// 之后对该扇区的写入都会失败
    pub fn fail_writes_at(&self, index: u32) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.write.insert(index);
        }
    }

    #[cfg(test)]
    pub fn clear_faults(&self) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.read.clear();
            faults.write.clear();
        }
    }

    #[cfg(test)]
    /// 成功写入的扇区次数
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Sector>>> {
        self.sectors
            .lock()
            .map_err(|_| Error::new(ErrorKind::Other, "memory disk lock poisoned"))
    }

    fn injected(&self, index: u32, write: bool) -> Result<()> {
        let faults = self
            .faults
            .lock()
            .map_err(|_| Error::new(ErrorKind::Other, "fault table lock poisoned"))?;
        let hit = if write {
            faults.write.contains(&index)
        } else {
            faults.read.contains(&index)
        };
        if hit {
            return Err(Error::new(
                ErrorKind::Other,
                format!("injected fault on sector {}", index),
            ));
        }
        Ok(())
    }
}

fn out_of_range(index: u32) -> Error {
    Error::new(
        ErrorKind::InvalidInput,
        format!("sector {} beyond end of disk", index),
    )
}

impl SectorDevice for MemDisk {
    fn read_sector(&self, index: u32, buf: &mut Sector) -> Result<()> {
        self.injected(index, false)?;
        let sectors = self.lock()?;
        let sector = sectors.get(index as usize).ok_or_else(|| out_of_range(index))?;
        buf.copy_from_slice(sector);
        Ok(())
    }

    fn write_sector(&self, index: u32, buf: &Sector) -> Result<()> {
        self.injected(index, true)?;
        let mut sectors = self.lock()?;
        let sector = sectors
            .get_mut(index as usize)
            .ok_or_else(|| out_of_range(index))?;
        sector.copy_from_slice(buf);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn total_sectors(&self) -> u32 {
        self.sectors.lock().map(|s| s.len() as u32).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injected_faults_hit_only_their_sector() {
        let disk = MemDisk::new(4);
        disk.fail_writes_at(2);
        let sector = [7u8; SECTOR_SIZE];

        assert!(disk.write_sector(1, &sector).is_ok());
        assert!(disk.write_sector(2, &sector).is_err());
        assert_eq!(disk.write_count(), 1);

        disk.clear_faults();
        assert!(disk.write_sector(2, &sector).is_ok());
        let mut buf = [0u8; SECTOR_SIZE];
        disk.read_sector(2, &mut buf).unwrap();
        assert_eq!(buf, sector);
    }

    #[test]
    fn reads_past_the_end_fail() {
        let disk = MemDisk::new(2);
        let mut buf = [0u8; SECTOR_SIZE];
        assert_eq!(
            disk.read_sector(2, &mut buf).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
    }
}
