//! 单个 inode 记录的读取，以及对其所在扇区的“读-改-写”更新

use log::{debug, error};

use crate::{
    disk::{Sector, SectorDevice, SECTOR_SIZE},
    fs::{
        config::{InodeRecord, INODE_SIZE},
        error::{FileSystemError, Result},
        geometry::Geometry,
    },
};

fn read_inode_sector<D: SectorDevice + ?Sized>(device: &D, sector: u32) -> Result<Sector> {
    let mut buf = [0u8; SECTOR_SIZE];
    device.read_sector(sector, &mut buf).map_err(|e| {
        error!("[inode] sector {} not read properly: {}", sector, e);
        FileSystemError::read(sector, e)
    })?;
    Ok(buf)
}

/// 读取编号为 `id` 的 inode 记录
pub fn get_inode<D: SectorDevice + ?Sized>(
    device: &D,
    geometry: &Geometry,
    id: u32,
) -> Result<InodeRecord> {
    let sector = geometry.sector_for_inode(id);
    let offset = geometry.offset_for_inode(id) as usize;
    let buf = read_inode_sector(device, sector)?;

    let mut record = [0u8; INODE_SIZE];
    let start = offset * INODE_SIZE;
    record.copy_from_slice(&buf[start..start + INODE_SIZE]);
    debug!("[get_inode] inode {} read from sector {} slot {}", id, sector, offset);
    Ok(record)
}

/// 覆盖编号为 `id` 的 inode 记录，同扇区的其它记录保持不变
pub fn save_inode<D: SectorDevice + ?Sized>(
    device: &D,
    geometry: &Geometry,
    id: u32,
    data: &InodeRecord,
) -> Result<()> {
    let sector = geometry.sector_for_inode(id);
    let offset = geometry.offset_for_inode(id);
    let original = read_inode_sector(device, sector)?;

    let updated = change_sector(geometry.inodes_per_sector, offset, data, &original);
    if let Err(e) = device.write_sector(sector, &updated) {
        error!("[save_inode] writing sector {} failed: {}", sector, e);
        return Err(FileSystemError::write(sector, e));
    }
    debug!("[save_inode] inode {} written to sector {} slot {}", id, sector, offset);
    Ok(())
}

/// 生成新的扇区镜像：槽位 `slot` 换成 `data`，其余槽位逐字节照抄 `disk_sector`
pub fn change_sector(
    inodes_per_sector: u32,
    slot: u32,
    data: &InodeRecord,
    disk_sector: &Sector,
) -> Sector {
    let mut out = [0u8; SECTOR_SIZE];
    for s in 0..inodes_per_sector as usize {
        let range = s * INODE_SIZE..(s + 1) * INODE_SIZE;
        if s == slot as usize {
            out[range].copy_from_slice(data);
        } else {
            out[range.clone()].copy_from_slice(&disk_sector[range]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{config::INODES_PER_SECTOR, test_support::scenario_disk};

    fn record(seed: u8) -> InodeRecord {
        let mut r = [0u8; INODE_SIZE];
        for (i, b) in r.iter_mut().enumerate() {
            *b = seed.wrapping_mul(31).wrapping_add(i as u8);
        }
        r
    }

    #[test]
    fn save_then_get_returns_record() {
        let (disk, geo) = scenario_disk();
        for id in [0, 1, 7, 8, 63, 100] {
            save_inode(&disk, &geo, id, &record(id as u8)).unwrap();
            assert_eq!(get_inode(&disk, &geo, id).unwrap(), record(id as u8));
        }
    }

    #[test]
    fn saving_inode_ten_leaves_its_neighbours_alone() {
        let (disk, geo) = scenario_disk();
        for id in 8..16 {
            save_inode(&disk, &geo, id, &record(id as u8 + 100)).unwrap();
        }
        let before: Vec<_> = (8..16).map(|id| get_inode(&disk, &geo, id).unwrap()).collect();

        let pattern = [0xA5u8; INODE_SIZE];
        save_inode(&disk, &geo, 10, &pattern).unwrap();

        assert_eq!(get_inode(&disk, &geo, 10).unwrap(), pattern);
        for id in (8..16).filter(|&id| id != 10) {
            assert_eq!(get_inode(&disk, &geo, id).unwrap(), before[(id - 8) as usize]);
        }

        // 整个扇区只有槽位 2 的字节发生变化
        let mut raw = [0u8; SECTOR_SIZE];
        disk.read_sector(41, &mut raw).unwrap();
        assert_eq!(&raw[2 * INODE_SIZE..3 * INODE_SIZE], &pattern[..]);
    }

    #[test]
    fn change_sector_replaces_exactly_one_slot() {
        let mut disk_sector = [0u8; SECTOR_SIZE];
        for (i, b) in disk_sector.iter_mut().enumerate() {
            *b = i as u8;
        }
        let data = [0xEEu8; INODE_SIZE];

        for slot in 0..INODES_PER_SECTOR {
            let out = change_sector(INODES_PER_SECTOR, slot, &data, &disk_sector);
            for s in 0..INODES_PER_SECTOR as usize {
                let range = s * INODE_SIZE..(s + 1) * INODE_SIZE;
                if s == slot as usize {
                    assert_eq!(&out[range], &data[..]);
                } else {
                    assert_eq!(&out[range.clone()], &disk_sector[range]);
                }
            }
        }
    }

    #[test]
    fn failed_read_means_no_write() {
        let (disk, geo) = scenario_disk();
        disk.fail_reads_at(41);
        let before = disk.write_count();

        let err = save_inode(&disk, &geo, 10, &record(1)).unwrap_err();
        assert!(matches!(err, FileSystemError::DeviceRead { sector: 41, .. }));
        assert_eq!(disk.write_count(), before);
        assert!(matches!(
            get_inode(&disk, &geo, 9),
            Err(FileSystemError::DeviceRead { sector: 41, .. })
        ));
    }

    #[test]
    fn failed_write_is_reported() {
        let (disk, geo) = scenario_disk();
        disk.fail_writes_at(41);
        let err = save_inode(&disk, &geo, 10, &record(1)).unwrap_err();
        assert!(matches!(err, FileSystemError::DeviceWrite { sector: 41, .. }));

        disk.clear_faults();
        assert_eq!(get_inode(&disk, &geo, 10).unwrap(), [0u8; INODE_SIZE]);
    }
}
