//! 以块为单位的读写：一个块是从 `sector_pos` 开始的 `sectors_per_block` 个连续扇区

use log::{debug, error, warn};

use crate::{
    disk::{SectorDevice, SECTOR_SIZE},
    fs::{
        error::{FileSystemError, Result},
        geometry::Geometry,
    },
};

/// 写一个块。`data` 不足一个块时，最后一个不完整的扇区以 0 补齐，
/// 之后的扇区整扇区写 0；超出一个块的部分被忽略。
///
/// 写入中途失败不会回滚，已写入的扇区保留在磁盘上。
pub fn write_block<D: SectorDevice + ?Sized>(
    device: &D,
    geometry: &Geometry,
    sector_pos: u32,
    data: &[u8],
) -> Result<()> {
    let block_bytes = geometry.block_bytes();
    if data.len() > block_bytes {
        warn!(
            "[write_block] dropping {} bytes past the {}-byte block",
            data.len() - block_bytes,
            block_bytes
        );
    }
    let data = &data[..data.len().min(block_bytes)];

    let full_sectors = data.len() / SECTOR_SIZE;
    let tail = data.len() % SECTOR_SIZE;

    for i in 0..geometry.sectors_per_block as usize {
        let mut buf = [0u8; SECTOR_SIZE];
        let start = i * SECTOR_SIZE;
        if i < full_sectors {
            buf.copy_from_slice(&data[start..start + SECTOR_SIZE]);
        } else if i == full_sectors && tail > 0 {
            buf[..tail].copy_from_slice(&data[start..start + tail]);
        }

        let sector = sector_pos + i as u32;
        if let Err(e) = device.write_sector(sector, &buf) {
            error!("[write_block] writing sector {} failed: {}", sector, e);
            return Err(FileSystemError::write(sector, e));
        }
    }

    debug!("[write_block] block at sector {} written", sector_pos);
    Ok(())
}

/// 读一个块，`data` 必须恰好是一个块的大小。
///
/// 读取中途失败时 `data` 只填充了前面已读的扇区。
pub fn read_block<D: SectorDevice + ?Sized>(
    device: &D,
    geometry: &Geometry,
    sector_pos: u32,
    data: &mut [u8],
) -> Result<()> {
    let block_bytes = geometry.block_bytes();
    if data.len() != block_bytes {
        error!(
            "[read_block] buffer of {} bytes differs from block size {}",
            data.len(),
            block_bytes
        );
        return Err(FileSystemError::SizeMismatch {
            expected: block_bytes,
            actual: data.len(),
        });
    }

    let mut buf = [0u8; SECTOR_SIZE];
    for (i, chunk) in data.chunks_exact_mut(SECTOR_SIZE).enumerate() {
        let sector = sector_pos + i as u32;
        if let Err(e) = device.read_sector(sector, &mut buf) {
            error!("[read_block] reading sector {} failed: {}", sector, e);
            return Err(FileSystemError::read(sector, e));
        }
        chunk.copy_from_slice(&buf);
    }

    debug!("[read_block] block at sector {} read", sector_pos);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{disk::MemDisk, fs::test_support::scenario_disk};

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + 3) as u8).collect()
    }

    #[test]
    fn block_round_trip() {
        let (disk, geo) = scenario_disk();
        let data = pattern(geo.block_bytes());
        write_block(&disk, &geo, 400, &data).unwrap();

        let mut out = vec![0u8; geo.block_bytes()];
        read_block(&disk, &geo, 400, &mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn short_data_is_zero_padded() {
        let (disk, geo) = scenario_disk();
        write_block(&disk, &geo, 400, &vec![0xFF; geo.block_bytes()]).unwrap();

        // 一个半扇区：扇区 1 的后半段以及扇区 2、3 都应被清零
        let data = pattern(SECTOR_SIZE + SECTOR_SIZE / 2);
        write_block(&disk, &geo, 400, &data).unwrap();

        let mut out = vec![0u8; geo.block_bytes()];
        read_block(&disk, &geo, 400, &mut out).unwrap();
        assert_eq!(&out[..data.len()], &data[..]);
        assert!(out[data.len()..].iter().all(|&b| b == 0));
    }

    #[test]
    fn empty_data_writes_every_sector() {
        let (disk, geo) = scenario_disk();
        let before = disk.write_count();
        write_block(&disk, &geo, 400, &[]).unwrap();
        assert_eq!(disk.write_count() - before, geo.sectors_per_block as usize);
    }

    #[test]
    fn oversized_write_keeps_to_one_block() {
        let (disk, geo) = scenario_disk();
        let before = disk.write_count();
        let data = vec![7u8; geo.block_bytes() + 10];
        write_block(&disk, &geo, 400, &data).unwrap();
        assert_eq!(disk.write_count() - before, geo.sectors_per_block as usize);

        let mut out = vec![0u8; geo.block_bytes()];
        read_block(&disk, &geo, 400, &mut out).unwrap();
        assert!(out.iter().all(|&b| b == 7));

        let mut next = [0xAAu8; SECTOR_SIZE];
        disk.read_sector(400 + geo.sectors_per_block, &mut next).unwrap();
        assert!(next.iter().all(|&b| b == 0));
    }

    #[test]
    fn read_requires_exact_block_size() {
        let (disk, geo) = scenario_disk();
        for len in [geo.block_bytes() - 1, geo.block_bytes() + 1, 0] {
            let mut out = vec![0u8; len];
            let err = read_block(&disk, &geo, 400, &mut out).unwrap_err();
            assert!(matches!(
                err,
                FileSystemError::SizeMismatch { expected, actual }
                    if expected == geo.block_bytes() && actual == len
            ));
        }
    }

    #[test]
    fn failed_write_leaves_earlier_sectors_on_disk() {
        let (disk, geo) = scenario_disk();
        disk.fail_writes_at(402);
        let data = pattern(geo.block_bytes());

        let err = write_block(&disk, &geo, 400, &data).unwrap_err();
        assert!(matches!(err, FileSystemError::DeviceWrite { sector: 402, .. }));

        let mut buf = [0u8; SECTOR_SIZE];
        disk.read_sector(400, &mut buf).unwrap();
        assert_eq!(&buf[..], &data[..SECTOR_SIZE]);
        disk.read_sector(401, &mut buf).unwrap();
        assert_eq!(&buf[..], &data[SECTOR_SIZE..2 * SECTOR_SIZE]);
        disk.read_sector(403, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn failed_read_keeps_partial_data() {
        let (disk, geo) = scenario_disk();
        let data = pattern(geo.block_bytes());
        write_block(&disk, &geo, 400, &data).unwrap();
        disk.fail_reads_at(401);

        let mut out = vec![0u8; geo.block_bytes()];
        let err = read_block(&disk, &geo, 400, &mut out).unwrap_err();
        assert!(matches!(err, FileSystemError::DeviceRead { sector: 401, .. }));
        assert_eq!(&out[..SECTOR_SIZE], &data[..SECTOR_SIZE]);
        assert!(out[SECTOR_SIZE..].iter().all(|&b| b == 0));
    }

    #[test]
    fn works_through_a_trait_object() {
        let disk = MemDisk::new(16);
        let geo = crate::fs::geometry::Geometry::from_super_block(
            &crate::fs::super_block::SuperBlock::new(2, 1, 1, 1, 8),
        )
        .unwrap();
        let device: &dyn SectorDevice = &disk;
        write_block(device, &geo, 4, &pattern(2 * SECTOR_SIZE)).unwrap();
        let mut out = vec![0u8; 2 * SECTOR_SIZE];
        read_block(device, &geo, 4, &mut out).unwrap();
        assert_eq!(out, pattern(2 * SECTOR_SIZE));
    }
}
