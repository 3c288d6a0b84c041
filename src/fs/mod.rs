use log::{debug, info, warn};

use crate::{
    disk::SectorDevice,
    fs::{
        bitmap::{BitmapKind, BitmapSearch, DiskBitmaps},
        config::{InodeRecord, SUPER_BLOCK_SECTOR},
        error::{FileSystemError, Result},
        geometry::Geometry,
        inode::Inode,
        open_file::{FileRecord, OpenFileTable},
        super_block::SuperBlock,
    },
};

pub mod bitmap;
pub mod block_io;
pub mod config;
pub mod error;
pub mod free_inode;
pub mod geometry;
pub mod inode;
pub mod inode_io;
pub mod open_file;
pub mod super_block;

/// 格式化参数
#[derive(Debug, Clone, Copy)]
pub struct FormatParams {
    /// 每块扇区数
    pub block_size: u16,
    /// inode 区块数
    pub inode_area_blocks: u16,
}

#[derive(Debug)]
pub struct FileSystem<D: SectorDevice> {
    device: D,
    // 只加载一次
    geometry: Option<Geometry>,
    super_block: Option<SuperBlock>,
    open_files: OpenFileTable,
}

impl<D: SectorDevice> FileSystem<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            geometry: None,
            super_block: None,
            open_files: OpenFileTable::new(),
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }

    /// 在设备上建立一个空的文件系统。
    ///
    /// `progress(done, total)` 在每清零一个 inode 区块后调用。
    pub fn format<F: FnMut(u32, u32)>(
        device: &D,
        params: FormatParams,
        mut progress: F,
    ) -> Result<SuperBlock> {
        if params.block_size == 0 {
            return Err(FileSystemError::Corrupted("block size is zero".to_string()));
        }
        let sectors_per_block = params.block_size as u32;
        let disk_blocks = device.total_sectors() / sectors_per_block;
        let bits_per_block = sectors_per_block as u64 * crate::disk::SECTOR_SIZE as u64 * 8;
        let inode_count = params.inode_area_blocks as u64
            * sectors_per_block as u64
            * config::INODES_PER_SECTOR as u64;

        let bitmap_blocks = |units: u64| {
            u16::try_from(units.div_ceil(bits_per_block).max(1)).map_err(|_| {
                FileSystemError::Corrupted(format!("bitmap for {} units is too large", units))
            })
        };
        let sb = SuperBlock::new(
            params.block_size,
            bitmap_blocks(disk_blocks as u64)?,
            bitmap_blocks(inode_count)?,
            params.inode_area_blocks,
            disk_blocks,
        );
        if sb.metadata_blocks() >= disk_blocks {
            return Err(FileSystemError::Corrupted(format!(
                "{} metadata blocks do not fit on a {}-block disk",
                sb.metadata_blocks(),
                disk_blocks
            )));
        }
        let geometry = Geometry::from_super_block(&sb)?;

        let sector = sb.encode()?;
        device
            .write_sector(SUPER_BLOCK_SECTOR, &sector)
            .map_err(|e| FileSystemError::write(SUPER_BLOCK_SECTOR, e))?;

        let mut bitmaps = DiskBitmaps::empty(&sb, &geometry);
        for block in 0..sb.metadata_blocks() {
            bitmaps.get_mut(BitmapKind::Block).set(block);
        }
        // inode 0 留给根目录
        bitmaps.get_mut(BitmapKind::Inode).set(0);
        bitmaps.sync(device)?;

        let area = sb.inode_area_size as u32;
        for i in 0..area {
            let sector_pos = geometry.inode_table_start_sector + i * sectors_per_block;
            block_io::write_block(device, &geometry, sector_pos, &[])?;
            progress(i + 1, area);
        }

        info!(
            "[format] {} blocks of {} sectors, {} inodes",
            disk_blocks, sectors_per_block, inode_count
        );
        Ok(sb)
    }

    /// 幂等的挂载入口：已加载时不做任何 I/O
    pub fn ensure_geometry_loaded(&mut self) -> Result<Geometry> {
        match self.geometry {
            Some(geometry) => {
                debug!("[FileSystem] geometry already loaded");
                Ok(geometry)
            }
            None => {
                debug!("[FileSystem] geometry not loaded yet");
                self.load_geometry()
            }
        }
    }

    /// 直接加载几何信息，已加载时报错
    pub fn load_geometry(&mut self) -> Result<Geometry> {
        if self.geometry.is_some() {
            warn!("[FileSystem] geometry already loaded");
            return Err(FileSystemError::AlreadyInitialized);
        }
        let (geometry, sb) = Geometry::read(&self.device)?;
        self.geometry = Some(geometry);
        self.super_block = Some(sb);
        Ok(geometry)
    }

    pub fn geometry(&self) -> Result<&Geometry> {
        self.geometry.as_ref().ok_or(FileSystemError::Uninitialized)
    }

    pub fn super_block(&self) -> Result<&SuperBlock> {
        self.super_block
            .as_ref()
            .ok_or(FileSystemError::Uninitialized)
    }

    pub fn is_mounted(&self) -> bool {
        self.geometry.is_some()
    }

    pub fn read_block(&self, sector_pos: u32, data: &mut [u8]) -> Result<()> {
        block_io::read_block(&self.device, self.geometry()?, sector_pos, data)
    }

    pub fn write_block(&self, sector_pos: u32, data: &[u8]) -> Result<()> {
        block_io::write_block(&self.device, self.geometry()?, sector_pos, data)
    }

    pub fn get_inode(&self, id: u32) -> Result<InodeRecord> {
        inode_io::get_inode(&self.device, self.geometry()?, id)
    }

    pub fn save_inode(&self, id: u32, data: &InodeRecord) -> Result<()> {
        inode_io::save_inode(&self.device, self.geometry()?, id, data)
    }

    pub fn read_inode(&self, id: u32) -> Result<Inode> {
        Inode::from_record(&self.get_inode(id)?)
    }

    pub fn write_inode(&self, id: u32, inode: &Inode) -> Result<()> {
        self.save_inode(id, &inode.to_record()?)
    }

    /// 从磁盘读取两张位图
    pub fn load_bitmaps(&self) -> Result<DiskBitmaps> {
        DiskBitmaps::load(&self.device, self.super_block()?, self.geometry()?)
    }

    pub fn get_free_node<S: BitmapSearch + ?Sized>(&self, search: &S) -> Result<u32> {
        free_inode::get_free_node(search)
    }

    pub fn add_open_file(&mut self, record: FileRecord) -> Result<usize> {
        self.open_files.add_open_file(record)
    }

    pub fn close_file(&mut self, handle: usize) -> Result<FileRecord> {
        self.open_files.close_file(handle)
    }

    pub fn open_files(&self) -> &OpenFileTable {
        &self.open_files
    }

    pub fn open_files_mut(&mut self) -> &mut OpenFileTable {
        &mut self.open_files
    }
}
