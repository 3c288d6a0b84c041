pub mod file_disk;
pub mod init;
pub mod mem_disk;
pub mod sector_device;
pub mod types;

pub use file_disk::FileDisk;
pub use mem_disk::MemDisk;
pub use sector_device::SectorDevice;
pub use types::{Sector, SECTOR_SIZE};
