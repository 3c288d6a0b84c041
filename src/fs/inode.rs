use serde::{Deserialize, Serialize};

use crate::fs::{
    config::{InodeRecord, INODE_SIZE},
    error::{FileSystemError, Result},
};

/// 磁盘上的 inode（32 字节，小端序）
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inode {
    pub blocks_file_size: u32, // 文件占用的数据块数
    pub bytes_file_size: u32,  // 文件大小（字节）
    pub data_ptr: [u32; 2],    // 直接块指针
    pub single_ind_ptr: u32,   // 一级间接块
    pub double_ind_ptr: u32,   // 二级间接块
    pub ref_counter: u32,      // 硬链接数
    pub reserved: u32,
}

impl Inode {
    pub fn from_record(record: &InodeRecord) -> Result<Self> {
        bincode::deserialize(record)
            .map_err(|e| FileSystemError::Corrupted(format!("unreadable inode: {}", e)))
    }

    pub fn to_record(&self) -> Result<InodeRecord> {
        let bytes = bincode::serialize(self)
            .map_err(|e| FileSystemError::Corrupted(format!("cannot encode inode: {}", e)))?;
        let mut record = [0u8; INODE_SIZE];
        record[..bytes.len()].copy_from_slice(&bytes);
        Ok(record)
    }

    /// 是否没有任何目录项指向该 inode
    pub fn is_unused(&self) -> bool {
        self.ref_counter == 0
    }

    /// 按字段名修改，供交互命令使用
    pub fn set_field(&mut self, name: &str, value: u32) -> bool {
        match name {
            "blocks" => self.blocks_file_size = value,
            "bytes" => self.bytes_file_size = value,
            "ptr0" => self.data_ptr[0] = value,
            "ptr1" => self.data_ptr[1] = value,
            "single" => self.single_ind_ptr = value,
            "double" => self.double_ind_ptr = value,
            "refs" => self.ref_counter = value,
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_layout_is_eight_little_endian_words() {
        let inode = Inode {
            blocks_file_size: 1,
            bytes_file_size: 0x0102_0304,
            data_ptr: [5, 6],
            single_ind_ptr: 7,
            double_ind_ptr: 8,
            ref_counter: 9,
            reserved: 0,
        };
        let record = inode.to_record().unwrap();
        assert_eq!(&record[0..4], &[1, 0, 0, 0]);
        assert_eq!(&record[4..8], &[4, 3, 2, 1]);
        assert_eq!(&record[8..12], &[5, 0, 0, 0]);
        assert_eq!(&record[24..28], &[9, 0, 0, 0]);
        assert_eq!(Inode::from_record(&record).unwrap(), inode);
    }

    #[test]
    fn zeroed_record_is_unused() {
        let inode = Inode::from_record(&[0u8; INODE_SIZE]).unwrap();
        assert!(inode.is_unused());
        assert_eq!(inode, Inode::default());
    }

    #[test]
    fn set_field_knows_its_names() {
        let mut inode = Inode::default();
        assert!(inode.set_field("ptr1", 42));
        assert!(inode.set_field("refs", 2));
        assert!(!inode.set_field("mode", 1));
        assert_eq!(inode.data_ptr, [0, 42]);
        assert_eq!(inode.ref_counter, 2);
    }
}
