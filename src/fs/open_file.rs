use log::{debug, warn};

use crate::fs::{
    config::MAX_NUM_OF_OPEN_FILES,
    error::{FileSystemError, Result},
};

/// 目录项类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Regular,
    Directory,
}

/// 目录项：由目录层解析得到，这里只负责保存
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub kind: RecordKind,
    pub name: String,
    pub inode: u32,
}

/// 打开的文件：目录项 + 当前读写位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenFile {
    pub record: FileRecord,
    pub cursor: u64,
}

/// 打开文件表，容量固定，关闭后的句柄可以复用
#[derive(Debug)]
pub struct OpenFileTable {
    slots: Vec<Option<OpenFile>>,
}

impl Default for OpenFileTable {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenFileTable {
    pub fn new() -> Self {
        Self {
            slots: vec![None; MAX_NUM_OF_OPEN_FILES],
        }
    }

    /// 放入编号最小的空槽位，返回句柄
    pub fn add_open_file(&mut self, record: FileRecord) -> Result<usize> {
        let Some(handle) = self.slots.iter().position(Option::is_none) else {
            warn!("[OpenFileTable] table is full, {} not opened", record.name);
            return Err(FileSystemError::TableFull);
        };

        debug!("[OpenFileTable] {} opened as handle {}", record.name, handle);
        self.slots[handle] = Some(OpenFile { record, cursor: 0 });
        Ok(handle)
    }

    /// 关闭句柄，槽位归还给后续的打开操作
    pub fn close_file(&mut self, handle: usize) -> Result<FileRecord> {
        let file = self
            .slots
            .get_mut(handle)
            .and_then(Option::take)
            .ok_or(FileSystemError::InvalidHandle(handle))?;
        debug!("[OpenFileTable] handle {} closed", handle);
        Ok(file.record)
    }

    pub fn get(&self, handle: usize) -> Result<&OpenFile> {
        self.slots
            .get(handle)
            .and_then(Option::as_ref)
            .ok_or(FileSystemError::InvalidHandle(handle))
    }

    pub fn get_mut(&mut self, handle: usize) -> Result<&mut OpenFile> {
        self.slots
            .get_mut(handle)
            .and_then(Option::as_mut)
            .ok_or(FileSystemError::InvalidHandle(handle))
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &OpenFile)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(handle, slot)| slot.as_ref().map(|file| (handle, file)))
    }
}
