use log::{info, warn};

use crate::fs::{
    bitmap::{BitState, BitmapKind, BitmapSearch},
    error::{FileSystemError, Result},
};

/// 向位图查询第一个空闲 inode，本身不做任何扫描
pub fn get_free_node<S: BitmapSearch + ?Sized>(search: &S) -> Result<u32> {
    match search.find_free(BitmapKind::Inode, BitState::Free) {
        Some(id) => {
            info!("[get_free_node] inode {} is free", id);
            Ok(id)
        }
        None => {
            warn!("[get_free_node] no free inode left");
            Err(FileSystemError::NoFreeInode)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Recorder {
        answer: Option<u32>,
        asked: RefCell<Vec<(BitmapKind, BitState)>>,
    }

    impl BitmapSearch for Recorder {
        fn find_free(&self, kind: BitmapKind, state: BitState) -> Option<u32> {
            self.asked.borrow_mut().push((kind, state));
            self.answer
        }
    }

    #[test]
    fn asks_for_a_free_inode() {
        let search = Recorder {
            answer: Some(17),
            asked: RefCell::new(Vec::new()),
        };
        assert_eq!(get_free_node(&search).unwrap(), 17);
        assert_eq!(
            search.asked.borrow().as_slice(),
            &[(BitmapKind::Inode, BitState::Free)]
        );
    }

    #[test]
    fn none_means_no_free_inode() {
        let search = Recorder {
            answer: None,
            asked: RefCell::new(Vec::new()),
        };
        assert!(matches!(
            get_free_node(&search),
            Err(FileSystemError::NoFreeInode)
        ));
    }
}
