use std::fmt;

/// 文件系统错误类型
#[derive(Debug)]
pub enum FileSystemError {
    Uninitialized,      // 尚未加载几何信息
    AlreadyInitialized, // 几何信息已加载，不允许重复加载
    DeviceRead {
        sector: u32,
        source: std::io::Error,
    },
    DeviceWrite {
        sector: u32,
        source: std::io::Error,
    },
    SizeMismatch {
        expected: usize,
        actual: usize,
    },
    NoFreeInode,          // 没有空闲 inode
    TableFull,            // 打开文件表已满
    InvalidHandle(usize), // 句柄未被使用
    Corrupted(String),    // 超级块无法描述一个文件系统
}

impl FileSystemError {
    pub fn read(sector: u32, source: std::io::Error) -> Self {
        Self::DeviceRead { sector, source }
    }

    pub fn write(sector: u32, source: std::io::Error) -> Self {
        Self::DeviceWrite { sector, source }
    }
}

// 实现 Display trait，用于打印错误信息
impl fmt::Display for FileSystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "File system geometry not loaded"),
            Self::AlreadyInitialized => write!(f, "File system geometry already loaded"),
            Self::DeviceRead { sector, source } => {
                write!(f, "Failed to read sector {}: {}", sector, source)
            }
            Self::DeviceWrite { sector, source } => {
                write!(f, "Failed to write sector {}: {}", sector, source)
            }
            Self::SizeMismatch { expected, actual } => write!(
                f,
                "Buffer size mismatch: expected {} bytes, got {}",
                expected, actual
            ),
            Self::NoFreeInode => write!(f, "No free inode available"),
            Self::TableFull => write!(f, "Open file table is full"),
            Self::InvalidHandle(handle) => write!(f, "Invalid file handle: {}", handle),
            Self::Corrupted(desc) => write!(f, "File system corrupted: {}", desc),
        }
    }
}

// 支持链式错误，方便追踪底层原因
impl std::error::Error for FileSystemError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DeviceRead { source, .. } | Self::DeviceWrite { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// 文件系统统一结果类型
pub type Result<T> = std::result::Result<T, FileSystemError>;
