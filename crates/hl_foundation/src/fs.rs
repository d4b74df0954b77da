// hydrolink\crates\hl_foundation\src/fs.rs

//! 文件可读性检查
//!
//! 适配器在触碰任何后端之前先确认配置文件与动态库文件可读。

use crate::error::{HlError, HlResult};
use std::fs::File;
use std::path::Path;

/// 判断路径是否指向一个可打开读取的普通文件
pub fn file_is_readable(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    path.is_file() && File::open(path).is_ok()
}

/// 检查文件可读，不可读时返回带原因的错误
pub fn check_readable(path: impl AsRef<Path>) -> HlResult<()> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(HlError::file_unreadable(path, "empty path"));
    }
    if path.is_dir() {
        return Err(HlError::file_unreadable(path, "path is a directory"));
    }
    File::open(path)
        .map(|_| ())
        .map_err(|e| HlError::file_unreadable(path, e.to_string()))
}
