// hydrolink\crates\hl_foundation\src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `HlError` 枚举和 `HlResult` 类型别名。模型适配相关的错误在
//! `hl_bmi` 中扩展，协议相关的错误在 `hl_protocols` 中定义。
//!
//! # 示例
//!
//! ```
//! use hl_foundation::error::{HlError, HlResult};
//!
//! fn open_config() -> HlResult<()> {
//!     Err(HlError::file_unreadable("model.cfg", "not found"))
//! }
//! assert!(open_config().is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// 统一结果类型
pub type HlResult<T> = Result<T, HlError>;

/// HydroLink 基础错误类型
#[derive(Error, Debug)]
pub enum HlError {
    /// 文件不可读
    #[error("文件不可读: '{}'. Error: {reason}", path.display())]
    FileUnreadable {
        /// 文件路径
        path: PathBuf,
        /// 底层原因
        reason: String,
    },

    /// 不支持的时间单位
    #[error("不支持的时间单位: '{unit}'")]
    UnknownTimeUnit {
        /// 模型报告的单位字符串
        unit: String,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl HlError {
    /// 文件不可读
    pub fn file_unreadable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FileUnreadable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// 不支持的时间单位
    pub fn unknown_time_unit(unit: impl Into<String>) -> Self {
        Self::UnknownTimeUnit { unit: unit.into() }
    }
}

// ========================================================================
// 测试
// ========================================================================
