// hydrolink\crates\hl_foundation\src/lib.rs

//! HydroLink Foundation Layer
//!
//! 基础层，为模型耦合各层提供最小公共抽象。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型
//! - [`fs`]: 文件可读性检查
//! - [`units`]: 模型时间单位换算表
//!
//! # 示例
//!
//! ```
//! use hl_foundation::units::TimeUnit;
//!
//! let unit = TimeUnit::parse("hours").unwrap();
//! assert_eq!(unit.seconds_factor(), 3600.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod fs;
pub mod units;

/// 层级标识
pub const LAYER: u8 = 1;

// 重导出常用类型
pub use error::{HlError, HlResult};
pub use fs::{file_is_readable, check_readable};
pub use units::TimeUnit;

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{HlError, HlResult};
    pub use crate::fs::{check_readable, file_is_readable};
    pub use crate::units::TimeUnit;
}
