// hydrolink\crates\hl_protocols\src/lib.rs

//! HydroLink Protocol Layer (Layer 3)
//!
//! 在 BMI 适配器之上按时间步运行的检查协议。
//!
//! # 模块概览
//!
//! - [`protocol`]: 协议 trait 与运行上下文
//! - [`error`]: 两级协议错误（致命 / 可恢复）
//! - [`mass_balance`]: 质量守恒检查
//! - [`registry`]: 协议容器
//!
//! # 严重程度
//!
//! [`BmiProtocols::run`] 返回嵌套结果：外层 `Err` 为致命错误，
//! 内层 `Err` 为已记录到日志的可恢复错误。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod mass_balance;
pub mod protocol;
pub mod registry;

/// 层级标识
pub const LAYER: u8 = 3;

pub use error::{ErrorKind, ProtocolError, ProtocolOutcome, ProtocolResult};
pub use mass_balance::{MassBalance, MassBalanceConfig};
pub use protocol::{BmiProtocol, Context};
pub use registry::{BmiProtocols, Protocol};
