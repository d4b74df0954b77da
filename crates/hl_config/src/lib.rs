// hydrolink\crates\hl_config\src/lib.rs

//! HydroLink Config Layer (Layer 4)
//!
//! 以 JSON 描述一个 BMI 模型的构造参数，并据此构建适配器与协议容器。
//!
//! # 模块概览
//!
//! - [`adapter_config`]: 适配器配置（后端、符号名、策略开关、协议配置）
//! - [`factory`]: 按后端种类构建 `Box<dyn BmiAdapter>`
//! - [`error`]: 配置错误类型
//!
//! # 层级架构
//!
//! ```text
//! Layer 5: hl_cli        ─> uses AdapterConfig, AdapterFactory
//! Layer 4: hl_config     ─> AdapterConfig, AdapterFactory (本层)
//! Layer 3: hl_protocols  ─> BmiProtocols
//! Layer 2: hl_bmi        ─> BmiAdapter, CAdapter, CppAdapter, ...
//! Layer 1: hl_foundation
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapter_config;
pub mod error;
pub mod factory;

/// 层级标识
pub const LAYER: u8 = 4;

pub use adapter_config::{AdapterConfig, BackendConfig};
pub use error::ConfigError;
pub use factory::AdapterFactory;
