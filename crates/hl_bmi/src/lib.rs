// hydrolink\crates\hl_bmi\src/lib.rs

//! HydroLink BMI Adapter Layer (Layer 2)
//!
//! 将外部水文模型（C、C++、Fortran、嵌入式 Python）统一封装到
//! [`Bmi`] 接口之后，驱动程序无需关心后端的内存布局、类型系统、
//! 时间单位或加载方式。
//!
//! # 模块概览
//!
//! - [`bmi`]: BMI 接口 trait 与适配器公共 trait
//! - [`adapter`]: 适配器共享的初始化状态机与时间换算
//! - [`dylib`]: 动态库加载与符号解析
//! - [`foreign_type`]: 外部类型名到本地数值类型的映射
//! - [`c`] / [`cpp`] / [`fortran`]: 各语言后端适配器
//! - `python`: 嵌入式 Python 后端（`python` feature）
//! - [`values`]: 类型擦除缓冲区到强类型值的转换
//!
//! # 生命周期
//!
//! ```text
//! 构造 ─> 校验配置文件 ─> 加载后端 ─> initialize ─> update* ─> finalize
//!                                         │
//!                                         └─ 失败：记录错误信息，不可重试
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapter;
pub mod bmi;
pub mod c;
pub mod c_ffi;
pub mod cpp;
pub mod dylib;
pub mod error;
pub mod foreign_type;
pub mod fortran;
#[cfg(feature = "python")]
pub mod python;
pub mod values;

/// 层级标识
pub const LAYER: u8 = 2;

// 重导出核心类型
pub use adapter::{AdapterBase, AdapterOptions, InitState};
pub use bmi::{share, BackendKind, Bmi, BmiAdapter, SharedAdapter};
pub use c::CAdapter;
pub use cpp::CppAdapter;
pub use dylib::DynamicLibrary;
pub use error::{BmiError, BmiResult};
pub use foreign_type::NativeType;
pub use fortran::FortranAdapter;
#[cfg(feature = "python")]
pub use python::{InterpreterGuard, PyAdapter};
pub use values::{get_value, get_value_at_indices, set_value, set_value_at_indices, NativeScalar};
