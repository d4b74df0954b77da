// hydrolink\crates\hl_bmi\src/error.rs

//! 适配器层错误类型
//!
//! 区分"管线故障"（配置、绑定、类型解析）与"模型自身故障"
//! （[`BmiError::ExternalState`]），调用方可据此决定是否继续模拟。

use hl_foundation::HlError;
use thiserror::Error;

/// 适配器层结果类型
pub type BmiResult<T> = Result<T, BmiError>;

/// BMI 适配器错误
#[derive(Error, Debug)]
pub enum BmiError {
    // ========================================================================
    // 调用前即可发现的错误
    // ========================================================================

    /// 配置错误（配置文件不可读、符号名为空、初始化后更换配置等）
    #[error("配置错误 [{model}]: {message}")]
    Config {
        /// 模型名称
        model: String,
        /// 具体错误信息
        message: String,
    },

    /// 动态库或符号绑定失败，信息中附带加载器诊断
    #[error("绑定失败 [{model}]: {message}")]
    Binding {
        /// 模型名称
        model: String,
        /// 具体错误信息
        message: String,
    },

    // ========================================================================
    // 后端执行错误
    // ========================================================================

    /// 外部模型状态异常：后端原生控制调用报告失败
    #[error("外部模型状态异常 [{model}]: {message}")]
    ExternalState {
        /// 模型名称
        model: String,
        /// 具体错误信息
        message: String,
    },

    /// 后端查询/读写调用失败
    #[error("模型调用失败 [{model}]: {message}")]
    Backend {
        /// 模型名称
        model: String,
        /// 具体错误信息
        message: String,
    },

    /// 先前的初始化尝试已失败，不可重试
    #[error("{model} 先前的初始化尝试出现异常: \n\t{message}")]
    PreviousInitFailure {
        /// 模型名称
        model: String,
        /// 首次失败时记录的信息
        message: String,
    },

    // ========================================================================
    // 类型与能力
    // ========================================================================

    /// 外部类型无法解析或数值无法无损转换
    #[error("类型解析失败: {message}")]
    TypeResolution {
        /// 具体错误信息
        message: String,
    },

    /// 后端不支持的操作
    #[error("不支持的操作 [{model}]: {operation}")]
    Unsupported {
        /// 模型名称
        model: String,
        /// 操作描述
        operation: String,
    },

    /// 嵌入式解释器抛出的异常
    #[error("Python 异常 [{model}]: {message}")]
    Python {
        /// 模型名称
        model: String,
        /// 解释器给出的异常文本
        message: String,
    },

    /// 基础层错误
    #[error(transparent)]
    Foundation(#[from] HlError),
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl BmiError {
    /// 配置错误
    pub fn config(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            model: model.into(),
            message: message.into(),
        }
    }

    /// 绑定错误
    pub fn binding(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Binding {
            model: model.into(),
            message: message.into(),
        }
    }

    /// 外部模型状态异常
    pub fn external_state(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalState {
            model: model.into(),
            message: message.into(),
        }
    }

    /// 后端调用失败
    pub fn backend(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            model: model.into(),
            message: message.into(),
        }
    }

    /// 类型解析失败
    pub fn type_resolution(message: impl Into<String>) -> Self {
        Self::TypeResolution {
            message: message.into(),
        }
    }

    /// 不支持的操作
    pub fn unsupported(model: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Unsupported {
            model: model.into(),
            operation: operation.into(),
        }
    }

    /// 是否为模型自身报告的失败
    pub fn is_external_state(&self) -> bool {
        matches!(self, Self::ExternalState { .. })
    }
}
