// hydrolink\crates\hl_protocols\src/error.rs

//! 协议错误
//!
//! 只有 [`ErrorKind::ProtocolError`] 是致命的，其余种类记录日志后交还调用方。

use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

/// 协议错误种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 模型缺失或尚未初始化
    UninitializedModel,
    /// 模型不支持该协议
    UnsupportedProtocol,
    /// 协议与模型集成失败（变量缺失、单位不一致等）
    IntegrationError,
    /// 协议检查失败（致命）
    ProtocolError,
    /// 协议检查失败（仅警告）
    ProtocolWarning,
}

impl ErrorKind {
    /// 是否需要中止调用方
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::ProtocolError)
    }

    fn is_warning(self) -> bool {
        matches!(self, Self::UnsupportedProtocol | Self::ProtocolWarning)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UninitializedModel => "Error(Uninitialized Model)",
            Self::UnsupportedProtocol => "Warning(Unsupported Protocol)",
            Self::IntegrationError => "Error(Integration)",
            Self::ProtocolError => "Error(Protocol)",
            Self::ProtocolWarning => "Warning(Protocol)",
        };
        f.write_str(s)
    }
}

/// 协议错误
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}::{protocol}: {message}")]
pub struct ProtocolError {
    kind: ErrorKind,
    protocol: String,
    message: String,
}

impl ProtocolError {
    /// 创建协议错误
    pub fn new(kind: ErrorKind, protocol: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            protocol: protocol.into(),
            message: message.into(),
        }
    }

    /// 错误种类
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// 协议名
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// 错误信息（不含前缀）
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 是否致命
    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}

/// 单次协议调用的原始结果
pub type ProtocolOutcome = Result<(), ProtocolError>;

/// 经严重程度分级后的结果：外层 `Err` 致命，内层 `Err` 可恢复
pub type ProtocolResult = Result<ProtocolOutcome, ProtocolError>;

/// 按严重程度处理原始结果
///
/// 所有错误都写入日志；致命错误放入外层，其余放入内层交还调用方。
pub fn escalate(outcome: ProtocolOutcome) -> ProtocolResult {
    match outcome {
        Ok(()) => Ok(Ok(())),
        Err(e) if e.is_fatal() => {
            error!(protocol = %e.protocol, "{e}");
            Err(e)
        }
        Err(e) => {
            if e.kind.is_warning() {
                warn!(protocol = %e.protocol, "{e}");
            } else {
                error!(protocol = %e.protocol, "{e}");
            }
            Ok(Err(e))
        }
    }
}
