// hydrolink\crates\hl_protocols\src/registry.rs

//! 协议容器
//!
//! 持有针对同一模型的全部协议，并统一处理严重程度。

use crate::error::{escalate, ErrorKind, ProtocolError, ProtocolResult};
use crate::mass_balance::MassBalance;
use crate::protocol::{BmiProtocol, Context};
use hl_bmi::SharedAdapter;
use std::collections::HashMap;
use std::fmt;

/// 已知协议
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// 质量守恒检查
    MassBalance,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MassBalance => f.write_str("mass_balance"),
        }
    }
}

/// 协议容器
///
/// # 示例
///
/// ```ignore
/// let protocols = BmiProtocols::new(Some(model.clone()), &properties);
/// let ctx = Context::new(step, total_steps, &timestamp, &feature_id);
///
/// // 外层 `?` 只传播致命错误
/// if let Err(warning) = protocols.run(Protocol::MassBalance, &ctx)? {
///     // 已写入日志，可按需处理
/// }
/// ```
pub struct BmiProtocols {
    protocols: HashMap<Protocol, Box<dyn BmiProtocol>>,
}

impl BmiProtocols {
    /// 创建并初始化全部协议
    ///
    /// 构造不会失败：探测或配置中的问题写入日志，并关闭对应协议。
    ///
    /// # 参数
    /// - `model`: 被检查的模型，`None` 时所有协议报告未初始化
    /// - `properties`: 协议配置，按协议名取子对象
    pub fn new(model: Option<SharedAdapter>, properties: &serde_json::Value) -> Self {
        let mut mass_balance = MassBalance::new(model);
        // 初始化只产生非致命错误
        let _ = escalate(mass_balance.initialize(properties));

        let mut protocols: HashMap<Protocol, Box<dyn BmiProtocol>> = HashMap::new();
        protocols.insert(Protocol::MassBalance, Box::new(mass_balance));
        Self { protocols }
    }

    /// 运行一个协议
    ///
    /// # 返回
    /// - `Err(e)`: 致命错误，调用方应中止
    /// - `Ok(Err(e))`: 可恢复错误，已写入日志
    /// - `Ok(Ok(()))`: 通过或本步跳过
    pub fn run(&self, protocol: Protocol, ctx: &Context<'_>) -> ProtocolResult {
        match self.protocols.get(&protocol) {
            Some(p) => escalate(p.run(ctx)),
            None => escalate(Err(ProtocolError::new(
                ErrorKind::UnsupportedProtocol,
                protocol.to_string(),
                "protocol is not registered",
            ))),
        }
    }

    /// 已注册的协议
    pub fn protocols(&self) -> Vec<Protocol> {
        self.protocols.keys().copied().collect()
    }

    /// 是否注册了指定协议
    pub fn contains(&self, protocol: Protocol) -> bool {
        self.protocols.contains_key(&protocol)
    }
}

impl Default for BmiProtocols {
    /// 无模型的容器，协议未初始化
    fn default() -> Self {
        let mut protocols: HashMap<Protocol, Box<dyn BmiProtocol>> = HashMap::new();
        protocols.insert(Protocol::MassBalance, Box::new(MassBalance::new(None)));
        Self { protocols }
    }
}

impl fmt::Debug for BmiProtocols {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BmiProtocols")
            .field("protocols", &self.protocols())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_disabled_no_op() {
        let protocols = BmiProtocols::default();
        assert!(protocols.contains(Protocol::MassBalance));
        let result = protocols.run(Protocol::MassBalance, &Context::new(0, 2, "t0", "id"));
        assert_eq!(result, Ok(Ok(())));
    }

    #[test]
    fn test_construction_without_model_never_fails() {
        let properties = serde_json::json!({"mass_balance": {"fatal": true}});
        let protocols = BmiProtocols::new(None, &properties);
        assert_eq!(
            protocols.run(Protocol::MassBalance, &Context::new(1, 2, "t1", "id")),
            Ok(Ok(()))
        );
    }
}
