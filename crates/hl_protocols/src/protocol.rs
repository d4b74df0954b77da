// hydrolink\crates\hl_protocols\src/protocol.rs

//! 协议接口

use crate::error::ProtocolOutcome;

/// 单次运行的上下文
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    /// 当前时间步（从 0 开始）
    pub current_time_step: i64,
    /// 总时间步数
    pub total_steps: i64,
    /// 当前时间标签，仅用于信息
    pub timestamp: &'a str,
    /// 要素 ID，仅用于信息
    pub id: &'a str,
}

impl<'a> Context<'a> {
    /// 创建上下文
    pub fn new(current_time_step: i64, total_steps: i64, timestamp: &'a str, id: &'a str) -> Self {
        Self {
            current_time_step,
            total_steps,
            timestamp,
            id,
        }
    }
}

/// 针对 BMI 模型的检查协议
///
/// 实现者只返回原始结果，严重程度由容器统一处理。
pub trait BmiProtocol: Send {
    /// 协议名（错误前缀与配置键）
    fn name(&self) -> &'static str;

    /// 探测模型是否支持该协议
    fn check_support(&mut self) -> ProtocolOutcome;

    /// 探测支持并读取 `properties` 中本协议的配置
    fn initialize(&mut self, properties: &serde_json::Value) -> ProtocolOutcome;

    /// 在一个时间步上运行
    fn run(&self, ctx: &Context<'_>) -> ProtocolOutcome;
}
