// ==========================================
// 冷库仓储工单系统 - 引擎层事件发布
// ==========================================
// 职责: 定义仓储事件发布 trait, 实现依赖倒置
// 说明: Engine/API 层定义 trait, 外部总线实现适配器;
//       跨进程同步是协作方的职责, 本系统发完即走
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ==========================================
// 仓储事件类型
// ==========================================

/// 仓储事件触发类型
///
/// 每次成功变更后发布, 用于触发告警重算与外部同步
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarehouseEventType {
    /// 库区内容变更 (登记/移动/发运)
    ZonesChanged,
    /// 工单队列变更 (创建/执行/取消/重排)
    OrdersChanged,
    /// 告警集合变更 (上报/解决/重算)
    AlertsChanged,
    /// 统计计数变更
    StatsChanged,
    /// 库房标识变更
    IdentityChanged,
}

impl WarehouseEventType {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            WarehouseEventType::ZonesChanged => "ZonesChanged",
            WarehouseEventType::OrdersChanged => "OrdersChanged",
            WarehouseEventType::AlertsChanged => "AlertsChanged",
            WarehouseEventType::StatsChanged => "StatsChanged",
            WarehouseEventType::IdentityChanged => "IdentityChanged",
        }
    }
}

/// 仓储事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseEvent {
    /// 事件类型
    pub event_type: WarehouseEventType,
    /// 事件来源描述 (命令名)
    pub source: String,
}

impl WarehouseEvent {
    pub fn new(event_type: WarehouseEventType, source: impl Into<String>) -> Self {
        Self {
            event_type,
            source: source.into(),
        }
    }
}

// ==========================================
// WarehouseEventPublisher - 事件发布能力
// ==========================================
pub trait WarehouseEventPublisher: Send + Sync {
    /// 发布事件 (fire-and-forget, 失败由实现方记录)
    fn publish(&self, event: WarehouseEvent);
}

/// 空实现: 无下游订阅时使用
pub struct NoopEventPublisher;

impl WarehouseEventPublisher for NoopEventPublisher {
    fn publish(&self, _event: WarehouseEvent) {}
}

/// 便捷别名
pub type SharedPublisher = Arc<dyn WarehouseEventPublisher>;
