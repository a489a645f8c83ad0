// ==========================================
// 冷库仓储工单系统 - 系统配置
// ==========================================
// 职责: 运行参数集中定义 (槽位数/温度阈值/超时窗口/刷新节奏)
// 存储: 持久化 KV 的 config 键, 缺省值兜底
// ==========================================

use serde::{Deserialize, Serialize};

/// 默认存储区槽位数
pub const DEFAULT_TOTAL_SLOTS: u32 = 12;

/// 默认高温阈值 (°C), 超过即进入聚合高温告警
pub const DEFAULT_HIGH_TEMPERATURE_C: f64 = 5.0;

/// 默认工单超时窗口 (毫秒): 2 分钟未执行即告警
pub const DEFAULT_ORDER_SLA_MS: i64 = 2 * 60 * 1000;

/// 默认告警刷新周期 (秒)
pub const DEFAULT_ALERT_TICK_SECS: u64 = 30;

// ==========================================
// OrderExpiryPolicy - 工单滞留策略
// ==========================================
// 默认不设取消路径、队列不设上限;
// 滞留处理作为可配置扩展点提供
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "ms")]
pub enum OrderExpiryPolicy {
    /// 工单永不过期 (默认)
    #[default]
    Never,
    /// 滞留超过指定毫秒数的工单在刷新时被丢弃
    ExpireAfterMs(i64),
}

// ==========================================
// WarehouseConfig - 库房配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WarehouseConfig {
    /// 存储区槽位总数
    pub total_slots: u32,
    /// 高温告警阈值 (°C), 严格大于触发
    pub high_temperature_c: f64,
    /// 工单超时窗口 (毫秒)
    pub order_sla_ms: i64,
    /// 告警刷新周期 (秒)
    pub alert_tick_secs: u64,
    /// 工单滞留策略
    pub expiry_policy: OrderExpiryPolicy,
    /// 是否允许班长显式取消工单 (扩展点, 默认关闭)
    pub allow_cancellation: bool,
    /// 是否启用复核工单与班长角色 (关闭即为简化变体)
    pub enable_review_orders: bool,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            total_slots: DEFAULT_TOTAL_SLOTS,
            high_temperature_c: DEFAULT_HIGH_TEMPERATURE_C,
            order_sla_ms: DEFAULT_ORDER_SLA_MS,
            alert_tick_secs: DEFAULT_ALERT_TICK_SECS,
            expiry_policy: OrderExpiryPolicy::default(),
            allow_cancellation: false,
            enable_review_orders: true,
        }
    }
}
