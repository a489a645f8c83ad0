// ==========================================
// 冷库仓储工单系统 - 服务层
// ==========================================
// 职责: 引擎之上的长生命周期服务 (告警刷新)
// ==========================================

pub mod alert_refresh;

// 重导出
pub use alert_refresh::{spawn_periodic_refresh, AlertRefreshService, RefreshTrigger};
