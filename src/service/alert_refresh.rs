// ==========================================
// 冷库仓储工单系统 - 告警刷新服务
// ==========================================
// 职责: 驱动告警重算 (周期定时 + 变更触发 + 手动)
// 说明: 重算对库区/工单只读, 结果整体替换告警集,
//       与命令互不冲突 (共用同一把状态锁)
// ==========================================

use crate::api::error::ApiResult;
use crate::api::warehouse_api::WarehouseApi;
use std::sync::Arc;
use std::time::Duration;

/// 刷新触发类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// 周期定时
    PeriodicTick,
    /// 库区/工单变更
    StoreMutated,
    /// 手动刷新
    ManualRefresh,
}

impl RefreshTrigger {
    pub fn as_str(&self) -> &str {
        match self {
            RefreshTrigger::PeriodicTick => "PeriodicTick",
            RefreshTrigger::StoreMutated => "StoreMutated",
            RefreshTrigger::ManualRefresh => "ManualRefresh",
        }
    }
}

// ==========================================
// AlertRefreshService - 告警刷新服务
// ==========================================
pub struct AlertRefreshService {
    api: Arc<WarehouseApi>,
}

impl AlertRefreshService {
    pub fn new(api: Arc<WarehouseApi>) -> Self {
        Self { api }
    }

    /// 执行一轮刷新, 返回刷新后的活动告警数
    pub fn refresh(&self, trigger: RefreshTrigger) -> ApiResult<usize> {
        let count = self.api.refresh_alerts()?;
        tracing::debug!("告警刷新完成 (trigger={}): {} 条活动告警", trigger.as_str(), count);
        Ok(count)
    }
}


/// 启动周期刷新任务 (节奏取配置 alertTickSecs)
///
/// 任务永不阻塞命令路径: 每轮只在状态锁内做一次同步重算
pub fn spawn_periodic_refresh(api: Arc<WarehouseApi>) -> tokio::task::JoinHandle<()> {
    let tick = Duration::from_secs(api.config().alert_tick_secs);
    let service = AlertRefreshService::new(api);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick);
        // 首个立即完成的 tick 跳过, 从一个完整周期后开始
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = service.refresh(RefreshTrigger::PeriodicTick) {
                tracing::warn!("周期告警刷新失败: {}", e);
            }
        }
    })
}
