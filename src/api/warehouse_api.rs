// ==========================================
// 冷库仓储工单系统 - 库房命令 API
// ==========================================
// 职责: 对外命令面 (登记/派工/执行/发运/告警处理/检索)
// 并发: 单写者协作模型, 全量状态由 Mutex 独占,
//       每条命令在锁内同步完成
// 持久化: 成功变更后 fire-and-forget 落库, 失败只记日志
// 授权: 每个变更入口自查授权表 (引擎入口亦自查)
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{OrderExpiryPolicy, WarehouseConfig};
use crate::domain::alert::{Alert, REPORT_ALERT_PREFIX, TEMPERATURE_ALERT_ID};
use crate::domain::boxes::CargoBox;
use crate::domain::order::{head_of_queue, sorted_queue, WorkOrder};
use crate::domain::stats::WarehouseStats;
use crate::domain::types::{AlertReason, OrderType, Role, Zone};
use crate::domain::warehouse::{WarehouseIdentity, WarehouseState};
use crate::engine::alerts::{build_report_alert, recompute_alerts};
use crate::engine::events::{SharedPublisher, WarehouseEvent, WarehouseEventType};
use crate::engine::orders::{ExecutionOutcome, OrderEngine};
use crate::engine::policy::{ActionKind, RolePolicy};
use crate::engine::sequence::IdService;
use crate::repository::error::RepositoryError;
use crate::repository::warehouse_repo::WarehouseRepository;
use chrono::{Local, Utc};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

/// 库区总览快照 (只读查询结果)
#[derive(Debug, Clone)]
pub struct ZoneOverview {
    pub inbound: Vec<CargoBox>,
    pub storage_occupied: Vec<CargoBox>,
    pub outbound: Vec<CargoBox>,
    pub dispatched: Vec<CargoBox>,
    pub occupied_count: usize,
    pub total_slots: u32,
}

// ==========================================
// WarehouseApi - 库房命令 API
// ==========================================
pub struct WarehouseApi {
    state: Mutex<WarehouseState>,
    engine: OrderEngine,
    policy: Arc<RolePolicy>,
    ids: Arc<IdService>,
    repo: Arc<WarehouseRepository>,
    config: WarehouseConfig,
    publisher: Option<SharedPublisher>,
}

impl WarehouseApi {
    pub fn new(
        state: WarehouseState,
        engine: OrderEngine,
        policy: Arc<RolePolicy>,
        ids: Arc<IdService>,
        repo: Arc<WarehouseRepository>,
        config: WarehouseConfig,
        publisher: Option<SharedPublisher>,
    ) -> Self {
        Self {
            state: Mutex::new(state),
            engine,
            policy,
            ids,
            repo,
            config,
            publisher,
        }
    }

    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    fn lock(&self) -> ApiResult<MutexGuard<'_, WarehouseState>> {
        self.state
            .lock()
            .map_err(|e| ApiError::Repository(RepositoryError::LockError(e.to_string())))
    }

    fn ensure(&self, role: Role, action: ActionKind) -> ApiResult<()> {
        if self.policy.permits(role, action) {
            Ok(())
        } else {
            Err(ApiError::Unauthorized {
                role,
                action: action.display_name().to_string(),
            })
        }
    }

    fn publish(&self, event_type: WarehouseEventType, source: &str) {
        if let Some(publisher) = &self.publisher {
            publisher.publish(WarehouseEvent::new(event_type, source));
        }
    }

    // 持久化失败不回滚内存状态: 外部持久化是协作方职责,
    // 此处 fire-and-forget, 仅保证可观测
    fn persist_zones(&self, state: &WarehouseState) {
        if let Err(e) = self.repo.save_zones(&state.store) {
            tracing::warn!("库区持久化失败: {}", e);
        }
    }

    fn persist_orders(&self, state: &WarehouseState) {
        if let Err(e) = self.repo.save_orders(&state.orders) {
            tracing::warn!("工单持久化失败: {}", e);
        }
    }

    fn persist_stats(&self, state: &WarehouseState) {
        if let Err(e) = self.repo.save_stats(&state.stats) {
            tracing::warn!("统计持久化失败: {}", e);
        }
    }

    fn persist_alerts(&self, state: &WarehouseState) {
        if let Err(e) = self.repo.save_alerts(&state.alerts) {
            tracing::warn!("告警持久化失败: {}", e);
        }
    }

    /// 变更后的告警重算 (锁内调用)
    fn refresh_alerts_locked(&self, state: &mut WarehouseState, now_ms: i64) {
        state.alerts = recompute_alerts(
            &state.store,
            &state.orders,
            &state.alerts,
            now_ms,
            &self.config,
        );
    }

    fn now_ms() -> i64 {
        Utc::now().timestamp_millis()
    }

    // ==========================================
    // 入库登记
    // ==========================================

    pub fn register_inbound(&self, role: Role, name: &str, temperature: f64) -> ApiResult<CargoBox> {
        let mut state = self.lock()?;
        let cargo = self
            .engine
            .register_inbound(&mut state, role, name, temperature)?;

        self.refresh_alerts_locked(&mut state, Self::now_ms());
        self.persist_zones(&state);
        self.persist_stats(&state);
        self.persist_alerts(&state);
        drop(state);

        self.publish(WarehouseEventType::ZonesChanged, "register_inbound");
        Ok(cargo)
    }

    // ==========================================
    // 工单命令
    // ==========================================

    pub fn create_order(
        &self,
        role: Role,
        order_type: OrderType,
        source_zone: Zone,
        source_position: u32,
        target: Option<u32>,
    ) -> ApiResult<WorkOrder> {
        let mut state = self.lock()?;
        let order = self.engine.create_order(
            &mut state,
            role,
            order_type,
            source_zone,
            source_position,
            target,
        )?;

        self.persist_orders(&state);
        drop(state);

        self.publish(WarehouseEventType::OrdersChanged, "create_order");
        Ok(order)
    }

    /// 复核工单便捷入口 (来源固定为存储区)
    pub fn create_review_order(&self, role: Role, source_position: u32) -> ApiResult<WorkOrder> {
        self.create_order(role, OrderType::Review, Zone::Storage, source_position, None)
    }

    pub fn execute_order(&self, role: Role, order_id: &str) -> ApiResult<ExecutionOutcome> {
        let mut state = self.lock()?;
        let outcome = self.engine.execute_order(&mut state, role, order_id)?;

        self.refresh_alerts_locked(&mut state, Self::now_ms());
        self.persist_zones(&state);
        self.persist_orders(&state);
        self.persist_stats(&state);
        self.persist_alerts(&state);
        drop(state);

        self.publish(WarehouseEventType::OrdersChanged, "execute_order");
        Ok(outcome)
    }

    pub fn dispatch_from_outbound(&self, role: Role, position: u32) -> ApiResult<CargoBox> {
        let mut state = self.lock()?;
        let cargo = self.engine.dispatch_from_outbound(&mut state, role, position)?;

        self.refresh_alerts_locked(&mut state, Self::now_ms());
        self.persist_zones(&state);
        drop(state);

        self.publish(WarehouseEventType::ZonesChanged, "dispatch_from_outbound");
        Ok(cargo)
    }

    pub fn cancel_order(&self, role: Role, order_id: &str) -> ApiResult<WorkOrder> {
        let mut state = self.lock()?;
        let order = self.engine.cancel_order(&mut state, role, order_id)?;

        self.refresh_alerts_locked(&mut state, Self::now_ms());
        self.persist_orders(&state);
        self.persist_alerts(&state);
        drop(state);

        self.publish(WarehouseEventType::OrdersChanged, "cancel_order");
        Ok(order)
    }

    // ==========================================
    // 告警处理
    // ==========================================

    /// 操作员对工单上报故障, 生成持久告警
    pub fn report_failure(
        &self,
        role: Role,
        order_id: &str,
        reporter_display_name: &str,
    ) -> ApiResult<Alert> {
        self.ensure(role, ActionKind::ReportFailure)?;

        let mut state = self.lock()?;
        let order = state
            .orders
            .iter()
            .find(|o| o.id == order_id)
            .cloned()
            .ok_or_else(|| {
                ApiError::Order(crate::engine::orders::OrderError::OrderNotFound(
                    order_id.to_string(),
                ))
            })?;

        let alert = build_report_alert(
            format!("{}{}", REPORT_ALERT_PREFIX, self.ids.new_report_suffix()),
            &order,
            reporter_display_name,
            &Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        );
        state.alerts.insert(0, alert.clone());
        self.persist_alerts(&state);
        drop(state);

        self.publish(WarehouseEventType::AlertsChanged, "report_failure");
        Ok(alert)
    }

    /// 解决告警 (从活动集移除)
    ///
    /// 超时/高温告警的成因若仍存在, 下轮重算会重新产生;
    /// 人工上报只能经此路径消失
    pub fn resolve_alert(&self, role: Role, alert_id: &str) -> ApiResult<()> {
        self.ensure(role, ActionKind::ManageAlerts)?;

        let mut state = self.lock()?;
        let before = state.alerts.len();
        state.alerts.retain(|a| a.id != alert_id);
        if state.alerts.len() == before {
            return Err(ApiError::AlertNotFound(alert_id.to_string()));
        }
        self.persist_alerts(&state);
        drop(state);

        self.publish(WarehouseEventType::AlertsChanged, "resolve_alert");
        Ok(())
    }

    /// 给告警附加处理原因标注
    pub fn set_alert_reason(&self, role: Role, alert_id: &str, reason: AlertReason) -> ApiResult<()> {
        self.ensure(role, ActionKind::ManageAlerts)?;

        let mut state = self.lock()?;
        let alert = state
            .alerts
            .iter_mut()
            .find(|a| a.id == alert_id)
            .ok_or_else(|| ApiError::AlertNotFound(alert_id.to_string()))?;
        alert.reason = Some(reason);
        self.persist_alerts(&state);
        Ok(())
    }

    /// 以修正温度的方式处理高温告警
    ///
    /// 修正后立即重算: 若仍有超温箱体, 聚合告警携新描述重现
    pub fn resolve_temperature_alert(
        &self,
        role: Role,
        zone: Zone,
        position: u32,
        new_temperature: f64,
    ) -> ApiResult<()> {
        self.ensure(role, ActionKind::ManageAlerts)?;
        if !new_temperature.is_finite() {
            return Err(ApiError::InvalidInput("温度必须是有效数值".to_string()));
        }

        let mut state = self.lock()?;
        state
            .store
            .set_box_temperature(zone, position, new_temperature)
            .map_err(crate::engine::orders::OrderError::from)
            .map_err(ApiError::from)?;
        state.alerts.retain(|a| a.id != TEMPERATURE_ALERT_ID);
        self.refresh_alerts_locked(&mut state, Self::now_ms());
        self.persist_zones(&state);
        self.persist_alerts(&state);
        drop(state);

        self.publish(WarehouseEventType::ZonesChanged, "resolve_temperature_alert");
        Ok(())
    }

    /// 以重排的方式处理工单超时告警: 时间戳重置并移除告警
    pub fn reschedule_order(&self, role: Role, order_id: &str) -> ApiResult<()> {
        let mut state = self.lock()?;
        self.engine.reschedule_order(&mut state, role, order_id)?;

        let alert_id = crate::domain::alert::order_alert_id(order_id);
        state.alerts.retain(|a| a.id != alert_id);
        self.persist_orders(&state);
        self.persist_alerts(&state);
        drop(state);

        self.publish(WarehouseEventType::OrdersChanged, "reschedule_order");
        Ok(())
    }

    // ==========================================
    // 告警刷新 (周期任务与变更触发共用)
    // ==========================================

    /// 按当前时刻刷新告警
    pub fn refresh_alerts(&self) -> ApiResult<usize> {
        self.refresh_alerts_at(Self::now_ms())
    }

    /// 按指定时刻刷新告警 (测试与回放场景)
    ///
    /// 同时按滞留策略丢弃过期工单 (默认策略下无操作)
    pub fn refresh_alerts_at(&self, now_ms: i64) -> ApiResult<usize> {
        let mut state = self.lock()?;

        if self.config.expiry_policy != OrderExpiryPolicy::Never {
            let expired = self.engine.expire_stale_orders(&mut state, now_ms);
            if !expired.is_empty() {
                self.persist_orders(&state);
            }
        }

        self.refresh_alerts_locked(&mut state, now_ms);
        let count = state.alerts.len();
        self.persist_alerts(&state);
        drop(state);

        self.publish(WarehouseEventType::AlertsChanged, "refresh_alerts");
        Ok(count)
    }

    // ==========================================
    // 外部变更通知
    // ==========================================

    /// 应用跨进程变更通知, 返回是否生效
    pub fn apply_external_change(&self, key: &str, value: &Value) -> ApiResult<bool> {
        let mut state = self.lock()?;
        let ids = Arc::clone(&self.ids);
        let mut mint = move || ids.new_box_id();
        let applied =
            self.repo
                .apply_external_change(&mut state, key, value, &self.config, &mut mint);
        if applied {
            self.refresh_alerts_locked(&mut state, Self::now_ms());
        }
        Ok(applied)
    }

    // ==========================================
    // 检索与库房命名
    // ==========================================

    /// 按编号或名称精确检索箱体位置
    pub fn search_box(&self, role: Role, query: &str) -> ApiResult<Option<(Zone, CargoBox)>> {
        self.ensure(role, ActionKind::SearchBoxes)?;
        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::InvalidInput("请输入要检索的编号或名称".to_string()));
        }
        let state = self.lock()?;
        Ok(state.store.find_box(query))
    }

    /// 修改库房显示名
    pub fn rename_warehouse(&self, role: Role, name: &str) -> ApiResult<()> {
        self.ensure(role, ActionKind::RenameWarehouse)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::InvalidInput("库房名称不能为空".to_string()));
        }

        let mut state = self.lock()?;
        state.identity.name = name.to_string();
        if let Err(e) = self.repo.save_identity(&state.identity) {
            tracing::warn!("库房标识持久化失败: {}", e);
        }
        drop(state);

        self.publish(WarehouseEventType::IdentityChanged, "rename_warehouse");
        Ok(())
    }

    // ==========================================
    // 只读查询
    // ==========================================

    /// 库区总览 (需要总览权限)
    pub fn zone_overview(&self, role: Role) -> ApiResult<ZoneOverview> {
        self.ensure(role, ActionKind::ViewZones)?;
        let state = self.lock()?;
        Ok(ZoneOverview {
            inbound: state.store.inbound().to_vec(),
            storage_occupied: state.store.storage_boxes(),
            outbound: state.store.outbound().to_vec(),
            dispatched: state.store.dispatched().to_vec(),
            occupied_count: state.store.occupied_count(),
            total_slots: state.store.total_slots(),
        })
    }

    pub fn identity(&self) -> ApiResult<WarehouseIdentity> {
        Ok(self.lock()?.identity.clone())
    }

    pub fn stats(&self) -> ApiResult<WarehouseStats> {
        Ok(self.lock()?.stats)
    }

    /// 待执行工单 (最旧在前)
    pub fn pending_orders(&self) -> ApiResult<Vec<WorkOrder>> {
        let state = self.lock()?;
        Ok(sorted_queue(&state.orders).into_iter().cloned().collect())
    }

    /// 队首工单
    pub fn next_order(&self) -> ApiResult<Option<WorkOrder>> {
        let state = self.lock()?;
        Ok(head_of_queue(&state.orders).cloned())
    }

    pub fn alerts(&self) -> ApiResult<Vec<Alert>> {
        Ok(self.lock()?.alerts.clone())
    }

    /// 存储区快照
    pub fn storage_slots(&self) -> ApiResult<Vec<crate::domain::boxes::StorageSlot>> {
        Ok(self.lock()?.store.storage().to_vec())
    }

    /// 当前可选存储目标 (空槽 − 预留)
    pub fn available_storage_targets(&self) -> ApiResult<Vec<u32>> {
        let state = self.lock()?;
        let allocator = self.engine.allocator();
        let free = allocator.free_storage_positions(state.store.storage());
        let reserved = allocator.reserved_targets(&state.orders, OrderType::ToStorage);
        Ok(allocator.available_targets(&free, &reserved))
    }

    /// 指定库区当前可派工箱体
    pub fn available_sources(&self, zone: Zone) -> ApiResult<Vec<CargoBox>> {
        let state = self.lock()?;
        let allocator = self.engine.allocator();
        let pending = allocator.pending_source_keys(&state.orders);
        let boxes = match zone {
            Zone::Inbound => state.store.inbound().to_vec(),
            Zone::Outbound => state.store.outbound().to_vec(),
            Zone::Storage => state.store.storage_boxes(),
        };
        Ok(allocator
            .available_sources(zone, &boxes, &pending)
            .into_iter()
            .cloned()
            .collect())
    }
}
