// ==========================================
// 冷库仓储工单系统 - 工单引擎
// ==========================================
// 职责: 工单创建/执行/发运/登记的状态机核心
// 不变量:
// - 同一 (来源库区, 来源位置) 最多一张待执行工单
// - 执行失败不留任何部分效果, 修正后可安全重试
// - 来源箱体在执行时重新解析, 不用创建时的副本
// 授权: 每个入口自查授权表, 不信任调用侧
// ==========================================

use crate::config::{OrderExpiryPolicy, WarehouseConfig};
use crate::domain::boxes::CargoBox;
use crate::domain::order::WorkOrder;
use crate::domain::types::{OrderType, Role, Zone};
use crate::domain::warehouse::WarehouseState;
use crate::domain::zone_store::StoreError;
use crate::engine::allocator::PositionAllocator;
use crate::engine::policy::{ActionKind, RolePolicy};
use crate::engine::sequence::IdService;
use chrono::{Local, Utc};
use std::sync::Arc;
use thiserror::Error;

// ==========================================
// OrderError - 工单业务错误
// ==========================================
// 全部为调用方可恢复错误, 携带操作员可读消息
#[derive(Error, Debug)]
pub enum OrderError {
    #[error("角色 {role} 无权进行{action}")]
    Unauthorized { role: Role, action: String },

    #[error("工单不存在: {0}")]
    OrderNotFound(String),

    #[error("位置无箱体: {zone}{position}")]
    BoxNotFound { zone: Zone, position: u32 },

    #[error("没有可派工的箱体 (均已有待执行工单或库区为空)")]
    NoEligibleSource,

    #[error("目标位置无效: {0}")]
    InvalidTarget(String),

    #[error("目标位置已被占用: {zone}{position}")]
    TargetOccupied { zone: Zone, position: u32 },

    #[error("来源箱体已不在 {zone}{position} (创建工单后被移走)")]
    SourceGone { zone: Zone, position: u32 },

    #[error("输入无效: {0}")]
    InvalidInput(String),

    #[error("复核工单未启用 (简化变体)")]
    ReviewDisabled,

    #[error("工单取消未启用 (见配置 allowCancellation)")]
    CancellationDisabled,

    // 校验通过后的库区操作失败, 单写者模型下不应出现
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type OrderResult<T> = Result<T, OrderError>;

/// 执行成功的结果摘要
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// 复核确认, 无库区变更
    Reviewed,
    /// 箱体已移入存储区目标槽位
    MovedToStorage { target: u32 },
    /// 箱体已移入出库区目标位置
    MovedToOutbound { target: u32 },
}

// ==========================================
// OrderEngine - 工单引擎
// ==========================================
pub struct OrderEngine {
    allocator: PositionAllocator,
    policy: Arc<RolePolicy>,
    ids: Arc<IdService>,
    config: WarehouseConfig,
}

impl OrderEngine {
    pub fn new(policy: Arc<RolePolicy>, ids: Arc<IdService>, config: WarehouseConfig) -> Self {
        Self {
            allocator: PositionAllocator::new(),
            policy,
            ids,
            config,
        }
    }

    pub fn allocator(&self) -> &PositionAllocator {
        &self.allocator
    }

    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    fn ensure(&self, role: Role, action: ActionKind) -> OrderResult<()> {
        if self.policy.permits(role, action) {
            Ok(())
        } else {
            Err(OrderError::Unauthorized {
                role,
                action: action.display_name().to_string(),
            })
        }
    }

    // ==========================================
    // 入库登记
    // ==========================================

    /// 登记新箱体到入库区下一空位
    pub fn register_inbound(
        &self,
        state: &mut WarehouseState,
        role: Role,
        name: &str,
        temperature: f64,
    ) -> OrderResult<CargoBox> {
        self.ensure(role, ActionKind::RegisterInbound)?;

        let name = name.trim();
        if name.is_empty() {
            return Err(OrderError::InvalidInput("货品名称不能为空".to_string()));
        }
        if !temperature.is_finite() {
            return Err(OrderError::InvalidInput("温度必须是有效数值".to_string()));
        }

        let position = self
            .allocator
            .next_free_position(state.store.inbound(), &Default::default());
        let cargo = CargoBox {
            position,
            auto_id: self.ids.new_box_id(),
            name: name.to_string(),
            temperature,
        };
        state.store.put_inbound(cargo.clone())?;
        state.stats.record_inbound();

        tracing::info!("入库登记: {} -> 入库区{}", cargo.auto_id, position);
        Ok(cargo)
    }

    // ==========================================
    // 工单创建
    // ==========================================

    /// 创建工单
    ///
    /// - ToStorage: 目标必须在可选存储目标集内 (空槽 − 预留)
    /// - ToOutbound: 来源限存储区, 目标总是按当前占用+预留重新计算,
    ///   调用方传入的目标被忽略
    /// - Review: 来源限存储区, 无目标
    ///
    /// 创建只入队, 不触达库区 (库区变更延迟到执行)
    pub fn create_order(
        &self,
        state: &mut WarehouseState,
        role: Role,
        order_type: OrderType,
        source_zone: Zone,
        source_position: u32,
        target: Option<u32>,
    ) -> OrderResult<WorkOrder> {
        self.ensure(role, ActionKind::CreateOrder)?;
        if !self.policy.permits_order_type(role, order_type) {
            return Err(OrderError::Unauthorized {
                role,
                action: format!("创建{}工单", order_type.display_name()),
            });
        }
        if order_type == OrderType::Review && !self.config.enable_review_orders {
            return Err(OrderError::ReviewDisabled);
        }

        // 类型级来源库区约束
        match order_type {
            OrderType::ToStorage => {
                if source_zone == Zone::Outbound {
                    return Err(OrderError::InvalidInput(
                        "移入存储区工单的来源只能是入库区或存储区".to_string(),
                    ));
                }
            }
            OrderType::ToOutbound | OrderType::Review => {
                if source_zone != Zone::Storage {
                    return Err(OrderError::InvalidInput(format!(
                        "{}工单的来源只能是存储区",
                        order_type.display_name()
                    )));
                }
            }
        }

        // 来源必须在可派工集合内 (排除已有待执行工单的箱体)
        let pending = self.allocator.pending_source_keys(&state.orders);
        let source_boxes = match source_zone {
            Zone::Inbound => state.store.inbound().to_vec(),
            Zone::Outbound => state.store.outbound().to_vec(),
            Zone::Storage => state.store.storage_boxes(),
        };
        let eligible = self
            .allocator
            .available_sources(source_zone, &source_boxes, &pending);
        if !eligible.iter().any(|b| b.position == source_position) {
            return Err(OrderError::NoEligibleSource);
        }

        // 目标判定
        let target_position = match order_type {
            OrderType::Review => None,
            OrderType::ToStorage => {
                let requested = target.ok_or_else(|| {
                    OrderError::InvalidTarget("移入存储区工单必须指定目标槽位".to_string())
                })?;
                let free = self.allocator.free_storage_positions(state.store.storage());
                let reserved = self
                    .allocator
                    .reserved_targets(&state.orders, OrderType::ToStorage);
                if !self
                    .allocator
                    .available_targets(&free, &reserved)
                    .contains(&requested)
                {
                    return Err(OrderError::InvalidTarget(format!(
                        "存储区{}不是可选空槽 (已占用或已被其他工单预留)",
                        requested
                    )));
                }
                Some(requested)
            }
            OrderType::ToOutbound => {
                let reserved = self
                    .allocator
                    .reserved_targets(&state.orders, OrderType::ToOutbound);
                Some(
                    self.allocator
                        .next_free_position(state.store.outbound(), &reserved),
                )
            }
        };

        let now = Local::now();
        let order = WorkOrder {
            id: self.ids.new_order_id(),
            order_type,
            source_zone,
            source_position,
            target_position,
            created_at: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            created_at_ms: Utc::now().timestamp_millis(),
            created_by: role,
        };
        state.orders.push(order.clone());

        tracing::info!("工单创建: {} [{}]", order.id, order.summary());
        Ok(order)
    }

    // ==========================================
    // 工单执行
    // ==========================================

    /// 执行工单
    ///
    /// 全部校验通过后才触达库区; 任何失败路径库区与队列原样不动,
    /// 修正后重试安全。执行成功即移除工单, 二次执行报 OrderNotFound
    pub fn execute_order(
        &self,
        state: &mut WarehouseState,
        role: Role,
        order_id: &str,
    ) -> OrderResult<ExecutionOutcome> {
        self.ensure(role, ActionKind::ExecuteOrder)?;

        let order = state
            .orders
            .iter()
            .find(|o| o.id == order_id)
            .cloned()
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))?;

        // 执行时重新解析来源箱体 (处理创建后被移走的竞态)
        let source = state
            .store
            .resolve_box(order.source_zone, order.source_position)
            .ok_or(OrderError::SourceGone {
                zone: order.source_zone,
                position: order.source_position,
            })?;

        // 持久层可能携带非法来源组合 (外部写入), 在触达库区前拦截
        if order.order_type != OrderType::Review && order.source_zone == Zone::Outbound {
            return Err(OrderError::InvalidInput(
                "出库区箱体只能通过发运离开".to_string(),
            ));
        }

        let outcome = match order.order_type {
            // 复核: 来源仍在即纯确认, 不触达库区不改统计
            OrderType::Review => ExecutionOutcome::Reviewed,

            OrderType::ToStorage => {
                let target = order.target_position.ok_or_else(|| {
                    OrderError::InvalidTarget("工单缺少目标槽位".to_string())
                })?;
                if order.source_zone == Zone::Storage && target == order.source_position {
                    return Err(OrderError::InvalidTarget(
                        "目标槽位必须不同于来源槽位".to_string(),
                    ));
                }
                // 目标占用在执行时重查 (创建后可能已被其他执行占走)
                if state.store.slot(target).map_err(|_| {
                    OrderError::InvalidTarget(format!("存储区{}越界", target))
                })?
                .is_occupied()
                {
                    return Err(OrderError::TargetOccupied {
                        zone: Zone::Storage,
                        position: target,
                    });
                }

                state.store.fill_slot(target, &source)?;
                self.clear_source(state, order.source_zone, order.source_position)?;
                state.stats.record_storage_move();
                ExecutionOutcome::MovedToStorage { target }
            }

            OrderType::ToOutbound => {
                let target = order.target_position.ok_or_else(|| {
                    OrderError::InvalidTarget("工单缺少出库目标位置".to_string())
                })?;
                if state.store.outbound().iter().any(|b| b.position == target) {
                    return Err(OrderError::TargetOccupied {
                        zone: Zone::Outbound,
                        position: target,
                    });
                }

                let mut moved = source.clone();
                moved.position = target;
                state.store.put_outbound(moved)?;
                self.clear_source(state, order.source_zone, order.source_position)?;
                state.stats.record_dispatch();
                ExecutionOutcome::MovedToOutbound { target }
            }
        };

        state.orders.retain(|o| o.id != order.id);
        tracing::info!("工单执行完成: {} [{}]", order.id, order.summary());
        Ok(outcome)
    }

    fn clear_source(&self, state: &mut WarehouseState, zone: Zone, position: u32) -> OrderResult<()> {
        match zone {
            Zone::Inbound => {
                state.store.remove_inbound(position)?;
            }
            Zone::Storage => {
                state.store.clear_slot(position)?;
            }
            Zone::Outbound => {
                return Err(OrderError::InvalidInput(
                    "出库区箱体只能通过发运离开".to_string(),
                ))
            }
        }
        Ok(())
    }

    // ==========================================
    // 出库发运
    // ==========================================

    /// 出库区箱体移入发运归档
    pub fn dispatch_from_outbound(
        &self,
        state: &mut WarehouseState,
        role: Role,
        position: u32,
    ) -> OrderResult<CargoBox> {
        self.ensure(role, ActionKind::Dispatch)?;

        let cargo = state
            .store
            .move_outbound_to_dispatched(position)
            .map_err(|_| OrderError::BoxNotFound {
                zone: Zone::Outbound,
                position,
            })?;
        tracing::info!("发运: {} 自出库区{}", cargo.auto_id, position);
        Ok(cargo)
    }

    // ==========================================
    // 工单重排 / 取消 / 过期 (告警处理与扩展点)
    // ==========================================

    /// 重排超时工单: 时间戳重置为当前, 下个刷新周期告警自然消失
    pub fn reschedule_order(
        &self,
        state: &mut WarehouseState,
        role: Role,
        order_id: &str,
    ) -> OrderResult<()> {
        self.ensure(role, ActionKind::ManageAlerts)?;

        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))?;
        order.created_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        order.created_at_ms = Utc::now().timestamp_millis();
        Ok(())
    }

    /// 显式取消工单 (扩展点, 默认关闭)
    pub fn cancel_order(
        &self,
        state: &mut WarehouseState,
        role: Role,
        order_id: &str,
    ) -> OrderResult<WorkOrder> {
        if !self.config.allow_cancellation {
            return Err(OrderError::CancellationDisabled);
        }
        self.ensure(role, ActionKind::CancelOrder)?;

        let index = state
            .orders
            .iter()
            .position(|o| o.id == order_id)
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))?;
        Ok(state.orders.remove(index))
    }

    /// 按滞留策略丢弃过期工单, 返回被丢弃的工单
    ///
    /// 默认策略 Never 下恒为空 (队列无上限)
    pub fn expire_stale_orders(&self, state: &mut WarehouseState, now_ms: i64) -> Vec<WorkOrder> {
        let OrderExpiryPolicy::ExpireAfterMs(limit) = self.config.expiry_policy else {
            return Vec::new();
        };

        let (expired, kept): (Vec<WorkOrder>, Vec<WorkOrder>) = state
            .orders
            .drain(..)
            .partition(|o| now_ms - o.created_at_ms >= limit);
        state.orders = kept;
        for order in &expired {
            tracing::warn!("工单滞留超限被丢弃: {} [{}]", order.id, order.summary());
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::sequence::{KvSequenceGenerator, SequenceGenerator};
    use crate::repository::kv_store::MemoryKvStore;

    fn engine_with(config: WarehouseConfig) -> OrderEngine {
        let store = Arc::new(MemoryKvStore::new());
        let ids = Arc::new(IdService::new(Arc::new(KvSequenceGenerator::new(store))));
        OrderEngine::new(Arc::new(RolePolicy::standard()), ids, config)
    }

    fn engine() -> OrderEngine {
        engine_with(WarehouseConfig::default())
    }

    fn state() -> WarehouseState {
        WarehouseState::new(12)
    }

    #[test]
    fn test_register_inbound_分配最小空位() {
        let engine = engine();
        let mut state = state();

        let first = engine
            .register_inbound(&mut state, Role::Custodian, "鳕鱼", -1.0)
            .expect("登记失败");
        assert_eq!(first.position, 1);
        let second = engine
            .register_inbound(&mut state, Role::Custodian, "虾仁", 2.0)
            .expect("登记失败");
        assert_eq!(second.position, 2);
        assert_eq!(state.stats.inbound_total, 2);
    }

    #[test]
    fn test_register_inbound_越权拒绝() {
        let engine = engine();
        let mut state = state();
        let err = engine
            .register_inbound(&mut state, Role::Operator, "鳕鱼", -1.0)
            .unwrap_err();
        assert!(matches!(err, OrderError::Unauthorized { .. }));
        assert_eq!(state.stats.inbound_total, 0);
    }

    #[test]
    fn test_create_order_重复来源拒绝() {
        let engine = engine();
        let mut state = state();
        engine
            .register_inbound(&mut state, Role::Custodian, "鳕鱼", -1.0)
            .unwrap();

        engine
            .create_order(&mut state, Role::Supervisor, OrderType::ToStorage, Zone::Inbound, 1, Some(3))
            .expect("首单应成功");
        // 同一来源第二单被拒 (不变量: 来源唯一)
        let err = engine
            .create_order(&mut state, Role::Supervisor, OrderType::ToStorage, Zone::Inbound, 1, Some(4))
            .unwrap_err();
        assert!(matches!(err, OrderError::NoEligibleSource));
        assert_eq!(state.orders.len(), 1);
    }

    #[test]
    fn test_create_order_预留目标不可重复选() {
        let engine = engine();
        let mut state = state();
        engine.register_inbound(&mut state, Role::Custodian, "a", 0.0).unwrap();
        engine.register_inbound(&mut state, Role::Custodian, "b", 0.0).unwrap();

        engine
            .create_order(&mut state, Role::Supervisor, OrderType::ToStorage, Zone::Inbound, 1, Some(5))
            .unwrap();
        let err = engine
            .create_order(&mut state, Role::Supervisor, OrderType::ToStorage, Zone::Inbound, 2, Some(5))
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidTarget(_)));
    }

    #[test]
    fn test_create_to_outbound_目标自动计算并忽略传入值() {
        let engine = engine();
        let mut state = state();
        state.store.fill_slot(2, &CargoBox {
            position: 2,
            auto_id: "B1".to_string(),
            name: "箱".to_string(),
            temperature: 0.0,
        }).unwrap();

        let order = engine
            .create_order(&mut state, Role::Supervisor, OrderType::ToOutbound, Zone::Storage, 2, Some(99))
            .expect("创建失败");
        assert_eq!(order.target_position, Some(1));
    }

    #[test]
    fn test_execute_order_二次执行_OrderNotFound() {
        let engine = engine();
        let mut state = state();
        engine.register_inbound(&mut state, Role::Custodian, "鳕鱼", -1.0).unwrap();
        let order = engine
            .create_order(&mut state, Role::Supervisor, OrderType::ToStorage, Zone::Inbound, 1, Some(3))
            .unwrap();

        engine
            .execute_order(&mut state, Role::Operator, &order.id)
            .expect("首次执行应成功");
        let err = engine
            .execute_order(&mut state, Role::Operator, &order.id)
            .unwrap_err();
        // 幂等安全: 第二次执行不重复生效
        assert!(matches!(err, OrderError::OrderNotFound(_)));
        assert_eq!(state.stats.storage_move_total, 1);
    }

    #[test]
    fn test_execute_order_来源消失() {
        let engine = engine();
        let mut state = state();
        engine.register_inbound(&mut state, Role::Custodian, "鳕鱼", -1.0).unwrap();
        let order = engine
            .create_order(&mut state, Role::Supervisor, OrderType::ToStorage, Zone::Inbound, 1, Some(3))
            .unwrap();

        // 工单创建后箱体被其他动作移走
        state.store.remove_inbound(1).unwrap();

        let err = engine
            .execute_order(&mut state, Role::Operator, &order.id)
            .unwrap_err();
        assert!(matches!(err, OrderError::SourceGone { .. }));
        // 失败不动队列
        assert_eq!(state.orders.len(), 1);
    }

    #[test]
    fn test_review_执行为纯确认() {
        let engine = engine();
        let mut state = state();
        state.store.fill_slot(4, &CargoBox {
            position: 4,
            auto_id: "B1".to_string(),
            name: "箱".to_string(),
            temperature: 0.0,
        }).unwrap();

        let order = engine
            .create_order(&mut state, Role::Supervisor, OrderType::Review, Zone::Storage, 4, None)
            .unwrap();
        let outcome = engine
            .execute_order(&mut state, Role::Operator, &order.id)
            .unwrap();
        assert_eq!(outcome, ExecutionOutcome::Reviewed);
        // 无库区变更, 无统计变更
        assert!(state.store.slot(4).unwrap().is_occupied());
        assert_eq!(state.stats.storage_move_total, 0);
        assert!(state.orders.is_empty());
    }

    #[test]
    fn test_cancel_order_默认关闭() {
        let engine = engine();
        let mut state = state();
        let err = engine
            .cancel_order(&mut state, Role::Supervisor, "任意")
            .unwrap_err();
        assert!(matches!(err, OrderError::CancellationDisabled));
    }

    #[test]
    fn test_expire_stale_orders_策略开启后生效() {
        let config = WarehouseConfig {
            expiry_policy: OrderExpiryPolicy::ExpireAfterMs(1000),
            ..WarehouseConfig::default()
        };
        let engine = engine_with(config);
        let mut state = state();
        engine.register_inbound(&mut state, Role::Custodian, "鳕鱼", -1.0).unwrap();
        let order = engine
            .create_order(&mut state, Role::Supervisor, OrderType::ToStorage, Zone::Inbound, 1, Some(3))
            .unwrap();

        let expired = engine.expire_stale_orders(&mut state, order.created_at_ms + 2000);
        assert_eq!(expired.len(), 1);
        assert!(state.orders.is_empty());
    }

    #[test]
    fn test_review_变体关闭后拒绝() {
        let config = WarehouseConfig {
            enable_review_orders: false,
            ..WarehouseConfig::default()
        };
        let engine = engine_with(config);
        let mut state = state();
        state.store.fill_slot(1, &CargoBox {
            position: 1,
            auto_id: "B1".to_string(),
            name: "箱".to_string(),
            temperature: 0.0,
        }).unwrap();

        let err = engine
            .create_order(&mut state, Role::Supervisor, OrderType::Review, Zone::Storage, 1, None)
            .unwrap_err();
        assert!(matches!(err, OrderError::ReviewDisabled));
    }

    // 发号器故障时登记仍可用 (随机后缀兜底)
    struct FailingGenerator;
    impl SequenceGenerator for FailingGenerator {
        fn next(&self, _prefix: &str, _date_key: &str) -> crate::repository::error::RepositoryResult<u32> {
            Err(crate::repository::error::RepositoryError::InternalError(
                "计数器不可用".to_string(),
            ))
        }
    }

    #[test]
    fn test_register_inbound_发号器故障兜底() {
        let ids = Arc::new(IdService::new(Arc::new(FailingGenerator)));
        let engine = OrderEngine::new(
            Arc::new(RolePolicy::standard()),
            ids,
            WarehouseConfig::default(),
        );
        let mut state = state();
        let cargo = engine
            .register_inbound(&mut state, Role::Custodian, "鳕鱼", -1.0)
            .expect("登记不应因发号器故障失败");
        assert!(cargo.auto_id.starts_with("BOX-"));
    }
}
