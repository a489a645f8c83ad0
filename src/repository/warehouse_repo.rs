// ==========================================
// 冷库仓储工单系统 - 库房状态仓储
// ==========================================
// 职责: 每个实体类的类型化读写, 加载时走归一化校验
// 规则:
// - 单个实体损坏 => 该实体回退默认值并记录日志, 其余实体不受影响
// - 跨进程变更通知与初始加载共用同一归一化路径
// - 变更后的持久化是 fire-and-forget, 失败只记录不上抛业务层
// ==========================================

use crate::config::WarehouseConfig;
use crate::domain::alert::Alert;
use crate::domain::boxes::create_initial_slots;
use crate::domain::order::WorkOrder;
use crate::domain::stats::WarehouseStats;
use crate::domain::warehouse::{WarehouseIdentity, WarehouseState};
use crate::domain::zone_store::ZoneStore;
use crate::repository::error::{RepositoryResult, ValidationResult};
use crate::repository::kv_store::{KvStore, StateKey};
use crate::repository::normalize;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

/// 旧版记录补发编号的发号闭包 (见 normalize::IdMint)
pub use crate::repository::normalize::IdMint;

pub struct WarehouseRepository {
    store: Arc<dyn KvStore>,
}

impl WarehouseRepository {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn kv_store(&self) -> Arc<dyn KvStore> {
        Arc::clone(&self.store)
    }

    /// 单实体加载: 缺失用默认值, 损坏用默认值并告警
    fn load_entity<T>(
        &self,
        key: StateKey,
        default: T,
        normalize: impl FnOnce(&Value) -> ValidationResult<T>,
    ) -> RepositoryResult<T> {
        match self.store.load(key)? {
            None => Ok(default),
            Some(value) => match normalize(&value) {
                Ok(entity) => Ok(entity),
                Err(e) => {
                    // 非致命: 可观测地回退默认值, 不向调用方上抛
                    let err = crate::repository::error::RepositoryError::MalformedState {
                        key: key.as_str().to_string(),
                        source: e,
                    };
                    tracing::warn!("{}, 已回退默认值", err);
                    Ok(default)
                }
            },
        }
    }

    // ==========================================
    // 配置
    // ==========================================

    pub fn load_config(&self) -> RepositoryResult<WarehouseConfig> {
        self.load_entity(StateKey::Config, WarehouseConfig::default(), |value| {
            serde_json::from_value(value.clone()).map_err(|_| {
                crate::repository::error::ValidationError::WrongShape {
                    expected: "配置对象",
                }
            })
        })
    }

    pub fn save_config(&self, config: &WarehouseConfig) -> RepositoryResult<()> {
        self.store
            .save(StateKey::Config, &serde_json::to_value(config)?)
    }

    // ==========================================
    // 全量加载
    // ==========================================

    /// 按实体独立加载全量状态
    ///
    /// mint_box: 旧版记录补发箱体编号
    /// mint_warehouse: 库房 id 缺失时一次性生成 (生成后立即落库)
    pub fn load_state(
        &self,
        config: &WarehouseConfig,
        mint_box: IdMint,
        mint_warehouse: IdMint,
    ) -> RepositoryResult<WarehouseState> {
        let expected_slots = config.total_slots as usize;
        let now_ms = Utc::now().timestamp_millis();

        let slots = self.load_entity(
            StateKey::Slots,
            create_initial_slots(config.total_slots),
            |value| normalize::normalize_slots(value, expected_slots, &mut *mint_box),
        )?;
        let inbound = self.load_entity(StateKey::InboundBoxes, Vec::new(), |value| {
            normalize::normalize_boxes(value, &mut *mint_box)
        })?;
        let outbound = self.load_entity(StateKey::OutboundBoxes, Vec::new(), |value| {
            normalize::normalize_boxes(value, &mut *mint_box)
        })?;
        let dispatched = self.load_entity(StateKey::Dispatched, Vec::new(), |value| {
            normalize::normalize_boxes(value, &mut *mint_box)
        })?;
        let orders = self.load_entity(StateKey::Orders, Vec::new(), |value| {
            normalize::normalize_orders(value, now_ms)
        })?;
        let stats = self.load_entity(
            StateKey::Stats,
            WarehouseStats::default(),
            normalize::normalize_stats,
        )?;
        let alerts = self.load_entity(StateKey::Alerts, Vec::new(), normalize::normalize_alerts)?;
        let identity = self.load_identity(mint_warehouse)?;

        Ok(WarehouseState {
            store: ZoneStore::from_parts(slots, inbound, outbound, dispatched),
            orders,
            stats,
            alerts,
            identity,
        })
    }

    fn load_identity(&self, mint_warehouse: IdMint) -> RepositoryResult<WarehouseIdentity> {
        let id = self.load_entity(StateKey::WarehouseId, String::new(), |value| {
            normalize::normalize_identity_string(value)
        })?;
        let name = self.load_entity(StateKey::WarehouseName, String::new(), |value| {
            normalize::normalize_identity_string(value)
        })?;

        // 库房 id 只生成一次, 生成即落库
        let id = if id.trim().is_empty() {
            let generated = mint_warehouse();
            self.store
                .save(StateKey::WarehouseId, &Value::String(generated.clone()))?;
            generated
        } else {
            id
        };

        Ok(WarehouseIdentity { id, name })
    }

    // ==========================================
    // 分实体保存
    // ==========================================

    pub fn save_zones(&self, store: &ZoneStore) -> RepositoryResult<()> {
        self.store
            .save(StateKey::Slots, &serde_json::to_value(store.storage())?)?;
        self.store
            .save(StateKey::InboundBoxes, &serde_json::to_value(store.inbound())?)?;
        self.store
            .save(StateKey::OutboundBoxes, &serde_json::to_value(store.outbound())?)?;
        self.store
            .save(StateKey::Dispatched, &serde_json::to_value(store.dispatched())?)?;
        Ok(())
    }

    pub fn save_orders(&self, orders: &[WorkOrder]) -> RepositoryResult<()> {
        self.store
            .save(StateKey::Orders, &serde_json::to_value(orders)?)
    }

    pub fn save_stats(&self, stats: &WarehouseStats) -> RepositoryResult<()> {
        self.store.save(StateKey::Stats, &serde_json::to_value(stats)?)
    }

    pub fn save_alerts(&self, alerts: &[Alert]) -> RepositoryResult<()> {
        self.store
            .save(StateKey::Alerts, &serde_json::to_value(alerts)?)
    }

    pub fn save_identity(&self, identity: &WarehouseIdentity) -> RepositoryResult<()> {
        self.store
            .save(StateKey::WarehouseId, &Value::String(identity.id.clone()))?;
        if !identity.name.trim().is_empty() {
            self.store
                .save(StateKey::WarehouseName, &Value::String(identity.name.trim().to_string()))?;
        }
        Ok(())
    }

    // ==========================================
    // 外部变更通知
    // ==========================================

    /// 应用跨进程变更通知 (与初始加载同一归一化路径)
    ///
    /// 返回 true 表示已应用; 未知键或损坏值忽略并返回 false
    pub fn apply_external_change(
        &self,
        state: &mut WarehouseState,
        key: &str,
        value: &Value,
        config: &WarehouseConfig,
        mint_box: IdMint,
    ) -> bool {
        let Some(key) = StateKey::parse(key) else {
            return false;
        };

        let applied: ValidationResult<()> = match key {
            StateKey::Slots => {
                normalize::normalize_slots(value, config.total_slots as usize, mint_box)
                    .map(|slots| state.store.replace_slots(slots))
            }
            StateKey::InboundBoxes => normalize::normalize_boxes(value, mint_box)
                .map(|boxes| state.store.replace_inbound(boxes)),
            StateKey::OutboundBoxes => normalize::normalize_boxes(value, mint_box)
                .map(|boxes| state.store.replace_outbound(boxes)),
            StateKey::Dispatched => normalize::normalize_boxes(value, mint_box)
                .map(|boxes| state.store.replace_dispatched(boxes)),
            StateKey::Orders => {
                normalize::normalize_orders(value, Utc::now().timestamp_millis())
                    .map(|orders| state.orders = orders)
            }
            StateKey::Stats => normalize::normalize_stats(value).map(|stats| state.stats = stats),
            StateKey::Alerts => {
                normalize::normalize_alerts(value).map(|alerts| state.alerts = alerts)
            }
            StateKey::WarehouseId => normalize::normalize_identity_string(value)
                .map(|id| state.identity.id = id),
            StateKey::WarehouseName => normalize::normalize_identity_string(value)
                .map(|name| state.identity.name = name),
            // 配置不走热更新, 重启生效
            StateKey::Config => return false,
        };

        match applied {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("外部变更通知数据损坏, 已忽略 (key={}): {}", key, e);
                false
            }
        }
    }
}
