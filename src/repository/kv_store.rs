// ==========================================
// 冷库仓储工单系统 - 持久化 KV 接口
// ==========================================
// 职责: 外部键值持久化协作方的接口定义
// 布局: 每个实体类一个逻辑键, 值为 JSON
// 说明: 跨进程变更通知走同一归一化路径
//       (WarehouseRepository::apply_external_change)
// ==========================================

use crate::repository::error::RepositoryResult;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

// ==========================================
// StateKey - 持久化实体键
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
    Slots,         // 存储区槽位 (定长数组)
    InboundBoxes,  // 入库区箱体列表
    OutboundBoxes, // 出库区箱体列表
    Dispatched,    // 发运归档列表
    Orders,        // 工单队列
    Stats,         // 运行统计
    WarehouseId,   // 库房 id (字符串)
    WarehouseName, // 库房显示名 (字符串)
    Config,        // 库房配置
    Alerts,        // 告警集合 (人工上报跨重启保留)
}

impl StateKey {
    /// 持久化键名 (v1 为布局版本号)
    pub fn as_str(&self) -> &'static str {
        match self {
            StateKey::Slots => "warehouseSlotsV1",
            StateKey::InboundBoxes => "warehouseInboundV1",
            StateKey::OutboundBoxes => "warehouseOutboundV1",
            StateKey::Dispatched => "warehouseDispatchedV1",
            StateKey::Orders => "warehouseOrdersV1",
            StateKey::Stats => "warehouseStatsV1",
            StateKey::WarehouseId => "warehouseIdV1",
            StateKey::WarehouseName => "warehouseNameV1",
            StateKey::Config => "warehouseConfigV1",
            StateKey::Alerts => "warehouseAlertsV1",
        }
    }

    /// 从持久化键名解析 (外部变更通知入口)
    pub fn parse(value: &str) -> Option<StateKey> {
        match value {
            "warehouseSlotsV1" => Some(StateKey::Slots),
            "warehouseInboundV1" => Some(StateKey::InboundBoxes),
            "warehouseOutboundV1" => Some(StateKey::OutboundBoxes),
            "warehouseDispatchedV1" => Some(StateKey::Dispatched),
            "warehouseOrdersV1" => Some(StateKey::Orders),
            "warehouseStatsV1" => Some(StateKey::Stats),
            "warehouseIdV1" => Some(StateKey::WarehouseId),
            "warehouseNameV1" => Some(StateKey::WarehouseName),
            "warehouseConfigV1" => Some(StateKey::Config),
            "warehouseAlertsV1" => Some(StateKey::Alerts),
            _ => None,
        }
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// KvStore - 键值存储能力
// ==========================================
pub trait KvStore: Send + Sync {
    /// 读取键值 (不存在返回 None)
    fn load(&self, key: StateKey) -> RepositoryResult<Option<Value>>;

    /// 写入键值 (整值替换)
    fn save(&self, key: StateKey, value: &Value) -> RepositoryResult<()>;

    /// 计数器原子自增并返回新值 (序列发号器使用)
    ///
    /// counter_key 不在 StateKey 枚举内, 形如 "auto-counter:<prefix>:<date>"
    fn next_counter(&self, counter_key: &str) -> RepositoryResult<u32>;
}

// ==========================================
// MemoryKvStore - 内存实现
// ==========================================
// 测试与无持久化运行场景
#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, Value>>,
    counters: Mutex<HashMap<String, u32>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置一个原始值 (测试损坏数据场景)
    pub fn seed_raw(&self, key: StateKey, value: Value) {
        self.entries
            .lock()
            .expect("MemoryKvStore 锁中毒")
            .insert(key.as_str().to_string(), value);
    }
}

impl KvStore for MemoryKvStore {
    fn load(&self, key: StateKey) -> RepositoryResult<Option<Value>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| crate::repository::error::RepositoryError::LockError(e.to_string()))?;
        Ok(entries.get(key.as_str()).cloned())
    }

    fn save(&self, key: StateKey, value: &Value) -> RepositoryResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| crate::repository::error::RepositoryError::LockError(e.to_string()))?;
        entries.insert(key.as_str().to_string(), value.clone());
        Ok(())
    }

    fn next_counter(&self, counter_key: &str) -> RepositoryResult<u32> {
        let mut counters = self
            .counters
            .lock()
            .map_err(|e| crate::repository::error::RepositoryError::LockError(e.to_string()))?;
        let next = counters.get(counter_key).copied().unwrap_or(0) + 1;
        counters.insert(counter_key.to_string(), next);
        Ok(next)
    }
}
