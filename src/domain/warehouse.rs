// ==========================================
// 冷库仓储工单系统 - 库房标识与聚合状态
// ==========================================
// 职责: 库房身份 (一次生成的 id + 可改显示名) 与
//       单写者模型下的全量内存状态
// ==========================================

use crate::domain::alert::Alert;
use crate::domain::order::WorkOrder;
use crate::domain::stats::WarehouseStats;
use crate::domain::zone_store::ZoneStore;
use serde::{Deserialize, Serialize};

// ==========================================
// WarehouseIdentity - 库房标识
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseIdentity {
    pub id: String,   // WH-YYYYMMDD-NNN, 首次初始化时生成一次
    pub name: String, // 显示名, 管理员可改
}

// ==========================================
// WarehouseState - 聚合内存状态
// ==========================================
// 单写者协作模型: 由 api 层以 Mutex 独占持有,
// 每次命令在锁内同步完成, 无部分可见的中间态
#[derive(Debug, Clone)]
pub struct WarehouseState {
    pub store: ZoneStore,
    pub orders: Vec<WorkOrder>,
    pub stats: WarehouseStats,
    pub alerts: Vec<Alert>,
    pub identity: WarehouseIdentity,
}

impl WarehouseState {
    /// 构造空库状态
    pub fn new(total_slots: u32) -> Self {
        Self {
            store: ZoneStore::new(total_slots),
            orders: Vec::new(),
            stats: WarehouseStats::default(),
            alerts: Vec::new(),
            identity: WarehouseIdentity::default(),
        }
    }
}
