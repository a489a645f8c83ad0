// ==========================================
// 冷库仓储工单系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、库区聚合
// 红线: 不含数据访问逻辑, 不含引擎逻辑
// ==========================================

pub mod alert;
pub mod boxes;
pub mod order;
pub mod stats;
pub mod types;
pub mod user;
pub mod warehouse;
pub mod zone_store;

// 重导出核心类型
pub use alert::{order_alert_id, Alert, ORDER_ALERT_PREFIX, REPORT_ALERT_PREFIX, TEMPERATURE_ALERT_ID};
pub use boxes::{create_initial_slots, CargoBox, StorageSlot};
pub use order::{head_of_queue, sorted_queue, WorkOrder};
pub use stats::WarehouseStats;
pub use types::{AlertReason, OrderType, Role, Zone};
pub use user::{Session, StaticUserDirectory, UserAccount, UserDirectory};
pub use warehouse::{WarehouseIdentity, WarehouseState};
pub use zone_store::{StoreError, StoreResult, ZoneStore};
