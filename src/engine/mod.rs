// ==========================================
// 冷库仓储工单系统 - 引擎层
// ==========================================
// 职责: 业务规则 (位置分配/工单状态机/告警推导/授权/发号)
// 红线: 不含持久化细节, 授权在引擎内部自查
// ==========================================

pub mod allocator;
pub mod alerts;
pub mod events;
pub mod orders;
pub mod policy;
pub mod sequence;

// 重导出
pub use allocator::PositionAllocator;
pub use alerts::{build_report_alert, high_temperature_boxes, overdue_orders, recompute_alerts};
pub use events::{
    NoopEventPublisher, SharedPublisher, WarehouseEvent, WarehouseEventPublisher, WarehouseEventType,
};
pub use orders::{ExecutionOutcome, OrderEngine, OrderError, OrderResult};
pub use policy::{ActionKind, RolePolicy};
pub use sequence::{
    format_auto_id, IdService, KvSequenceGenerator, SequenceGenerator, BOX_ID_PREFIX,
    WAREHOUSE_ID_PREFIX,
};
