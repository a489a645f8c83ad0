// ==========================================
// 冷库仓储工单系统 - API 层
// ==========================================
// 职责: 业务接口 (命令面 + 只读查询)
// ==========================================

pub mod error;
pub mod warehouse_api;

// 重导出
pub use error::{ApiError, ApiResult};
pub use warehouse_api::{WarehouseApi, ZoneOverview};
