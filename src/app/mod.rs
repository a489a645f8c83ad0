// ==========================================
// 冷库仓储工单系统 - 应用层
// ==========================================
// 职责: 装配仓储/引擎/API, 连接外部调用方与后端
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
