// ==========================================
// 冷库仓储工单系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 库内物流调度引擎 (三库区 + 工单队列 + 告警推导)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 服务层 - 告警刷新
pub mod service;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AlertReason, OrderType, Role, Zone};

// 领域实体
pub use domain::{
    Alert, CargoBox, Session, StorageSlot, UserAccount, UserDirectory, WarehouseIdentity,
    WarehouseState, WarehouseStats, WorkOrder, ZoneStore,
};

// 引擎
pub use engine::{
    ExecutionOutcome, IdService, OrderEngine, OrderError, PositionAllocator, RolePolicy,
};

// 配置
pub use config::{OrderExpiryPolicy, WarehouseConfig};

// API
pub use api::{ApiError, ApiResult, WarehouseApi};

// 应用
pub use app::{get_default_db_path, AppState};

/// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
