// ==========================================
// 冷库仓储工单系统 - API 层错误类型
// ==========================================
// 职责: 汇聚引擎/仓储错误, 提供操作员可读的失败消息
// 约束: 所有失败均为调用方本地可恢复, 不留部分变更
// ==========================================

use crate::domain::types::Role;
use crate::engine::orders::OrderError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API 层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 授权错误 (API 层自有入口) =====
    #[error("角色 {role} 无权进行{action}")]
    Unauthorized { role: Role, action: String },

    // ===== 业务规则错误 (工单引擎) =====
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("告警不存在: {0}")]
    AlertNotFound(String),

    #[error("输入无效: {0}")]
    InvalidInput(String),

    // ===== 数据访问错误 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
