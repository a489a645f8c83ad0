// ==========================================
// 冷库仓储工单系统 - 仓储层错误类型
// ==========================================
// 职责: 持久化与归一化错误定义
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 数据库错误 =====
    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    // ===== 序列化错误 =====
    #[error("JSON 序列化失败: {0}")]
    SerializationError(String),

    // ===== 数据质量错误 =====
    // 非致命: 调用方保留内存默认值, 仅记录日志
    #[error("持久化数据损坏 (key={key}): {source}")]
    MalformedState {
        key: String,
        #[source]
        source: ValidationError,
    },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        RepositoryError::DatabaseQueryError(err.to_string())
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::SerializationError(err.to_string())
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

// ==========================================
// ValidationError - 归一化校验错误
// ==========================================
// 每个实体类一个校验器, 顶层形状不合法即整体拒绝
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("顶层形状错误: 期望 {expected}")]
    WrongShape { expected: &'static str },

    #[error("数组长度错误: 期望 {expected}, 实际 {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("字段类型错误 (field={field})")]
    FieldType { field: &'static str },

    #[error("字段缺失 (field={field})")]
    MissingField { field: &'static str },

    #[error("枚举值非法 (field={field}, value={value})")]
    InvalidVariant { field: &'static str, value: String },
}

pub type ValidationResult<T> = Result<T, ValidationError>;
