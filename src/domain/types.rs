// ==========================================
// 冷库仓储工单系统 - 领域类型定义
// ==========================================
// 职责: 角色/库区/工单类型等基础枚举
// 序列化格式: snake_case (与持久化 JSON 一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 角色 (Role)
// ==========================================
// 权限判定以 engine::policy 的授权表为准,
// 此处仅定义身份本身
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Custodian,  // 保管员: 入库登记、出库发运
    Admin,      // 管理员: 全局查看、检索、库房命名
    Operator,   // 操作员: 执行工单、上报故障
    Supervisor, // 班长: 创建工单、处理告警
}

impl Role {
    /// 全部角色 (用于策略表构建与测试遍历)
    pub const ALL: [Role; 4] = [
        Role::Custodian,
        Role::Admin,
        Role::Operator,
        Role::Supervisor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Custodian => "custodian",
            Role::Admin => "admin",
            Role::Operator => "operator",
            Role::Supervisor => "supervisor",
        }
    }

    /// 从持久化字符串解析 (未知值返回 None)
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "custodian" => Some(Role::Custodian),
            "admin" => Some(Role::Admin),
            "operator" => Some(Role::Operator),
            "supervisor" => Some(Role::Supervisor),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 库区 (Zone)
// ==========================================
// 三个库区: 入库区(动态位)、存储区(固定槽位)、出库区(动态位)
// 发运归档不是库区, 单独建模 (ZoneStore::dispatched)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Inbound,
    Storage,
    Outbound,
}

impl Zone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::Inbound => "inbound",
            Zone::Storage => "storage",
            Zone::Outbound => "outbound",
        }
    }

    /// 中文显示名 (告警/工单描述用)
    pub fn display_name(&self) -> &'static str {
        match self {
            Zone::Inbound => "入库区",
            Zone::Storage => "存储区",
            Zone::Outbound => "出库区",
        }
    }

    pub fn parse(value: &str) -> Option<Zone> {
        match value {
            "inbound" => Some(Zone::Inbound),
            "storage" => Some(Zone::Storage),
            "outbound" => Some(Zone::Outbound),
            _ => None,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 工单类型 (OrderType)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    ToStorage,  // 移入存储区 (需要显式目标槽位)
    ToOutbound, // 移入出库区 (目标位在创建时自动计算)
    Review,     // 复核 (仅存储区来源, 无目标位)
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::ToStorage => "to_storage",
            OrderType::ToOutbound => "to_outbound",
            OrderType::Review => "review",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OrderType::ToStorage => "移入存储区",
            OrderType::ToOutbound => "移入出库区",
            OrderType::Review => "复核",
        }
    }

    pub fn parse(value: &str) -> Option<OrderType> {
        match value {
            "to_storage" => Some(OrderType::ToStorage),
            "to_outbound" => Some(OrderType::ToOutbound),
            "review" => Some(OrderType::Review),
            _ => None,
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 告警处理原因 (AlertReason)
// ==========================================
// 操作员/班长在告警上附加的说明, 告警重算时必须保留
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertReason {
    NoTime,  // 没来得及
    Refused, // 不愿处理
    Blocked, // 无法处理
}

impl AlertReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertReason::NoTime => "no_time",
            AlertReason::Refused => "refused",
            AlertReason::Blocked => "blocked",
        }
    }

    pub fn parse(value: &str) -> Option<AlertReason> {
        match value {
            "no_time" => Some(AlertReason::NoTime),
            "refused" => Some(AlertReason::Refused),
            "blocked" => Some(AlertReason::Blocked),
            _ => None,
        }
    }
}

impl fmt::Display for AlertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_roundtrip() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("foreman"), None);
    }

    #[test]
    fn test_order_type_parse_未知值() {
        assert_eq!(OrderType::parse("to_storage"), Some(OrderType::ToStorage));
        assert_eq!(OrderType::parse("mover"), None);
    }
}
