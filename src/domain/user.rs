// ==========================================
// 冷库仓储工单系统 - 用户目录接口
// ==========================================
// 职责: 认证协作方的接口定义 (系统边界, 不实现会话存储)
// 说明: 用户表以注入能力提供, 引擎不持有任何全局账号状态,
//       测试可替换为确定性假实现
// ==========================================

use crate::domain::types::Role;
use serde::{Deserialize, Serialize};

/// 用户账号 (目录内部记录)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub display_name: String,
}

/// 认证成功后的会话视图 (不含口令)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub username: String,
    pub role: Role,
    pub display_name: String,
}

/// 用户目录能力
///
/// 会话的持久化与失效由外部协作方负责,
/// 本系统只消费认证结果 (Session)
pub trait UserDirectory: Send + Sync {
    /// 校验用户名/口令, 成功返回会话视图
    fn authenticate(&self, username: &str, password: &str) -> Option<Session>;

    /// 按用户名查询角色 (外部恢复会话时的二次确认)
    fn role_of(&self, username: &str) -> Option<Role>;
}

// ==========================================
// StaticUserDirectory - 静态用户目录
// ==========================================
// 接线与测试用的最小实现
pub struct StaticUserDirectory {
    accounts: Vec<UserAccount>,
}

impl StaticUserDirectory {
    pub fn new(accounts: Vec<UserAccount>) -> Self {
        Self { accounts }
    }

    /// 四个标准角色各一个账号的默认目录
    pub fn standard() -> Self {
        let account = |username: &str, password: &str, role: Role, display_name: &str| UserAccount {
            username: username.to_string(),
            password: password.to_string(),
            role,
            display_name: display_name.to_string(),
        };
        Self::new(vec![
            account("custodian", "custodian123", Role::Custodian, "保管员"),
            account("admin", "admin123", Role::Admin, "管理员"),
            account("operator", "operator123", Role::Operator, "操作员"),
            account("supervisor", "supervisor123", Role::Supervisor, "班长"),
        ])
    }
}

impl UserDirectory for StaticUserDirectory {
    fn authenticate(&self, username: &str, password: &str) -> Option<Session> {
        self.accounts
            .iter()
            .find(|a| a.username == username && a.password == password)
            .map(|a| Session {
                username: a.username.clone(),
                role: a.role,
                display_name: a.display_name.clone(),
            })
    }

    fn role_of(&self, username: &str) -> Option<Role> {
        self.accounts
            .iter()
            .find(|a| a.username == username)
            .map(|a| a.role)
    }
}
