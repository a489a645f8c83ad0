// ==========================================
// 冷库仓储工单系统 - 角色授权策略
// ==========================================
// 职责: 角色 -> 可执行动作的静态授权表
// 红线: 授权边界在引擎/API 内部自查, 绝不信任调用侧的
//       界面隐藏; 直接调用变更入口同样会被拦截
// ==========================================

use crate::domain::types::{OrderType, Role};
use std::collections::{HashMap, HashSet};
use std::fmt;

// ==========================================
// ActionKind - 受控动作
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    RegisterInbound, // 入库登记
    CreateOrder,     // 创建工单 (类型细分见 permits_order_type)
    ExecuteOrder,    // 执行工单
    Dispatch,        // 出库发运
    ReportFailure,   // 故障上报
    ManageAlerts,    // 告警处理 (解决/标注原因/改温/重排)
    SearchBoxes,     // 箱体检索
    ViewZones,       // 库区总览
    RenameWarehouse, // 库房命名
    CancelOrder,     // 取消工单 (扩展点, 还需配置开启)
}

impl ActionKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ActionKind::RegisterInbound => "入库登记",
            ActionKind::CreateOrder => "创建工单",
            ActionKind::ExecuteOrder => "执行工单",
            ActionKind::Dispatch => "出库发运",
            ActionKind::ReportFailure => "故障上报",
            ActionKind::ManageAlerts => "告警处理",
            ActionKind::SearchBoxes => "箱体检索",
            ActionKind::ViewZones => "库区总览",
            ActionKind::RenameWarehouse => "库房命名",
            ActionKind::CancelOrder => "取消工单",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ==========================================
// RolePolicy - 授权表
// ==========================================
pub struct RolePolicy {
    grants: HashMap<Role, HashSet<ActionKind>>,
    creatable_types: HashMap<Role, HashSet<OrderType>>,
}

impl RolePolicy {
    /// 标准授权表 (四角色超集变体, 含复核工单)
    ///
    /// 保管员: 入库登记 / 出库发运
    /// 管理员: 总览 / 检索 / 库房命名
    /// 操作员: 执行工单 / 故障上报 / 总览
    /// 班长:   创建工单 (全部类型) / 告警处理 / 取消工单
    pub fn standard() -> Self {
        let mut grants: HashMap<Role, HashSet<ActionKind>> = HashMap::new();
        let mut creatable_types: HashMap<Role, HashSet<OrderType>> = HashMap::new();

        grants.insert(
            Role::Custodian,
            [ActionKind::RegisterInbound, ActionKind::Dispatch]
                .into_iter()
                .collect(),
        );
        grants.insert(
            Role::Admin,
            [
                ActionKind::ViewZones,
                ActionKind::SearchBoxes,
                ActionKind::RenameWarehouse,
            ]
            .into_iter()
            .collect(),
        );
        grants.insert(
            Role::Operator,
            [
                ActionKind::ExecuteOrder,
                ActionKind::ReportFailure,
                ActionKind::ViewZones,
            ]
            .into_iter()
            .collect(),
        );
        grants.insert(
            Role::Supervisor,
            [
                ActionKind::CreateOrder,
                ActionKind::ManageAlerts,
                ActionKind::CancelOrder,
            ]
            .into_iter()
            .collect(),
        );

        creatable_types.insert(
            Role::Supervisor,
            [OrderType::ToStorage, OrderType::ToOutbound, OrderType::Review]
                .into_iter()
                .collect(),
        );

        Self {
            grants,
            creatable_types,
        }
    }

    /// 简化变体: 无班长角色、无复核工单
    ///
    /// 工单创建与告警处理归管理员, 复核类型对所有角色关闭
    pub fn without_supervisor() -> Self {
        let mut policy = Self::standard();
        policy.grants.remove(&Role::Supervisor);
        policy.creatable_types.remove(&Role::Supervisor);

        let admin = policy.grants.entry(Role::Admin).or_default();
        admin.insert(ActionKind::CreateOrder);
        admin.insert(ActionKind::ManageAlerts);
        admin.insert(ActionKind::CancelOrder);
        policy.creatable_types.insert(
            Role::Admin,
            [OrderType::ToStorage, OrderType::ToOutbound].into_iter().collect(),
        );
        policy
    }

    /// 角色是否可执行动作
    pub fn permits(&self, role: Role, action: ActionKind) -> bool {
        self.grants
            .get(&role)
            .map(|actions| actions.contains(&action))
            .unwrap_or(false)
    }

    /// 角色是否可创建指定类型的工单
    pub fn permits_order_type(&self, role: Role, order_type: OrderType) -> bool {
        self.creatable_types
            .get(&role)
            .map(|types| types.contains(&order_type))
            .unwrap_or(false)
    }
}

impl Default for RolePolicy {
    fn default() -> Self {
        Self::standard()
    }
}
