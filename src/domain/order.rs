// ==========================================
// 冷库仓储工单系统 - 工单领域模型
// ==========================================
// 职责: 工单实体与队列排序规则
// 不变量: 同一 (来源库区, 来源位置) 同时最多一张待执行工单
// 生命周期: 创建即 Pending, 执行成功即从队列移除 (无 Cancelled 状态,
//           取消/过期由 config::OrderExpiryPolicy 扩展点控制)
// ==========================================

use crate::domain::types::{OrderType, Role, Zone};
use serde::{Deserialize, Serialize};

// ==========================================
// WorkOrder - 工单
// ==========================================
// 工单只持有 (库区, 位置) 引用, 不复制箱体数据;
// 执行时必须从 ZoneStore 重新解析箱体 (创建后箱体可能已被移走)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: String,                   // 工单唯一标识 (UUID v4)
    pub order_type: OrderType,        // 工单类型
    pub source_zone: Zone,            // 来源库区
    pub source_position: u32,         // 来源位置
    pub target_position: Option<u32>, // 目标位置 (Review 工单为 None)
    pub created_at: String,           // 创建时间显示串
    pub created_at_ms: i64,           // 创建时间 epoch 毫秒 (排序/超时判定键)
    pub created_by: Role,             // 创建角色
}

impl WorkOrder {
    /// 来源键 "(库区:位置)", 用于待执行工单的来源去重
    pub fn source_key(&self) -> (Zone, u32) {
        (self.source_zone, self.source_position)
    }

    /// 工单摘要 (告警描述/队列展示用)
    pub fn summary(&self) -> String {
        let source = self.source_zone.display_name();
        match self.order_type {
            OrderType::Review => format!("复核 {}{}", source, self.source_position),
            OrderType::ToStorage => format!(
                "{}{} -> 存储区{}",
                source,
                self.source_position,
                target_label(self.target_position)
            ),
            OrderType::ToOutbound => format!(
                "{}{} -> 出库区{}",
                source,
                self.source_position,
                target_label(self.target_position)
            ),
        }
    }
}

fn target_label(target: Option<u32>) -> String {
    match target {
        Some(position) => position.to_string(),
        None => "-".to_string(),
    }
}

/// 按创建时间升序返回队列视图 (最旧在前, 稳定排序保持同毫秒插入序)
pub fn sorted_queue(orders: &[WorkOrder]) -> Vec<&WorkOrder> {
    let mut view: Vec<&WorkOrder> = orders.iter().collect();
    view.sort_by_key(|o| o.created_at_ms);
    view
}

/// 队首工单: createdAtMs 最旧者, 同毫秒按插入顺序
pub fn head_of_queue(orders: &[WorkOrder]) -> Option<&WorkOrder> {
    sorted_queue(orders).into_iter().next()
}
