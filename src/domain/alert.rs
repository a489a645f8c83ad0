// ==========================================
// 冷库仓储工单系统 - 告警领域模型
// ==========================================
// 职责: 告警实体与稳定标识方案
// 标识规则: 告警 id 由成因确定性派生, 重复重算不产生重复告警
// ==========================================

use crate::domain::types::AlertReason;
use serde::{Deserialize, Serialize};

/// 全库聚合高温告警的固定 id (所有 >5°C 箱体共用一条)
pub const TEMPERATURE_ALERT_ID: &str = "alert-temperature-5";

/// 工单超时告警 id 前缀, 后接工单 id
pub const ORDER_ALERT_PREFIX: &str = "alert-order-";

/// 人工故障上报告警 id 前缀, 后接生成序列
pub const REPORT_ALERT_PREFIX: &str = "alert-report-";

// ==========================================
// Alert - 告警
// ==========================================
// 三类成因:
// 1. 高温聚合告警 (固定 id, 每轮重算刷新描述)
// 2. 工单超时告警 (id 派生自工单 id)
// 3. 人工故障上报 (显式处理前一直保留)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub title: String,
    pub description: String,
    /// 处理原因标注, 重算时按 id 保留
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<AlertReason>,
}

impl Alert {
    pub fn new(id: impl Into<String>, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            reason: None,
        }
    }

    /// 是否为工单超时告警
    pub fn is_order_alert(&self) -> bool {
        self.id.starts_with(ORDER_ALERT_PREFIX)
    }

    /// 是否为人工故障上报
    pub fn is_report_alert(&self) -> bool {
        self.id.starts_with(REPORT_ALERT_PREFIX)
    }

    /// 从工单超时告警 id 还原工单 id
    pub fn order_id(&self) -> Option<&str> {
        self.id.strip_prefix(ORDER_ALERT_PREFIX)
    }
}

/// 由工单 id 派生超时告警 id
pub fn order_alert_id(order_id: &str) -> String {
    format!("{}{}", ORDER_ALERT_PREFIX, order_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_alert_id_可逆() {
        let alert = Alert::new(order_alert_id("abc-123"), "工单超时", "...");
        assert!(alert.is_order_alert());
        assert_eq!(alert.order_id(), Some("abc-123"));
    }

    #[test]
    fn test_report_alert_识别() {
        let alert = Alert::new("alert-report-7", "故障上报", "...");
        assert!(alert.is_report_alert());
        assert!(!alert.is_order_alert());
        assert_eq!(alert.order_id(), None);
    }
}
