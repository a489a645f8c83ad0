// ==========================================
// 冷库仓储工单系统 - 告警推导引擎
// ==========================================
// 职责: 由库区/工单状态重算活动告警集
// 算法: 每轮从成因全量重建, 按稳定 id 复用既有告警的
//       reason 标注; 人工上报告警始终整体保留
// 触发: 周期刷新 + 每次变更后 (service::alert_refresh)
// 纯函数实现, 不依赖隐式时钟
// ==========================================

use crate::config::WarehouseConfig;
use crate::domain::alert::{order_alert_id, Alert, TEMPERATURE_ALERT_ID};
use crate::domain::boxes::CargoBox;
use crate::domain::order::{sorted_queue, WorkOrder};
use crate::domain::types::Zone;
use crate::domain::zone_store::ZoneStore;
use std::collections::HashMap;

/// 全库高温箱体: 三个库区中温度严格大于阈值者
pub fn high_temperature_boxes(store: &ZoneStore, threshold: f64) -> Vec<(Zone, CargoBox)> {
    let mut result = Vec::new();
    for cargo in store.inbound() {
        if cargo.temperature > threshold {
            result.push((Zone::Inbound, cargo.clone()));
        }
    }
    for cargo in store.storage_boxes() {
        if cargo.temperature > threshold {
            result.push((Zone::Storage, cargo));
        }
    }
    for cargo in store.outbound() {
        if cargo.temperature > threshold {
            result.push((Zone::Outbound, cargo.clone()));
        }
    }
    result
}

/// 超时工单: 滞留时长达到 SLA 窗口者 (最旧在前)
pub fn overdue_orders<'a>(orders: &'a [WorkOrder], now_ms: i64, sla_ms: i64) -> Vec<&'a WorkOrder> {
    sorted_queue(orders)
        .into_iter()
        .filter(|o| now_ms - o.created_at_ms >= sla_ms)
        .collect()
}

/// 重算活动告警集
///
/// 1. 高温聚合告警: 全库一条, 固定 id, 描述列出全部超温箱体
/// 2. 工单超时告警: 每张超时工单一条, id 派生自工单 id
/// 3. 人工上报告警: 原样保留, 直到显式解决
/// 成因消失的 1/2 类告警不再进入结果, 即自然消失;
/// 既有告警的 reason 标注按 id 保留
pub fn recompute_alerts(
    store: &ZoneStore,
    orders: &[WorkOrder],
    previous: &[Alert],
    now_ms: i64,
    config: &WarehouseConfig,
) -> Vec<Alert> {
    let previous_by_id: HashMap<&str, &Alert> =
        previous.iter().map(|a| (a.id.as_str(), a)).collect();
    let mut next: Vec<Alert> = Vec::new();

    // 1. 高温聚合告警
    let high = high_temperature_boxes(store, config.high_temperature_c);
    if !high.is_empty() {
        let details: Vec<String> = high
            .iter()
            .map(|(zone, cargo)| {
                format!(
                    "{}{} · {} ({}) · {} °C",
                    zone.display_name(),
                    cargo.position,
                    cargo.name,
                    cargo.auto_id,
                    cargo.temperature
                )
            })
            .collect();
        let mut alert = Alert::new(
            TEMPERATURE_ALERT_ID,
            "温度超标",
            format!(
                "温度超过 {} °C: {}",
                config.high_temperature_c,
                details.join(" | ")
            ),
        );
        if let Some(existing) = previous_by_id.get(TEMPERATURE_ALERT_ID) {
            alert.reason = existing.reason;
        }
        next.push(alert);
    }

    // 2. 工单超时告警
    for order in overdue_orders(orders, now_ms, config.order_sla_ms) {
        let id = order_alert_id(&order.id);
        let mut alert = Alert::new(
            id.clone(),
            "工单超时",
            format!(
                "工单滞留超过 {} 分钟: {}。创建人 {} · {}",
                config.order_sla_ms / 60_000,
                order.summary(),
                order.created_by,
                order.created_at
            ),
        );
        if let Some(existing) = previous_by_id.get(id.as_str()) {
            alert.reason = existing.reason;
        }
        next.push(alert);
    }

    // 3. 人工上报告警整体保留
    for alert in previous.iter().filter(|a| a.is_report_alert()) {
        if !next.iter().any(|n| n.id == alert.id) {
            next.push(alert.clone());
        }
    }

    next
}

/// 构造人工故障上报告警
pub fn build_report_alert(
    id: String,
    order: &WorkOrder,
    reporter_display_name: &str,
    reported_at: &str,
) -> Alert {
    Alert::new(
        id,
        "故障上报",
        format!(
            "{} · 上报人 {} · {}",
            order.summary(),
            reporter_display_name,
            reported_at
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::alert::REPORT_ALERT_PREFIX;
    use crate::domain::types::{AlertReason, OrderType, Role};

    fn config() -> WarehouseConfig {
        WarehouseConfig::default()
    }

    fn cargo(position: u32, temperature: f64) -> CargoBox {
        CargoBox {
            position,
            auto_id: format!("B{}", position),
            name: format!("箱{}", position),
            temperature,
        }
    }

    fn order(id: &str, created_at_ms: i64) -> WorkOrder {
        WorkOrder {
            id: id.to_string(),
            order_type: OrderType::Review,
            source_zone: Zone::Storage,
            source_position: 1,
            target_position: None,
            created_at: "2026-08-07 10:00:00".to_string(),
            created_at_ms,
            created_by: Role::Supervisor,
        }
    }

    #[test]
    fn test_高温聚合为单条告警() {
        let mut store = ZoneStore::new(12);
        store.put_inbound(cargo(1, 7.0)).unwrap();
        store.put_inbound(cargo(2, 3.0)).unwrap();
        store.put_outbound(cargo(1, 6.5)).unwrap();

        let alerts = recompute_alerts(&store, &[], &[], 0, &config());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, TEMPERATURE_ALERT_ID);
        // 描述列出全部超温箱体, 不含 3°C 的箱体
        assert!(alerts[0].description.contains("入库区1"));
        assert!(alerts[0].description.contains("出库区1"));
        assert!(!alerts[0].description.contains("入库区2"));
    }

    #[test]
    fn test_温度回落后告警消失() {
        let mut store = ZoneStore::new(12);
        store.put_inbound(cargo(1, 7.0)).unwrap();
        let first = recompute_alerts(&store, &[], &[], 0, &config());
        assert_eq!(first.len(), 1);

        store.set_box_temperature(Zone::Inbound, 1, 4.0).unwrap();
        let second = recompute_alerts(&store, &[], &first, 0, &config());
        assert!(second.is_empty());
    }

    #[test]
    fn test_阈值为严格大于() {
        let mut store = ZoneStore::new(12);
        store.put_inbound(cargo(1, 5.0)).unwrap();
        assert!(recompute_alerts(&store, &[], &[], 0, &config()).is_empty());
    }

    #[test]
    fn test_超时告警按工单派生且保留原因() {
        let store = ZoneStore::new(12);
        let orders = vec![order("o-1", 1000)];

        // 滞留 119 秒: 尚未超时
        let early = recompute_alerts(&store, &orders, &[], 1000 + 119_000, &config());
        assert!(early.is_empty());

        // 滞留 121 秒: 恰好一条, id 派生自工单 id
        let mut first = recompute_alerts(&store, &orders, &[], 1000 + 121_000, &config());
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, "alert-order-o-1");

        // 标注原因后重算, 原因保留
        first[0].reason = Some(AlertReason::NoTime);
        let second = recompute_alerts(&store, &orders, &first, 1000 + 150_000, &config());
        assert_eq!(second[0].reason, Some(AlertReason::NoTime));
    }

    #[test]
    fn test_人工上报跨重算保留() {
        let store = ZoneStore::new(12);
        let report = Alert::new(
            format!("{}abc", REPORT_ALERT_PREFIX),
            "故障上报",
            "复核 存储区1 · 上报人 操作员",
        );
        let next = recompute_alerts(&store, &[], &[report.clone()], 0, &config());
        assert_eq!(next.len(), 1);
        assert_eq!(next[0], report);
    }

    #[test]
    fn test_超时告警随工单执行消失() {
        let store = ZoneStore::new(12);
        let orders = vec![order("o-1", 0)];
        let first = recompute_alerts(&store, &orders, &[], 200_000, &config());
        assert_eq!(first.len(), 1);

        // 工单离开队列后成因消失
        let second = recompute_alerts(&store, &[], &first, 200_000, &config());
        assert!(second.is_empty());
    }

    #[test]
    fn test_超时判定含临界值() {
        let store = ZoneStore::new(12);
        let orders = vec![order("o-1", 0)];
        // 恰好 120000ms 即告警 (>= 语义)
        let alerts = recompute_alerts(&store, &orders, &[], 120_000, &config());
        assert_eq!(alerts.len(), 1);
    }
}
