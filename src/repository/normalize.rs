// ==========================================
// 冷库仓储工单系统 - 持久化数据归一化
// ==========================================
// 职责: 每个实体类一个校验器, 输入外部 JSON, 输出类型化实体
// 规则:
// - 顶层形状错误 (长度/类型不符) => 整体拒绝, 调用方保留默认值
// - 可选字段缺失/类型不符 => 回退安全默认值
// - 旧版字段 (itemId/id/boxPosition) => 迁移到当前字段
// 初始加载与跨进程变更通知共用同一套校验器
// ==========================================

use crate::domain::alert::Alert;
use crate::domain::boxes::{CargoBox, StorageSlot};
use crate::domain::order::WorkOrder;
use crate::domain::stats::WarehouseStats;
use crate::domain::types::{AlertReason, OrderType, Role, Zone};
use crate::repository::error::{ValidationError, ValidationResult};
use serde_json::Value;

/// 旧版记录补发编号的发号闭包
pub type IdMint<'a> = &'a mut dyn FnMut() -> String;

// ==========================================
// 存储区槽位
// ==========================================
// 定长数组, 长度不符即整体拒绝
pub fn normalize_slots(value: &Value, expected_len: usize, mint: IdMint) -> ValidationResult<Vec<StorageSlot>> {
    let items = value.as_array().ok_or(ValidationError::WrongShape {
        expected: "槽位数组",
    })?;
    if items.len() != expected_len {
        return Err(ValidationError::WrongLength {
            expected: expected_len,
            actual: items.len(),
        });
    }

    let mut slots = Vec::with_capacity(items.len());
    for item in items {
        let record = item.as_object().ok_or(ValidationError::WrongShape {
            expected: "槽位对象",
        })?;

        let position = record
            .get("position")
            .and_then(Value::as_u64)
            .ok_or(ValidationError::FieldType { field: "position" })? as u32;

        // 旧版字段: itemId 曾经既当编号又当名称
        let legacy_name = record.get("itemId").and_then(Value::as_str).unwrap_or("");
        let name = record
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(legacy_name)
            .to_string();

        let auto_id = match record.get("autoId").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            // 有名称无编号的旧记录补发编号, 空槽保持空串
            None if !name.is_empty() => mint(),
            None => String::new(),
        };

        let temperature = match record.get("temperature") {
            Some(Value::Number(n)) => n.as_f64(),
            _ => None,
        };

        slots.push(StorageSlot {
            position,
            auto_id,
            name,
            temperature,
        });
    }
    Ok(slots)
}

// ==========================================
// 动态库区箱体列表
// ==========================================
// position/temperature 任一不是数字即整体拒绝
pub fn normalize_boxes(value: &Value, mint: IdMint) -> ValidationResult<Vec<CargoBox>> {
    let items = value.as_array().ok_or(ValidationError::WrongShape {
        expected: "箱体数组",
    })?;

    let mut boxes = Vec::with_capacity(items.len());
    for item in items {
        let record = item.as_object().ok_or(ValidationError::WrongShape {
            expected: "箱体对象",
        })?;

        let position = record
            .get("position")
            .and_then(Value::as_u64)
            .ok_or(ValidationError::FieldType { field: "position" })? as u32;

        let temperature = record
            .get("temperature")
            .and_then(Value::as_f64)
            .ok_or(ValidationError::FieldType {
                field: "temperature",
            })?;

        // 旧版字段: id 曾兼作名称
        let legacy_name = record.get("id").and_then(Value::as_str).unwrap_or("");
        let name = record
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(legacy_name)
            .to_string();

        let auto_id = match record.get("autoId").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None if !name.is_empty() => mint(),
            None => String::new(),
        };

        boxes.push(CargoBox {
            position,
            auto_id,
            name,
            temperature,
        });
    }
    Ok(boxes)
}

// ==========================================
// 工单队列
// ==========================================
pub fn normalize_orders(value: &Value, now_ms: i64) -> ValidationResult<Vec<WorkOrder>> {
    let items = value.as_array().ok_or(ValidationError::WrongShape {
        expected: "工单数组",
    })?;

    let mut orders = Vec::with_capacity(items.len());
    for item in items {
        let record = item.as_object().ok_or(ValidationError::WrongShape {
            expected: "工单对象",
        })?;

        let id = record
            .get("id")
            .and_then(Value::as_str)
            .ok_or(ValidationError::FieldType { field: "id" })?
            .to_string();

        let type_raw = record
            .get("orderType")
            .and_then(Value::as_str)
            .ok_or(ValidationError::FieldType { field: "orderType" })?;
        let order_type = OrderType::parse(type_raw).ok_or_else(|| ValidationError::InvalidVariant {
            field: "orderType",
            value: type_raw.to_string(),
        })?;

        let created_at = record
            .get("createdAt")
            .and_then(Value::as_str)
            .ok_or(ValidationError::FieldType { field: "createdAt" })?
            .to_string();

        // 创建角色非法时回退保管员, 缺失则拒绝
        let created_by_raw = record
            .get("createdBy")
            .and_then(Value::as_str)
            .ok_or(ValidationError::FieldType { field: "createdBy" })?;
        let created_by = Role::parse(created_by_raw).unwrap_or(Role::Custodian);

        let source_zone = record
            .get("sourceZone")
            .and_then(Value::as_str)
            .and_then(Zone::parse)
            .unwrap_or(Zone::Inbound);

        // 旧版字段: boxPosition
        let source_position = record
            .get("sourcePosition")
            .and_then(Value::as_u64)
            .or_else(|| record.get("boxPosition").and_then(Value::as_u64))
            .ok_or(ValidationError::FieldType {
                field: "sourcePosition",
            })? as u32;

        let target_position = record
            .get("targetPosition")
            .and_then(Value::as_u64)
            .map(|p| p as u32);

        // 时间戳缺失/非法时回退当前时刻, 保证排序键总是存在
        let created_at_ms = record
            .get("createdAtMs")
            .and_then(Value::as_i64)
            .unwrap_or(now_ms);

        orders.push(WorkOrder {
            id,
            order_type,
            source_zone,
            source_position,
            target_position,
            created_at,
            created_at_ms,
            created_by,
        });
    }
    Ok(orders)
}

// ==========================================
// 运行统计
// ==========================================
// 字段级兜底: 缺失/类型不符的计数器归零, 不拒绝整体
pub fn normalize_stats(value: &Value) -> ValidationResult<WarehouseStats> {
    let record = value.as_object().ok_or(ValidationError::WrongShape {
        expected: "统计对象",
    })?;

    let counter = |field: &str| record.get(field).and_then(Value::as_u64).unwrap_or(0);

    Ok(WarehouseStats {
        inbound_total: counter("inboundTotal"),
        dispatched_total: counter("dispatchedTotal"),
        storage_move_total: counter("storageMoveTotal"),
    })
}

// ==========================================
// 告警集合
// ==========================================
pub fn normalize_alerts(value: &Value) -> ValidationResult<Vec<Alert>> {
    let items = value.as_array().ok_or(ValidationError::WrongShape {
        expected: "告警数组",
    })?;

    let mut alerts = Vec::with_capacity(items.len());
    for item in items {
        let record = item.as_object().ok_or(ValidationError::WrongShape {
            expected: "告警对象",
        })?;

        let field = |name: &'static str| -> ValidationResult<String> {
            record
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or(ValidationError::FieldType { field: name })
        };

        let reason = record
            .get("reason")
            .and_then(Value::as_str)
            .and_then(AlertReason::parse);

        alerts.push(Alert {
            id: field("id")?,
            title: field("title")?,
            description: field("description")?,
            reason,
        });
    }
    Ok(alerts)
}

// ==========================================
// 库房标识串 (id / 显示名共用)
// ==========================================
pub fn normalize_identity_string(value: &Value) -> ValidationResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or(ValidationError::WrongShape { expected: "字符串" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mint_fixed() -> impl FnMut() -> String {
        let mut n = 0;
        move || {
            n += 1;
            format!("BOX-20260807-{:03}", n)
        }
    }

    #[test]
    fn test_normalize_slots_长度不符整体拒绝() {
        let mut mint = mint_fixed();
        let value = json!([{"position": 1, "autoId": "", "name": "", "temperature": null}]);
        assert_eq!(
            normalize_slots(&value, 12, &mut mint),
            Err(ValidationError::WrongLength {
                expected: 12,
                actual: 1
            })
        );
    }

    #[test]
    fn test_normalize_slots_旧版itemId迁移() {
        let mut mint = mint_fixed();
        let mut items = vec![json!({"position": 1, "itemId": "鳕鱼", "temperature": 3})];
        for position in 2..=12 {
            items.push(json!({"position": position, "autoId": "", "name": "", "temperature": null}));
        }
        let slots = normalize_slots(&Value::Array(items), 12, &mut mint).unwrap();
        assert_eq!(slots[0].name, "鳕鱼");
        // 有名称无编号 => 补发
        assert_eq!(slots[0].auto_id, "BOX-20260807-001");
        assert_eq!(slots[0].temperature, Some(3.0));
        // 空槽不补发
        assert_eq!(slots[1].auto_id, "");
    }

    #[test]
    fn test_normalize_boxes_温度非数字整体拒绝() {
        let mut mint = mint_fixed();
        let value = json!([
            {"position": 1, "autoId": "B1", "name": "a", "temperature": 2.0},
            {"position": 2, "autoId": "B2", "name": "b", "temperature": "冷"}
        ]);
        assert_eq!(
            normalize_boxes(&value, &mut mint),
            Err(ValidationError::FieldType {
                field: "temperature"
            })
        );
    }

    #[test]
    fn test_normalize_orders_旧字段与角色回退() {
        let value = json!([{
            "id": "o-1",
            "orderType": "to_storage",
            "sourceZone": "bodega",
            "boxPosition": 4,
            "targetPosition": 2,
            "createdAt": "2026-08-07 10:00:00",
            "createdBy": "jefe"
        }]);
        let orders = normalize_orders(&value, 999).unwrap();
        let order = &orders[0];
        // 未知库区回退入库区, 未知角色回退保管员
        assert_eq!(order.source_zone, Zone::Inbound);
        assert_eq!(order.created_by, Role::Custodian);
        // 旧版 boxPosition 迁移, 缺失时间戳补当前值
        assert_eq!(order.source_position, 4);
        assert_eq!(order.created_at_ms, 999);
    }

    #[test]
    fn test_normalize_orders_未知类型拒绝() {
        let value = json!([{
            "id": "o-1",
            "orderType": "mover",
            "sourcePosition": 1,
            "createdAt": "x",
            "createdBy": "admin"
        }]);
        assert!(matches!(
            normalize_orders(&value, 0),
            Err(ValidationError::InvalidVariant { .. })
        ));
    }

    #[test]
    fn test_normalize_stats_字段级兜底() {
        let stats = normalize_stats(&json!({"inboundTotal": 7, "dispatchedTotal": "x"})).unwrap();
        assert_eq!(stats.inbound_total, 7);
        assert_eq!(stats.dispatched_total, 0);
        assert_eq!(stats.storage_move_total, 0);

        assert!(normalize_stats(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_normalize_alerts_保留原因() {
        let value = json!([{
            "id": "alert-report-1",
            "title": "故障上报",
            "description": "...",
            "reason": "no_time"
        }]);
        let alerts = normalize_alerts(&value).unwrap();
        assert_eq!(alerts[0].reason, Some(AlertReason::NoTime));
    }
}
