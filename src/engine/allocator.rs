// ==========================================
// 冷库仓储工单系统 - 位置分配引擎
// ==========================================
// 职责: 入库区/出库区下一空位计算, 存储区空槽与可选目标集,
//       可选来源集 (排除已有待执行工单的箱体)
// 无状态引擎, 全部为确定性纯函数
// ==========================================

use crate::domain::boxes::{CargoBox, StorageSlot};
use crate::domain::order::WorkOrder;
use crate::domain::types::{OrderType, Zone};
use std::collections::HashSet;

// ==========================================
// PositionAllocator - 位置分配引擎
// ==========================================
pub struct PositionAllocator {
    // 无状态引擎, 不需要注入依赖
}

impl PositionAllocator {
    pub fn new() -> Self {
        Self {}
    }

    /// 动态库区下一空位: 最小未占用正整数
    ///
    /// reserved 为待执行工单已预留的目标位 (入库区无预留语义, 传空集)
    pub fn next_free_position(&self, boxes: &[CargoBox], reserved: &HashSet<u32>) -> u32 {
        let mut occupied: HashSet<u32> = boxes.iter().map(|b| b.position).collect();
        occupied.extend(reserved.iter().copied());
        let mut next = 1;
        while occupied.contains(&next) {
            next += 1;
        }
        next
    }

    /// 存储区空槽位置 (升序)
    pub fn free_storage_positions(&self, slots: &[StorageSlot]) -> Vec<u32> {
        slots
            .iter()
            .filter(|s| !s.is_occupied())
            .map(|s| s.position)
            .collect()
    }

    /// 指定类型待执行工单预留的目标位集合
    ///
    /// 预留按工单类型隔离: ToStorage 只占存储区目标,
    /// ToOutbound 只占出库区目标
    pub fn reserved_targets(&self, orders: &[WorkOrder], order_type: OrderType) -> HashSet<u32> {
        orders
            .iter()
            .filter(|o| o.order_type == order_type)
            .filter_map(|o| o.target_position)
            .collect()
    }

    /// 可选存储目标 = 空槽 − 已预留目标
    ///
    /// 空槽被其他待执行工单预留后不再对外提供,
    /// 防止两张工单在执行前争抢同一目的地
    pub fn available_targets(&self, free: &[u32], reserved: &HashSet<u32>) -> Vec<u32> {
        free.iter()
            .copied()
            .filter(|position| !reserved.contains(position))
            .collect()
    }

    /// 全部待执行工单的来源键集合 (不分类型)
    pub fn pending_source_keys(&self, orders: &[WorkOrder]) -> HashSet<(Zone, u32)> {
        orders.iter().map(|o| o.source_key()).collect()
    }

    /// 可选来源 = 库区箱体 − 已有待执行工单的来源
    pub fn available_sources<'a>(
        &self,
        zone: Zone,
        boxes: &'a [CargoBox],
        pending: &HashSet<(Zone, u32)>,
    ) -> Vec<&'a CargoBox> {
        boxes
            .iter()
            .filter(|b| !pending.contains(&(zone, b.position)))
            .collect()
    }
}

impl Default for PositionAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::boxes::create_initial_slots;
    use crate::domain::types::Role;

    fn cargo(position: u32) -> CargoBox {
        CargoBox {
            position,
            auto_id: format!("B{}", position),
            name: format!("箱{}", position),
            temperature: 0.0,
        }
    }

    fn order(order_type: OrderType, source_zone: Zone, source: u32, target: Option<u32>) -> WorkOrder {
        WorkOrder {
            id: format!("o-{}-{}", source_zone, source),
            order_type,
            source_zone,
            source_position: source,
            target_position: target,
            created_at: String::new(),
            created_at_ms: 0,
            created_by: Role::Supervisor,
        }
    }

    #[test]
    fn test_next_free_position_取最小空位() {
        let allocator = PositionAllocator::new();
        let boxes = vec![cargo(1), cargo(2), cargo(4)];
        assert_eq!(allocator.next_free_position(&boxes, &HashSet::new()), 3);
        assert_eq!(allocator.next_free_position(&[], &HashSet::new()), 1);
    }

    #[test]
    fn test_next_free_position_跳过预留位() {
        let allocator = PositionAllocator::new();
        let boxes = vec![cargo(1)];
        let reserved: HashSet<u32> = [2, 3].into_iter().collect();
        assert_eq!(allocator.next_free_position(&boxes, &reserved), 4);
    }

    #[test]
    fn test_available_targets_排除预留() {
        let allocator = PositionAllocator::new();
        let mut slots = create_initial_slots(6);
        slots[0].fill("B1".to_string(), "箱1".to_string(), 0.0);

        let orders = vec![
            order(OrderType::ToStorage, Zone::Inbound, 1, Some(3)),
            // 出库预留不影响存储目标
            order(OrderType::ToOutbound, Zone::Storage, 2, Some(4)),
        ];

        let free = allocator.free_storage_positions(&slots);
        assert_eq!(free, vec![2, 3, 4, 5, 6]);

        let reserved = allocator.reserved_targets(&orders, OrderType::ToStorage);
        let available = allocator.available_targets(&free, &reserved);
        assert_eq!(available, vec![2, 4, 5, 6]);
    }

    #[test]
    fn test_available_sources_排除已派工箱体() {
        let allocator = PositionAllocator::new();
        let boxes = vec![cargo(1), cargo(2)];
        let orders = vec![order(OrderType::Review, Zone::Inbound, 1, None)];

        let pending = allocator.pending_source_keys(&orders);
        let sources = allocator.available_sources(Zone::Inbound, &boxes, &pending);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].position, 2);

        // 同位置不同库区不受影响
        let storage_sources = allocator.available_sources(Zone::Storage, &boxes, &pending);
        assert_eq!(storage_sources.len(), 2);
    }
}
