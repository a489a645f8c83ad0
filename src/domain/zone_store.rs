// ==========================================
// 冷库仓储工单系统 - 库区存储聚合
// ==========================================
// 职责: 三个库区集合 + 发运归档的唯一持有者
// 约束: 所有变更相对一次求值原子可见; 对不存在位置的操作
//       返回类型化错误, 绝不静默吞掉
// 所有权: 箱体在库期间数据归 ZoneStore 独占, 工单只持引用
// ==========================================

use crate::domain::boxes::{create_initial_slots, sort_by_position, CargoBox, StorageSlot};
use crate::domain::types::Zone;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 库区操作错误 (逻辑错误, 由工单引擎转译为业务错误)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("槽位越界: position={position}, 总槽位数={total}")]
    SlotOutOfRange { position: u32, total: u32 },

    #[error("槽位已占用: position={position}")]
    SlotOccupied { position: u32 },

    #[error("位置无箱体: zone={zone}, position={position}")]
    PositionEmpty { zone: Zone, position: u32 },

    #[error("位置已占用: zone={zone}, position={position}")]
    PositionOccupied { zone: Zone, position: u32 },
}

pub type StoreResult<T> = Result<T, StoreError>;

// ==========================================
// ZoneStore - 库区存储
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneStore {
    slots: Vec<StorageSlot>,  // 存储区固定槽位 (position 1..=N)
    inbound: Vec<CargoBox>,   // 入库区 (按 position 升序)
    outbound: Vec<CargoBox>,  // 出库区 (按 position 升序)
    dispatched: Vec<CargoBox>, // 发运归档 (只增)
}

impl ZoneStore {
    /// 构造空库 (total_slots 个空槽)
    pub fn new(total_slots: u32) -> Self {
        Self {
            slots: create_initial_slots(total_slots),
            inbound: Vec::new(),
            outbound: Vec::new(),
            dispatched: Vec::new(),
        }
    }

    /// 从持久化实体组装 (repository 层归一化之后调用)
    pub fn from_parts(
        slots: Vec<StorageSlot>,
        inbound: Vec<CargoBox>,
        outbound: Vec<CargoBox>,
        dispatched: Vec<CargoBox>,
    ) -> Self {
        Self {
            slots,
            inbound,
            outbound,
            dispatched,
        }
    }

    // ==========================================
    // 快照读取
    // ==========================================

    pub fn storage(&self) -> &[StorageSlot] {
        &self.slots
    }

    pub fn inbound(&self) -> &[CargoBox] {
        &self.inbound
    }

    pub fn outbound(&self) -> &[CargoBox] {
        &self.outbound
    }

    pub fn dispatched(&self) -> &[CargoBox] {
        &self.dispatched
    }

    pub fn total_slots(&self) -> u32 {
        self.slots.len() as u32
    }

    /// 存储区占用槽位数
    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_occupied()).count()
    }

    /// 存储区占用槽位的箱体视图
    pub fn storage_boxes(&self) -> Vec<CargoBox> {
        self.slots.iter().filter_map(|s| s.as_cargo_box()).collect()
    }

    /// 执行时重新解析来源箱体 (创建工单后箱体可能已被移走)
    pub fn resolve_box(&self, zone: Zone, position: u32) -> Option<CargoBox> {
        match zone {
            Zone::Inbound => self.inbound.iter().find(|b| b.position == position).cloned(),
            Zone::Outbound => self
                .outbound
                .iter()
                .find(|b| b.position == position)
                .cloned(),
            Zone::Storage => self
                .slots
                .iter()
                .find(|s| s.position == position)
                .and_then(|s| s.as_cargo_box()),
        }
    }

    /// 按编号或名称精确检索 (入库区 -> 存储区 -> 出库区)
    pub fn find_box(&self, query: &str) -> Option<(Zone, CargoBox)> {
        let matches = |b: &CargoBox| b.auto_id == query || b.name == query;
        if let Some(found) = self.inbound.iter().find(|b| matches(b)) {
            return Some((Zone::Inbound, found.clone()));
        }
        if let Some(found) = self.storage_boxes().into_iter().find(|b| matches(b)) {
            return Some((Zone::Storage, found));
        }
        if let Some(found) = self.outbound.iter().find(|b| matches(b)) {
            return Some((Zone::Outbound, found.clone()));
        }
        None
    }

    // ==========================================
    // 入库区变更
    // ==========================================

    pub fn put_inbound(&mut self, cargo: CargoBox) -> StoreResult<()> {
        if self.inbound.iter().any(|b| b.position == cargo.position) {
            return Err(StoreError::PositionOccupied {
                zone: Zone::Inbound,
                position: cargo.position,
            });
        }
        self.inbound.push(cargo);
        sort_by_position(&mut self.inbound);
        Ok(())
    }

    pub fn remove_inbound(&mut self, position: u32) -> StoreResult<CargoBox> {
        match self.inbound.iter().position(|b| b.position == position) {
            Some(index) => Ok(self.inbound.remove(index)),
            None => Err(StoreError::PositionEmpty {
                zone: Zone::Inbound,
                position,
            }),
        }
    }

    // ==========================================
    // 存储区变更
    // ==========================================

    pub fn slot(&self, position: u32) -> StoreResult<&StorageSlot> {
        self.slots
            .iter()
            .find(|s| s.position == position)
            .ok_or(StoreError::SlotOutOfRange {
                position,
                total: self.total_slots(),
            })
    }

    /// 写入箱体数据到空槽 (占用槽位必须先 clear_slot)
    pub fn fill_slot(&mut self, position: u32, cargo: &CargoBox) -> StoreResult<()> {
        let total = self.total_slots();
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.position == position)
            .ok_or(StoreError::SlotOutOfRange { position, total })?;
        if slot.is_occupied() {
            return Err(StoreError::SlotOccupied { position });
        }
        slot.fill(cargo.auto_id.clone(), cargo.name.clone(), cargo.temperature);
        Ok(())
    }

    /// 清空占用槽位, 返回原箱体数据
    pub fn clear_slot(&mut self, position: u32) -> StoreResult<CargoBox> {
        let total = self.total_slots();
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.position == position)
            .ok_or(StoreError::SlotOutOfRange { position, total })?;
        let cargo = slot.as_cargo_box().ok_or(StoreError::PositionEmpty {
            zone: Zone::Storage,
            position,
        })?;
        slot.clear();
        Ok(cargo)
    }

    // ==========================================
    // 出库区变更
    // ==========================================

    pub fn put_outbound(&mut self, cargo: CargoBox) -> StoreResult<()> {
        if self.outbound.iter().any(|b| b.position == cargo.position) {
            return Err(StoreError::PositionOccupied {
                zone: Zone::Outbound,
                position: cargo.position,
            });
        }
        self.outbound.push(cargo);
        sort_by_position(&mut self.outbound);
        Ok(())
    }

    /// 发运: 出库区箱体移入归档
    pub fn move_outbound_to_dispatched(&mut self, position: u32) -> StoreResult<CargoBox> {
        let index = self
            .outbound
            .iter()
            .position(|b| b.position == position)
            .ok_or(StoreError::PositionEmpty {
                zone: Zone::Outbound,
                position,
            })?;
        let cargo = self.outbound.remove(index);
        self.dispatched.push(cargo.clone());
        sort_by_position(&mut self.dispatched);
        Ok(cargo)
    }

    // ==========================================
    // 温度修正 (告警处理路径)
    // ==========================================

    pub fn set_box_temperature(&mut self, zone: Zone, position: u32, value: f64) -> StoreResult<()> {
        match zone {
            Zone::Inbound => {
                let cargo = self
                    .inbound
                    .iter_mut()
                    .find(|b| b.position == position)
                    .ok_or(StoreError::PositionEmpty { zone, position })?;
                cargo.temperature = value;
            }
            Zone::Outbound => {
                let cargo = self
                    .outbound
                    .iter_mut()
                    .find(|b| b.position == position)
                    .ok_or(StoreError::PositionEmpty { zone, position })?;
                cargo.temperature = value;
            }
            Zone::Storage => {
                let total = self.total_slots();
                let slot = self
                    .slots
                    .iter_mut()
                    .find(|s| s.position == position)
                    .ok_or(StoreError::SlotOutOfRange { position, total })?;
                if !slot.is_occupied() {
                    return Err(StoreError::PositionEmpty { zone, position });
                }
                slot.temperature = Some(value);
            }
        }
        Ok(())
    }

    /// 覆盖单个库区集合 (外部变更通知路径, 整体替换)
    pub fn replace_slots(&mut self, slots: Vec<StorageSlot>) {
        self.slots = slots;
    }

    pub fn replace_inbound(&mut self, boxes: Vec<CargoBox>) {
        self.inbound = boxes;
    }

    pub fn replace_outbound(&mut self, boxes: Vec<CargoBox>) {
        self.outbound = boxes;
    }

    pub fn replace_dispatched(&mut self, boxes: Vec<CargoBox>) {
        self.dispatched = boxes;
    }
}
