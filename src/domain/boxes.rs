// ==========================================
// 冷库仓储工单系统 - 箱体领域模型
// ==========================================
// 职责: 动态库区箱体 (CargoBox) 与固定槽位 (StorageSlot)
// 约束: 槽位 position 不可变, 占用状态只有空/占两种
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// CargoBox - 动态库区箱体
// ==========================================
// 用于入库区/出库区/发运归档
// position 为库区内稠密键: 该库区内最小未占用正整数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CargoBox {
    pub position: u32,    // 库区内位置 (稠密键)
    pub auto_id: String,  // 自动编号 (BOX-YYYYMMDD-NNN)
    pub name: String,     // 货品名称
    pub temperature: f64, // 温度 (°C)
}

// ==========================================
// StorageSlot - 存储区固定槽位
// ==========================================
// 全库固定 N 个槽位 (默认 12), position 1..=N
// 空槽: auto_id 为空串且 temperature 为 None
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSlot {
    pub position: u32,            // 槽位编号 (不可变)
    pub auto_id: String,          // 占用箱体编号, 空串表示空槽
    pub name: String,             // 占用箱体名称
    pub temperature: Option<f64>, // 占用箱体温度, 空槽为 None
}

impl StorageSlot {
    /// 构造空槽
    pub fn empty(position: u32) -> Self {
        Self {
            position,
            auto_id: String::new(),
            name: String::new(),
            temperature: None,
        }
    }

    /// 槽位是否被占用
    pub fn is_occupied(&self) -> bool {
        !self.auto_id.trim().is_empty()
    }

    /// 写入箱体数据 (调用方负责先校验空槽)
    pub fn fill(&mut self, auto_id: String, name: String, temperature: f64) {
        self.auto_id = auto_id;
        self.name = name;
        self.temperature = Some(temperature);
    }

    /// 清空槽位
    pub fn clear(&mut self) {
        self.auto_id.clear();
        self.name.clear();
        self.temperature = None;
    }

    /// 以箱体视图读取占用槽位 (空槽返回 None)
    pub fn as_cargo_box(&self) -> Option<CargoBox> {
        if !self.is_occupied() {
            return None;
        }
        Some(CargoBox {
            position: self.position,
            auto_id: self.auto_id.clone(),
            name: self.name.clone(),
            temperature: self.temperature.unwrap_or(0.0),
        })
    }
}

/// 构造初始槽位数组 (1..=total 全部为空槽)
pub fn create_initial_slots(total: u32) -> Vec<StorageSlot> {
    (1..=total).map(StorageSlot::empty).collect()
}

/// 按位置升序排序 (入库区/出库区列表展示与持久化顺序)
pub fn sort_by_position(boxes: &mut [CargoBox]) {
    boxes.sort_by_key(|b| b.position);
}
