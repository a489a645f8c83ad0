// ==========================================
// 冷库仓储工单系统 - 运行统计
// ==========================================
// 职责: 单调递增的业务计数器
// 约束: 只在登记/执行成功后递增, 永不回退
// 发运归档数量不计数, 直接取归档列表长度
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseStats {
    pub inbound_total: u64,      // 入库登记累计
    pub dispatched_total: u64,   // 移入出库区累计 (ToOutbound 执行)
    pub storage_move_total: u64, // 移入存储区累计 (ToStorage 执行)
}

impl WarehouseStats {
    pub fn record_inbound(&mut self) {
        self.inbound_total += 1;
    }

    pub fn record_dispatch(&mut self) {
        self.dispatched_total += 1;
    }

    pub fn record_storage_move(&mut self) {
        self.storage_move_total += 1;
    }
}
