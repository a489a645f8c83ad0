// ==========================================
// 冷库仓储工单系统 - 编号发号服务
// ==========================================
// 职责: 自动编号生成 (PREFIX-YYYYMMDD-NNN)
// 说明: 计数器按 前缀+日期 原子递增, 持久化在 KV 存储;
//       发号失败时退化为随机后缀, 绝不阻塞业务流程
// 注入式服务, 测试可替换确定性假实现
// ==========================================

use crate::repository::error::RepositoryResult;
use crate::repository::kv_store::KvStore;
use chrono::Local;
use std::sync::Arc;
use uuid::Uuid;

/// 箱体编号前缀
pub const BOX_ID_PREFIX: &str = "BOX";

/// 库房编号前缀
pub const WAREHOUSE_ID_PREFIX: &str = "WH";

// ==========================================
// SequenceGenerator - 序列发号能力
// ==========================================
pub trait SequenceGenerator: Send + Sync {
    /// 返回 (prefix, date_key) 对应计数器的下一个值 (从 1 开始)
    fn next(&self, prefix: &str, date_key: &str) -> RepositoryResult<u32>;
}

// ==========================================
// KvSequenceGenerator - KV 计数器实现
// ==========================================
pub struct KvSequenceGenerator {
    store: Arc<dyn KvStore>,
}

impl KvSequenceGenerator {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }
}

impl SequenceGenerator for KvSequenceGenerator {
    fn next(&self, prefix: &str, date_key: &str) -> RepositoryResult<u32> {
        self.store
            .next_counter(&format!("auto-counter:{}:{}", prefix, date_key))
    }
}

// ==========================================
// IdService - 业务编号门面
// ==========================================
pub struct IdService {
    generator: Arc<dyn SequenceGenerator>,
}

impl IdService {
    pub fn new(generator: Arc<dyn SequenceGenerator>) -> Self {
        Self { generator }
    }

    /// 箱体编号: BOX-YYYYMMDD-NNN
    pub fn new_box_id(&self) -> String {
        self.auto_id(BOX_ID_PREFIX)
    }

    /// 库房编号: WH-YYYYMMDD-NNN
    pub fn new_warehouse_id(&self) -> String {
        self.auto_id(WAREHOUSE_ID_PREFIX)
    }

    /// 工单 id (UUID v4, 无日期语义)
    pub fn new_order_id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// 故障上报告警 id 后缀
    pub fn new_report_suffix(&self) -> String {
        Uuid::new_v4().to_string()
    }

    fn auto_id(&self, prefix: &str) -> String {
        let date_key = Local::now().format("%Y%m%d").to_string();
        match self.generator.next(prefix, &date_key) {
            Ok(n) => format_auto_id(prefix, &date_key, n),
            Err(e) => {
                // 计数器不可用时退化为随机后缀
                tracing::warn!("编号计数器不可用, 使用随机后缀: {}", e);
                format_auto_id(prefix, &date_key, random_suffix())
            }
        }
    }
}

/// 编号拼装: PREFIX-YYYYMMDD-NNN (序号零填充到 3 位)
pub fn format_auto_id(prefix: &str, date_key: &str, seq: u32) -> String {
    format!("{}-{}-{:03}", prefix, date_key, seq)
}

/// 从 UUID 派生 0..999 的随机后缀
fn random_suffix() -> u32 {
    let bytes = *Uuid::new_v4().as_bytes();
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) % 1000
}
