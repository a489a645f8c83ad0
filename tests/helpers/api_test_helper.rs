// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 提供API层集成测试的通用测试环境
// ==========================================

use std::sync::Arc;
use tempfile::NamedTempFile;

use cold_storage_wms::api::WarehouseApi;
use cold_storage_wms::app::AppState;
use cold_storage_wms::domain::order::WorkOrder;
use cold_storage_wms::domain::types::{OrderType, Role, Zone};
use cold_storage_wms::repository::kv_store::MemoryKvStore;

// ==========================================
// API测试环境
// ==========================================

/// API测试环境 (内存 KV 存储)
pub struct ApiTestEnv {
    pub api: Arc<WarehouseApi>,
    /// 底层内存存储 (损坏数据预置等场景)
    pub store: Arc<MemoryKvStore>,
}

impl ApiTestEnv {
    pub fn new() -> Self {
        let store = Arc::new(MemoryKvStore::new());
        let app = AppState::with_store(store.clone(), None).expect("无法装配测试环境");
        Self {
            api: app.warehouse_api,
            store,
        }
    }

    /// 从预置好数据的存储装配 (先 seed 再建环境)
    pub fn from_store(store: Arc<MemoryKvStore>) -> Self {
        let app = AppState::with_store(store.clone(), None).expect("无法装配测试环境");
        Self {
            api: app.warehouse_api,
            store,
        }
    }

    /// 保管员登记一个箱体, 返回其入库区位置
    pub fn register(&self, name: &str, temperature: f64) -> u32 {
        self.api
            .register_inbound(Role::Custodian, name, temperature)
            .expect("登记失败")
            .position
    }

    /// 班长创建入库区 -> 存储区工单
    pub fn create_to_storage(&self, source_position: u32, target: u32) -> WorkOrder {
        self.api
            .create_order(
                Role::Supervisor,
                OrderType::ToStorage,
                Zone::Inbound,
                source_position,
                Some(target),
            )
            .expect("创建工单失败")
    }

    /// 登记并立即移入指定存储槽位
    pub fn stock_slot(&self, name: &str, temperature: f64, target: u32) {
        let position = self.register(name, temperature);
        let order = self.create_to_storage(position, target);
        self.api
            .execute_order(Role::Operator, &order.id)
            .expect("执行工单失败");
    }
}

/// 磁盘 SQLite 测试环境 (持久化往返场景)
///
/// 临时文件随环境一起存活, 可用同一路径重新装配验证重载
pub struct SqliteTestEnv {
    pub db_path: String,
    pub api: Arc<WarehouseApi>,
    _temp_file: NamedTempFile,
}

impl SqliteTestEnv {
    pub fn new() -> Self {
        let temp_file = NamedTempFile::new().expect("无法创建临时文件");
        let db_path = temp_file.path().to_string_lossy().to_string();
        let app = AppState::new(db_path.clone()).expect("无法装配测试环境");
        Self {
            db_path,
            api: app.warehouse_api,
            _temp_file: temp_file,
        }
    }

    /// 用同一数据库路径重新装配 (模拟进程重启)
    pub fn reopen(&self) -> Arc<WarehouseApi> {
        AppState::new(self.db_path.clone())
            .expect("无法重新装配")
            .warehouse_api
    }
}
