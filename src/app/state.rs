// ==========================================
// 冷库仓储工单系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和 API 实例
// 装配顺序: KV 存储 -> 仓储 -> 发号/授权/引擎 -> API
// ==========================================

use std::sync::Arc;

use crate::api::WarehouseApi;
use crate::domain::user::{StaticUserDirectory, UserDirectory};
use crate::engine::events::SharedPublisher;
use crate::engine::orders::OrderEngine;
use crate::engine::policy::RolePolicy;
use crate::engine::sequence::{IdService, KvSequenceGenerator};
use crate::repository::kv_store::KvStore;
use crate::repository::sqlite_store::SqliteKvStore;
use crate::repository::warehouse_repo::WarehouseRepository;
use crate::service::alert_refresh::spawn_periodic_refresh;

/// 应用状态
///
/// 包含 API 实例和共享资源
pub struct AppState {
    /// 数据库路径 (内存装配时为空串)
    pub db_path: String,

    /// 库房命令 API
    pub warehouse_api: Arc<WarehouseApi>,

    /// 用户目录 (认证协作方接口)
    pub user_directory: Arc<dyn UserDirectory>,
}

impl AppState {
    /// 创建新的 AppState 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 该方法会:
    /// 1. 打开 SQLite KV 存储
    /// 2. 加载配置与全量库房状态 (损坏实体回退默认值)
    /// 3. 装配发号器、授权表、工单引擎与 API
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState, 数据库路径: {}", db_path);

        let store = Arc::new(
            SqliteKvStore::new(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?,
        );
        let mut state = Self::assemble(store, None)?;
        state.db_path = db_path;
        Ok(state)
    }

    /// 从任意 KV 存储装配 (测试注入内存存储)
    pub fn with_store(
        store: Arc<dyn KvStore>,
        publisher: Option<SharedPublisher>,
    ) -> Result<Self, String> {
        Self::assemble(store, publisher)
    }

    fn assemble(
        store: Arc<dyn KvStore>,
        publisher: Option<SharedPublisher>,
    ) -> Result<Self, String> {
        let repo = Arc::new(WarehouseRepository::new(Arc::clone(&store)));
        let config = repo
            .load_config()
            .map_err(|e| format!("无法加载配置: {}", e))?;

        let ids = Arc::new(IdService::new(Arc::new(KvSequenceGenerator::new(
            Arc::clone(&store),
        ))));

        // 复核工单关闭即简化变体: 班长角色整体禁用
        let policy = if config.enable_review_orders {
            Arc::new(RolePolicy::standard())
        } else {
            Arc::new(RolePolicy::without_supervisor())
        };

        let warehouse_state = {
            let ids_for_box = Arc::clone(&ids);
            let ids_for_wh = Arc::clone(&ids);
            let mut mint_box = move || ids_for_box.new_box_id();
            let mut mint_wh = move || ids_for_wh.new_warehouse_id();
            repo.load_state(&config, &mut mint_box, &mut mint_wh)
                .map_err(|e| format!("无法加载库房状态: {}", e))?
        };
        tracing::info!(
            "库房状态加载完成: 库房 {} ({}/{} 槽位占用, {} 张待执行工单)",
            warehouse_state.identity.id,
            warehouse_state.store.occupied_count(),
            warehouse_state.store.total_slots(),
            warehouse_state.orders.len()
        );

        let engine = OrderEngine::new(Arc::clone(&policy), Arc::clone(&ids), config.clone());
        let warehouse_api = Arc::new(WarehouseApi::new(
            warehouse_state,
            engine,
            policy,
            ids,
            repo,
            config,
            publisher,
        ));

        Ok(Self {
            db_path: String::new(),
            warehouse_api,
            user_directory: Arc::new(StaticUserDirectory::standard()),
        })
    }

    /// 启动周期告警刷新任务
    pub fn spawn_alert_refresh(&self) -> tokio::task::JoinHandle<()> {
        spawn_periodic_refresh(Arc::clone(&self.warehouse_api))
    }
}

/// 获取默认数据库路径 (用户数据目录下)
pub fn get_default_db_path() -> String {
    let base = dirs::data_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
    base.join("cold-storage-wms")
        .join("warehouse.db")
        .to_string_lossy()
        .to_string()
}
