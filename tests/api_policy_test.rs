// ==========================================
// API 授权与变体集成测试
// ==========================================
// 测试范围:
// 1. 授权矩阵: 每个变更入口对无权角色的拒绝
// 2. 简化变体 (复核关闭) 的行为
// 3. 检索与库房命名
// 4. 取消工单扩展点
// ==========================================

mod helpers;

use std::sync::Arc;

use cold_storage_wms::api::ApiError;
use cold_storage_wms::domain::types::{OrderType, Role, Zone};
use cold_storage_wms::engine::orders::OrderError;
use cold_storage_wms::repository::kv_store::{KvStore, MemoryKvStore, StateKey};
use helpers::api_test_helper::ApiTestEnv;
use serde_json::json;

fn is_unauthorized(err: &ApiError) -> bool {
    matches!(
        err,
        ApiError::Unauthorized { .. } | ApiError::Order(OrderError::Unauthorized { .. })
    )
}

// ==========================================
// 授权矩阵
// ==========================================

#[test]
fn test_入库登记仅保管员() {
    let env = ApiTestEnv::new();
    for role in [Role::Admin, Role::Operator, Role::Supervisor] {
        let err = env.api.register_inbound(role, "箱", 0.0).unwrap_err();
        assert!(is_unauthorized(&err), "角色 {} 不应有入库登记权限", role);
    }
    env.api
        .register_inbound(Role::Custodian, "箱", 0.0)
        .expect("保管员登记应成功");
}

#[test]
fn test_创建工单仅班长() {
    let env = ApiTestEnv::new();
    let position = env.register("箱", 0.0);

    for role in [Role::Custodian, Role::Admin, Role::Operator] {
        let err = env
            .api
            .create_order(role, OrderType::ToStorage, Zone::Inbound, position, Some(1))
            .unwrap_err();
        assert!(is_unauthorized(&err), "角色 {} 不应有创建工单权限", role);
    }
    assert!(env.api.pending_orders().unwrap().is_empty());
}

#[test]
fn test_执行工单仅操作员() {
    let env = ApiTestEnv::new();
    let position = env.register("箱", 0.0);
    let order = env.create_to_storage(position, 1);

    for role in [Role::Custodian, Role::Admin, Role::Supervisor] {
        let err = env.api.execute_order(role, &order.id).unwrap_err();
        assert!(is_unauthorized(&err), "角色 {} 不应有执行工单权限", role);
    }
    // 被拒期间队列与库区不动
    assert_eq!(env.api.pending_orders().unwrap().len(), 1);
    assert_eq!(env.api.zone_overview(Role::Admin).unwrap().occupied_count, 0);
}

#[test]
fn test_发运仅保管员_上报仅操作员() {
    let env = ApiTestEnv::new();
    env.stock_slot("箱", 0.0, 1);
    let order = env
        .api
        .create_order(Role::Supervisor, OrderType::ToOutbound, Zone::Storage, 1, None)
        .unwrap();
    env.api.execute_order(Role::Operator, &order.id).unwrap();

    let err = env.api.dispatch_from_outbound(Role::Operator, 1).unwrap_err();
    assert!(is_unauthorized(&err));

    // 上报需要队列里有工单
    let position = env.register("箱2", 0.0);
    let pending = env.create_to_storage(position, 2);
    let err = env
        .api
        .report_failure(Role::Supervisor, &pending.id, "班长")
        .unwrap_err();
    assert!(is_unauthorized(&err));
    env.api
        .report_failure(Role::Operator, &pending.id, "操作员")
        .expect("操作员上报应成功");
}

#[test]
fn test_检索仅管理员() {
    let env = ApiTestEnv::new();
    let cargo = env
        .api
        .register_inbound(Role::Custodian, "带鱼", -5.0)
        .unwrap();

    for role in [Role::Custodian, Role::Operator, Role::Supervisor] {
        let err = env.api.search_box(role, &cargo.auto_id).unwrap_err();
        assert!(is_unauthorized(&err));
    }

    // 编号与名称均可命中
    let (zone, found) = env
        .api
        .search_box(Role::Admin, &cargo.auto_id)
        .unwrap()
        .expect("应命中");
    assert_eq!(zone, Zone::Inbound);
    assert_eq!(found.position, cargo.position);
    assert!(env.api.search_box(Role::Admin, "带鱼").unwrap().is_some());
    assert!(env.api.search_box(Role::Admin, "不存在").unwrap().is_none());
}

#[test]
fn test_库房命名仅管理员() {
    let env = ApiTestEnv::new();
    let err = env.api.rename_warehouse(Role::Custodian, "冷库").unwrap_err();
    assert!(is_unauthorized(&err));

    env.api.rename_warehouse(Role::Admin, "  一号冷库  ").unwrap();
    assert_eq!(env.api.identity().unwrap().name, "一号冷库");

    let err = env.api.rename_warehouse(Role::Admin, "   ").unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[test]
fn test_库区总览权限() {
    let env = ApiTestEnv::new();
    assert!(env.api.zone_overview(Role::Admin).is_ok());
    assert!(env.api.zone_overview(Role::Operator).is_ok());
    assert!(is_unauthorized(&env.api.zone_overview(Role::Custodian).unwrap_err()));
    assert!(is_unauthorized(&env.api.zone_overview(Role::Supervisor).unwrap_err()));
}

// ==========================================
// 简化变体与扩展点
// ==========================================

#[test]
fn test_复核关闭变体_班长整体禁用() {
    let store = Arc::new(MemoryKvStore::new());
    store
        .save(StateKey::Config, &json!({"enableReviewOrders": false}))
        .unwrap();
    let env = ApiTestEnv::from_store(store);
    env.register("箱", 0.0);

    // 班长失去全部创建权限
    let err = env
        .api
        .create_order(Role::Supervisor, OrderType::ToStorage, Zone::Inbound, 1, Some(1))
        .unwrap_err();
    assert!(is_unauthorized(&err));

    // 管理员接手创建, 但复核类型不可用
    env.api
        .create_order(Role::Admin, OrderType::ToStorage, Zone::Inbound, 1, Some(1))
        .expect("简化变体下管理员创建应成功");
    let err = env.api.create_review_order(Role::Admin, 1).unwrap_err();
    assert!(is_unauthorized(&err));
}

#[test]
fn test_取消工单扩展点默认关闭_开启后生效() {
    // 默认关闭
    let env = ApiTestEnv::new();
    let position = env.register("箱", 0.0);
    let order = env.create_to_storage(position, 1);
    let err = env.api.cancel_order(Role::Supervisor, &order.id).unwrap_err();
    assert!(matches!(
        err,
        ApiError::Order(OrderError::CancellationDisabled)
    ));

    // 配置开启后班长可取消
    let store = Arc::new(MemoryKvStore::new());
    store
        .save(StateKey::Config, &json!({"allowCancellation": true}))
        .unwrap();
    let env = ApiTestEnv::from_store(store);
    let position = env.register("箱", 0.0);
    let order = env.create_to_storage(position, 1);

    let err = env.api.cancel_order(Role::Operator, &order.id).unwrap_err();
    assert!(is_unauthorized(&err));

    env.api
        .cancel_order(Role::Supervisor, &order.id)
        .expect("开启后取消应成功");
    assert!(env.api.pending_orders().unwrap().is_empty());
}

#[test]
fn test_滞留策略开启后刷新丢弃过期工单() {
    let store = Arc::new(MemoryKvStore::new());
    store
        .save(
            StateKey::Config,
            &json!({"expiryPolicy": {"mode": "expire_after_ms", "ms": 600000}}),
        )
        .unwrap();
    let env = ApiTestEnv::from_store(store);
    let position = env.register("箱", 0.0);
    let order = env.create_to_storage(position, 1);

    // 未到限不丢
    env.api.refresh_alerts_at(order.created_at_ms + 1_000).unwrap();
    assert_eq!(env.api.pending_orders().unwrap().len(), 1);

    // 超限即丢, 其超时告警也随之消失
    env.api.refresh_alerts_at(order.created_at_ms + 700_000).unwrap();
    assert!(env.api.pending_orders().unwrap().is_empty());
    assert!(env.api.alerts().unwrap().is_empty());
}
