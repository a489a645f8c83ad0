// ==========================================
// 冷库仓储工单系统 - SQLite KV 存储
// ==========================================
// 职责: KvStore 的 SQLite 实现
// 表结构: warehouse_kv (key TEXT PK, value TEXT JSON)
//         auto_counter (counter_key TEXT PK, value INTEGER)
// 并发: 共享连接 + Mutex, 计数器自增在同一事务内完成
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::kv_store::{KvStore, StateKey};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::sync::{Arc, Mutex};

pub struct SqliteKvStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteKvStore {
    /// 打开数据库并确保表存在
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 内存数据库 (测试用)
    pub fn in_memory() -> RepositoryResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        crate::db::configure_sqlite_connection(&conn)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建 (连接需已应用统一 PRAGMA)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            guard.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS warehouse_kv (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE TABLE IF NOT EXISTS auto_counter (
                    counter_key TEXT PRIMARY KEY,
                    value INTEGER NOT NULL DEFAULT 0
                );
                "#,
            )?;
        }
        Ok(Self { conn })
    }
}

impl KvStore for SqliteKvStore {
    fn load(&self, key: StateKey) -> RepositoryResult<Option<Value>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM warehouse_kv WHERE key = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn save(&self, key: StateKey, value: &Value) -> RepositoryResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let text = serde_json::to_string(value)?;
        conn.execute(
            "INSERT INTO warehouse_kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key.as_str(), text],
        )?;
        Ok(())
    }

    fn next_counter(&self, counter_key: &str) -> RepositoryResult<u32> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        // 自增与读取在同一事务内, 保证按日按前缀原子
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO auto_counter (counter_key, value) VALUES (?1, 1)
             ON CONFLICT(counter_key) DO UPDATE SET value = value + 1",
            params![counter_key],
        )?;
        let value: u32 = tx.query_row(
            "SELECT value FROM auto_counter WHERE counter_key = ?1",
            params![counter_key],
            |row| row.get(0),
        )?;
        tx.commit()?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_save_load_覆盖写() {
        let store = SqliteKvStore::in_memory().expect("无法创建内存库");
        assert!(store.load(StateKey::Orders).unwrap().is_none());

        store.save(StateKey::Orders, &json!([{"id": "o1"}])).unwrap();
        store.save(StateKey::Orders, &json!([])).unwrap();

        let loaded = store.load(StateKey::Orders).unwrap().unwrap();
        assert_eq!(loaded, json!([]));
    }

    #[test]
    fn test_counter_按键独立() {
        let store = SqliteKvStore::in_memory().expect("无法创建内存库");
        assert_eq!(store.next_counter("auto-counter:BOX:20260807").unwrap(), 1);
        assert_eq!(store.next_counter("auto-counter:BOX:20260807").unwrap(), 2);
        assert_eq!(store.next_counter("auto-counter:BOX:20260808").unwrap(), 1);
    }
}
