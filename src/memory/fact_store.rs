//! 长期记忆：fact_<n> 键值存储
//!
//! FactStore 只负责 put / get_all 的持久化（SQLite 或内存）；FactMemory 在其上实现
//! 「追加一条事实」与「子串检索」。追加时在互斥锁内读取最大序号再写入，保证并发请求下键唯一且单调递增；
//! 检索读取快照，不持有追加锁。

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use rusqlite::{params, Connection};

use crate::core::AgentError;

/// 事实键前缀
pub const FACT_KEY_PREFIX: &str = "fact_";

/// 持久化接口：跨进程重启保留
pub trait FactStore: Send + Sync {
    fn put(&self, key: &str, value: &str) -> Result<(), AgentError>;

    fn get_all(&self) -> Result<BTreeMap<String, String>, AgentError>;

    /// 关闭底层资源；关闭后的 put / get_all 返回错误
    fn close(&self) -> Result<(), AgentError> {
        Ok(())
    }
}

/// SQLite 实现：单表 facts(key, value)
pub struct SqliteFactStore {
    conn: Mutex<Option<Connection>>,
}

impl SqliteFactStore {
    /// 打开（或创建）数据库文件；父目录不存在时自动创建
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AgentError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| AgentError::Memory(e.to_string()))?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, AgentError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, AgentError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS facts (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, rusqlite::Error>,
    ) -> Result<T, AgentError> {
        let guard = self
            .conn
            .lock()
            .map_err(|e| AgentError::Memory(e.to_string()))?;
        let conn = guard
            .as_ref()
            .ok_or_else(|| AgentError::Memory("fact store is closed".to_string()))?;
        Ok(f(conn)?)
    }
}

impl FactStore for SqliteFactStore {
    fn put(&self, key: &str, value: &str) -> Result<(), AgentError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO facts (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map(|_| ())
        })
    }

    fn get_all(&self) -> Result<BTreeMap<String, String>, AgentError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT key, value FROM facts")?;
            let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
            rows.collect::<Result<BTreeMap<_, _>, _>>()
        })
    }

    fn close(&self) -> Result<(), AgentError> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|e| AgentError::Memory(e.to_string()))?;
        if let Some(conn) = guard.take() {
            conn.close().map_err(|(_, e)| AgentError::from(e))?;
            tracing::info!("fact store closed");
        }
        Ok(())
    }
}

/// 内存实现（测试 / 未配置持久化路径时使用）
#[derive(Default)]
pub struct InMemoryFactStore {
    facts: RwLock<BTreeMap<String, String>>,
    closed: AtomicBool,
}

impl InMemoryFactStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> Result<(), AgentError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(AgentError::Memory("fact store is closed".to_string()));
        }
        Ok(())
    }
}

impl FactStore for InMemoryFactStore {
    fn put(&self, key: &str, value: &str) -> Result<(), AgentError> {
        self.ensure_open()?;
        self.facts
            .write()
            .map_err(|e| AgentError::Memory(e.to_string()))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_all(&self) -> Result<BTreeMap<String, String>, AgentError> {
        self.ensure_open()?;
        Ok(self
            .facts
            .read()
            .map_err(|e| AgentError::Memory(e.to_string()))?
            .clone())
    }

    fn close(&self) -> Result<(), AgentError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// 解析 fact_<n> 的序号
fn fact_index(key: &str) -> Option<u64> {
    key.strip_prefix(FACT_KEY_PREFIX)?.parse().ok()
}

/// 注入式长期记忆句柄：进程启动时打开，关闭时由 FactStoreCleanup 释放
pub struct FactMemory {
    store: Arc<dyn FactStore>,
    append_lock: Mutex<()>,
}

impl FactMemory {
    pub fn new(store: Arc<dyn FactStore>) -> Self {
        Self {
            store,
            append_lock: Mutex::new(()),
        }
    }

    /// 追加一条事实，返回分配的键（fact_<最大序号+1>）
    pub fn remember(&self, fact: &str) -> Result<String, AgentError> {
        let _guard = self
            .append_lock
            .lock()
            .map_err(|e| AgentError::Memory(e.to_string()))?;
        let next = self
            .store
            .get_all()?
            .keys()
            .filter_map(|k| fact_index(k))
            .max()
            .unwrap_or(0)
            + 1;
        let key = format!("{FACT_KEY_PREFIX}{next}");
        self.store.put(&key, fact)?;
        tracing::info!(key = %key, "fact stored");
        Ok(key)
    }

    /// 当前所有事实的快照
    pub fn snapshot(&self) -> Result<BTreeMap<String, String>, AgentError> {
        self.store.get_all()
    }

    /// 大小写不敏感的子串检索，按序号升序返回事实文本
    pub fn search(&self, query: &str) -> Result<Vec<String>, AgentError> {
        let query = query.to_lowercase();
        let mut hits: Vec<(u64, String)> = self
            .snapshot()?
            .into_iter()
            .filter(|(_, fact)| fact.to_lowercase().contains(&query))
            .map(|(key, fact)| (fact_index(&key).unwrap_or(u64::MAX), fact))
            .collect();
        hits.sort_by_key(|(index, _)| *index);
        Ok(hits.into_iter().map(|(_, fact)| fact).collect())
    }

    pub fn close(&self) -> Result<(), AgentError> {
        self.store.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remember_assigns_monotonic_keys() {
        let memory = FactMemory::new(Arc::new(InMemoryFactStore::new()));
        assert_eq!(memory.remember("first").unwrap(), "fact_1");
        assert_eq!(memory.remember("second").unwrap(), "fact_2");
        assert_eq!(memory.snapshot().unwrap().len(), 2);
    }

    #[test]
    fn test_remember_continues_after_highest_existing_key() {
        let store = Arc::new(InMemoryFactStore::new());
        store.put("fact_7", "seeded").unwrap();
        let memory = FactMemory::new(store);
        assert_eq!(memory.remember("next").unwrap(), "fact_8");
    }

    #[test]
    fn test_concurrent_remember_keys_are_unique() {
        let memory = Arc::new(FactMemory::new(Arc::new(InMemoryFactStore::new())));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let memory = Arc::clone(&memory);
                std::thread::spawn(move || memory.remember(&format!("fact number {i}")).unwrap())
            })
            .collect();
        let mut keys: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 8);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let memory = FactMemory::new(Arc::new(InMemoryFactStore::new()));
        memory.remember("The answer is 42").unwrap();
        memory.remember("my favorite color is blue").unwrap();
        memory.remember("42 was paired with apples").unwrap();

        assert_eq!(
            memory.search("42").unwrap(),
            vec!["The answer is 42".to_string(), "42 was paired with apples".to_string()]
        );
        assert_eq!(memory.search("BLUE").unwrap().len(), 1);
        assert!(memory.search("99").unwrap().is_empty());
    }

    #[test]
    fn test_sqlite_store_persists_across_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("memory").join("agent_memory.db");

        {
            let memory = FactMemory::new(Arc::new(SqliteFactStore::open(&path).unwrap()));
            memory.remember("the secret code is 1234").unwrap();
            memory.close().unwrap();
        }

        let memory = FactMemory::new(Arc::new(SqliteFactStore::open(&path).unwrap()));
        let all = memory.snapshot().unwrap();
        assert_eq!(all.get("fact_1").map(String::as_str), Some("the secret code is 1234"));
        assert_eq!(memory.remember("another").unwrap(), "fact_2");
    }

    #[test]
    fn test_closed_sqlite_store_rejects_writes() {
        let store = SqliteFactStore::open_in_memory().unwrap();
        store.close().unwrap();
        assert!(matches!(store.put("fact_1", "x"), Err(AgentError::Memory(_))));
        // 重复关闭无副作用
        assert!(store.close().is_ok());
    }
}
