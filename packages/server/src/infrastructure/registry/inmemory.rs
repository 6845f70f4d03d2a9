//! InMemory ConnectionRegistry 実装
//!
//! A single `tokio::sync::Mutex` guards the map. Every method holds the lock only
//! for the structural read or write; snapshots are copied out so the relay loop
//! writes to clients with the lock released.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionHandle, ConnectionId, ConnectionRegistry};

#[derive(Default)]
pub struct InMemoryConnectionRegistry {
    /// Key: ConnectionId, Value: the live handle
    connections: Mutex<HashMap<ConnectionId, Arc<ConnectionHandle>>>,
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn add(&self, handle: Arc<ConnectionHandle>) {
        let id = handle.id();
        let mut connections = self.connections.lock().await;
        connections.insert(id, handle);
        tracing::debug!(
            "Connection '{}' registered ({} live)",
            id,
            connections.len()
        );
    }

    async fn remove(&self, id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let mut connections = self.connections.lock().await;
        let removed = connections.remove(id);
        if removed.is_some() {
            tracing::debug!(
                "Connection '{}' unregistered ({} live)",
                id,
                connections.len()
            );
        }
        removed
    }

    async fn snapshot(&self) -> Vec<Arc<ConnectionHandle>> {
        let connections = self.connections.lock().await;
        connections.values().cloned().collect()
    }

    async fn contains(&self, id: &ConnectionId) -> bool {
        let connections = self.connections.lock().await;
        connections.contains_key(id)
    }

    async fn count(&self) -> usize {
        let connections = self.connections.lock().await;
        connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MockChannelWriter;
    use std::collections::HashSet;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - add / remove / snapshot の基本動作
    // - remove の冪等性（既に削除済みでもエラーにならない）
    // - 並行な add / remove 後の整合性
    //
    // 【なぜこのテストが必要か】
    // - Registry は全ハンドラとリレーループが共有する唯一の可変状態
    // - 同時更新で重複・取りこぼしが起きないことを保証する必要がある
    // ========================================

    fn create_test_handle() -> Arc<ConnectionHandle> {
        let mut writer = MockChannelWriter::new();
        writer.expect_write().returning(|_| Ok(()));
        writer.expect_close().returning(|| ());
        Arc::new(ConnectionHandle::new(Box::new(writer)))
    }

    #[tokio::test]
    async fn test_add_makes_handle_visible() {
        // テスト項目: add したハンドルが snapshot に含まれる
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();
        let handle = create_test_handle();

        // when (操作):
        registry.add(handle.clone()).await;

        // then (期待する結果):
        assert!(registry.contains(&handle.id()).await);
        assert_eq!(registry.count().await, 1);
        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id(), handle.id());
    }

    #[tokio::test]
    async fn test_remove_returns_handle_once() {
        // テスト項目: remove は一度目だけハンドルを返し、二度目は None（冪等性）
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();
        let handle = create_test_handle();
        registry.add(handle.clone()).await;

        // when (操作):
        let first = registry.remove(&handle.id()).await;
        let second = registry.remove(&handle.id()).await;

        // then (期待する結果):
        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(registry.count().await, 0);
        assert!(registry.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_unknown_handle_is_noop() {
        // テスト項目: 存在しないハンドルを削除しても問題なく処理される
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();
        registry.add(create_test_handle()).await;

        // when (操作):
        let removed = registry.remove(&ConnectionId::generate()).await;

        // then (期待する結果):
        assert!(removed.is_none());
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_add_same_handle_twice_keeps_single_entry() {
        // テスト項目: 同じハンドルを二度 add しても重複しない
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();
        let handle = create_test_handle();

        // when (操作):
        registry.add(handle.clone()).await;
        registry.add(handle.clone()).await;

        // then (期待する結果):
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_snapshot_is_detached_from_later_mutations() {
        // テスト項目: snapshot 取得後の変更は取得済み snapshot に影響しない
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();
        let handle = create_test_handle();
        registry.add(handle.clone()).await;
        let snapshot = registry.snapshot().await;

        // when (操作):
        registry.remove(&handle.id()).await;
        registry.add(create_test_handle()).await;

        // then (期待する結果):
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id(), handle.id());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_add_and_remove_is_consistent() {
        // テスト項目: 1000 件の並行 add と 500 件の並行 remove の後、ちょうど 500 件残る
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let handles: Vec<_> = (0..1000).map(|_| create_test_handle()).collect();

        // when (操作):
        let mut tasks = Vec::new();
        for handle in handles.iter().cloned() {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move { registry.add(handle).await }));
        }
        for task in tasks.drain(..) {
            task.await.unwrap();
        }
        for handle in handles.iter().take(500).cloned() {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                registry.remove(&handle.id()).await;
            }));
        }
        // remove と並行して snapshot を取り、重複がないことを確認する
        for _ in 0..50 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                let snapshot = registry.snapshot().await;
                let unique: HashSet<_> = snapshot.iter().map(|h| h.id()).collect();
                assert_eq!(unique.len(), snapshot.len());
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        // then (期待する結果):
        assert_eq!(registry.count().await, 500);
        let survivors: HashSet<_> = registry.snapshot().await.iter().map(|h| h.id()).collect();
        let expected: HashSet<_> = handles.iter().skip(500).map(|h| h.id()).collect();
        assert_eq!(survivors, expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_interleaved_add_and_remove_is_consistent() {
        // テスト項目: add と remove が入り混じっても最終的な件数が正しい
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let staying: Vec<_> = (0..500).map(|_| create_test_handle()).collect();
        let leaving: Vec<_> = (0..500).map(|_| create_test_handle()).collect();

        // when (操作): 各 leaving ハンドルは自分のタスク内で add → remove する
        let mut tasks = Vec::new();
        for handle in staying.iter().cloned() {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move { registry.add(handle).await }));
        }
        for handle in leaving.iter().cloned() {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                let id = handle.id();
                registry.add(handle).await;
                registry.remove(&id).await;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        // then (期待する結果):
        assert_eq!(registry.count().await, 500);
        for handle in &leaving {
            assert!(!registry.contains(&handle.id()).await);
        }
    }
}
