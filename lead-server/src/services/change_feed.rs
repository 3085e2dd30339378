//! Change Feed - 变更事件与聚合失效
//!
//! 每次落库成功的 Lead / Expense 变更都会：
//! 1. 推进该集合的版本号（读路径以版本号判断缓存条目新旧）
//! 2. 向 broadcast 通道发布一条 [`ChangeEvent`]
//!
//! 失效监听器订阅事件流，把短窗口内的突发变更合并成一次缓存清理。
//! 正确性不依赖监听器：读路径总是用当前版本号校验缓存条目，
//! 监听器只负责控制内存占用。

use crate::metrics::cache::{MetricsCache, Versions};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Collection names carried in change events
pub const COLLECTION_LEAD: &str = "lead";
pub const COLLECTION_EXPENSE: &str = "expense";

/// What happened to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
}

/// One accepted mutation against a collection
#[derive(Debug, Clone, Serialize)]
pub struct ChangeEvent {
    pub collection: &'static str,
    pub action: ChangeAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Collection version after this mutation
    pub version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// 集合版本号管理
///
/// 每个集合一个单调递增计数器，缓存条目记录计算时的版本，
/// 版本号一动，旧条目即判定过期。
#[derive(Debug, Default)]
pub struct ResourceVersions {
    versions: DashMap<String, u64>,
}

impl ResourceVersions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 递增指定集合的版本号并返回新值，未知集合从 0 起计（返回 1）
    pub fn increment(&self, collection: &str) -> u64 {
        let mut entry = self.versions.entry(collection.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// 当前版本号，未知集合返回 0
    pub fn get(&self, collection: &str) -> u64 {
        self.versions.get(collection).map(|v| *v).unwrap_or(0)
    }
}

/// Change feed hub: version counters plus the broadcast channel
#[derive(Debug)]
pub struct ChangeFeed {
    versions: ResourceVersions,
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            versions: ResourceVersions::new(),
            tx,
        }
    }

    /// Record an accepted mutation: bump the collection version and
    /// broadcast the event. Returns the new version.
    pub fn publish<T: Serialize>(
        &self,
        collection: &'static str,
        action: ChangeAction,
        id: Option<&str>,
        data: Option<&T>,
    ) -> u64 {
        let version = self.versions.increment(collection);
        let event = ChangeEvent {
            collection,
            action,
            id: id.map(str::to_string),
            version,
            data: data.and_then(|d| serde_json::to_value(d).ok()),
        };
        // send 只在没有任何订阅者时失败，属正常情况
        let _ = self.tx.send(event);
        version
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    pub fn lead_version(&self) -> u64 {
        self.versions.get(COLLECTION_LEAD)
    }

    pub fn expense_version(&self) -> u64 {
        self.versions.get(COLLECTION_EXPENSE)
    }

    /// Snapshot of both collection versions, for stamping cache entries
    pub fn current_versions(&self) -> Versions {
        Versions {
            lead: self.lead_version(),
            expense: self.expense_version(),
        }
    }
}

/// 失效监听器（后台任务）
///
/// 收到第一条事件后等一个合并窗口，吸收窗口内的后续事件，
/// 然后按当前版本号清走过期缓存条目。窗口有界，重算永不被吞掉。
pub async fn run_invalidation_listener(
    feed: Arc<ChangeFeed>,
    cache: Arc<MetricsCache>,
    coalesce_window: Duration,
) {
    let mut rx = feed.subscribe();
    tracing::info!(
        window_ms = coalesce_window.as_millis() as u64,
        "Metrics invalidation listener started"
    );

    loop {
        match rx.recv().await {
            Ok(event) => {
                tracing::debug!(
                    collection = event.collection,
                    version = event.version,
                    "Change event received, coalescing invalidation"
                );
                tokio::time::sleep(coalesce_window).await;
                // 清掉窗口内堆积的事件，一批只清一次缓存
                while rx.try_recv().is_ok() {}
                cache.evict_stale(feed.current_versions());
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                // 落后不影响正确性，版本号校验兜底
                tracing::warn!(skipped, "Invalidation listener lagged, evicting immediately");
                cache.evict_stale(feed.current_versions());
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::info!("Change feed closed, invalidation listener stopping");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::DashboardMetrics;

    #[tokio::test]
    async fn test_publish_bumps_versions_and_broadcasts() {
        let feed = ChangeFeed::new(16);
        let mut rx = feed.subscribe();

        let v = feed.publish(
            COLLECTION_LEAD,
            ChangeAction::Created,
            Some("lead:abc"),
            Some(&serde_json::json!({"customer_name": "Test"})),
        );
        assert_eq!(v, 1);
        assert_eq!(feed.lead_version(), 1);
        assert_eq!(feed.expense_version(), 0);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.collection, COLLECTION_LEAD);
        assert_eq!(event.action, ChangeAction::Created);
        assert_eq!(event.id.as_deref(), Some("lead:abc"));
        assert_eq!(event.version, 1);
        assert!(event.data.is_some());

        feed.publish::<()>(COLLECTION_EXPENSE, ChangeAction::Deleted, None, None);
        assert_eq!(feed.expense_version(), 1);
        assert_eq!(feed.lead_version(), 1);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_still_bumps() {
        let feed = ChangeFeed::new(4);
        assert_eq!(
            feed.publish::<()>(COLLECTION_LEAD, ChangeAction::Updated, Some("lead:x"), None),
            1
        );
        assert_eq!(
            feed.publish::<()>(COLLECTION_LEAD, ChangeAction::Updated, Some("lead:x"), None),
            2
        );
    }

    #[tokio::test]
    async fn test_listener_coalesces_and_evicts() {
        let feed = Arc::new(ChangeFeed::new(64));
        let cache = Arc::new(MetricsCache::new());

        // Entry stamped at the pre-mutation versions
        cache.put_dashboard(
            "all|0|1".to_string(),
            feed.current_versions(),
            DashboardMetrics::default(),
        );
        assert!(!cache.is_empty());

        let listener = tokio::spawn(run_invalidation_listener(
            Arc::clone(&feed),
            Arc::clone(&cache),
            Duration::from_millis(20),
        ));

        // A burst of mutations inside one coalescing window
        for _ in 0..5 {
            feed.publish::<()>(COLLECTION_LEAD, ChangeAction::Updated, Some("lead:x"), None);
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(cache.is_empty(), "stale entry should be evicted");

        listener.abort();
    }
}
