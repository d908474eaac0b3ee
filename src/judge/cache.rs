//! 评测结果缓存
//!
//! 以压缩提交键索引的内存表，写入为后写覆盖。压缩键含有完整提交内容，
//! 只在进程内使用；客户端拿到的是它的摘要句柄（见 [`super::key::result_handle`]），
//! 通过句柄索引回查。定时清理 `updated_at` 超过 TTL 的已结束条目。

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use super::key::result_handle;
use crate::models::judge::entities::JudgeReport;

/// `begin` 的结果
#[derive(Debug)]
pub enum Begin {
    /// 新建了 running 条目，由调用方负责执行
    Started(JudgeReport),
    /// 已有条目（运行中或已结束）
    Existing(JudgeReport),
}

#[derive(Clone)]
pub struct JudgeCache {
    entries: Arc<DashMap<String, JudgeReport>>,
    // 句柄 -> 压缩键
    handles: Arc<DashMap<String, String>>,
    ttl: Duration,
}

impl JudgeCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            handles: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<JudgeReport> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// 按对外句柄查找
    pub fn lookup(&self, handle: &str) -> Option<JudgeReport> {
        let key = self.handles.get(handle)?.value().clone();
        self.get(&key)
    }

    pub fn put(&self, key: &str, report: JudgeReport) {
        self.handles.insert(report.key.clone(), key.to_string());
        self.entries.insert(key.to_string(), report);
    }

    pub fn remove(&self, key: &str) {
        if let Some((_, report)) = self.entries.remove(key) {
            self.handles.remove(&report.key);
        }
    }

    /// 原子地占用一个键：不存在时写入 running 报告
    pub fn begin(&self, key: &str, total: usize) -> Begin {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(entry) => Begin::Existing(entry.get().clone()),
            Entry::Vacant(entry) => {
                let report = JudgeReport::start(result_handle(key), total);
                self.handles.insert(report.key.clone(), key.to_string());
                entry.insert(report.clone());
                Begin::Started(report)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 删除过期的已结束条目，返回删除数量
    ///
    /// running 条目由运行任务自己收尾，清理时不动。
    pub fn sweep(&self) -> usize {
        let ttl = match chrono::Duration::from_std(self.ttl) {
            Ok(ttl) => ttl,
            Err(_) => return 0,
        };
        let deadline = chrono::Utc::now() - ttl;

        let before = self.entries.len();
        self.entries
            .retain(|_, report| !report.state.is_terminal() || report.updated_at > deadline);
        self.handles.retain(|_, key| self.entries.contains_key(key.as_str()));
        before.saturating_sub(self.entries.len())
    }

    /// 启动后台清理任务
    pub fn spawn_cleanup(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // 第一次 tick 立即返回
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = cache.sweep();
                if removed > 0 {
                    debug!(
                        "Judge cache sweep removed {} entries, {} left",
                        removed,
                        cache.len()
                    );
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::judge::entities::JudgeRunState;

    #[test]
    fn test_begin_is_exclusive() {
        let cache = JudgeCache::new(Duration::from_secs(60));

        assert!(matches!(cache.begin("k", 2), Begin::Started(_)));
        match cache.begin("k", 2) {
            Begin::Existing(report) => assert_eq!(report.state, JudgeRunState::Running),
            Begin::Started(_) => panic!("second begin must not start a run"),
        }
        assert_eq!(cache.len(), 1);
    }

    fn stale(key: &str, state: JudgeRunState) -> JudgeReport {
        let mut report = JudgeReport::start(result_handle(key), 1);
        report.finish(state);
        report.updated_at = chrono::Utc::now() - chrono::Duration::seconds(120);
        report
    }

    #[test]
    fn test_put_overwrites() {
        let cache = JudgeCache::new(Duration::from_secs(60));
        let Begin::Started(mut report) = cache.begin("k", 1) else {
            panic!("empty cache must start a run");
        };

        report.finish(JudgeRunState::Finished);
        cache.put("k", report.clone());

        assert_eq!(cache.get("k").unwrap().state, JudgeRunState::Finished);
        assert_eq!(cache.lookup(&report.key).unwrap().state, JudgeRunState::Finished);
    }

    #[test]
    fn test_lookup_by_handle_only() {
        let cache = JudgeCache::new(Duration::from_secs(60));
        cache.begin("compressed-key", 1);

        assert!(cache.lookup("compressed-key").is_none());
        let handle = result_handle("compressed-key");
        assert_eq!(cache.lookup(&handle).unwrap().key, handle);

        cache.remove("compressed-key");
        assert!(cache.lookup(&handle).is_none());
    }

    #[test]
    fn test_sweep_removes_stale_entries() {
        let cache = JudgeCache::new(Duration::from_secs(60));

        cache.put("old", stale("old", JudgeRunState::Finished));
        cache.begin("fresh", 1);

        assert_eq!(cache.sweep(), 1);
        assert!(cache.get("old").is_none());
        assert!(cache.lookup(&result_handle("old")).is_none());
        assert!(cache.get("fresh").is_some());
    }

    #[test]
    fn test_sweep_keeps_running_entries() {
        let cache = JudgeCache::new(Duration::from_secs(60));

        let mut slow = JudgeReport::start(result_handle("slow"), 3);
        slow.updated_at = chrono::Utc::now() - chrono::Duration::seconds(600);
        cache.put("slow", slow);
        cache.put("aborted", stale("aborted", JudgeRunState::Aborted));

        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.get("slow").unwrap().state, JudgeRunState::Running);
        assert!(cache.lookup(&result_handle("slow")).is_some());
        assert!(matches!(cache.begin("slow", 3), Begin::Existing(_)));
    }

    #[tokio::test]
    async fn test_cleanup_task_runs_periodically() {
        let cache = JudgeCache::new(Duration::from_secs(60));
        cache.put("old", stale("old", JudgeRunState::Finished));

        let handle = cache.spawn_cleanup(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(cache.is_empty());
        handle.abort();
    }
}
