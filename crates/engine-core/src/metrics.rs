use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    rows_read: AtomicU64,
    rows_written: AtomicU64,
    rows_skipped: AtomicU64,
    rows_failed: AtomicU64,
    pages_fetched: AtomicU64,
}

/// Live counters shared across every table of a run.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub rows_read: u64,
    pub rows_written: u64,
    pub rows_skipped: u64,
    pub rows_failed: u64,
    pub pages_fetched: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn increment_read(&self, count: u64) {
        self.inner.rows_read.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_written(&self, count: u64) {
        self.inner.rows_written.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_skipped(&self, count: u64) {
        self.inner.rows_skipped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_failed(&self, count: u64) {
        self.inner.rows_failed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_pages(&self, count: u64) {
        self.inner.pages_fetched.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rows_read: self.inner.rows_read.load(Ordering::Relaxed),
            rows_written: self.inner.rows_written.load(Ordering::Relaxed),
            rows_skipped: self.inner.rows_skipped.load(Ordering::Relaxed),
            rows_failed: self.inner.rows_failed.load(Ordering::Relaxed),
            pages_fetched: self.inner.pages_fetched.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counters() {
        let metrics = Metrics::new();
        let clone = metrics.clone();
        clone.increment_read(3);
        clone.increment_failed(1);
        metrics.increment_written(2);

        let snap = metrics.snapshot();
        assert_eq!(snap.rows_read, 3);
        assert_eq!(snap.rows_written, 2);
        assert_eq!(snap.rows_failed, 1);
    }
}
