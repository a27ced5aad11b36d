//! Change reporter
//!
//! Forwards move records to the analytics sink on detached tasks. Reporting is
//! best-effort: failures are logged and dropped, and the reorder that produced
//! the record never waits on it.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;

use crate::api::client::AnalyticsSink;
use crate::models::MoveRecord;

#[derive(Clone)]
pub struct Reporter {
    sink: Arc<dyn AnalyticsSink>,
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Reporter {
    pub fn new(sink: Arc<dyn AnalyticsSink>) -> Self {
        Self {
            sink,
            pending: Arc::default(),
        }
    }

    fn pending(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Sends `record` in the background. In degraded mode it is only logged.
    pub fn report(&self, record: MoveRecord, degraded: bool) {
        if degraded {
            tracing::info!(
                id = %record.item_id,
                from = record.from_index,
                to = record.to_index,
                "analytics (offline)"
            );
            return;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!(id = %record.item_id, "no tokio runtime, move record dropped");
                return;
            }
        };

        let sink = Arc::clone(&self.sink);
        let handle = runtime.spawn(async move {
            if let Err(e) = sink.record_move(&record).await {
                tracing::warn!(id = %record.item_id, "Analytics error: {}", e);
            }
        });

        let mut pending = self.pending();
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Waits for every report sent so far. Used before process exit and in tests.
    pub async fn flush(&self) {
        let handles: Vec<_> = self.pending().drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::{GatewayError, MemoryGateway};

    struct BrokenSink;

    #[async_trait::async_trait]
    impl AnalyticsSink for BrokenSink {
        async fn record_move(&self, _record: &MoveRecord) -> Result<(), GatewayError> {
            Err(GatewayError::Unavailable("connection refused".to_string()))
        }
    }

    fn record() -> MoveRecord {
        MoveRecord {
            item_id: "1".to_string(),
            from_index: 0,
            to_index: 2,
        }
    }

    #[tokio::test]
    async fn test_report_reaches_sink() {
        let sink = MemoryGateway::default();
        let reporter = Reporter::new(Arc::new(sink.clone()));

        reporter.report(record(), false);
        reporter.flush().await;

        assert_eq!(sink.moves(), vec![record()]);
    }

    #[tokio::test]
    async fn test_degraded_mode_skips_sink() {
        let sink = MemoryGateway::default();
        let reporter = Reporter::new(Arc::new(sink.clone()));

        reporter.report(record(), true);
        reporter.flush().await;

        assert!(sink.moves().is_empty());
    }

    #[tokio::test]
    async fn test_sink_failure_is_swallowed() {
        let reporter = Reporter::new(Arc::new(BrokenSink));

        reporter.report(record(), false);
        // completes without panicking or propagating
        reporter.flush().await;
        assert!(reporter.pending().is_empty());
    }
}
