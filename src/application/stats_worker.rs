use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::services::StatsService;
use crate::domain::repositories::{FlagStore, LinkRepository};
use crate::domain::stats_event::StatsEvent;

/// Drains the stats queue, reporting each event once.
///
/// Exits when every sender has been dropped.
pub async fn run_stats_worker<R, S>(
    mut rx: mpsc::Receiver<StatsEvent>,
    service: Arc<StatsService<R, S>>,
) where
    R: LinkRepository + ?Sized,
    S: FlagStore + ?Sized,
{
    while let Some(ev) = rx.recv().await {
        service.report(ev).await;
    }
    tracing::debug!("Stats worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::LaunchTracker;
    use crate::domain::repositories::{MockFlagStore, MockLinkRepository};

    #[tokio::test]
    async fn test_worker_reports_each_event_and_stops() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_send_stats_event()
            .times(2)
            .returning(|_| Ok(()));

        let mut mock_store = MockFlagStore::new();
        mock_store.expect_take_bool().returning(|_, _| Ok(false));

        let tracker = Arc::new(LaunchTracker::new(Arc::new(mock_store)));
        let service = Arc::new(StatsService::new(
            Arc::new(mock_repo),
            tracker,
            "api-key",
            "android",
        ));

        let (tx, rx) = mpsc::channel(10);
        let worker = tokio::spawn(run_stats_worker(rx, service));

        tx.send(StatsEvent::new("a", None)).await.unwrap();
        tx.send(StatsEvent::new("", None)).await.unwrap();
        tx.send(StatsEvent::new("b", Some("h".to_string()))).await.unwrap();
        drop(tx);

        worker.await.unwrap();
    }
}
