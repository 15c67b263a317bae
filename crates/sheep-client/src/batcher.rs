//! Click write batching.
//!
//! Clicks are applied to the mirror immediately but written out lazily: a
//! burst of clicks becomes one write carrying the summed delta for the
//! global counter plus the latest absolute player rows. The batch is written
//! once no click has arrived for the debounce delay (trailing edge).
//!
//! [`ClickQueue`] is the pure coalescing core; [`spawn_batcher`] drives it
//! from a tokio task.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sheep_shared::{User, UserCurrency, UserStats};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Player rows as of the most recent click.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickSnapshot {
    pub user: User,
    pub currency: UserCurrency,
    pub stats: UserStats,
}

/// What one flush writes.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickBatch {
    /// Clicks since the previous flush.
    pub delta: u64,
    pub snapshot: ClickSnapshot,
}

/// Receives flushed batches.
#[async_trait]
pub trait FlushSink: Send + Sync {
    /// Failures are the sink's to log; a batch is never retried.
    async fn flush(&self, batch: ClickBatch);
}

// ---------------------------------------------------------------------------
// Coalescing core
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ClickQueue {
    delay: Duration,
    pending: u64,
    latest: Option<ClickSnapshot>,
    deadline: Option<Instant>,
}

impl ClickQueue {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: 0,
            latest: None,
            deadline: None,
        }
    }

    /// Count one click. Each click pushes the deadline back.
    pub fn record(&mut self, snapshot: ClickSnapshot, now: Instant) {
        self.pending += 1;
        self.latest = Some(snapshot);
        self.deadline = Some(now + self.delay);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }

    pub fn pending(&self) -> u64 {
        self.pending
    }

    /// Drain the queue. `None` when there is nothing to write.
    pub fn take(&mut self) -> Option<ClickBatch> {
        self.deadline = None;
        let snapshot = self.latest.take()?;
        let delta = std::mem::take(&mut self.pending);
        Some(ClickBatch { delta, snapshot })
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

enum BatcherCommand {
    Record(Box<ClickSnapshot>),
    /// Write whatever is pending now, then acknowledge.
    Flush(oneshot::Sender<()>),
    /// Final flush, then stop.
    Shutdown(oneshot::Sender<()>),
}

pub struct BatcherHandle {
    cmd_tx: mpsc::UnboundedSender<BatcherCommand>,
    task: JoinHandle<()>,
}

impl BatcherHandle {
    /// Queue one click. Never blocks.
    pub fn record(&self, snapshot: ClickSnapshot) {
        if self.cmd_tx.send(BatcherCommand::Record(Box::new(snapshot))).is_err() {
            tracing::warn!("click recorded after batcher stopped");
        }
    }

    /// Write pending clicks now and wait until the write has finished.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.cmd_tx.send(BatcherCommand::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    /// Final flush, then stop the task.
    pub async fn shutdown(self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.cmd_tx.send(BatcherCommand::Shutdown(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "batcher task failed");
        }
    }
}

pub fn spawn_batcher(sink: Arc<dyn FlushSink>, delay: Duration) -> BatcherHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<BatcherCommand>();

    let task = tokio::spawn(async move {
        let mut queue = ClickQueue::new(delay);

        loop {
            let deadline = queue.deadline();

            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(BatcherCommand::Record(snapshot)) => {
                        queue.record(*snapshot, Instant::now());
                    }
                    Some(BatcherCommand::Flush(done)) => {
                        flush(&mut queue, sink.as_ref()).await;
                        let _ = done.send(());
                    }
                    Some(BatcherCommand::Shutdown(done)) => {
                        flush(&mut queue, sink.as_ref()).await;
                        let _ = done.send(());
                        break;
                    }
                    None => {
                        flush(&mut queue, sink.as_ref()).await;
                        break;
                    }
                },

                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if queue.is_due(Instant::now()) {
                        flush(&mut queue, sink.as_ref()).await;
                    }
                }
            }
        }

        tracing::debug!("click batcher stopped");
    });

    BatcherHandle { cmd_tx, task }
}

async fn flush(queue: &mut ClickQueue, sink: &dyn FlushSink) {
    if let Some(batch) = queue.take() {
        tracing::debug!(delta = batch.delta, clicks = batch.snapshot.user.total_clicks, "flushing clicks");
        sink.flush(batch).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;
    use sheep_shared::{progression, Profile, UserId};

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        batches: Mutex<Vec<ClickBatch>>,
    }

    impl RecordingSink {
        fn batches(&self) -> Vec<ClickBatch> {
            self.batches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FlushSink for RecordingSink {
        async fn flush(&self, batch: ClickBatch) {
            self.batches.lock().unwrap().push(batch);
        }
    }

    fn click(profile: &mut Profile) -> ClickSnapshot {
        progression::apply_click(profile, Utc::now());
        ClickSnapshot {
            user: profile.user.clone(),
            currency: profile.currency.clone(),
            stats: profile.stats.clone(),
        }
    }

    fn profile() -> Profile {
        let now = Utc::now();
        Profile::new(User::anonymous(UserId::new(), 3, now), now)
    }

    #[test]
    fn queue_coalesces_and_resets() {
        let mut p = profile();
        let start = Instant::now();
        let mut queue = ClickQueue::new(Duration::from_millis(300));
        assert!(queue.take().is_none());

        queue.record(click(&mut p), start);
        queue.record(click(&mut p), start + Duration::from_millis(200));
        assert!(!queue.is_due(start + Duration::from_millis(400)));
        assert!(queue.is_due(start + Duration::from_millis(500)));

        let batch = queue.take().unwrap();
        assert_eq!(batch.delta, 2);
        assert_eq!(batch.snapshot.user.total_clicks, 2);
        assert_eq!(queue.pending(), 0);
        assert!(queue.deadline().is_none());
        assert!(queue.take().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_clicks_flushes_once() {
        let sink = Arc::new(RecordingSink::default());
        let handle = spawn_batcher(sink.clone(), Duration::from_millis(300));
        let mut p = profile();

        for _ in 0..10 {
            handle.record(click(&mut p));
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(sink.batches().is_empty(), "flushed inside the window");

        tokio::time::sleep(Duration::from_secs(2)).await;

        let batches = sink.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].delta, 10);
        assert_eq!(batches[0].snapshot.user.total_clicks, 10);
        handle.shutdown().await;
        assert_eq!(sink.batches().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn separate_bursts_flush_separately() {
        let sink = Arc::new(RecordingSink::default());
        let handle = spawn_batcher(sink.clone(), Duration::from_millis(300));
        let mut p = profile();

        for _ in 0..3 {
            handle.record(click(&mut p));
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
        for _ in 0..4 {
            handle.record(click(&mut p));
        }
        tokio::time::sleep(Duration::from_secs(1)).await;

        let deltas: Vec<u64> = sink.batches().iter().map(|b| b.delta).collect();
        assert_eq!(deltas, vec![3, 4]);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_flush_and_shutdown_write_pending() {
        let sink = Arc::new(RecordingSink::default());
        let handle = spawn_batcher(sink.clone(), Duration::from_secs(60));
        let mut p = profile();

        handle.record(click(&mut p));
        handle.flush().await;
        assert_eq!(sink.batches().len(), 1);

        handle.flush().await;
        assert_eq!(sink.batches().len(), 1, "empty flush writes nothing");

        handle.record(click(&mut p));
        handle.record(click(&mut p));
        handle.shutdown().await;

        let batches = sink.batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1].delta, 2);
    }
}
