//! Periodic reminder scanner.
//!
//! Each cycle asks the store for incomplete tasks whose due or reminder
//! time lies inside `[now, now + window]`, records every kind not yet in
//! the task's ledger and notifies only when the record was newly added.
//! Recording before notifying means a reminder can be lost on a crash but
//! never delivered twice.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use todoshare_model::ReminderWindow;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::ledger::DedupLedger;
use super::notifier::{FiredReminder, Notifier};
use crate::store::{StoreError, TaskQuery, TaskStore};

/// Outcome of one scan cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Tasks returned by the candidate query.
    pub candidates: usize,
    /// Reminders recorded and handed to the notifier in this cycle.
    pub fired: Vec<FiredReminder>,
    /// Kinds in the window that had already fired.
    pub suppressed: usize,
    /// Kinds whose ledger update failed.
    pub failed: usize,
}

/// Background worker turning approaching times into notifications.
pub struct ReminderScanner<S, N> {
    store: Arc<S>,
    ledger: DedupLedger<S>,
    notifier: N,
    window: ReminderWindow,
}

impl<S: TaskStore, N: Notifier> ReminderScanner<S, N> {
    #[must_use]
    pub fn new(store: Arc<S>, notifier: N, window: ReminderWindow) -> Self {
        let ledger = DedupLedger::new(Arc::clone(&store));
        Self {
            store,
            ledger,
            notifier,
            window,
        }
    }

    #[must_use]
    pub const fn window(&self) -> ReminderWindow {
        self.window
    }

    /// Runs one scan cycle at `now`.
    ///
    /// A failed ledger update for one task is logged and counted; the scan
    /// carries on with the remaining tasks.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the candidate query fails. Nothing is
    /// recorded or notified in that case.
    pub async fn scan_once(&self, now: DateTime<Utc>) -> Result<ScanReport, StoreError> {
        let query = TaskQuery::ReminderCandidates {
            from: now,
            to: self.window.end(now),
        };
        let candidates = self.store.find(&query).await?;
        let mut report = ScanReport {
            candidates: candidates.len(),
            ..ScanReport::default()
        };

        for task in &candidates {
            for (kind, at) in self.window.due_kinds(task, now) {
                if task.has_fired(kind) {
                    report.suppressed += 1;
                    continue;
                }
                match self.ledger.record(&task.id, kind).await {
                    Ok(true) => {
                        let fired = FiredReminder::new(task, kind, at, now);
                        self.notifier.notify(&fired).await;
                        report.fired.push(fired);
                    }
                    Ok(false) => report.suppressed += 1,
                    Err(e) => {
                        tracing::warn!(
                            task_id = %task.id,
                            kind = %kind,
                            error = %e,
                            "failed to record reminder, skipping"
                        );
                        report.failed += 1;
                    }
                }
            }
        }

        tracing::debug!(
            candidates = report.candidates,
            fired = report.fired.len(),
            suppressed = report.suppressed,
            failed = report.failed,
            "reminder scan complete"
        );
        Ok(report)
    }
}

impl<S, N> ReminderScanner<S, N>
where
    S: TaskStore + 'static,
    N: Notifier + 'static,
{
    /// Moves the scanner onto a background task that scans every
    /// `interval`, starting immediately.
    ///
    /// Ticks never overlap; a slow scan delays the next one. A failed
    /// cycle is logged and skipped.
    #[must_use]
    pub fn spawn(self, interval: Duration) -> ScannerHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(
                interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
                window_minutes = self.window.lead().num_minutes(),
                "reminder scanner started"
            );
            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    _ = tick.tick() => {
                        if let Err(e) = self.scan_once(Utc::now()).await {
                            tracing::warn!(error = %e, "reminder scan failed, skipping cycle");
                        }
                    }
                }
            }
            tracing::info!("reminder scanner stopped");
        });
        ScannerHandle {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Handle to a running scanner.
///
/// Dropping the handle signals shutdown without waiting.
pub struct ScannerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ScannerHandle {
    /// Signals shutdown and waits for any in-flight scan to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            tracing::warn!(error = %e, "reminder scanner task ended abnormally");
        }
    }

    /// Whether the background task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for ScannerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
