//! Integration tests for the reminder scanner.
//!
//! Covers exactly-once firing per kind, the reschedule policy in both
//! configurations, recovery from store failures and the background task
//! lifecycle.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use todoshare::Engine;
use todoshare::config::ReminderSettings;
use todoshare::directory::InMemoryDirectory;
use todoshare::reminders::{ChannelNotifier, ReminderScanner};
use todoshare::sharing::Grantee;
use todoshare::store::{InMemoryTaskStore, StoreError, TaskQuery, TaskStore, UpdateOutcome};
use todoshare_model::{
    Permission, ReminderKind, ReminderWindow, Task, TaskDraft, TaskId, TaskPatch, TaskUpdate,
    UserId, UserRef,
};

// ---------------------------------------------------------------------------
// Helper types
// ---------------------------------------------------------------------------

/// Store wrapper whose queries and updates can be made to fail on demand.
#[derive(Default)]
struct FlakyStore {
    inner: InMemoryTaskStore,
    fail_find: AtomicBool,
    fail_update: AtomicBool,
}

impl FlakyStore {
    fn set_fail_find(&self, fail: bool) {
        self.fail_find.store(fail, Ordering::SeqCst);
    }

    fn set_fail_update(&self, fail: bool) {
        self.fail_update.store(fail, Ordering::SeqCst);
    }
}

impl TaskStore for FlakyStore {
    async fn insert(&self, task: Task) -> Result<Task, StoreError> {
        self.inner.insert(task).await
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Task, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn find(&self, query: &TaskQuery) -> Result<Vec<Task>, StoreError> {
        if self.fail_find.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection reset".into()));
        }
        self.inner.find(query).await
    }

    async fn update(&self, id: &TaskId, update: TaskUpdate) -> Result<UpdateOutcome, StoreError> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write timed out".into()));
        }
        self.inner.update(id, update).await
    }

    async fn delete(&self, id: &TaskId) -> Result<(), StoreError> {
        self.inner.delete(id).await
    }
}

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn directory() -> Arc<InMemoryDirectory> {
    Arc::new(InMemoryDirectory::with_users([
        UserRef::new("alice", "Alice", "alice@example.com"),
        UserRef::new("bob", "Bob", "bob@example.com"),
    ]))
}

fn make_engine(rearm: bool) -> Engine<InMemoryTaskStore, InMemoryDirectory> {
    let settings = ReminderSettings {
        rearm_on_reschedule: rearm,
        ..ReminderSettings::default()
    };
    Engine::new(Arc::new(InMemoryTaskStore::new()), directory(), settings)
}

fn alice() -> UserId {
    UserId::from("alice")
}

fn at(now: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    now + Duration::minutes(minutes)
}

// ===========================================================================
// Exactly-once firing
// ===========================================================================

#[tokio::test]
async fn due_soon_fires_once() {
    let engine = make_engine(false);
    let now = Utc::now();
    let task = engine
        .tasks()
        .create(&alice(), TaskDraft::new("Submit report").due_at(at(now, 10)))
        .await
        .unwrap();
    let (notifier, mut rx) = ChannelNotifier::channel();
    let scanner = engine.scanner(notifier);

    let first = scanner.scan_once(now).await.unwrap();
    assert_eq!(first.fired.len(), 1);
    let fired = engine.ledger().fired(&task.id).await.unwrap();
    assert!(fired.contains(&ReminderKind::DueDate));
    let reminder = rx.recv().await.unwrap();
    assert_eq!(reminder.message(), "Due in 10 minutes");

    let second = scanner.scan_once(at(now, 5)).await.unwrap();
    assert!(second.fired.is_empty());
    assert_eq!(engine.ledger().fired(&task.id).await.unwrap(), fired);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn both_kinds_fire_in_same_cycle_to_all_participants() {
    let engine = make_engine(false);
    let now = Utc::now();
    let task = engine
        .tasks()
        .create(
            &alice(),
            TaskDraft::new("Launch").due_at(at(now, 25)).remind_at(at(now, 3)),
        )
        .await
        .unwrap();
    engine
        .sharing()
        .share(&task.id, &alice(), &Grantee::parse("bob@example.com").unwrap(), Permission::View)
        .await
        .unwrap();

    let (notifier, mut rx) = ChannelNotifier::channel();
    let report = engine.scanner(notifier).scan_once(now).await.unwrap();
    assert_eq!(report.fired.len(), 2);

    for _ in 0..2 {
        let reminder = rx.recv().await.unwrap();
        assert_eq!(reminder.recipients, vec![alice(), UserId::from("bob")]);
        if reminder.kind == ReminderKind::CustomReminder {
            assert_eq!(reminder.message(), "Reminder: 3 minutes until your todo");
        }
    }
}

#[tokio::test]
async fn completed_task_is_not_reminded() {
    let engine = make_engine(false);
    let now = Utc::now();
    let task = engine
        .tasks()
        .create(&alice(), TaskDraft::new("Done already").due_at(at(now, 10)))
        .await
        .unwrap();
    engine.tasks().set_completed(&task.id, &alice(), true).await.unwrap();

    let (notifier, _rx) = ChannelNotifier::channel();
    let report = engine.scanner(notifier).scan_once(now).await.unwrap();
    assert!(report.fired.is_empty());
    assert!(engine.ledger().fired(&task.id).await.unwrap().is_empty());
}

// ===========================================================================
// Reschedule policy
// ===========================================================================

async fn fire_then_reschedule(rearm: bool) -> usize {
    let engine = make_engine(rearm);
    let now = Utc::now();
    let task = engine
        .tasks()
        .create(&alice(), TaskDraft::new("Dentist").due_at(at(now, 10)))
        .await
        .unwrap();
    let (notifier, _rx) = ChannelNotifier::channel();
    let scanner = engine.scanner(notifier);
    assert_eq!(scanner.scan_once(now).await.unwrap().fired.len(), 1);

    let patch = TaskPatch {
        due_at: Some(Some(at(now, 20))),
        ..TaskPatch::default()
    };
    engine.tasks().edit(&task.id, &alice(), patch).await.unwrap();
    scanner.scan_once(at(now, 1)).await.unwrap().fired.len()
}

#[tokio::test]
async fn reschedule_does_not_refire_by_default() {
    assert_eq!(fire_then_reschedule(false).await, 0);
}

#[tokio::test]
async fn reschedule_refires_when_rearm_enabled() {
    assert_eq!(fire_then_reschedule(true).await, 1);
}

#[tokio::test]
async fn upcoming_reflects_ledger_after_scan() {
    let engine = make_engine(false);
    let now = Utc::now();
    engine
        .tasks()
        .create(&alice(), TaskDraft::new("Soon").due_at(at(now, 10)))
        .await
        .unwrap();
    engine
        .tasks()
        .create(&alice(), TaskDraft::new("Tonight").due_at(at(now, 300)))
        .await
        .unwrap();

    let (notifier, _rx) = ChannelNotifier::channel();
    engine.scanner(notifier).scan_once(now).await.unwrap();

    let upcoming = engine.reminders().upcoming(&alice(), now).await.unwrap();
    let flags: Vec<_> = upcoming.iter().map(|u| (u.title.as_str(), u.notified)).collect();
    assert_eq!(flags, vec![("Soon", true), ("Tonight", false)]);
}

// ===========================================================================
// Failure handling
// ===========================================================================

#[tokio::test]
async fn failed_query_skips_cycle_then_resumes() {
    let store = Arc::new(FlakyStore::default());
    let engine = Engine::new(Arc::clone(&store), directory(), ReminderSettings::default());
    let now = Utc::now();
    let task = engine
        .tasks()
        .create(&alice(), TaskDraft::new("Flaky").due_at(at(now, 10)))
        .await
        .unwrap();
    let (notifier, mut rx) = ChannelNotifier::channel();
    let scanner = engine.scanner(notifier);

    store.set_fail_find(true);
    assert!(matches!(
        scanner.scan_once(now).await,
        Err(StoreError::Unavailable(_))
    ));
    assert!(engine.ledger().fired(&task.id).await.unwrap().is_empty());
    assert!(rx.try_recv().is_err());

    store.set_fail_find(false);
    let report = scanner.scan_once(at(now, 1)).await.unwrap();
    assert_eq!(report.fired.len(), 1);
    assert_eq!(rx.recv().await.unwrap().task_id, task.id);
}

#[tokio::test]
async fn failed_ledger_update_is_counted_and_retried() {
    let store = Arc::new(FlakyStore::default());
    let engine = Engine::new(Arc::clone(&store), directory(), ReminderSettings::default());
    let now = Utc::now();
    engine
        .tasks()
        .create(&alice(), TaskDraft::new("Flaky").due_at(at(now, 10)))
        .await
        .unwrap();
    let (notifier, mut rx) = ChannelNotifier::channel();
    let scanner = engine.scanner(notifier);

    store.set_fail_update(true);
    let report = scanner.scan_once(now).await.unwrap();
    assert_eq!(report.failed, 1);
    assert!(report.fired.is_empty());
    assert!(rx.try_recv().is_err());

    store.set_fail_update(false);
    let report = scanner.scan_once(at(now, 1)).await.unwrap();
    assert_eq!(report.fired.len(), 1);
    assert_eq!(report.failed, 0);
}

// ===========================================================================
// Lifecycle
// ===========================================================================

#[tokio::test]
async fn spawned_scanner_notifies_once_and_stops() {
    let store = Arc::new(InMemoryTaskStore::new());
    let owner = alice();
    let now = Utc::now();
    let task = Task::new(owner.clone(), owner, TaskDraft::new("Standup").due_at(at(now, 15)), now).unwrap();
    store.insert(task.clone()).await.unwrap();

    let (notifier, mut rx) = ChannelNotifier::channel();
    let handle = ReminderScanner::new(Arc::clone(&store), notifier, ReminderWindow::default())
        .spawn(StdDuration::from_millis(20));

    let reminder = tokio::time::timeout(StdDuration::from_secs(5), rx.recv())
        .await
        .expect("scanner should fire within timeout")
        .unwrap();
    assert_eq!(reminder.task_id, task.id);
    assert_eq!(reminder.kind, ReminderKind::DueDate);

    // Several more ticks pass without a duplicate.
    tokio::time::sleep(StdDuration::from_millis(100)).await;
    assert!(rx.try_recv().is_err());

    assert!(!handle.is_finished());
    handle.stop().await;

    // The scanner owned the only sender; once stopped the channel closes.
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn dropping_handle_stops_scanner() {
    let store = Arc::new(InMemoryTaskStore::new());
    let (notifier, mut rx) = ChannelNotifier::channel();
    let handle = ReminderScanner::new(store, notifier, ReminderWindow::default())
        .spawn(StdDuration::from_millis(10));
    drop(handle);

    let closed = tokio::time::timeout(StdDuration::from_secs(5), rx.recv())
        .await
        .expect("scanner should exit after its handle is dropped");
    assert!(closed.is_none());
}

#[tokio::test]
async fn engine_start_scanner_uses_configured_interval() {
    let settings = ReminderSettings {
        scan_interval: StdDuration::from_millis(20),
        ..ReminderSettings::default()
    };
    let engine = Engine::new(Arc::new(InMemoryTaskStore::new()), directory(), settings);
    let now = Utc::now();
    engine
        .tasks()
        .create(&alice(), TaskDraft::new("Later today").remind_at(at(now, 29)))
        .await
        .unwrap();

    let (notifier, mut rx) = ChannelNotifier::channel();
    let handle = engine.start_scanner(notifier);
    let reminder = tokio::time::timeout(StdDuration::from_secs(5), rx.recv())
        .await
        .expect("scanner should fire within timeout")
        .unwrap();
    assert_eq!(reminder.kind, ReminderKind::CustomReminder);
    handle.stop().await;
}
