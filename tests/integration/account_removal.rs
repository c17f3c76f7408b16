//! Integration tests for removing a user's data from the engine.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use todoshare::config::ReminderSettings;
use todoshare::directory::InMemoryDirectory;
use todoshare::engine::AccountRemoval;
use todoshare::sharing::Grantee;
use todoshare::store::InMemoryTaskStore;
use todoshare::{Engine, TaskError};
use todoshare_model::{AccessLevel, Permission, TaskDraft, UserId, UserRef};

fn make_engine() -> Engine<InMemoryTaskStore, InMemoryDirectory> {
    let directory = InMemoryDirectory::with_users([
        UserRef::new("alice", "Alice", "alice@example.com"),
        UserRef::new("bob", "Bob", "bob@example.com"),
        UserRef::new("carol", "Carol", "carol@example.com"),
    ]);
    Engine::new(
        Arc::new(InMemoryTaskStore::new()),
        Arc::new(directory),
        ReminderSettings::default(),
    )
}

fn user(id: &str) -> UserId {
    UserId::from(id)
}

#[tokio::test]
async fn removal_deletes_owned_and_revokes_held_grants() {
    let engine = make_engine();

    // Bob owns two tasks, one shared with Carol.
    let bob_shared = engine
        .tasks()
        .create(&user("bob"), TaskDraft::new("Bob's shared"))
        .await
        .unwrap();
    engine
        .sharing()
        .share(&bob_shared.id, &user("bob"), &Grantee::from(user("carol")), Permission::Edit)
        .await
        .unwrap();
    engine
        .tasks()
        .create(&user("bob"), TaskDraft::new("Bob's private"))
        .await
        .unwrap();

    // Alice shares a task with Bob and Carol.
    let alice_task = engine
        .tasks()
        .create(&user("alice"), TaskDraft::new("Alice's shared"))
        .await
        .unwrap();
    for grantee in ["bob", "carol"] {
        engine
            .sharing()
            .share(&alice_task.id, &user("alice"), &Grantee::from(user(grantee)), Permission::View)
            .await
            .unwrap();
    }

    let removal = engine.remove_account(&user("bob")).await.unwrap();
    assert_eq!(
        removal,
        AccountRemoval {
            deleted: 2,
            revoked: 1
        }
    );

    assert!(matches!(
        engine.tasks().get(&bob_shared.id, &user("carol")).await,
        Err(TaskError::NotFound(_))
    ));
    assert!(engine.sharing().tasks_owned_by(&user("bob")).await.unwrap().is_empty());
    assert!(engine.sharing().tasks_shared_with(&user("bob")).await.unwrap().is_empty());

    let remaining = engine.tasks().get(&alice_task.id, &user("alice")).await.unwrap();
    assert!(remaining.grant_for(&user("bob")).is_none());
    assert!(remaining.grant_for(&user("carol")).is_some());
    assert!(remaining.is_shared());
    assert_eq!(
        engine
            .tasks()
            .access_level(&alice_task.id, &user("bob"))
            .await
            .unwrap(),
        AccessLevel::NoAccess
    );
}

#[tokio::test]
async fn removal_of_last_grantee_unshares_task() {
    let engine = make_engine();
    let task = engine
        .tasks()
        .create(&user("alice"), TaskDraft::new("Just for Bob"))
        .await
        .unwrap();
    engine
        .sharing()
        .share(&task.id, &user("alice"), &Grantee::from(user("bob")), Permission::Edit)
        .await
        .unwrap();

    engine.remove_account(&user("bob")).await.unwrap();
    let task = engine.tasks().get(&task.id, &user("alice")).await.unwrap();
    assert!(!task.is_shared());
}

#[tokio::test]
async fn removal_of_user_without_data_is_a_no_op() {
    let engine = make_engine();
    engine
        .tasks()
        .create(&user("alice"), TaskDraft::new("Untouched"))
        .await
        .unwrap();

    let removal = engine.remove_account(&user("carol")).await.unwrap();
    assert_eq!(removal, AccountRemoval::default());
    assert_eq!(engine.store().len().await, 1);
}
