//! Property-based tests for share-list invariants and access evaluation.
//!
//! Uses proptest to verify, over arbitrary sequences of grant updates:
//! 1. A task never holds two grants for the same grantee.
//! 2. `is_shared()` is true exactly when the grant list is non-empty.
//! 3. The owner always evaluates to `Owner`.
//! 4. Every other user's level matches a simple reference model.
//! 5. Revoking every grant leaves all non-owners at `NoAccess`.

use std::collections::HashMap;

use chrono::Utc;
use proptest::prelude::*;
use todoshare_model::{
    AccessLevel, Permission, ShareGrant, Task, TaskDraft, TaskUpdate, UserId, evaluate,
};

const OWNER: &str = "user-0";

#[derive(Debug, Clone)]
enum Op {
    Add(u8, Permission),
    Set(u8, Permission),
    Remove(u8),
}

fn arb_permission() -> impl Strategy<Value = Permission> {
    prop_oneof![Just(Permission::View), Just(Permission::Edit)]
}

/// Users 1..=4 are candidate grantees; user 0 is the owner.
fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1u8..=4, arb_permission()).prop_map(|(u, p)| Op::Add(u, p)),
        (1u8..=4, arb_permission()).prop_map(|(u, p)| Op::Set(u, p)),
        (1u8..=4).prop_map(Op::Remove),
    ]
}

fn user(n: u8) -> UserId {
    UserId::new(format!("user-{n}"))
}

fn make_task() -> Task {
    let owner = UserId::from(OWNER);
    Task::new(owner.clone(), owner, TaskDraft::new("Shared chores"), Utc::now())
        .unwrap_or_else(|e| panic!("valid draft rejected: {e}"))
}

fn expected_level(model: &HashMap<u8, Permission>, n: u8) -> AccessLevel {
    match model.get(&n) {
        Some(Permission::Edit) => AccessLevel::Editor,
        Some(Permission::View) => AccessLevel::Viewer,
        None => AccessLevel::NoAccess,
    }
}

/// Applies `op` to both the task and the reference model.
fn step(task: &mut Task, model: &mut HashMap<u8, Permission>, op: &Op) {
    match *op {
        Op::Add(n, p) => {
            let result = TaskUpdate::AddGrant(ShareGrant::new(user(n), p, Utc::now()))
                .apply(task, Utc::now());
            assert_eq!(result.is_ok(), !model.contains_key(&n));
            model.entry(n).or_insert(p);
        }
        Op::Set(n, p) => {
            let result = TaskUpdate::SetGrantPermission {
                grantee: user(n),
                permission: p,
            }
            .apply(task, Utc::now());
            assert_eq!(result.is_ok(), model.contains_key(&n));
            if let Some(existing) = model.get_mut(&n) {
                *existing = p;
            }
        }
        Op::Remove(n) => {
            let result = TaskUpdate::RemoveGrant { grantee: user(n) }.apply(task, Utc::now());
            assert_eq!(result.is_ok(), model.remove(&n).is_some());
        }
    }
}

proptest! {
    #[test]
    fn share_list_invariants_hold(ops in prop::collection::vec(arb_op(), 0..64)) {
        let mut task = make_task();
        let mut model = HashMap::new();

        for op in &ops {
            step(&mut task, &mut model, op);

            let mut grantees: Vec<_> = task.shares().iter().map(|g| g.grantee.clone()).collect();
            let total = grantees.len();
            grantees.sort();
            grantees.dedup();
            prop_assert_eq!(grantees.len(), total);
            prop_assert_eq!(task.is_shared(), !task.shares().is_empty());
            prop_assert_eq!(evaluate(&task, &user(0)), AccessLevel::Owner);
            for n in 1..=4 {
                prop_assert_eq!(evaluate(&task, &user(n)), expected_level(&model, n));
            }
        }
    }

    #[test]
    fn revoking_everything_leaves_no_access(ops in prop::collection::vec(arb_op(), 0..32)) {
        let mut task = make_task();
        let mut model = HashMap::new();
        for op in &ops {
            step(&mut task, &mut model, op);
        }

        let grantees: Vec<_> = task.shares().iter().map(|g| g.grantee.clone()).collect();
        for grantee in grantees {
            let removed = TaskUpdate::RemoveGrant { grantee }.apply(&mut task, Utc::now());
            prop_assert!(removed.is_ok());
        }

        prop_assert!(!task.is_shared());
        prop_assert_eq!(evaluate(&task, &user(0)), AccessLevel::Owner);
        for n in 1..=4 {
            prop_assert_eq!(evaluate(&task, &user(n)), AccessLevel::NoAccess);
        }
    }

    #[test]
    fn permission_parse_never_panics(s in ".*") {
        let parsed = s.parse::<Permission>();
        let trimmed = s.trim();
        prop_assert_eq!(parsed.is_ok(), trimmed == "view" || trimmed == "edit");
    }
}
