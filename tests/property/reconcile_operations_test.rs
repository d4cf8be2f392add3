//! Property-based tests for bookmark reconciliation.
//!
//! Every write reaches a view twice: once as the result of its own action
//! and once as the pushed echo. These tests check that the collection ends
//! up the same as if each write had been applied exactly once, and that it
//! keeps a newest-first order with no duplicate ids.

use chrono::{TimeZone, Utc};
use linkshelf::managers::bookmark_manager::{BookmarkCollection, BookmarkReconcilerTrait};
use linkshelf::types::bookmark::Bookmark;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Insert(u8),
    Delete(u8),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u8..8).prop_map(Op::Insert),
        2 => (0u8..8).prop_map(Op::Delete),
    ]
}

fn bookmark(n: u8) -> Bookmark {
    Bookmark {
        id: format!("bm-{}", n),
        user_id: "user-1".to_string(),
        title: format!("Title {}", n),
        url: format!("https://site{}.example", n),
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, n as u32).unwrap(),
    }
}

/// Reference model: a plain newest-first list.
fn model(ops: &[Op]) -> Vec<String> {
    let mut list: Vec<String> = Vec::new();
    for op in ops {
        match op {
            Op::Insert(n) => {
                let id = bookmark(*n).id;
                if !list.contains(&id) {
                    list.insert(0, id);
                }
            }
            Op::Delete(n) => {
                let id = bookmark(*n).id;
                list.retain(|existing| existing != &id);
            }
        }
    }
    list
}

fn apply_local(c: &mut BookmarkCollection, op: &Op) {
    match op {
        Op::Insert(n) => {
            c.apply_local_insert(bookmark(*n));
        }
        Op::Delete(n) => {
            c.apply_local_delete(&bookmark(*n).id);
        }
    }
}

fn apply_echo(c: &mut BookmarkCollection, op: &Op) {
    match op {
        Op::Insert(n) => {
            c.apply_remote_insert(bookmark(*n));
        }
        Op::Delete(n) => {
            c.apply_remote_delete(&bookmark(*n).id);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn local_action_plus_echo_matches_single_application(ops in prop::collection::vec(arb_op(), 0..40)) {
        let mut once = BookmarkCollection::new();
        let mut twice = BookmarkCollection::new();
        for op in &ops {
            apply_local(&mut once, op);

            apply_local(&mut twice, op);
            apply_echo(&mut twice, op);
        }
        prop_assert_eq!(once.ids(), twice.ids());
        let expected = model(&ops);
        prop_assert_eq!(once.ids(), expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn echo_arriving_first_is_absorbed(ops in prop::collection::vec(arb_op(), 0..40)) {
        let mut c = BookmarkCollection::new();
        for op in &ops {
            apply_echo(&mut c, op);
            apply_local(&mut c, op);
        }
        let expected = model(&ops);
        prop_assert_eq!(c.ids(), expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn ids_stay_unique_and_indexed(ops in prop::collection::vec(arb_op(), 0..60)) {
        let mut c = BookmarkCollection::new();
        for op in &ops {
            apply_local(&mut c, op);
            apply_echo(&mut c, op);
        }
        let ids = c.ids();
        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        prop_assert_eq!(deduped.len(), ids.len());
        prop_assert_eq!(c.len(), ids.len());
        for id in ids {
            prop_assert!(c.contains(id));
            prop_assert_eq!(c.get(id).map(|b| b.id.as_str()), Some(id));
        }
    }

    #[test]
    fn distinct_inserts_are_listed_newest_first(count in 1u8..8) {
        let mut c = BookmarkCollection::new();
        for n in 0..count {
            c.apply_remote_insert(bookmark(n));
        }
        let expected: Vec<String> = (0..count).rev().map(|n| bookmark(n).id).collect();
        prop_assert_eq!(c.ids(), expected.iter().map(String::as_str).collect::<Vec<_>>());
    }
}
