//! Unit tests for the change feed and its subscriptions.

use std::time::Duration;

use chrono::Utc;

use linkshelf::services::change_feed::ChangeFeed;
use linkshelf::types::bookmark::Bookmark;
use linkshelf::types::change::{ChangeEvent, ChangeFilter, ChangeKind, EventFilter, Table};

fn bookmark(id: &str, owner: &str) -> Bookmark {
    Bookmark {
        id: id.to_string(),
        user_id: owner.to_string(),
        title: "T".to_string(),
        url: "https://t.example".to_string(),
        created_at: Utc::now(),
    }
}

#[test]
fn test_subscription_receives_matching_events_only() {
    let feed = ChangeFeed::new(16);
    let mut inserts = feed.subscribe(ChangeFilter::new(Table::Bookmarks, EventFilter::Insert).owned_by("u1"));

    feed.publish(ChangeEvent::bookmark_inserted(bookmark("a", "u2")));
    feed.publish(ChangeEvent::bookmark_deleted("u1", "x"));
    feed.publish(ChangeEvent::bookmark_inserted(bookmark("b", "u1")));

    let event = inserts.try_next().expect("matching event");
    assert_eq!(event.kind, ChangeKind::Insert);
    assert_eq!(event.owner_id, "u1");
    assert!(inserts.try_next().is_none());
}

#[test]
fn test_events_published_before_subscribe_are_not_seen() {
    let feed = ChangeFeed::new(16);
    feed.publish(ChangeEvent::bookmark_deleted("u1", "x"));
    let mut sub = feed.subscribe(ChangeFilter::new(Table::Bookmarks, EventFilter::Any));
    assert!(sub.try_next().is_none());
}

#[test]
fn test_publish_assigns_increasing_sequence_numbers() {
    let feed = ChangeFeed::new(16);
    let mut sub = feed.subscribe(ChangeFilter::new(Table::Bookmarks, EventFilter::Any));
    feed.publish(ChangeEvent::bookmark_deleted("u1", "a"));
    feed.publish(ChangeEvent::bookmark_deleted("u1", "b"));
    let first = sub.try_next().unwrap();
    let second = sub.try_next().unwrap();
    assert!(first.seq > 0);
    assert!(second.seq > first.seq);
}

#[test]
fn test_drop_and_unsubscribe_release_subscriptions() {
    let feed = ChangeFeed::new(16);
    let a = feed.subscribe(ChangeFilter::new(Table::Bookmarks, EventFilter::Insert));
    let b = feed.subscribe(ChangeFilter::new(Table::Profiles, EventFilter::Any));
    assert_eq!(feed.active_subscriptions(), 2);
    assert_ne!(a.id(), b.id());

    drop(a);
    assert_eq!(feed.active_subscriptions(), 1);
    b.unsubscribe();
    assert_eq!(feed.active_subscriptions(), 0);
}

#[test]
fn test_publish_without_subscribers_is_harmless() {
    let feed = ChangeFeed::default();
    assert_eq!(feed.publish(ChangeEvent::bookmark_deleted("u1", "a")), 0);
}

#[test]
fn test_lagged_subscription_skips_dropped_events_and_continues() {
    let feed = ChangeFeed::new(2);
    let mut sub = feed.subscribe(ChangeFilter::new(Table::Bookmarks, EventFilter::Delete));
    for id in ["a", "b", "c", "d", "e"] {
        feed.publish(ChangeEvent::bookmark_deleted("u1", id));
    }

    assert!(!sub.take_lagged());
    let mut seen = Vec::new();
    while let Some(event) = sub.try_next() {
        seen.push(event.old_id.unwrap());
    }
    assert_eq!(seen, vec!["d".to_string(), "e".to_string()]);
    assert!(sub.take_lagged());
    assert!(!sub.take_lagged(), "the mark clears once read");
}

#[test]
fn test_subscription_within_capacity_is_not_lagged() {
    let feed = ChangeFeed::new(4);
    let mut sub = feed.subscribe(ChangeFilter::new(Table::Bookmarks, EventFilter::Any));
    for id in ["a", "b", "c"] {
        feed.publish(ChangeEvent::bookmark_deleted("u1", id));
    }
    while sub.try_next().is_some() {}
    assert!(!sub.take_lagged());
}

#[tokio::test]
async fn test_recv_waits_for_matching_event() {
    let feed = std::sync::Arc::new(ChangeFeed::new(16));
    let mut sub = feed.subscribe(ChangeFilter::new(Table::Profiles, EventFilter::Delete).owned_by("u1"));

    let publisher = std::sync::Arc::clone(&feed);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        publisher.publish(ChangeEvent::profile_deleted("u2"));
        publisher.publish(ChangeEvent::profile_deleted("u1"));
    });

    let event = tokio::time::timeout(Duration::from_secs(2), sub.recv())
        .await
        .expect("event before timeout")
        .expect("feed still open");
    assert_eq!(event.owner_id, "u1");
}

#[tokio::test]
async fn test_recv_returns_none_when_feed_is_dropped() {
    let feed = ChangeFeed::new(4);
    let mut sub = feed.subscribe(ChangeFilter::new(Table::Bookmarks, EventFilter::Any));
    drop(feed);
    assert!(sub.recv().await.is_none());
}
