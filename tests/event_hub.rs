// tests/event_hub.rs

mod common;

use common::{with_timeout, EventRecorder};
use execd::events::EventHub;
use execd::protocol::Event;
use tokio::sync::mpsc;

fn stdout(id: &str, data: &str) -> Event {
    Event::Stdout {
        id: id.into(),
        data: data.into(),
    }
}

#[tokio::test]
async fn test_broadcast_reaches_every_subscriber() {
    let hub = EventHub::new();
    let mut a = EventRecorder::subscribe(&hub, 1);
    let mut b = EventRecorder::subscribe(&hub, 2);

    assert_eq!(hub.broadcast(&stdout("s", "x")), 2);

    assert_eq!(with_timeout(a.next()).await.unwrap(), stdout("s", "x"));
    assert_eq!(with_timeout(b.next()).await.unwrap(), stdout("s", "x"));
}

#[tokio::test]
async fn test_dead_subscriber_is_dropped_without_affecting_others() {
    let hub = EventHub::new();
    let mut alive = EventRecorder::subscribe(&hub, 1);

    let (tx, rx) = mpsc::channel(4);
    hub.subscribe(2, tx);
    drop(rx);

    assert_eq!(hub.subscriber_count(), 2);
    assert_eq!(hub.broadcast(&stdout("s", "one")), 1);
    assert!(!hub.is_subscribed(2));
    assert!(hub.is_subscribed(1));

    hub.broadcast(&stdout("s", "two"));
    assert_eq!(with_timeout(alive.next()).await.unwrap(), stdout("s", "one"));
    assert_eq!(with_timeout(alive.next()).await.unwrap(), stdout("s", "two"));
}

#[test]
fn test_subscribe_is_idempotent_and_unsubscribe_removes() {
    let hub = EventHub::new();
    let (tx, _rx) = mpsc::channel(4);

    assert!(hub.subscribe(7, tx.clone()));
    assert!(!hub.subscribe(7, tx));
    assert_eq!(hub.subscriber_count(), 1);

    assert!(hub.unsubscribe(7));
    assert!(!hub.unsubscribe(7));
    assert_eq!(hub.broadcast(&stdout("s", "nobody")), 0);
}

#[tokio::test]
async fn test_subscriber_that_stops_reading_is_dropped_when_its_queue_fills() {
    let hub = EventHub::new();
    let mut reader = EventRecorder::subscribe(&hub, 1);

    let (tx, mut stalled) = mpsc::channel(2);
    hub.subscribe(2, tx);

    assert_eq!(hub.broadcast(&stdout("s", "a")), 2);
    assert_eq!(hub.broadcast(&stdout("s", "b")), 2);
    assert_eq!(hub.broadcast(&stdout("s", "c")), 1);
    assert!(!hub.is_subscribed(2));

    // What was queued before the drop is still there; nothing after it.
    assert!(stalled.recv().await.is_some());
    assert!(stalled.recv().await.is_some());
    assert!(stalled.recv().await.is_none());

    for data in ["a", "b", "c"] {
        assert_eq!(with_timeout(reader.next()).await.unwrap(), stdout("s", data));
    }
}
