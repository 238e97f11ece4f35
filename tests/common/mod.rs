#![allow(dead_code)]

use std::time::Duration;

use semwatch::{FileWatcherEvent, WatchStreams};

pub use semwatch_test_utils::builders;
pub use semwatch_test_utils::{init_tracing, with_timeout};

/// Next classified event; panics if the stream closes or nothing arrives.
pub async fn next_event(streams: &mut WatchStreams) -> FileWatcherEvent {
    with_timeout(streams.events.recv())
        .await
        .expect("event stream closed")
}

/// Assert that no event is delivered within `ms` (virtual time when paused).
pub async fn assert_no_event(streams: &mut WatchStreams, ms: u64) {
    match tokio::time::timeout(Duration::from_millis(ms), streams.events.recv()).await {
        Err(_) => {}
        Ok(Some(event)) => panic!("unexpected event: {event:?}"),
        Ok(None) => panic!("event stream closed unexpectedly"),
    }
}

/// Wait until the event stream reports closed.
pub async fn assert_stream_closed(streams: &mut WatchStreams) {
    if let Some(event) = with_timeout(streams.events.recv()).await {
        panic!("event delivered after stop: {event:?}");
    }
}
