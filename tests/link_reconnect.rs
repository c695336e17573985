//! Integration tests for the detection link against a local WebSocket
//! server: delivery order, malformed-payload tolerance, reconnect
//! scheduling, and disconnect cancelling the pending retry.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use guitar_trainer::config::LinkConfig;
use guitar_trainer::detection::{ConnectionState, DetectionLink, StrumDirection};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

fn link_config(port: u16) -> LinkConfig {
    LinkConfig {
        event_endpoint: format!("ws://127.0.0.1:{}/ws", port),
        reconnect_delay_ms: 100,
        chord_history_cap: 8,
    }
}

async fn bind() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let port = listener.local_addr().expect("local addr").port();
    (listener, port)
}

fn frame(chord: &str, direction: &str) -> String {
    format!(
        r#"{{"chord":"{}","strum_direction":"{}","strum_detected":true,"velocity":0.05,"thumb_extended":false}}"#,
        chord, direction
    )
}

/// Accept one connection and push the given frames, then drop it.
async fn serve_once(listener: &TcpListener, frames: Vec<String>) {
    let (stream, _) = listener.accept().await.expect("accept");
    let mut ws = tokio_tungstenite::accept_async(stream)
        .await
        .expect("websocket handshake");
    for text in frames {
        ws.send(Message::Text(text)).await.expect("send frame");
    }
    // Dropping the stream simulates an unexpected close.
}

#[tokio::test]
async fn test_events_delivered_in_order_and_malformed_frames_dropped() {
    let (listener, port) = bind().await;
    let link = DetectionLink::new(&link_config(port));
    let mut events = link.subscribe_events();
    let mut states = link.subscribe_state();

    let server = tokio::spawn(async move {
        serve_once(
            &listener,
            vec![
                frame("C", "down"),
                "{not json at all".to_string(),
                frame("G", "up"),
            ],
        )
        .await;
    });

    link.connect().unwrap();

    let first = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("first event")
        .expect("channel open");
    assert_eq!(first.chord.as_ref().map(|c| c.root()), Some("C"));
    assert_eq!(first.strum_direction, Some(StrumDirection::Down));

    // The malformed frame is dropped without killing the link; the next
    // valid frame arrives in order.
    let second = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("second event")
        .expect("channel open");
    assert_eq!(second.chord.as_ref().map(|c| c.root()), Some("G"));
    assert_eq!(second.strum_direction, Some(StrumDirection::Up));

    // Connected was observed along the way.
    let mut saw_connected = false;
    while let Ok(state) = states.try_recv() {
        if state == ConnectionState::Connected {
            saw_connected = true;
        }
    }
    assert!(saw_connected);

    server.await.unwrap();
    link.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_link_reconnects_after_server_drop() {
    let (listener, port) = bind().await;
    let link = DetectionLink::new(&link_config(port));
    let mut events = Box::pin(link.events_stream());

    let server = tokio::spawn(async move {
        // First connection: handshake then immediate drop.
        serve_once(&listener, vec![]).await;
        // Second connection proves a reconnect happened.
        serve_once(&listener, vec![frame("Am", "down")]).await;
    });

    link.connect().unwrap();

    let event = tokio::time::timeout(Duration::from_secs(5), events.next())
        .await
        .expect("event after reconnect")
        .expect("stream open");
    assert_eq!(event.chord.as_ref().map(|c| c.root()), Some("Am"));

    server.await.unwrap();
    link.disconnect().await.unwrap();
    assert_eq!(link.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_disconnect_cancels_pending_reconnect() {
    let (listener, port) = bind().await;
    let config = LinkConfig {
        reconnect_delay_ms: 300,
        ..link_config(port)
    };
    let link = DetectionLink::new(&config);
    let mut states = link.subscribe_state();

    let server = tokio::spawn(async move {
        serve_once(&listener, vec![]).await;
        listener
    });

    link.connect().unwrap();

    // Wait for the drop to surface as an Error state; the link is now
    // inside its fixed reconnect delay.
    loop {
        let state = tokio::time::timeout(Duration::from_secs(5), states.recv())
            .await
            .expect("state transition")
            .expect("channel open");
        if matches!(state, ConnectionState::Error(_)) {
            break;
        }
    }

    link.disconnect().await.unwrap();
    assert_eq!(link.state(), ConnectionState::Disconnected);

    // No further connection attempt arrives after disconnect.
    let listener = server.await.unwrap();
    let extra = tokio::time::timeout(Duration::from_millis(600), listener.accept()).await;
    assert!(extra.is_err(), "no reconnect attempt expected after disconnect");
}

#[tokio::test]
async fn test_each_failure_schedules_one_delayed_retry() {
    let (listener, port) = bind().await;
    let link = DetectionLink::new(&link_config(port));

    let server = tokio::spawn(async move {
        // Three consecutive accept-then-drop failures, then a working
        // connection delivering a frame.
        for _ in 0..3 {
            serve_once(&listener, vec![]).await;
        }
        serve_once(&listener, vec![frame("F", "up")]).await;
    });

    let mut events = link.subscribe_events();
    let started = std::time::Instant::now();
    link.connect().unwrap();

    let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
        .await
        .expect("event after repeated reconnects")
        .expect("channel open");
    assert_eq!(event.chord.as_ref().map(|c| c.root()), Some("F"));

    // Three failures mean three delay windows were waited through.
    assert!(started.elapsed() >= Duration::from_millis(300));

    server.await.unwrap();
    link.disconnect().await.unwrap();
}
