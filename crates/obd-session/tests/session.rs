//! End-to-end session tests against a scripted transport.
//!
//! All tests run with paused tokio time so timer-driven behavior (the poll
//! rotation, fallback schedule) is deterministic. `settle()` yields long
//! enough for the worker task to process whatever was just fed.

use std::time::Duration;

use tokio::sync::mpsc;

use obd_codec::TelemetrySample;
use obd_session::mock::{scripted, ScriptHandle, UnavailableTransport};
use obd_session::{AdapterSession, SessionConfig, TransportError};

/// Let the spawned worker run; 1 ms of paused time is instant wall-clock.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Answer the ATZ/ATE0/ATSP0 init sequence so the session reaches ready.
async fn complete_init(handle: &ScriptHandle) {
    for _ in 0..3 {
        handle.feed("OK\r>").await;
    }
    settle().await;
}

async fn connect_scripted() -> (
    AdapterSession,
    ScriptHandle,
    mpsc::UnboundedReceiver<TelemetrySample>,
) {
    let (transport, handle) = scripted();
    let (tx, rx) = mpsc::unbounded_channel();
    let session = AdapterSession::connect(transport, SessionConfig::default(), tx).await;
    settle().await;
    (session, handle, rx)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<TelemetrySample>) -> Vec<TelemetrySample> {
    let mut out = Vec::new();
    while let Ok(sample) = rx.try_recv() {
        out.push(sample);
    }
    out
}

#[tokio::test(start_paused = true)]
async fn init_sequence_is_serialized() {
    let (mut session, handle, _rx) = connect_scripted().await;

    // Only the reset goes out until its terminator arrives
    assert_eq!(handle.writes(), vec!["ATZ\r"]);

    handle.feed("ELM327 v1.5\r>").await;
    settle().await;
    assert_eq!(handle.writes(), vec!["ATZ\r", "ATE0\r"]);

    handle.feed("OK\r>").await;
    settle().await;
    assert_eq!(handle.writes(), vec!["ATZ\r", "ATE0\r", "ATSP0\r"]);

    session.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn ready_emits_connected_once() {
    let (mut session, handle, mut rx) = connect_scripted().await;
    complete_init(&handle).await;

    let updates = drain(&mut rx);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].is_connected, Some(true));

    session.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn poll_rotation_round_robins_pids() {
    let (mut session, handle, mut rx) = connect_scripted().await;
    complete_init(&handle).await;
    drain(&mut rx);

    let mut expected = vec!["ATZ\r".to_string(), "ATE0\r".to_string(), "ATSP0\r".to_string()];
    for (request, response) in [
        ("010C\r", "410C0C80\r>"),
        ("010D\r", "410D37\r>"),
        ("0105\r", "41057B\r>"),
        ("010C\r", "410C1A2B\r>"),
    ] {
        // Advance past one poll interval; exactly one PID goes out
        tokio::time::sleep(Duration::from_millis(501)).await;
        expected.push(request.to_string());
        assert_eq!(handle.writes(), expected);

        handle.feed(response).await;
        settle().await;
    }

    let updates = drain(&mut rx);
    assert_eq!(updates.len(), 4);
    assert_eq!(updates[0].rpm, Some(800.0));
    assert_eq!(updates[1].speed_kph, Some(55.0));
    assert_eq!(updates[2].coolant_temp_c, Some(83.0));
    assert_eq!(updates[3].rpm, Some(1674.75));

    session.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn fragmented_response_decodes_once() {
    let (mut session, handle, mut rx) = connect_scripted().await;
    complete_init(&handle).await;
    drain(&mut rx);

    // Three separate deliveries, one terminator, one decode
    handle.feed("41").await;
    handle.feed("0C0C80").await;
    handle.feed(">").await;
    settle().await;

    let updates = drain(&mut rx);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].rpm, Some(800.0));

    // The remainder buffer was left empty: a following response decodes clean
    handle.feed("410D37>").await;
    settle().await;
    let updates = drain(&mut rx);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].speed_kph, Some(55.0));

    session.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn at_most_one_command_in_flight() {
    let (mut session, handle, mut rx) = connect_scripted().await;
    complete_init(&handle).await;
    drain(&mut rx);
    let baseline = handle.writes().len();

    // Three scans queued back to back, no responses: exactly one write
    session.scan_dtcs();
    session.scan_dtcs();
    session.scan_dtcs();
    settle().await;
    assert_eq!(handle.writes().len(), baseline + 1);
    assert_eq!(handle.writes()[baseline], "03\r");

    // First terminator releases exactly the next command, in order
    handle.feed("43 00\r>").await;
    settle().await;
    assert_eq!(handle.writes().len(), baseline + 2);
    assert_eq!(handle.writes()[baseline + 1], "03\r");

    session.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn dtc_scan_delivers_value_replacing_list() {
    let (mut session, handle, mut rx) = connect_scripted().await;
    complete_init(&handle).await;
    drain(&mut rx);

    session.scan_dtcs();
    settle().await;
    handle.feed("43 02 03 01 04 20\r>").await;
    settle().await;

    let updates = drain(&mut rx);
    assert_eq!(updates.len(), 1);
    assert_eq!(
        updates[0].dtcs,
        Some(vec!["P0301".to_string(), "P0420".to_string()])
    );

    // An empty scan still pushes a (empty) replacement list
    session.scan_dtcs();
    settle().await;
    handle.feed("43 00\r>").await;
    settle().await;
    let updates = drain(&mut rx);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].dtcs, Some(Vec::new()));

    session.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn garbage_response_is_silent() {
    let (mut session, handle, mut rx) = connect_scripted().await;
    complete_init(&handle).await;
    drain(&mut rx);

    handle.feed("SEARCHING...\r>").await;
    handle.feed("NO DATA\r>").await;
    handle.feed("\0\0>").await;
    settle().await;

    assert!(drain(&mut rx).is_empty());
    session.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn mojibake_fragment_keeps_session_alive() {
    let (mut session, handle, mut rx) = connect_scripted().await;
    complete_init(&handle).await;
    drain(&mut rx);

    // Invalid UTF-8 right after a tag: lossy decoding turns it into
    // replacement characters, which must decode to nothing, not kill
    // the worker
    handle.feed("410C").await;
    handle.feed_bytes(b"\xFF\xFFa\xE9b>").await;
    settle().await;
    assert!(drain(&mut rx).is_empty());

    // The worker survived: a clean response still decodes
    handle.feed("410D37\r>").await;
    settle().await;
    let updates = drain(&mut rx);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].speed_kph, Some(55.0));

    session.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn write_failure_drops_command_and_clears_flight() {
    let (mut session, handle, mut rx) = connect_scripted().await;
    complete_init(&handle).await;
    drain(&mut rx);
    let baseline = handle.writes().len();

    handle.set_fail_writes(true);
    session.scan_dtcs();
    settle().await;
    // The write was attempted and rejected; the command is gone
    assert_eq!(handle.writes().len(), baseline + 1);

    // Flag cleared: the next request dispatches immediately, no stale
    // retry of the dropped one first
    handle.set_fail_writes(false);
    session.scan_dtcs();
    settle().await;
    assert_eq!(handle.writes().len(), baseline + 2);
    assert_eq!(handle.writes()[baseline + 1], "03\r");

    session.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn failed_write_does_not_stall_queued_commands() {
    let (mut session, handle, mut rx) = connect_scripted().await;
    complete_init(&handle).await;
    drain(&mut rx);

    // One scan in flight, two more queued behind it
    session.scan_dtcs();
    settle().await;
    session.scan_dtcs();
    session.scan_dtcs();
    settle().await;
    let baseline = handle.writes().len();

    // The in-flight scan completes while writes are rejected: both queued
    // scans are attempted and dropped rather than left stuck
    handle.set_fail_writes(true);
    handle.feed("43 00\r>").await;
    settle().await;
    assert_eq!(handle.writes().len(), baseline + 2);

    // With the queue drained, polling resumes on its own
    handle.set_fail_writes(false);
    tokio::time::sleep(Duration::from_millis(501)).await;
    let writes = handle.writes();
    assert_eq!(writes.len(), baseline + 3);
    assert!(writes.last().unwrap().starts_with("01"));

    session.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn disconnect_closes_channel_and_is_idempotent() {
    let (mut session, handle, _rx) = connect_scripted().await;
    complete_init(&handle).await;

    assert!(session.is_active());
    session.disconnect().await;
    assert!(!session.is_active());
    assert!(handle.is_closed());

    // Second call is a no-op
    session.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn disconnect_while_command_in_flight() {
    let (mut session, handle, _rx) = connect_scripted().await;
    // ATZ is in flight and will never be answered
    assert_eq!(handle.writes(), vec!["ATZ\r"]);

    session.disconnect().await;
    assert!(handle.is_closed());
}

#[tokio::test(start_paused = true)]
async fn unavailable_transport_falls_back() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session =
        AdapterSession::connect(UnavailableTransport::default(), SessionConfig::default(), tx)
            .await;
    assert!(session.is_active());

    // Synthetic "connected" status after the configured delay
    let first = rx.recv().await.unwrap();
    assert_eq!(first.is_connected, Some(true));

    // Scan requests are absorbed, not queued forever
    session.scan_dtcs();

    // Synthetic telemetry follows on the interval
    let sample = rx.recv().await.unwrap();
    assert!(sample.rpm.is_some());
    assert!(sample.speed_kph.is_some());
    assert!(sample.coolant_temp_c.is_some());

    session.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn no_callbacks_after_disconnect() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session = AdapterSession::connect(
        UnavailableTransport(TransportError::NoServiceFound),
        SessionConfig::default(),
        tx,
    )
    .await;

    // Disconnect before the first fallback delay elapses
    session.disconnect().await;

    // Several fallback intervals later: still complete silence
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(drain(&mut rx).is_empty());
}
