use super::*;
use crate::pcm::encode_block;
use crate::testing::{FakeConnector, FakeMic, FakeOutput, MicState, OutputState};
use std::sync::Mutex;
use tokio::time::{Duration, timeout};

struct Harness {
    session: VoiceSession,
    updates: mpsc::UnboundedReceiver<SessionUpdate>,
    connector: Arc<FakeConnector>,
    mic: Arc<Mutex<MicState>>,
    out: Arc<Mutex<OutputState>>,
}

fn config(greeting: Option<&str>) -> SessionConfig {
    SessionConfig { setup: LiveSetup::new("You are the studio assistant."), greeting: greeting.map(str::to_owned) }
}

fn harness_with(connector: Arc<FakeConnector>, mic: FakeMic, mic_state: Arc<Mutex<MicState>>, greeting: Option<&str>) -> Harness {
    let (output, out) = FakeOutput::new();
    let (session, updates) = VoiceSession::new(config(greeting), connector.clone(), Box::new(mic), Box::new(output));
    Harness { session, updates, connector, mic: mic_state, out }
}

fn harness() -> Harness {
    let (mic, state) = FakeMic::new();
    harness_with(FakeConnector::new(), mic, state, None)
}

fn drain_states(rx: &mut mpsc::UnboundedReceiver<SessionUpdate>) -> Vec<SessionState> {
    let mut states = Vec::new();
    while let Ok(update) = rx.try_recv() {
        if let SessionUpdate::State(s) = update {
            states.push(s);
        }
    }
    states
}

fn drain_errors(rx: &mut mpsc::UnboundedReceiver<SessionUpdate>) -> Vec<String> {
    std::iter::from_fn(|| rx.try_recv().ok())
        .filter_map(|u| match u {
            SessionUpdate::Error(e) => Some(e),
            _ => None,
        })
        .collect()
}

fn audio_message(samples: usize) -> ServerMessage {
    ServerMessage { audio: vec![encode_block(&vec![0.1; samples]).data], ..ServerMessage::default() }
}

fn assert_torn_down(h: &Harness) {
    assert_eq!(h.session.state(), SessionState::Disconnected);
    assert!(h.session.scheduler().is_idle());
    assert!(h.out.lock().unwrap().closed);
    assert!(!h.mic.lock().unwrap().active);
}

// =========================================================================
// connect
// =========================================================================

#[tokio::test]
async fn connect_walks_through_states_to_listening() {
    let mut h = harness();
    h.session.connect().await.unwrap();

    assert_eq!(h.session.state(), SessionState::Listening);
    assert_eq!(
        drain_states(&mut h.updates),
        vec![SessionState::Connecting, SessionState::Connected, SessionState::Listening]
    );
    assert!(h.mic.lock().unwrap().active);
    assert!(h.out.lock().unwrap().open);
    let setups = h.connector.setups.lock().unwrap();
    assert_eq!(setups.len(), 1);
    assert_eq!(setups[0].system_instruction, "You are the studio assistant.");
}

#[tokio::test]
async fn second_connect_is_a_no_op() {
    let mut h = harness();
    h.session.connect().await.unwrap();
    h.session.connect().await.unwrap();

    assert_eq!(h.connector.setups.lock().unwrap().len(), 1);
    assert_eq!(h.mic.lock().unwrap().starts, 1);
}

#[tokio::test]
async fn connect_sends_scripted_greeting() {
    let (mic, state) = FakeMic::new();
    let mut h = harness_with(FakeConnector::new(), mic, state, Some("Say hello"));
    h.session.connect().await.unwrap();

    let mut remote = h.connector.take_remote();
    let first = remote.sent.try_recv().unwrap();
    assert_eq!(first, ClientMessage::Text("Say hello".into()));
}

#[tokio::test]
async fn mic_permission_denied_resets_to_disconnected() {
    let (mic, state) = FakeMic::denied();
    let mut h = harness_with(FakeConnector::new(), mic, state, None);

    let err = h.session.connect().await.unwrap_err();
    assert!(matches!(err, VoiceError::Device(DeviceError::PermissionDenied)));
    assert_torn_down(&h);

    // The link was dropped, so the socket writer sees the channel close.
    let mut remote = h.connector.take_remote();
    assert!(remote.sent.recv().await.is_none());
    assert!(drain_errors(&mut h.updates).iter().any(|e| e.contains("permission")));
}

#[tokio::test]
async fn session_handshake_failure_tears_down_from_connecting() {
    let (mic, state) = FakeMic::new();
    let mut h = harness_with(FakeConnector::failing(), mic, state, None);

    let err = h.session.connect().await.unwrap_err();
    assert!(matches!(err, VoiceError::Live(LiveError::Connect(_))));
    assert_torn_down(&h);
    assert_eq!(
        drain_states(&mut h.updates),
        vec![SessionState::Connecting, SessionState::Disconnected]
    );
}

// =========================================================================
// capture
// =========================================================================

#[tokio::test]
async fn mic_block_is_encoded_and_sent() {
    let mut h = harness();
    h.session.connect().await.unwrap();
    let mut remote = h.connector.take_remote();

    let block = vec![0.5; 4096];
    h.session.handle_mic_block(&block).await.unwrap();

    let sent = remote.sent.try_recv().unwrap();
    assert_eq!(sent, ClientMessage::Audio(encode_block(&block)));
}

#[tokio::test]
async fn mic_block_after_disconnect_is_dropped() {
    let mut h = harness();
    h.session.connect().await.unwrap();
    h.session.disconnect();
    assert!(h.session.handle_mic_block(&[0.1; 16]).await.is_ok());
}

// =========================================================================
// playback / state
// =========================================================================

#[tokio::test]
async fn audio_moves_to_speaking_and_completion_back_to_listening() {
    let mut h = harness();
    h.session.connect().await.unwrap();
    drain_states(&mut h.updates);

    h.session.handle_server_message(audio_message(2400));
    h.session.handle_server_message(audio_message(2400));
    assert_eq!(h.session.state(), SessionState::Speaking);

    let scheduled = h.out.lock().unwrap().scheduled.clone();
    assert_eq!(scheduled.len(), 2);
    assert!((scheduled[1].1 - (scheduled[0].1 + 0.1)).abs() < 1e-9);

    h.session.handle_source_ended(scheduled[0].0);
    assert_eq!(h.session.state(), SessionState::Speaking);
    h.session.handle_source_ended(scheduled[1].0);
    assert_eq!(h.session.state(), SessionState::Listening);

    assert_eq!(drain_states(&mut h.updates), vec![SessionState::Speaking, SessionState::Listening]);
}

#[tokio::test]
async fn interruption_clears_sources_and_zeroes_cursor() {
    let mut h = harness();
    h.session.connect().await.unwrap();
    h.session.handle_server_message(audio_message(24_000));
    h.session.handle_server_message(audio_message(24_000));

    h.session
        .handle_server_message(ServerMessage { interrupted: true, ..ServerMessage::default() });

    assert_eq!(h.session.state(), SessionState::Listening);
    assert!(h.session.scheduler().is_idle());
    assert!(h.session.scheduler().next_start_time().abs() < f64::EPSILON);
    assert_eq!(h.out.lock().unwrap().stopped.len(), 2);
}

#[tokio::test]
async fn undecodable_audio_is_skipped() {
    let mut h = harness();
    h.session.connect().await.unwrap();
    h.session
        .handle_server_message(ServerMessage { audio: vec!["%%%".into()], ..ServerMessage::default() });
    assert_eq!(h.session.state(), SessionState::Listening);
    assert!(h.out.lock().unwrap().scheduled.is_empty());
}

// =========================================================================
// transcripts
// =========================================================================

#[tokio::test]
async fn turn_complete_flushes_at_most_two_messages() {
    let mut h = harness();
    h.session.connect().await.unwrap();

    h.session.handle_server_message(ServerMessage {
        input_transcription: Some("Do you build ".into()),
        ..ServerMessage::default()
    });
    h.session.handle_server_message(ServerMessage {
        input_transcription: Some("chatbots?".into()),
        output_transcription: Some("Yes, ".into()),
        ..ServerMessage::default()
    });
    h.session.handle_server_message(ServerMessage {
        output_transcription: Some("voice ones too.".into()),
        turn_complete: true,
        ..ServerMessage::default()
    });

    let messages = h.session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].text, "Do you build chatbots?");
    assert!(messages[0].is_user);
    assert_eq!(messages[1].text, "Yes, voice ones too.");

    // Accumulator was cleared: an empty turn adds nothing.
    h.session
        .handle_server_message(ServerMessage { turn_complete: true, ..ServerMessage::default() });
    assert_eq!(h.session.messages().len(), 2);

    let pushed: Vec<ChatMessage> = std::iter::from_fn(|| h.updates.try_recv().ok())
        .filter_map(|u| match u {
            SessionUpdate::Message(m) => Some(m),
            _ => None,
        })
        .collect();
    assert_eq!(pushed.len(), 2);
}

// =========================================================================
// disconnect
// =========================================================================

#[tokio::test]
async fn disconnect_while_speaking_releases_everything() {
    let mut h = harness();
    h.session.connect().await.unwrap();
    h.session.handle_server_message(audio_message(24_000));
    assert_eq!(h.session.state(), SessionState::Speaking);

    h.session.disconnect();
    assert_torn_down(&h);
    assert_eq!(h.out.lock().unwrap().stopped.len(), 1);
    assert!(h.session.scheduler().next_start_time().abs() < f64::EPSILON);
}

#[tokio::test]
async fn disconnect_while_listening_releases_everything() {
    let mut h = harness();
    h.session.connect().await.unwrap();
    h.session.disconnect();
    assert_torn_down(&h);
}

#[tokio::test]
async fn disconnect_is_idempotent() {
    let mut h = harness();
    h.session.disconnect();
    h.session.disconnect();
    assert_torn_down(&h);
    assert!(drain_states(&mut h.updates).is_empty());
}

#[tokio::test]
async fn send_text_ignores_blank_and_forwards_text() {
    let mut h = harness();
    h.session.connect().await.unwrap();
    let mut remote = h.connector.take_remote();

    h.session.send_text("   ").await.unwrap();
    assert!(remote.sent.try_recv().is_err());

    h.session.send_text("What courses exist?").await.unwrap();
    assert_eq!(remote.sent.try_recv().unwrap(), ClientMessage::Text("What courses exist?".into()));
}

// =========================================================================
// run loop
// =========================================================================

#[tokio::test]
async fn run_forwards_mic_blocks_until_stopped() {
    let mut h = harness();
    h.session.connect().await.unwrap();
    let mut remote = h.connector.take_remote();
    let stop = h.session.stop_handle();
    let sink = h.mic.lock().unwrap().sink.clone().unwrap();

    let driver = async {
        sink.send(vec![0.25; 4096]).unwrap();
        let sent = timeout(Duration::from_secs(1), remote.sent.recv())
            .await
            .expect("mic block should be forwarded")
            .unwrap();
        assert!(matches!(sent, ClientMessage::Audio(_)));
        stop.stop();
    };

    let (result, ()) = tokio::join!(h.session.run(), driver);
    assert!(result.is_ok());
    assert_torn_down(&h);
}

#[tokio::test]
async fn run_plays_audio_and_returns_to_listening() {
    let mut h = harness();
    h.session.connect().await.unwrap();
    let remote = h.connector.take_remote();
    let stop = h.session.stop_handle();
    let out = Arc::clone(&h.out);

    let driver = async {
        remote.events.send(LiveEvent::Message(audio_message(2400))).await.unwrap();
        // Wait for the chunk to be scheduled, then report natural completion.
        let id = loop {
            if let Some(&(id, _, _)) = out.lock().unwrap().scheduled.first() {
                break id;
            }
            tokio::task::yield_now().await;
        };
        let ended = out.lock().unwrap().ended.clone().unwrap();
        ended.send(id).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        stop.stop();
    };

    let (result, ()) = tokio::join!(h.session.run(), driver);
    assert!(result.is_ok());
    let states = drain_states(&mut h.updates);
    let tail: Vec<SessionState> = states.into_iter().skip(3).collect();
    assert_eq!(tail, vec![SessionState::Speaking, SessionState::Listening, SessionState::Disconnected]);
}

#[tokio::test]
async fn remote_close_ends_run_disconnected() {
    let mut h = harness();
    h.session.connect().await.unwrap();
    let remote = h.connector.take_remote();
    remote.events.send(LiveEvent::Closed(Some("bye".into()))).await.unwrap();

    let result = timeout(Duration::from_secs(1), h.session.run()).await.unwrap();
    assert!(result.is_ok());
    assert_torn_down(&h);
}

#[tokio::test]
async fn remote_error_ends_run_with_error() {
    let mut h = harness();
    h.session.connect().await.unwrap();
    let remote = h.connector.take_remote();
    remote.events.send(LiveEvent::Error("socket reset".into())).await.unwrap();

    let err = timeout(Duration::from_secs(1), h.session.run()).await.unwrap().unwrap_err();
    assert!(matches!(err, VoiceError::Live(LiveError::Protocol(_))));
    assert_torn_down(&h);
}

#[tokio::test]
async fn dropped_remote_counts_as_close() {
    let mut h = harness();
    h.session.connect().await.unwrap();
    drop(h.connector.take_remote());

    let result = timeout(Duration::from_secs(1), h.session.run()).await.unwrap();
    assert!(result.is_ok());
    assert_eq!(h.session.state(), SessionState::Disconnected);
}
