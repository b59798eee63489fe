//! Real-time session protocol and websocket transport.
//!
//! PROTOCOL
//! ========
//! One JSON message per websocket frame:
//! 1. client → `{"setup": {...}}`, server → `{"setupComplete": {}}` (handshake)
//! 2. client → `{"realtimeInput": {"audio": {"mimeType", "data"}}}` per mic block
//! 3. server → `{"serverContent": {"modelTurn": {"parts": [{"inlineData"}]},
//!    "inputTranscription", "outputTranscription", "turnComplete", "interrupted"}}`
//!
//! TRANSPORT
//! =========
//! [`GeminiLiveConnector`] completes the handshake, then splits the socket
//! into a writer task fed by [`LiveLink::outbound`] and a reader task that
//! parses frames into [`LiveLink::inbound`]. Dropping the link closes the
//! socket.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::pcm::AudioChunk;

pub const LIVE_ENDPOINT: &str =
    "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";
pub const DEFAULT_LIVE_MODEL: &str = "gemini-2.5-flash-native-audio-preview-09-2025";
pub const DEFAULT_VOICE: &str = "Zephyr";

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const CHANNEL_CAPACITY: usize = 64;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

#[derive(Debug, thiserror::Error)]
pub enum LiveError {
    #[error("realtime connect failed: {0}")]
    Connect(String),
    #[error("realtime session closed")]
    Closed,
    #[error("realtime protocol error: {0}")]
    Protocol(String),
    #[error("realtime handshake timed out")]
    Timeout,
}

// =============================================================================
// SETUP
// =============================================================================

/// Everything sent in the opening `setup` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSetup {
    pub model: String,
    pub voice: String,
    pub system_instruction: String,
    pub input_transcription: bool,
    pub output_transcription: bool,
}

impl LiveSetup {
    #[must_use]
    pub fn new(system_instruction: impl Into<String>) -> Self {
        Self {
            model: DEFAULT_LIVE_MODEL.to_owned(),
            voice: DEFAULT_VOICE.to_owned(),
            system_instruction: system_instruction.into(),
            input_transcription: true,
            output_transcription: true,
        }
    }

    /// The wire `setup` message.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let model = if self.model.starts_with("models/") { self.model.clone() } else { format!("models/{}", self.model) };
        let mut setup = json!({
            "model": model,
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": self.voice } }
                }
            },
            "systemInstruction": { "parts": [{ "text": self.system_instruction }] },
        });
        if self.input_transcription {
            setup["inputAudioTranscription"] = json!({});
        }
        if self.output_transcription {
            setup["outputAudioTranscription"] = json!({});
        }
        json!({ "setup": setup })
    }
}

// =============================================================================
// MESSAGES
// =============================================================================

/// Messages the session sends after the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Audio(AudioChunk),
    /// A complete user text turn (also used for scripted openers).
    Text(String),
}

impl ClientMessage {
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Audio(chunk) => json!({ "realtimeInput": { "audio": chunk } }),
            Self::Text(text) => json!({
                "clientContent": {
                    "turns": [{ "role": "user", "parts": [{ "text": text }] }],
                    "turnComplete": true
                }
            }),
        }
    }
}

/// Flattened view of one server message. Absent fields are empty/false.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerMessage {
    pub setup_complete: bool,
    /// Base64 PCM16 payloads, in part order.
    pub audio: Vec<String>,
    pub input_transcription: Option<String>,
    pub output_transcription: Option<String>,
    pub turn_complete: bool,
    pub interrupted: bool,
    pub go_away: bool,
}

/// Events surfaced by a live link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveEvent {
    Message(ServerMessage),
    Closed(Option<String>),
    Error(String),
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct WireServerMessage {
    setup_complete: Option<Value>,
    server_content: Option<WireServerContent>,
    go_away: Option<Value>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct WireServerContent {
    model_turn: Option<WireContent>,
    input_transcription: Option<WireTranscription>,
    output_transcription: Option<WireTranscription>,
    turn_complete: bool,
    interrupted: bool,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct WireContent {
    parts: Vec<WirePart>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct WirePart {
    inline_data: Option<WireInlineData>,
}

#[derive(Deserialize)]
struct WireInlineData {
    data: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct WireTranscription {
    text: Option<String>,
}

/// Parse one server frame.
///
/// # Errors
///
/// Returns [`LiveError::Protocol`] when the frame is not a JSON object of the expected shape.
pub fn parse_server_message(raw: &str) -> Result<ServerMessage, LiveError> {
    let wire: WireServerMessage = serde_json::from_str(raw).map_err(|e| LiveError::Protocol(e.to_string()))?;
    let mut msg = ServerMessage {
        setup_complete: wire.setup_complete.is_some(),
        go_away: wire.go_away.is_some(),
        ..ServerMessage::default()
    };
    if let Some(content) = wire.server_content {
        msg.audio = content
            .model_turn
            .map(|turn| {
                turn.parts
                    .into_iter()
                    .filter_map(|p| p.inline_data.map(|d| d.data))
                    .collect()
            })
            .unwrap_or_default();
        msg.input_transcription = content.input_transcription.and_then(|t| t.text);
        msg.output_transcription = content.output_transcription.and_then(|t| t.text);
        msg.turn_complete = content.turn_complete;
        msg.interrupted = content.interrupted;
    }
    Ok(msg)
}

// =============================================================================
// CONNECTOR
// =============================================================================

/// Both directions of an open session.
#[derive(Debug)]
pub struct LiveLink {
    pub outbound: mpsc::Sender<ClientMessage>,
    pub inbound: mpsc::Receiver<LiveEvent>,
}

/// Opens a real-time session. Returns only after the handshake completes.
#[async_trait::async_trait]
pub trait RealtimeConnector: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`LiveError`] when the socket cannot be opened or the setup is rejected.
    async fn connect(&self, setup: &LiveSetup) -> Result<LiveLink, LiveError>;
}

/// Hosted Gemini Live endpoint over websocket.
pub struct GeminiLiveConnector {
    api_key: String,
    endpoint: String,
    handshake_timeout: Duration,
}

impl GeminiLiveConnector {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), endpoint: LIVE_ENDPOINT.to_owned(), handshake_timeout: HANDSHAKE_TIMEOUT }
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Deadline for the whole opening: TCP/TLS, websocket upgrade and setup ack.
    #[must_use]
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    fn url(&self) -> String {
        format!("{}?key={}", self.endpoint, self.api_key)
    }

    async fn open(&self, setup: &LiveSetup) -> Result<WsStream, LiveError> {
        let (mut stream, _) = connect_async(self.url())
            .await
            .map_err(|e| LiveError::Connect(e.to_string()))?;

        stream
            .send(Message::Text(setup.to_json().to_string().into()))
            .await
            .map_err(|e| LiveError::Connect(e.to_string()))?;

        await_setup_complete(&mut stream).await?;
        Ok(stream)
    }
}

#[async_trait::async_trait]
impl RealtimeConnector for GeminiLiveConnector {
    async fn connect(&self, setup: &LiveSetup) -> Result<LiveLink, LiveError> {
        info!(model = %setup.model, voice = %setup.voice, "live: connecting");
        let stream = tokio::time::timeout(self.handshake_timeout, self.open(setup))
            .await
            .map_err(|_| LiveError::Timeout)??;
        info!("live: setup complete");

        let (mut sink, mut source) = stream.split();
        let (out_tx, mut out_rx) = mpsc::channel::<ClientMessage>(CHANNEL_CAPACITY);
        let (in_tx, in_rx) = mpsc::channel::<LiveEvent>(CHANNEL_CAPACITY);

        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                if let Err(e) = sink.send(Message::Text(msg.to_json().to_string().into())).await {
                    warn!(error = %e, "live: send failed");
                    break;
                }
            }
            let _ = sink.close().await;
            debug!("live: writer finished");
        });

        tokio::spawn(async move {
            let closed_reason = loop {
                let Some(frame) = source.next().await else {
                    break None;
                };
                let message = match frame {
                    Ok(Message::Close(frame)) => break frame.map(|f| f.reason.as_str().to_owned()),
                    Ok(message) => message,
                    Err(e) => {
                        let _ = in_tx.send(LiveEvent::Error(e.to_string())).await;
                        return;
                    }
                };
                match decode_frame(&message) {
                    Ok(Some(msg)) => {
                        if in_tx.send(LiveEvent::Message(msg)).await.is_err() {
                            return;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "live: dropping malformed frame"),
                }
            };
            let _ = in_tx.send(LiveEvent::Closed(closed_reason)).await;
        });

        Ok(LiveLink { outbound: out_tx, inbound: in_rx })
    }
}

async fn await_setup_complete(stream: &mut WsStream) -> Result<(), LiveError> {
    loop {
        let Some(frame) = stream.next().await else {
            return Err(LiveError::Closed);
        };
        match frame.map_err(|e| LiveError::Connect(e.to_string()))? {
            Message::Close(frame) => {
                warn!(reason = ?frame.map(|f| f.reason.as_str().to_owned()), "live: closed during setup");
                return Err(LiveError::Closed);
            }
            message => {
                if decode_frame(&message)?.is_some_and(|msg| msg.setup_complete) {
                    return Ok(());
                }
            }
        }
    }
}

/// Text and binary frames both carry JSON; control frames yield `None`.
fn decode_frame(message: &Message) -> Result<Option<ServerMessage>, LiveError> {
    let raw = match message {
        Message::Text(text) => text.as_str(),
        Message::Binary(bytes) => std::str::from_utf8(bytes).map_err(|e| LiveError::Protocol(e.to_string()))?,
        _ => return Ok(None),
    };
    parse_server_message(raw).map(Some)
}

#[cfg(test)]
#[path = "live_test.rs"]
mod tests;
