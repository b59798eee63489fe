//! Real-time voice session: one owned object per conversation.
//!
//! LIFECYCLE
//! =========
//! ```text
//! Disconnected ─connect()─▶ Connecting ─handshake─▶ Connected ─▶ Listening ⇄ Speaking
//!       ▲                                                               │
//!       └──────────── disconnect() / remote close / error ──────────────┘
//! ```
//!
//! `Listening` and `Speaking` are driven only by the playback scheduler:
//! a scheduled chunk means `Speaking`, the active set draining means
//! `Listening`.
//!
//! Teardown releases the microphone, the output context and the socket
//! unconditionally, from whichever state it is invoked in.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Notify, mpsc};
use tracing::{debug, info, warn};

use crate::chat::ChatMessage;
use crate::device::{AudioOutput, DeviceError, Microphone, SourceId};
use crate::live::{ClientMessage, LiveError, LiveEvent, LiveLink, LiveSetup, RealtimeConnector, ServerMessage};
use crate::pcm::{self, PcmError};
use crate::playback::PlaybackScheduler;
use crate::transcript::TranscriptAccumulator;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Listening,
    Speaking,
}

impl SessionState {
    /// Connected in any sub-state.
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(self, Self::Connected | Self::Listening | Self::Speaking)
    }
}

/// Notifications for the host UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    State(SessionState),
    Message(ChatMessage),
    Error(String),
}

#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Live(#[from] LiveError),
    #[error(transparent)]
    Pcm(#[from] PcmError),
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub setup: LiveSetup,
    /// Scripted opener sent right after connecting, if any.
    pub greeting: Option<String>,
}

/// Ends a running [`VoiceSession::run`] from another task.
#[derive(Debug, Clone)]
pub struct StopHandle {
    notify: Arc<Notify>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.notify.notify_one();
    }
}

enum Event {
    Stop,
    Mic(Vec<f32>),
    MicClosed,
    Remote(LiveEvent),
    SourceEnded(SourceId),
    OutputClosed,
}

// =============================================================================
// SESSION
// =============================================================================

pub struct VoiceSession {
    config: SessionConfig,
    connector: Arc<dyn RealtimeConnector>,
    mic: Box<dyn Microphone>,
    output: Box<dyn AudioOutput>,
    state: SessionState,
    scheduler: PlaybackScheduler,
    transcripts: TranscriptAccumulator,
    messages: Vec<ChatMessage>,
    link: Option<LiveLink>,
    mic_rx: Option<mpsc::UnboundedReceiver<Vec<f32>>>,
    ended_rx: Option<mpsc::UnboundedReceiver<SourceId>>,
    updates: mpsc::UnboundedSender<SessionUpdate>,
    stop: Arc<Notify>,
}

impl VoiceSession {
    /// Build a disconnected session and the receiver for its updates.
    pub fn new(
        config: SessionConfig,
        connector: Arc<dyn RealtimeConnector>,
        mic: Box<dyn Microphone>,
        output: Box<dyn AudioOutput>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionUpdate>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let session = Self {
            config,
            connector,
            mic,
            output,
            state: SessionState::Disconnected,
            scheduler: PlaybackScheduler::new(),
            transcripts: TranscriptAccumulator::new(),
            messages: Vec::new(),
            link: None,
            mic_rx: None,
            ended_rx: None,
            updates,
            stop: Arc::new(Notify::new()),
        };
        (session, rx)
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Transcript messages flushed so far.
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle { notify: Arc::clone(&self.stop) }
    }

    #[must_use]
    pub fn scheduler(&self) -> &PlaybackScheduler {
        &self.scheduler
    }

    // -------------------------------------------------------------------------
    // connect / disconnect
    // -------------------------------------------------------------------------

    /// Open the session. A no-op unless currently disconnected.
    ///
    /// # Errors
    ///
    /// Device or session failures tear everything down, leave the session
    /// `Disconnected`, and are returned.
    pub async fn connect(&mut self) -> Result<(), VoiceError> {
        if self.state != SessionState::Disconnected {
            debug!(state = ?self.state, "voice: connect ignored");
            return Ok(());
        }
        self.set_state(SessionState::Connecting);

        if let Err(e) = self.open().await {
            warn!(error = %e, "voice: connect failed");
            self.notify(SessionUpdate::Error(e.to_string()));
            self.disconnect();
            return Err(e);
        }
        Ok(())
    }

    async fn open(&mut self) -> Result<(), VoiceError> {
        let (ended_tx, ended_rx) = mpsc::unbounded_channel();
        self.output.open(ended_tx)?;
        self.ended_rx = Some(ended_rx);

        let link = self.connector.connect(&self.config.setup).await?;
        self.link = Some(link);
        self.set_state(SessionState::Connected);

        let (mic_tx, mic_rx) = mpsc::unbounded_channel();
        self.mic.start(mic_tx)?;
        self.mic_rx = Some(mic_rx);

        if let Some(greeting) = self.config.greeting.clone() {
            self.send(ClientMessage::Text(greeting)).await?;
        }
        self.set_state(SessionState::Listening);
        Ok(())
    }

    /// Release every resource and return to `Disconnected`. Idempotent.
    pub fn disconnect(&mut self) {
        self.mic.stop();
        self.mic_rx = None;
        self.scheduler.reset(self.output.as_mut());
        self.output.close();
        self.ended_rx = None;
        // Dropping the outbound sender closes the socket writer.
        self.link = None;
        self.transcripts.clear();
        self.set_state(SessionState::Disconnected);
    }

    /// Send a typed user turn into the live session. Blank text is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the session's transport has gone away.
    pub async fn send_text(&mut self, text: &str) -> Result<(), VoiceError> {
        let text = text.trim();
        if text.is_empty() || !self.state.is_live() {
            return Ok(());
        }
        self.send(ClientMessage::Text(text.to_owned())).await
    }

    async fn send(&mut self, message: ClientMessage) -> Result<(), VoiceError> {
        let Some(link) = self.link.as_ref() else {
            return Err(LiveError::Closed.into());
        };
        link.outbound
            .send(message)
            .await
            .map_err(|_| VoiceError::Live(LiveError::Closed))
    }

    // -------------------------------------------------------------------------
    // event loop
    // -------------------------------------------------------------------------

    /// Pump microphone, server and playback events until the session ends.
    ///
    /// # Errors
    ///
    /// Returns the transport error when the session ends because of one. A
    /// remote close or a stop request ends with `Ok`.
    pub async fn run(&mut self) -> Result<(), VoiceError> {
        let stop = Arc::clone(&self.stop);
        while self.state != SessionState::Disconnected {
            let (Some(link), Some(mic_rx), Some(ended_rx)) =
                (self.link.as_mut(), self.mic_rx.as_mut(), self.ended_rx.as_mut())
            else {
                self.disconnect();
                break;
            };

            let event = tokio::select! {
                () = stop.notified() => Event::Stop,
                block = mic_rx.recv() => block.map_or(Event::MicClosed, Event::Mic),
                ev = link.inbound.recv() => Event::Remote(ev.unwrap_or(LiveEvent::Closed(None))),
                id = ended_rx.recv() => id.map_or(Event::OutputClosed, Event::SourceEnded),
            };

            match event {
                Event::Stop => {
                    info!("voice: stop requested");
                    self.disconnect();
                }
                Event::Mic(block) => {
                    if let Err(e) = self.handle_mic_block(&block).await {
                        return Err(self.fail(e));
                    }
                }
                Event::MicClosed => return Err(self.fail(DeviceError::Backend("microphone stream ended".into()).into())),
                Event::OutputClosed => return Err(self.fail(DeviceError::Backend("output device ended".into()).into())),
                Event::Remote(LiveEvent::Message(msg)) => self.handle_server_message(msg),
                Event::Remote(LiveEvent::Closed(reason)) => {
                    info!(?reason, "voice: remote closed");
                    self.disconnect();
                }
                Event::Remote(LiveEvent::Error(e)) => return Err(self.fail(LiveError::Protocol(e).into())),
                Event::SourceEnded(id) => self.handle_source_ended(id),
            }
        }
        Ok(())
    }

    fn fail(&mut self, err: VoiceError) -> VoiceError {
        warn!(error = %err, "voice: session error");
        self.notify(SessionUpdate::Error(err.to_string()));
        self.disconnect();
        err
    }

    /// Encode one capture block and stream it. Blocks are sent independently.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport is closed.
    pub async fn handle_mic_block(&mut self, block: &[f32]) -> Result<(), VoiceError> {
        if !self.state.is_live() {
            return Ok(());
        }
        self.send(ClientMessage::Audio(pcm::encode_block(block))).await
    }

    /// Apply one server message: transcripts, audio, barge-in, turn end.
    pub fn handle_server_message(&mut self, msg: ServerMessage) {
        if !self.state.is_live() {
            return;
        }
        if msg.go_away {
            warn!("voice: server is ending the session soon");
        }
        if let Some(text) = &msg.input_transcription {
            self.transcripts.push_input(text);
        }
        if let Some(text) = &msg.output_transcription {
            self.transcripts.push_output(text);
        }

        for data in &msg.audio {
            match pcm::decode_chunk(data) {
                Ok(samples) if samples.is_empty() => {}
                Ok(samples) => {
                    let placed = self.scheduler.enqueue(self.output.as_mut(), samples);
                    debug!(id = placed.id, start = placed.start, duration = placed.duration, "voice: chunk scheduled");
                    self.set_state(SessionState::Speaking);
                }
                Err(e) => warn!(error = %e, "voice: dropping undecodable chunk"),
            }
        }

        if msg.interrupted {
            info!(active = self.scheduler.active_count(), "voice: interrupted");
            self.scheduler.interrupt(self.output.as_mut());
            self.set_state(SessionState::Listening);
        }

        if msg.turn_complete {
            for message in self.transcripts.flush() {
                self.messages.push(message.clone());
                self.notify(SessionUpdate::Message(message));
            }
        }
    }

    /// A scheduled source finished on its own.
    pub fn handle_source_ended(&mut self, id: SourceId) {
        if self.scheduler.source_ended(id) && self.state == SessionState::Speaking {
            self.set_state(SessionState::Listening);
        }
    }

    // -------------------------------------------------------------------------
    // helpers
    // -------------------------------------------------------------------------

    fn set_state(&mut self, next: SessionState) {
        if self.state == next {
            return;
        }
        info!(from = ?self.state, to = ?next, "voice: state change");
        self.state = next;
        self.notify(SessionUpdate::State(next));
    }

    fn notify(&self, update: SessionUpdate) {
        // The host may have stopped listening; updates are best-effort.
        let _ = self.updates.send(update);
    }
}

impl Drop for VoiceSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
