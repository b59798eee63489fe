//! Conversational assistant pipeline shared by the CLI and any other host.
//!
//! ARCHITECTURE
//! ============
//! ```text
//!   Microphone ──f32 blocks──▶ pcm::encode_block ──AudioChunk──▶ LiveLink.outbound
//!                                                                       │
//!   AudioOutput ◀── PlaybackScheduler ◀── pcm::decode_chunk ◀── LiveLink.inbound
//!                                              TranscriptAccumulator ◀──┘
//! ```
//!
//! [`session::VoiceSession`] owns every resource for one real-time session and
//! drives the state machine. Hardware and the hosted model are reached only
//! through the capability traits in [`device`] and [`live`], so hosts supply
//! their own microphone, speaker and transport.
//!
//! [`chat::ChatLog`] is the simpler single-shot text path.

pub mod chat;
pub mod device;
pub mod live;
pub mod pcm;
pub mod playback;
pub mod session;
pub mod transcript;

#[cfg(test)]
pub(crate) mod testing;

pub use chat::{ChatError, ChatLog, ChatMessage, Responder};
pub use device::{AudioOutput, DeviceError, Microphone, SourceId};
pub use live::{GeminiLiveConnector, LiveLink, LiveSetup, RealtimeConnector};
pub use session::{SessionConfig, SessionState, SessionUpdate, StopHandle, VoiceError, VoiceSession};
