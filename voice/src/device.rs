//! Audio capabilities the session consumes but does not own the implementation of.

use tokio::sync::mpsc;

/// Handle for one scheduled playback buffer.
pub type SourceId = u64;

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("microphone permission denied")]
    PermissionDenied,
    #[error("no {0} device available")]
    NoDevice(&'static str),
    #[error("audio backend error: {0}")]
    Backend(String),
}

/// Microphone capture at 16 kHz mono.
pub trait Microphone: Send {
    /// Acquire the device and begin delivering sample blocks to `blocks`.
    ///
    /// # Errors
    ///
    /// Returns an error when the device is missing or access is denied.
    fn start(&mut self, blocks: mpsc::UnboundedSender<Vec<f32>>) -> Result<(), DeviceError>;

    /// Stop capture and release the device. Safe to call when not started.
    fn stop(&mut self);

    fn is_active(&self) -> bool;
}

/// Playback context with a monotonic clock, in seconds.
///
/// Sources stopped through [`AudioOutput::stop`] or [`AudioOutput::close`]
/// are not reported on the `ended` channel; only natural completion is.
pub trait AudioOutput: Send {
    /// Acquire the output device. Naturally finished sources are reported on `ended`.
    ///
    /// # Errors
    ///
    /// Returns an error when no output device can be opened.
    fn open(&mut self, ended: mpsc::UnboundedSender<SourceId>) -> Result<(), DeviceError>;

    fn current_time(&self) -> f64;

    /// Play `samples` (mono, at `sample_rate`) starting at clock time `start_at`.
    fn schedule(&mut self, samples: Vec<f32>, sample_rate: u32, start_at: f64) -> SourceId;

    fn stop(&mut self, id: SourceId);

    /// Stop everything and release the device. Safe to call repeatedly.
    fn close(&mut self);

    fn is_closed(&self) -> bool;
}
