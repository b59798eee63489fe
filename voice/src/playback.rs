//! Gapless playback of model audio chunks.
//!
//! DESIGN
//! ======
//! Chunks arrive at irregular network intervals. Each one is scheduled at a
//! monotonic cursor (`next_start_time`) on the output clock and the cursor is
//! advanced by the chunk's duration, so back-to-back chunks neither gap nor
//! overlap. When the cursor has fallen behind the clock (an underrun), it is
//! pulled forward to "now" instead of scheduling in the past.
//!
//! Order is arrival order; transport reordering is not corrected.

use std::collections::HashSet;

use crate::device::{AudioOutput, SourceId};
use crate::pcm::OUTPUT_SAMPLE_RATE;

/// Where a chunk landed on the output clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledChunk {
    pub id: SourceId,
    pub start: f64,
    pub duration: f64,
}

#[derive(Debug, Default)]
pub struct PlaybackScheduler {
    next_start_time: f64,
    active: HashSet<SourceId>,
}

impl PlaybackScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn next_start_time(&self) -> f64 {
        self.next_start_time
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }

    /// Schedule one decoded 24 kHz chunk right after the previous one.
    pub fn enqueue(&mut self, output: &mut dyn AudioOutput, samples: Vec<f32>) -> ScheduledChunk {
        let now = output.current_time();
        if self.next_start_time < now {
            self.next_start_time = now;
        }
        let start = self.next_start_time;
        let duration = samples.len() as f64 / f64::from(OUTPUT_SAMPLE_RATE);
        let id = output.schedule(samples, OUTPUT_SAMPLE_RATE, start);
        self.next_start_time += duration;
        self.active.insert(id);
        ScheduledChunk { id, start, duration }
    }

    /// Forget a naturally finished source. Returns `true` when this emptied the active set.
    pub fn source_ended(&mut self, id: SourceId) -> bool {
        self.active.remove(&id) && self.active.is_empty()
    }

    /// Barge-in: silence everything now and rewind the cursor to zero. The
    /// next chunk then starts at the current clock time.
    pub fn interrupt(&mut self, output: &mut dyn AudioOutput) {
        self.reset(output);
    }

    /// Teardown: stop every active source, forget it, and zero the cursor.
    /// Safe to call with nothing playing.
    pub fn reset(&mut self, output: &mut dyn AudioOutput) {
        for id in self.active.drain() {
            output.stop(id);
        }
        self.next_start_time = 0.0;
    }
}

#[cfg(test)]
#[path = "playback_test.rs"]
mod tests;
