//! Software mixer behind the speaker.
//!
//! DESIGN
//! ======
//! Sources are placed on a frame clock at the device rate. The clock only
//! advances as the device pulls frames, so `now()` is exactly what has been
//! played. Overlapping sources sum; a source is reported on `ended` once the
//! clock passes its last frame. Stopped sources are dropped silently.

use tokio::sync::mpsc;
use tracing::warn;
use voice::SourceId;
use voice::pcm;

struct Source {
    id: SourceId,
    start: u64,
    samples: Vec<f32>,
}

impl Source {
    fn end(&self) -> u64 {
        self.start + self.samples.len() as u64
    }
}

pub struct Mixer {
    rate: u32,
    frames_played: u64,
    next_id: SourceId,
    sources: Vec<Source>,
    ended: Option<mpsc::UnboundedSender<SourceId>>,
}

impl Mixer {
    #[must_use]
    pub fn new(rate: u32) -> Self {
        Self { rate: rate.max(1), frames_played: 0, next_id: 0, sources: Vec::new(), ended: None }
    }

    /// Restart the clock at zero and report completions to `ended`.
    pub fn reset(&mut self, rate: u32, ended: mpsc::UnboundedSender<SourceId>) {
        *self = Self::new(rate);
        self.ended = Some(ended);
    }

    /// Seconds of audio played so far.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.frames_played as f64 / f64::from(self.rate)
    }

    #[must_use]
    pub fn active(&self) -> usize {
        self.sources.len()
    }

    pub fn schedule(&mut self, samples: Vec<f32>, sample_rate: u32, start_at: f64) -> SourceId {
        let samples = if sample_rate == self.rate {
            samples
        } else {
            pcm::resample(&samples, sample_rate, self.rate).unwrap_or_else(|e| {
                warn!(error = %e, from = sample_rate, to = self.rate, "speaker: resample failed, playing silence");
                vec![0.0; (samples.len() as u64 * u64::from(self.rate) / u64::from(sample_rate.max(1))) as usize]
            })
        };
        let start = (start_at.max(0.0) * f64::from(self.rate)).round() as u64;
        self.next_id += 1;
        let id = self.next_id;
        self.sources.push(Source { id, start, samples });
        id
    }

    pub fn stop(&mut self, id: SourceId) {
        self.sources.retain(|s| s.id != id);
    }

    /// Drop every source and stop reporting.
    pub fn clear(&mut self) {
        self.sources.clear();
        self.ended = None;
    }

    /// Fill interleaved `out` with the mono mix on every channel and advance the clock.
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let mut frames = 0u64;
        for frame in out.chunks_mut(channels) {
            let t = self.frames_played + frames;
            let mixed: f32 = self
                .sources
                .iter()
                .filter(|s| t >= s.start)
                .filter_map(|s| s.samples.get((t - s.start) as usize))
                .sum();
            frame.fill(mixed.clamp(-1.0, 1.0));
            frames += 1;
        }
        self.frames_played += frames;

        let now = self.frames_played;
        let ended = self.ended.as_ref();
        self.sources.retain(|s| {
            let done = s.end() <= now;
            if done {
                if let Some(tx) = ended {
                    let _ = tx.send(s.id);
                }
            }
            !done
        });
    }
}

#[cfg(test)]
#[path = "mixer_test.rs"]
mod tests;
