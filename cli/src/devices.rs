//! cpal-backed microphone and speaker.
//!
//! DESIGN
//! ======
//! A cpal stream is not `Send` on every backend, so each stream is built,
//! played and dropped on its own thread. The thread reports the build result
//! on a ready channel and then parks on a stop channel; sending on (or
//! dropping) the stop sender tears the stream down.
//!
//! Capture downmixes to mono, resamples to the 16 kHz wire rate with one
//! streaming resampler per stream and regroups into fixed blocks. Playback
//! pulls from a shared [`Mixer`] whose clock is the number of frames the
//! device has consumed.

use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use tokio::sync::mpsc;
use tracing::{info, warn};
use voice::pcm::{INPUT_BLOCK_SIZE, INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE, Reblocker, StreamResampler};
use voice::{AudioOutput, DeviceError, Microphone, SourceId};

use crate::mixer::Mixer;

// =============================================================================
// STREAM THREAD
// =============================================================================

struct StreamThread {
    stop: std_mpsc::Sender<()>,
    handle: thread::JoinHandle<()>,
}

impl StreamThread {
    fn spawn<F>(name: &str, build: F) -> Result<Self, DeviceError>
    where
        F: FnOnce() -> Result<cpal::Stream, DeviceError> + Send + 'static,
    {
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<(), DeviceError>>();
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                let stream = match build().and_then(|stream| {
                    stream.play().map_err(|e| classify("stream", &e))?;
                    Ok(stream)
                }) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                let _ = stop_rx.recv();
                drop(stream);
            })
            .map_err(|e| DeviceError::Backend(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self { stop: stop_tx, handle }),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => Err(DeviceError::Backend(format!("{name} thread exited during setup"))),
        }
    }

    fn shutdown(self) {
        let _ = self.stop.send(());
        if self.handle.join().is_err() {
            warn!("audio: stream thread panicked");
        }
    }
}

/// Map a cpal error onto the device error the session understands.
fn classify(kind: &'static str, err: &impl std::fmt::Display) -> DeviceError {
    let message = err.to_string();
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("not authorized") {
        DeviceError::PermissionDenied
    } else if lower.contains("not available") || lower.contains("no longer available") {
        DeviceError::NoDevice(kind)
    } else {
        DeviceError::Backend(message)
    }
}

fn lock(mixer: &Mutex<Mixer>) -> MutexGuard<'_, Mixer> {
    mixer.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// MICROPHONE
// =============================================================================

/// Capture pipeline fed by every callback: downmix, resample, reblock.
///
/// The resampler lives as long as the stream, so partial chunks carry over
/// from one callback to the next.
struct Capture {
    channels: usize,
    resampler: StreamResampler,
    reblocker: Reblocker,
    blocks: mpsc::UnboundedSender<Vec<f32>>,
}

impl Capture {
    fn new(rate: u32, channels: u16, blocks: mpsc::UnboundedSender<Vec<f32>>) -> Result<Self, DeviceError> {
        let resampler = StreamResampler::new(rate, INPUT_SAMPLE_RATE).map_err(|e| DeviceError::Backend(e.to_string()))?;
        Ok(Self {
            channels: usize::from(channels.max(1)),
            resampler,
            reblocker: Reblocker::new(INPUT_BLOCK_SIZE),
            blocks,
        })
    }

    fn push<T>(&mut self, data: &[T])
    where
        T: Sample,
        f32: FromSample<T>,
    {
        let mono: Vec<f32> = data
            .chunks(self.channels)
            .map(|frame| frame.iter().map(|&s| s.to_sample::<f32>()).sum::<f32>() / frame.len() as f32)
            .collect();
        let resampled = match self.resampler.push(&mono) {
            Ok(samples) => samples,
            Err(e) => {
                warn!(error = %e, "mic: resample failed, dropping callback");
                return;
            }
        };
        for block in self.reblocker.push(&resampled) {
            let _ = self.blocks.send(block);
        }
    }
}

#[derive(Default)]
pub struct CpalMicrophone {
    stream: Option<StreamThread>,
}

impl CpalMicrophone {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Microphone for CpalMicrophone {
    fn start(&mut self, blocks: mpsc::UnboundedSender<Vec<f32>>) -> Result<(), DeviceError> {
        if self.stream.is_some() {
            return Ok(());
        }
        self.stream = Some(StreamThread::spawn("folio-mic", move || build_input(blocks))?);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.shutdown();
            info!("mic: stopped");
        }
    }

    fn is_active(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for CpalMicrophone {
    fn drop(&mut self) {
        self.stop();
    }
}

fn build_input(blocks: mpsc::UnboundedSender<Vec<f32>>) -> Result<cpal::Stream, DeviceError> {
    let host = cpal::default_host();
    let device = host.default_input_device().ok_or(DeviceError::NoDevice("input"))?;
    let supported = device.default_input_config().map_err(|e| classify("input", &e))?;
    let format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();
    info!(rate = config.sample_rate.0, channels = config.channels, ?format, "mic: opening");

    let capture = Capture::new(config.sample_rate.0, config.channels, blocks)?;
    match format {
        SampleFormat::F32 => input_stream::<f32>(&device, &config, capture),
        SampleFormat::I16 => input_stream::<i16>(&device, &config, capture),
        SampleFormat::U16 => input_stream::<u16>(&device, &config, capture),
        other => Err(DeviceError::Backend(format!("unsupported input sample format {other:?}"))),
    }
}

fn input_stream<T>(device: &cpal::Device, config: &cpal::StreamConfig, mut capture: Capture) -> Result<cpal::Stream, DeviceError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| capture.push(data),
            |e| warn!(error = %e, "mic: stream error"),
            None,
        )
        .map_err(|e| classify("input", &e))
}

// =============================================================================
// SPEAKER
// =============================================================================

pub struct CpalSpeaker {
    mixer: Arc<Mutex<Mixer>>,
    stream: Option<StreamThread>,
}

impl Default for CpalSpeaker {
    fn default() -> Self {
        Self::new()
    }
}

impl CpalSpeaker {
    pub fn new() -> Self {
        Self { mixer: Arc::new(Mutex::new(Mixer::new(OUTPUT_SAMPLE_RATE))), stream: None }
    }
}

impl AudioOutput for CpalSpeaker {
    fn open(&mut self, ended: mpsc::UnboundedSender<SourceId>) -> Result<(), DeviceError> {
        if self.stream.is_some() {
            return Ok(());
        }
        let mixer = Arc::clone(&self.mixer);
        self.stream = Some(StreamThread::spawn("folio-speaker", move || build_output(mixer, ended))?);
        Ok(())
    }

    fn current_time(&self) -> f64 {
        lock(&self.mixer).now()
    }

    fn schedule(&mut self, samples: Vec<f32>, sample_rate: u32, start_at: f64) -> SourceId {
        lock(&self.mixer).schedule(samples, sample_rate, start_at)
    }

    fn stop(&mut self, id: SourceId) {
        lock(&self.mixer).stop(id);
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.shutdown();
            info!("speaker: closed");
        }
        lock(&self.mixer).clear();
    }

    fn is_closed(&self) -> bool {
        self.stream.is_none()
    }
}

impl Drop for CpalSpeaker {
    fn drop(&mut self) {
        self.close();
    }
}

fn build_output(mixer: Arc<Mutex<Mixer>>, ended: mpsc::UnboundedSender<SourceId>) -> Result<cpal::Stream, DeviceError> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(DeviceError::NoDevice("output"))?;
    let supported = device.default_output_config().map_err(|e| classify("output", &e))?;
    let format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();
    info!(rate = config.sample_rate.0, channels = config.channels, ?format, "speaker: opening");

    lock(&mixer).reset(config.sample_rate.0, ended);
    match format {
        SampleFormat::F32 => output_stream::<f32>(&device, &config, mixer),
        SampleFormat::I16 => output_stream::<i16>(&device, &config, mixer),
        SampleFormat::U16 => output_stream::<u16>(&device, &config, mixer),
        other => Err(DeviceError::Backend(format!("unsupported output sample format {other:?}"))),
    }
}

fn output_stream<T>(device: &cpal::Device, config: &cpal::StreamConfig, mixer: Arc<Mutex<Mixer>>) -> Result<cpal::Stream, DeviceError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = usize::from(config.channels);
    let mut scratch: Vec<f32> = Vec::new();
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                scratch.resize(data.len(), 0.0);
                lock(&mixer).render(&mut scratch, channels);
                for (out, &sample) in data.iter_mut().zip(&scratch) {
                    *out = T::from_sample(sample);
                }
            },
            |e| warn!(error = %e, "speaker: stream error"),
            None,
        )
        .map_err(|e| classify("output", &e))
}

#[cfg(test)]
#[path = "devices_test.rs"]
mod tests;
