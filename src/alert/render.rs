use log::info;

use crate::alert::Alert;

/// The output boundary. Implementations own the audio device or any display
/// side channel; the scheduler only hands over classified alerts.
pub trait AlertRenderer {
    fn render(&mut self, alert: &Alert);

    /// Alerts firing on the same tick are rendered together. Audio
    /// implementations mix them into one waveform instead of queuing.
    fn render_batch(&mut self, alerts: &[Alert]) {
        for alert in alerts {
            self.render(alert);
        }
    }
}

/// Always available: one log line per alert, the way the original console
/// output read.
pub struct LogRenderer;

impl AlertRenderer for LogRenderer {
    fn render(&mut self, alert: &Alert) {
        info!(
            "{} {} is overhead (RCS: {}, altitude: {:.0} km, distance: {:.0} km, pitch: {}, bin: {})",
            alert.object_id,
            alert.object_name,
            alert.rcs,
            alert.altitude_km,
            alert.distance_km,
            alert.pitch.note,
            alert.pitch_bin,
        );
    }
}

#[cfg(feature = "audio")]
pub use audio::AudioRenderer;

#[cfg(feature = "audio")]
mod audio {
    use log::{info, warn};
    use rodio::buffer::SamplesBuffer;
    use rodio::{OutputStream, OutputStreamHandle};

    use super::{AlertRenderer, LogRenderer};
    use crate::alert::tone::{mix_into, synthesize_with_reverb};
    use crate::alert::Alert;

    /// Stagger between alerts rendered on the same tick, seconds.
    const BATCH_SPACING_S: f64 = 1.0;

    /// Synthesizes each alert and plays it through the default output device.
    /// A batch of simultaneous alerts becomes a single mixed waveform with
    /// each tone offset by a fixed stagger.
    pub struct AudioRenderer {
        // The stream must stay alive for the handle to keep playing.
        _stream: OutputStream,
        handle: OutputStreamHandle,
        log: LogRenderer,
        volume: f64,
        sample_rate: u32,
    }

    impl AudioRenderer {
        /// `None` when no output device is available; callers fall back to
        /// the log renderer.
        pub fn open(volume: f64, sample_rate: u32) -> Option<Self> {
            match OutputStream::try_default() {
                Ok((stream, handle)) => {
                    info!("audio output opened");
                    Some(Self {
                        _stream: stream,
                        handle,
                        log: LogRenderer,
                        volume,
                        sample_rate,
                    })
                }
                Err(e) => {
                    warn!("no audio output device ({}), alerts will only be logged", e);
                    None
                }
            }
        }
    }

    impl AlertRenderer for AudioRenderer {
        fn render(&mut self, alert: &Alert) {
            self.render_batch(std::slice::from_ref(alert));
        }

        fn render_batch(&mut self, alerts: &[Alert]) {
            let mut buffer = Vec::new();
            for (i, alert) in alerts.iter().enumerate() {
                self.log.render(alert);
                let waveform = synthesize_with_reverb(
                    alert.pitch.frequency_hz,
                    alert.duration_s,
                    alert.decay_rate,
                    self.volume,
                    self.sample_rate,
                );
                mix_into(&mut buffer, &waveform, i as f64 * BATCH_SPACING_S, self.sample_rate);
            }
            if buffer.is_empty() {
                return;
            }
            let source = SamplesBuffer::new(1, self.sample_rate, buffer);
            if let Err(e) = self.handle.play_raw(source) {
                warn!("failed to play alert tone: {}", e);
            }
        }
    }
}
