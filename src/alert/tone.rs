use std::f64::consts::TAU;

const REVERB_DELAY_S: f64 = 0.05;
const REVERB_DECAY: f64 = 0.3;
const REVERB_ECHOES: usize = 4;

/// A sine at `frequency_hz` under an exponential envelope. `decay_rate` is
/// negative for a dying tone.
pub fn synthesize(
    frequency_hz: f64,
    duration_s: f64,
    decay_rate: f64,
    volume: f64,
    sample_rate: u32,
) -> Vec<f32> {
    let length = (duration_s * sample_rate as f64) as usize;
    (0..length)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            (volume * (TAU * frequency_hz * t).sin() * (decay_rate * t).exp()) as f32
        })
        .collect()
}

/// The plain tone plus a few delayed, attenuated echoes, clipped back into
/// the volume envelope.
pub fn synthesize_with_reverb(
    frequency_hz: f64,
    duration_s: f64,
    decay_rate: f64,
    volume: f64,
    sample_rate: u32,
) -> Vec<f32> {
    let base = synthesize(frequency_hz, duration_s, decay_rate, volume, sample_rate);
    let delay_samples = (REVERB_DELAY_S * sample_rate as f64) as usize;

    let mut mixed = base.clone();
    for echo in 1..=REVERB_ECHOES {
        let offset = echo * delay_samples;
        if offset >= base.len() {
            break;
        }
        let gain = (volume * REVERB_DECAY.powi(echo as i32)) as f32;
        for i in offset..base.len() {
            mixed[i - offset] += base[i] * gain;
        }
    }

    let clip = volume as f32;
    for sample in &mut mixed {
        *sample = sample.clamp(-clip, clip);
    }
    mixed
}

/// Mix a waveform into a shared output buffer at a time offset, growing the
/// buffer as needed and renormalizing so concurrent alerts never clip.
pub fn mix_into(buffer: &mut Vec<f32>, waveform: &[f32], offset_s: f64, sample_rate: u32) {
    let start = (offset_s * sample_rate as f64) as usize;
    let needed = start + waveform.len();
    if needed > buffer.len() {
        buffer.resize(needed, 0.0);
    }
    for (i, sample) in waveform.iter().enumerate() {
        buffer[start + i] += sample;
    }

    let peak = buffer.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    if peak > 1.0 {
        for sample in buffer.iter_mut() {
            *sample /= peak;
        }
    }
}
