mod classify;
mod render;
#[cfg_attr(not(feature = "audio"), allow(dead_code))]
mod tone;

pub use classify::{altitude_to_pitch_bin, rcs_to_duration_bin, Pitch};
pub use render::{AlertRenderer, LogRenderer};
pub use tone::{mix_into, synthesize, synthesize_with_reverb};

#[cfg(feature = "audio")]
pub use render::AudioRenderer;

use crate::catalog::RcsClass;
use crate::predict::PassEvent;

/// A classified, ready-to-render alert: the event's observables plus the
/// synthesis parameters derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub object_id: String,
    pub object_name: String,
    pub rcs: RcsClass,
    pub altitude_km: f64,
    pub distance_km: f64,
    pub pitch: Pitch,
    pub duration_s: f64,
    pub decay_rate: f64,
    /// Altitude bin index for an external display/LED consumer.
    pub pitch_bin: usize,
}

impl Alert {
    pub fn from_event(event: &PassEvent) -> Self {
        let (pitch, pitch_bin) = altitude_to_pitch_bin(event.altitude_km);
        let (duration_s, decay_rate) = rcs_to_duration_bin(event.rcs);
        Self {
            object_id: event.object_id.clone(),
            object_name: event.object_name.clone(),
            rcs: event.rcs,
            altitude_km: event.altitude_km,
            distance_km: event.distance_km,
            pitch,
            duration_s,
            decay_rate,
            pitch_bin,
        }
    }
}
