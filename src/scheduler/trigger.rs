use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::alert::Alert;
use crate::predict::PassEvent;

/// How long after culmination an object stays suppressed (and alertable).
pub const GRACE_MINUTES: i64 = 30;

/// Matches wall-clock time against the precomputed event list and guarantees
/// one alert per object per pass: an object id with a live entry in the
/// triggered map must not fire again until the entry expires.
///
/// The original condition carried an extra one-minute pre-window bound; it
/// never allowed early firing, only guarded tick granularity. The effective
/// rule implemented here: fire at the first tick where `now >= event_time`
/// (and the grace window has not elapsed), then suppress until expiry.
pub struct TriggerEngine {
    triggered: HashMap<String, DateTime<Utc>>,
}

impl TriggerEngine {
    pub fn new() -> Self {
        Self {
            triggered: HashMap::new(),
        }
    }

    /// One scheduler tick. Expired suppressions are swept before new triggers
    /// are evaluated, so an object whose grace window just elapsed can
    /// immediately re-arm on a freshly computed event under the same id.
    pub fn tick(&mut self, now: DateTime<Utc>, events: &[PassEvent]) -> Vec<Alert> {
        self.triggered.retain(|_, expiry| now <= *expiry);

        let mut alerts = Vec::new();
        for event in events {
            let expiry = event.culmination_time + Duration::minutes(GRACE_MINUTES);
            if now >= event.culmination_time
                && now <= expiry
                && !self.triggered.contains_key(&event.object_id)
            {
                self.triggered.insert(event.object_id.clone(), expiry);
                alerts.push(Alert::from_event(event));
            }
        }
        alerts
    }

    #[cfg(test)]
    pub fn live_suppressions(&self) -> usize {
        self.triggered.len()
    }
}

impl Default for TriggerEngine {
    fn default() -> Self {
        Self::new()
    }
}
