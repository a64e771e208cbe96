use crate::catalog::RcsClass;

/// A named pitch from the equal-tempered scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pitch {
    pub note: &'static str,
    pub frequency_hz: f64,
}

/// Upper edges of the altitude bins, km. The last bin is open-ended.
const BIN_EDGES_KM: [f64; 7] = [400.0, 800.0, 1200.0, 1600.0, 2000.0, 10_000.0, 30_000.0];

/// One pitch per bin, rising with altitude.
const BIN_PITCHES: [Pitch; 8] = [
    Pitch { note: "G4", frequency_hz: 392.00 },
    Pitch { note: "A#5", frequency_hz: 932.33 },
    Pitch { note: "C6", frequency_hz: 1046.50 },
    Pitch { note: "D6", frequency_hz: 1174.66 },
    Pitch { note: "F6", frequency_hz: 1396.91 },
    Pitch { note: "G6", frequency_hz: 1567.98 },
    Pitch { note: "A#6", frequency_hz: 1864.66 },
    Pitch { note: "C7", frequency_hz: 2093.00 },
];

/// Classify an altitude into one of eight ordered pitch bins. Total: negative
/// altitudes land in the lowest bin, anything above the last edge clamps to
/// the highest. The bin index feeds the display side channel.
pub fn altitude_to_pitch_bin(altitude_km: f64) -> (Pitch, usize) {
    let bin = BIN_EDGES_KM
        .iter()
        .position(|edge| altitude_km < *edge)
        .unwrap_or(BIN_PITCHES.len() - 1);
    (BIN_PITCHES[bin], bin)
}

/// Map the RCS class to a synthesis duration (seconds) and exponential decay
/// rate. Larger objects ring longer and decay slower. Unclassified objects
/// sound like small ones; every null spelling already collapsed to `Unknown`
/// at the catalog boundary, so a single arm covers them all.
pub fn rcs_to_duration_bin(rcs: RcsClass) -> (f64, f64) {
    match rcs {
        RcsClass::Small | RcsClass::Unknown => (2.0, -2.0),
        RcsClass::Medium => (4.0, -1.0),
        RcsClass::Large => (8.0, -0.5),
    }
}
