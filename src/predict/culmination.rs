use chrono::{DateTime, Duration, Utc};
use sgp4::{Constants, Elements};

use crate::catalog::RcsClass;
use crate::predict::error::PredictError;
use crate::predict::geo::haversine_km;
use crate::predict::observer::Observer;
use crate::predict::propagation::propagate_geo;
use crate::predict::types::{PassEvent, RetainMode};

const COARSE_STEP_SECONDS: i64 = 60;
const FINE_STEP_SECONDS: i64 = 1;
const HORIZON_ELEVATION: f64 = 0.0;

/// Enumerate culminations for one object over `[start, start + horizon]` at a
/// 0° elevation mask, keeping those whose sub-satellite point lies within
/// `radius_km` of the observer.
#[allow(clippy::too_many_arguments)]
pub fn find_culminations(
    observer: &Observer,
    elements: &Elements,
    constants: &Constants,
    object_id: &str,
    object_name: &str,
    rcs: RcsClass,
    start: DateTime<Utc>,
    horizon: Duration,
    radius_km: f64,
    retain: RetainMode,
) -> Result<Vec<PassEvent>, PredictError> {
    let end = start + horizon;
    let coarse_step = Duration::seconds(COARSE_STEP_SECONDS);

    let mut events = Vec::new();
    let mut cursor = start;
    let mut in_pass = false;
    let mut max_el = f64::NEG_INFINITY;
    let mut max_el_time = cursor;

    while cursor <= end {
        let sample = propagate_geo(observer, elements, constants, cursor)?;
        let visible = sample.elevation_deg >= HORIZON_ELEVATION;

        if visible {
            if !in_pass || sample.elevation_deg > max_el {
                max_el = sample.elevation_deg;
                max_el_time = cursor;
            }
            in_pass = true;
        } else if in_pass {
            // Window closed; the coarse maximum brackets the culmination.
            if let Some(event) = culmination_event(
                observer,
                elements,
                constants,
                object_id,
                object_name,
                rcs,
                max_el_time,
                radius_km,
            )? {
                events.push(event);
                if retain == RetainMode::First {
                    return Ok(events);
                }
            }
            in_pass = false;
        }

        cursor += coarse_step;
    }

    // A pass still open at the horizon edge uses the best sample seen so far.
    if in_pass {
        if let Some(event) = culmination_event(
            observer,
            elements,
            constants,
            object_id,
            object_name,
            rcs,
            max_el_time,
            radius_km,
        )? {
            events.push(event);
        }
    }

    Ok(events)
}

/// Refine the culmination instant to one second inside the coarse bracket,
/// then apply the ground-distance cutoff.
#[allow(clippy::too_many_arguments)]
fn culmination_event(
    observer: &Observer,
    elements: &Elements,
    constants: &Constants,
    object_id: &str,
    object_name: &str,
    rcs: RcsClass,
    coarse_max: DateTime<Utc>,
    radius_km: f64,
) -> Result<Option<PassEvent>, PredictError> {
    let coarse_step = Duration::seconds(COARSE_STEP_SECONDS);
    let fine_step = Duration::seconds(FINE_STEP_SECONDS);

    let mut best_time = coarse_max;
    let mut best_el = f64::NEG_INFINITY;
    let mut cursor = coarse_max - coarse_step;
    let fine_end = coarse_max + coarse_step;

    while cursor <= fine_end {
        let sample = propagate_geo(observer, elements, constants, cursor)?;
        if sample.elevation_deg > best_el {
            best_el = sample.elevation_deg;
            best_time = cursor;
        }
        cursor += fine_step;
    }

    let at_peak = propagate_geo(observer, elements, constants, best_time)?;
    let distance_km = haversine_km(
        observer.latitude_deg,
        observer.longitude_deg,
        at_peak.subpoint_lat_deg,
        at_peak.subpoint_lon_deg,
    );

    if !distance_km.is_finite() || distance_km > radius_km {
        return Ok(None);
    }

    Ok(Some(PassEvent {
        object_id: object_id.to_string(),
        object_name: object_name.to_string(),
        rcs,
        culmination_time: best_time,
        altitude_km: at_peak.altitude_km,
        distance_km,
    }))
}
