use chrono::{DateTime, Utc};
use sgp4::{Constants, Elements};

use crate::predict::error::PredictError;
use crate::predict::geo::ecef_to_geodetic;
use crate::predict::observer::Observer;

/// One propagated instant reduced to what the pipeline needs: the look angle
/// for visibility scanning and the geodetic sub-satellite point.
#[derive(Debug, Clone, Copy)]
pub struct GeoSample {
    pub elevation_deg: f64,
    pub subpoint_lat_deg: f64,
    pub subpoint_lon_deg: f64,
    /// Height above the reference ellipsoid; negative while re-entering.
    pub altitude_km: f64,
}

pub fn propagate_geo(
    observer: &Observer,
    elements: &Elements,
    constants: &Constants,
    timestamp: DateTime<Utc>,
) -> Result<GeoSample, PredictError> {
    let minutes = elements
        .datetime_to_minutes_since_epoch(&timestamp.naive_utc())
        .map_err(|e| PredictError::Propagation(e.to_string()))?;

    let prediction = constants
        .propagate(minutes)
        .map_err(|e| PredictError::Propagation(e.to_string()))?;

    let sidereal =
        sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&timestamp.naive_utc()));
    let sat_ecef = teme_to_ecef_position(prediction.position, sidereal);

    let (subpoint_lat_deg, subpoint_lon_deg, altitude_km) = ecef_to_geodetic(sat_ecef);

    let sta_ecef = observer.position_ecef_km();
    let dr = [
        sat_ecef[0] - sta_ecef[0],
        sat_ecef[1] - sta_ecef[1],
        sat_ecef[2] - sta_ecef[2],
    ];
    let range_km = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();

    let (_, _, up) = ecef_to_enu(dr, observer.lat_rad(), observer.lon_rad());
    let elevation_deg = if range_km > 0.0 {
        (up / range_km).asin().to_degrees()
    } else {
        0.0
    };

    Ok(GeoSample {
        elevation_deg,
        subpoint_lat_deg,
        subpoint_lon_deg,
        altitude_km,
    })
}

pub fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

pub fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::test_support::{iss_elements, iss_epoch};

    #[test]
    fn propagates_to_a_plausible_leo_subpoint() {
        let (elements, constants) = iss_elements();
        let observer = Observer {
            latitude_deg: 29.76303,
            longitude_deg: -95.362061,
            altitude_m: 0.0,
        };

        let sample = propagate_geo(&observer, &elements, &constants, iss_epoch()).unwrap();
        assert!(
            sample.altitude_km > 250.0 && sample.altitude_km < 500.0,
            "ISS altitude out of range: {}",
            sample.altitude_km
        );
        assert!(sample.subpoint_lat_deg.abs() <= 52.0, "beyond inclination band");
        assert!(sample.subpoint_lon_deg >= -180.0 && sample.subpoint_lon_deg <= 180.0);
        assert!(sample.elevation_deg >= -90.0 && sample.elevation_deg <= 90.0);
    }

    #[test]
    fn teme_rotation_preserves_radius() {
        let pos = [6524.834, 1327.0, -1001.5];
        let rotated = teme_to_ecef_position(pos, 1.234);
        let r = |v: [f64; 3]| (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
        assert!((r(pos) - r(rotated)).abs() < 1e-9);
    }
}
