use crate::predict::observer::{WGS84_A_KM, WGS84_E2};

/// Mean Earth radius used for great-circle distances, km.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle surface distance between two (lat, lon) points, km.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// ECEF position (km) to geodetic latitude/longitude (degrees) and height
/// above the WGS-84 ellipsoid (km). Height may be negative for re-entering
/// objects; callers pass it through unclamped.
pub fn ecef_to_geodetic(pos: [f64; 3]) -> (f64, f64, f64) {
    let [x, y, z] = pos;
    let lon = y.atan2(x);
    let p = (x * x + y * y).sqrt();

    // Fixed-point iteration on the geodetic latitude; converges in a few
    // rounds for anything from the surface out to GEO.
    let mut lat = z.atan2(p * (1.0 - WGS84_E2));
    for _ in 0..5 {
        let sin_lat = lat.sin();
        let n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        lat = (z + WGS84_E2 * n * sin_lat).atan2(p);
    }

    let sin_lat = lat.sin();
    let n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    let height = if lat.cos().abs() > 1e-9 {
        p / lat.cos() - n
    } else {
        z.abs() - n * (1.0 - WGS84_E2)
    };

    (lat.to_degrees(), lon.to_degrees(), height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::Observer;

    #[test]
    fn haversine_matches_known_city_pair() {
        // Houston to New Orleans, roughly 510 km
        let d = haversine_km(29.7604, -95.3698, 29.9511, -90.0715);
        assert!((d - 510.0).abs() < 15.0, "got {}", d);
    }

    #[test]
    fn haversine_of_identical_points_is_zero() {
        assert_eq!(haversine_km(29.76, -95.36, 29.76, -95.36), 0.0);
    }

    #[test]
    fn geodetic_round_trips_through_ecef() {
        let obs = Observer {
            latitude_deg: 29.76303,
            longitude_deg: -95.362061,
            altitude_m: 0.0,
        };
        let (lat, lon, height) = ecef_to_geodetic(obs.position_ecef_km());
        assert!((lat - obs.latitude_deg).abs() < 1e-6);
        assert!((lon - obs.longitude_deg).abs() < 1e-6);
        assert!(height.abs() < 1e-3);
    }

    #[test]
    fn height_scales_with_radial_distance() {
        // A point 400 km above the equator
        let (lat, _, height) = ecef_to_geodetic([WGS84_A_KM + 400.0, 0.0, 0.0]);
        assert!(lat.abs() < 1e-9);
        assert!((height - 400.0).abs() < 1e-6);
    }
}
