mod culmination;
mod error;
mod geo;
mod observer;
mod propagation;
mod types;

pub use culmination::find_culminations;
pub use error::PredictError;
pub use geo::{ecef_to_geodetic, haversine_km};
pub use observer::Observer;
pub use propagation::{propagate_geo, GeoSample};
pub use types::{PassEvent, RetainMode};
