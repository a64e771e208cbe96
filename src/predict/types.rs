use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::RcsClass;

/// A predicted culmination inside the configured radius. Persisted sorted
/// ascending by `culmination_time` and read-only until the next recompute
/// replaces the whole set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassEvent {
    pub object_id: String,
    pub object_name: String,
    #[serde(default)]
    pub rcs: RcsClass,
    #[serde(with = "crate::cache::stamp")]
    pub culmination_time: DateTime<Utc>,
    pub altitude_km: f64,
    pub distance_km: f64,
}

/// Whether prediction keeps the first qualifying culmination per object or
/// every one inside the horizon. An explicit configuration choice, not a
/// hidden default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetainMode {
    First,
    #[default]
    All,
}
