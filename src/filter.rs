use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use sgp4::{Constants, Elements};

use crate::catalog::{CatalogEntry, ObjectType, RcsClass};
use crate::predict::{haversine_km, propagate_geo, Observer};

/// Orbits inclined less than the observer's latitude minus this margin can
/// never carry their ground track over the observer.
pub const INCLINATION_MARGIN_DEG: f64 = 4.0;

/// Why an entry was dropped. Returned, not thrown; the exclusion log is a
/// diagnostic side channel and plays no role in correctness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    Decayed,
    InclinationTooLow,
    MissingTle,
    Unpropagatable,
    TypeNotWhitelisted,
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Exclusion::Decayed => "already decayed",
            Exclusion::InclinationTooLow => "inclination below threshold",
            Exclusion::MissingTle => "missing TLE data",
            Exclusion::Unpropagatable => "invalid subpoint calculation",
            Exclusion::TypeNotWhitelisted => "object type not whitelisted",
        };
        f.write_str(reason)
    }
}

/// An entry that survived every relevance check, with its orbital elements
/// already parsed for the predictor.
pub struct FilteredEntry {
    pub object_id: String,
    pub object_name: String,
    pub rcs: RcsClass,
    pub elements: Elements,
    pub constants: Constants,
}

/// Append-only, line-oriented, best-effort. Never read back.
pub struct ExclusionLog {
    file: Option<File>,
}

impl ExclusionLog {
    pub fn open(path: &Path) -> Self {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| warn!("cannot open exclusion log {}: {}", path.display(), e))
            .ok();
        Self { file }
    }

    #[cfg(test)]
    pub fn disabled() -> Self {
        Self { file: None }
    }

    fn record(&mut self, object_id: &str, reason: &Exclusion) {
        if let Some(file) = &mut self.file {
            let _ = writeln!(file, "Excluded {}: {}", object_id, reason);
        }
    }
}

/// Apply the relevance checks in order, short-circuiting on the first one that
/// fails. Propagation problems are rejections, never errors: a catalog entry
/// the library cannot handle is simply not relevant.
pub fn screen(
    entry: &CatalogEntry,
    observer: &Observer,
    whitelist: &[ObjectType],
    now: DateTime<Utc>,
) -> Result<FilteredEntry, Exclusion> {
    if entry.has_decayed() {
        return Err(Exclusion::Decayed);
    }

    let inclination = entry.inclination.unwrap_or(0.0);
    if inclination < observer.latitude_deg - INCLINATION_MARGIN_DEG {
        return Err(Exclusion::InclinationTooLow);
    }

    let (line1, line2) = match (&entry.tle_line1, &entry.tle_line2) {
        (Some(l1), Some(l2)) => (l1, l2),
        _ => return Err(Exclusion::MissingTle),
    };

    let elements = Elements::from_tle(
        entry.object_name.clone(),
        line1.as_bytes(),
        line2.as_bytes(),
    )
    .map_err(|_| Exclusion::Unpropagatable)?;
    let constants = Constants::from_elements(&elements).map_err(|_| Exclusion::Unpropagatable)?;

    // Current-instant sanity check: the object must propagate cleanly and its
    // subpoint distance must compute to a finite value.
    let sample =
        propagate_geo(observer, &elements, &constants, now).map_err(|_| Exclusion::Unpropagatable)?;
    let distance = haversine_km(
        observer.latitude_deg,
        observer.longitude_deg,
        sample.subpoint_lat_deg,
        sample.subpoint_lon_deg,
    );
    if !distance.is_finite() {
        return Err(Exclusion::Unpropagatable);
    }

    match &entry.object_type {
        Some(object_type) if whitelist.contains(object_type) => {}
        _ => return Err(Exclusion::TypeNotWhitelisted),
    }

    Ok(FilteredEntry {
        object_id: entry.id().to_string(),
        object_name: entry.object_name.clone().unwrap_or_default(),
        rcs: entry.rcs,
        elements,
        constants,
    })
}

/// Reduce the raw catalog to relevant entries, order preserved, one exclusion
/// log line per rejected entry.
pub fn filter_catalog(
    catalog: &[CatalogEntry],
    observer: &Observer,
    whitelist: &[ObjectType],
    now: DateTime<Utc>,
    log: &mut ExclusionLog,
) -> Vec<FilteredEntry> {
    let mut kept = Vec::new();
    for entry in catalog {
        match screen(entry, observer, whitelist, now) {
            Ok(filtered) => kept.push(filtered),
            Err(reason) => {
                debug!("excluded {}: {}", entry.id(), reason);
                log.record(entry.id(), &reason);
            }
        }
    }
    info!(
        "relevance filter kept {} of {} catalog entries",
        kept.len(),
        catalog.len()
    );
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::test_support::{iss_epoch, ISS_TLE1, ISS_TLE2};

    fn houston() -> Observer {
        Observer {
            latitude_deg: 29.76303,
            longitude_deg: -95.362061,
            altitude_m: 0.0,
        }
    }

    fn whitelist() -> Vec<ObjectType> {
        vec![
            ObjectType::Debris,
            ObjectType::RocketBody,
            ObjectType::Unknown,
        ]
    }

    fn entry(json: &str) -> CatalogEntry {
        serde_json::from_str(json).unwrap()
    }

    fn valid_entry() -> CatalogEntry {
        entry(&format!(
            r#"{{
                "OBJECT_ID": "1998-067A",
                "OBJECT_NAME": "ISS DEB",
                "OBJECT_TYPE": "DEBRIS",
                "TLE_LINE1": "{}",
                "TLE_LINE2": "{}",
                "DECAY_DATE": null,
                "INCLINATION": "51.6416",
                "RCS_SIZE": "LARGE"
            }}"#,
            ISS_TLE1, ISS_TLE2
        ))
    }

    #[test]
    fn decayed_entries_are_excluded() {
        let mut e = valid_entry();
        e.decay_date = Some("2021-04-06".to_string());
        assert_eq!(
            screen(&e, &houston(), &whitelist(), iss_epoch()).err(),
            Some(Exclusion::Decayed)
        );
    }

    #[test]
    fn decay_sentinel_none_is_not_decayed() {
        let mut e = valid_entry();
        e.decay_date = Some("None".to_string());
        assert!(screen(&e, &houston(), &whitelist(), iss_epoch()).is_ok());
    }

    #[test]
    fn inclination_below_latitude_band_is_excluded() {
        let mut e = valid_entry();
        e.inclination = Some(20.0);
        assert_eq!(
            screen(&e, &houston(), &whitelist(), iss_epoch()).err(),
            Some(Exclusion::InclinationTooLow)
        );

        // Missing inclination reads as zero, which also fails the band check
        e.inclination = None;
        assert_eq!(
            screen(&e, &houston(), &whitelist(), iss_epoch()).err(),
            Some(Exclusion::InclinationTooLow)
        );
    }

    #[test]
    fn missing_tle_is_excluded() {
        let mut e = valid_entry();
        e.tle_line1 = None;
        assert_eq!(
            screen(&e, &houston(), &whitelist(), iss_epoch()).err(),
            Some(Exclusion::MissingTle)
        );
    }

    #[test]
    fn unparseable_tle_is_a_rejection_not_an_error() {
        let mut e = valid_entry();
        e.tle_line1 = Some("1 garbage".to_string());
        assert_eq!(
            screen(&e, &houston(), &whitelist(), iss_epoch()).err(),
            Some(Exclusion::Unpropagatable)
        );
    }

    #[test]
    fn non_whitelisted_types_are_excluded() {
        let mut e = valid_entry();
        e.object_type = Some(ObjectType::Payload);
        assert_eq!(
            screen(&e, &houston(), &whitelist(), iss_epoch()).err(),
            Some(Exclusion::TypeNotWhitelisted)
        );

        e.object_type = None;
        assert_eq!(
            screen(&e, &houston(), &whitelist(), iss_epoch()).err(),
            Some(Exclusion::TypeNotWhitelisted)
        );
    }

    #[test]
    fn surviving_entries_keep_catalog_order() {
        let mut a = valid_entry();
        a.object_id = Some("A".to_string());
        let mut b = valid_entry();
        b.object_id = Some("B".to_string());
        let decayed = {
            let mut e = valid_entry();
            e.decay_date = Some("2020-01-01".to_string());
            e
        };

        let mut log = ExclusionLog::disabled();
        let kept = filter_catalog(
            &[a, decayed, b],
            &houston(),
            &whitelist(),
            iss_epoch(),
            &mut log,
        );
        let ids: Vec<_> = kept.iter().map(|f| f.object_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn exclusion_log_lines_use_the_original_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exclusion_log.txt");
        let mut log = ExclusionLog::open(&path);

        let mut e = valid_entry();
        e.decay_date = Some("2020-01-01".to_string());
        filter_catalog(&[e], &houston(), &whitelist(), iss_epoch(), &mut log);
        drop(log);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Excluded 1998-067A: already decayed\n");
    }
}
