use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use strum_macros::EnumString;

/// Catalog object type as reported by the catalog service. Values outside the
/// known set round-trip through `Other` instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
pub enum ObjectType {
    #[strum(serialize = "DEBRIS")]
    Debris,
    #[strum(serialize = "ROCKET BODY")]
    RocketBody,
    #[strum(serialize = "PAYLOAD")]
    Payload,
    #[strum(serialize = "UNKNOWN")]
    Unknown,
    #[strum(default)]
    Other(String),
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectType::Debris => f.write_str("DEBRIS"),
            ObjectType::RocketBody => f.write_str("ROCKET BODY"),
            ObjectType::Payload => f.write_str("PAYLOAD"),
            ObjectType::Unknown => f.write_str("UNKNOWN"),
            ObjectType::Other(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for ObjectType {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ObjectType {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        // EnumString with a default variant never fails
        Ok(ObjectType::from_str(&raw).unwrap_or(ObjectType::Other(raw)))
    }
}

/// Radar cross-section class. The service reports this inconsistently: JSON
/// null, a missing field, and the literal strings "null"/"None" all occur for
/// unclassified objects and collapse to a single `Unknown` here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RcsClass {
    Small,
    Medium,
    Large,
    #[default]
    Unknown,
}

impl RcsClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RcsClass::Small => "SMALL",
            RcsClass::Medium => "MEDIUM",
            RcsClass::Large => "LARGE",
            RcsClass::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for RcsClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RcsClass {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RcsClass {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        struct RcsVisitor;

        impl<'de> Visitor<'de> for RcsVisitor {
            type Value = RcsClass;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an RCS size string or null")
            }

            fn visit_str<E: de::Error>(self, raw: &str) -> Result<RcsClass, E> {
                Ok(match raw {
                    "SMALL" => RcsClass::Small,
                    "MEDIUM" => RcsClass::Medium,
                    "LARGE" => RcsClass::Large,
                    _ => RcsClass::Unknown,
                })
            }

            fn visit_unit<E: de::Error>(self) -> Result<RcsClass, E> {
                Ok(RcsClass::Unknown)
            }

            fn visit_none<E: de::Error>(self) -> Result<RcsClass, E> {
                Ok(RcsClass::Unknown)
            }

            fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<RcsClass, D2::Error> {
                d.deserialize_any(RcsVisitor)
            }
        }

        d.deserialize_any(RcsVisitor)
    }
}

/// A raw catalog record, immutable once fetched. Field names follow the
/// service's GP query response so the catalog cache stays wire-compatible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "OBJECT_ID", default)]
    pub object_id: Option<String>,
    #[serde(rename = "OBJECT_NAME", default)]
    pub object_name: Option<String>,
    #[serde(rename = "OBJECT_TYPE", default)]
    pub object_type: Option<ObjectType>,
    #[serde(rename = "TLE_LINE1", default)]
    pub tle_line1: Option<String>,
    #[serde(rename = "TLE_LINE2", default)]
    pub tle_line2: Option<String>,
    #[serde(rename = "DECAY_DATE", default)]
    pub decay_date: Option<String>,
    #[serde(
        rename = "INCLINATION",
        default,
        deserialize_with = "de_inclination"
    )]
    pub inclination: Option<f64>,
    #[serde(rename = "RCS_SIZE", default)]
    pub rcs: RcsClass,
}

impl CatalogEntry {
    pub fn id(&self) -> &str {
        self.object_id.as_deref().unwrap_or("Unknown ID")
    }

    /// The service writes the sentinel string "None" for objects that have
    /// not decayed; treat it the same as an absent field.
    pub fn has_decayed(&self) -> bool {
        matches!(self.decay_date.as_deref(), Some(date) if date != "None")
    }
}

/// The GP endpoint serializes numerics as JSON strings; accept both.
fn de_inclination<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    struct InclinationVisitor;

    impl<'de> Visitor<'de> for InclinationVisitor {
        type Value = Option<f64>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("inclination in degrees, as number or string")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v as f64))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v as f64))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.trim().parse().ok())
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<Self::Value, D2::Error> {
            d.deserialize_any(InclinationVisitor)
        }
    }

    d.deserialize_any(InclinationVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_a_gp_record() {
        let raw = r#"{
            "OBJECT_ID": "1993-036ABE",
            "OBJECT_NAME": "COSMOS 2251 DEB",
            "OBJECT_TYPE": "DEBRIS",
            "TLE_LINE1": "1 34427U 93036SX  ...",
            "TLE_LINE2": "2 34427  74.0355  ...",
            "DECAY_DATE": null,
            "INCLINATION": "74.0355",
            "RCS_SIZE": "SMALL"
        }"#;
        let entry: CatalogEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.object_type, Some(ObjectType::Debris));
        assert_eq!(entry.inclination, Some(74.0355));
        assert_eq!(entry.rcs, RcsClass::Small);
        assert!(!entry.has_decayed());
    }

    #[test]
    fn decay_sentinel_and_null_are_not_decayed() {
        let none: CatalogEntry = serde_json::from_str(r#"{"DECAY_DATE": "None"}"#).unwrap();
        assert!(!none.has_decayed());

        let absent: CatalogEntry = serde_json::from_str("{}").unwrap();
        assert!(!absent.has_decayed());

        let decayed: CatalogEntry =
            serde_json::from_str(r#"{"DECAY_DATE": "2021-04-06"}"#).unwrap();
        assert!(decayed.has_decayed());
    }

    #[test]
    fn rcs_null_spellings_collapse_to_unknown() {
        for raw in [
            r#"{"RCS_SIZE": null}"#,
            r#"{"RCS_SIZE": "null"}"#,
            r#"{"RCS_SIZE": "None"}"#,
            r#"{"RCS_SIZE": "UNKNOWN"}"#,
            "{}",
        ] {
            let entry: CatalogEntry = serde_json::from_str(raw).unwrap();
            assert_eq!(entry.rcs, RcsClass::Unknown, "input: {}", raw);
        }
    }

    #[test]
    fn unknown_object_types_round_trip() {
        let entry: CatalogEntry =
            serde_json::from_str(r#"{"OBJECT_TYPE": "TBA"}"#).unwrap();
        assert_eq!(
            entry.object_type,
            Some(ObjectType::Other("TBA".to_string()))
        );
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"TBA\""));
    }

    #[test]
    fn inclination_accepts_numbers_and_strings() {
        let as_num: CatalogEntry = serde_json::from_str(r#"{"INCLINATION": 51.6}"#).unwrap();
        assert_eq!(as_num.inclination, Some(51.6));

        let as_str: CatalogEntry = serde_json::from_str(r#"{"INCLINATION": "51.6"}"#).unwrap();
        assert_eq!(as_str.inclination, Some(51.6));
    }
}
