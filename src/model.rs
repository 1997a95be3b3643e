//! Stops and coordinates as they arrive from the request decoder.

use serde::{Deserialize, Deserializer, Serialize};

/// A WGS84 point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// A single address an agent has to visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default, deserialize_with = "string_or_number")]
    pub house_number: String,
    #[serde(default)]
    pub street_name: String,
}

impl Stop {
    pub fn new(
        id: impl Into<String>,
        lat: f64,
        lon: f64,
        house_number: impl Into<String>,
        street_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            lat,
            lon,
            house_number: house_number.into(),
            street_name: street_name.into(),
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }
}

/// Address exports are inconsistent about quoting ids and house numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Integer(i64),
        Float(f64),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Integer(value) => value.to_string(),
        Raw::Float(value) => value.to_string(),
        Raw::Null(()) => String::new(),
    })
}
