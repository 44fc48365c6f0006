use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Conversion factor from metres per second to kilometres per hour.
const MPS_TO_KMH: f64 = 3.6;

/// Fixed coordinates the collector samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Normalized weather record published once per cycle.
///
/// Every upstream-sourced field is optional and serializes as `null` when the
/// upstream payload did not carry it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Observation time reported upstream, epoch seconds.
    #[serde(rename = "timestamp")]
    pub observed_at: Option<i64>,
    pub location_lat: f64,
    pub location_lon: f64,
    pub temperature_c: Option<f64>,
    pub humidity_percent: Option<i64>,
    pub wind_speed_kmh: Option<f64>,
    pub weather_code: Option<i64>,
    /// Local wall-clock time of normalization, epoch seconds with sub-second precision.
    pub collected_at: f64,
}

impl Reading {
    /// Normalize an OpenWeather "current weather" payload.
    ///
    /// Each field is looked up on its own; a missing or mistyped value only
    /// blanks that field.
    pub fn from_payload(payload: &Value, location: Location, collected_at: f64) -> Self {
        let wind_speed_mps = decimal_at(payload, "/wind/speed");

        Self {
            observed_at: integer_at(payload, "/dt"),
            location_lat: location.latitude,
            location_lon: location.longitude,
            temperature_c: decimal_at(payload, "/main/temp"),
            humidity_percent: integer_at(payload, "/main/humidity"),
            wind_speed_kmh: wind_speed_mps.map(|v| v * MPS_TO_KMH),
            weather_code: integer_at(payload, "/weather/0/id"),
            collected_at,
        }
    }

    pub fn observed_time(&self) -> Option<DateTime<Utc>> {
        self.observed_at.and_then(unix_to_utc)
    }
}

/// Resolve a JSON pointer, yielding `None` at the first missing link.
pub fn field<'a>(payload: &'a Value, pointer: &str) -> Option<&'a Value> {
    payload.pointer(pointer).filter(|v| !v.is_null())
}

fn decimal_at(payload: &Value, pointer: &str) -> Option<f64> {
    field(payload, pointer).and_then(Value::as_f64)
}

fn integer_at(payload: &Value, pointer: &str) -> Option<i64> {
    let value = field(payload, pointer)?;
    value.as_i64().or_else(|| {
        // Some stations report integral values as floats, e.g. `60.0`.
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.is_finite())
            .map(|f| f as i64)
    })
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}
