//! Pure stringification of OneCall payloads into grouped `key=value` strings.
//!
//! Everything in this module is a deterministic function of its input; absent
//! fields are legitimate data, never errors.

use serde_json::{Map, Value};

/// The fixed set of output groups, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Dt,
    SunMoon,
    Temperature,
    Precipitation,
    Wind,
    Weather,
    Other,
}

impl Group {
    pub const fn key(self) -> &'static str {
        match self {
            Group::Dt => "dt",
            Group::SunMoon => "sun_moon",
            Group::Temperature => "temperature",
            Group::Precipitation => "precipitation",
            Group::Wind => "wind",
            Group::Weather => "weather",
            Group::Other => "other",
        }
    }

    pub const fn all() -> &'static [Group] {
        &[
            Group::Dt,
            Group::SunMoon,
            Group::Temperature,
            Group::Precipitation,
            Group::Wind,
            Group::Weather,
            Group::Other,
        ]
    }
}

const META_FIELDS: &[&str] = &["lat", "lon", "timezone", "timezone_offset"];
const SUN_MOON_FIELDS: &[&str] = &["sunrise", "sunset", "moonrise", "moonset", "moon_phase"];
const TEMPERATURE_FIELDS: &[&str] = &["temp", "feels_like", "dew_point"];
const TEMPERATURE_SUBKEYS: &[&str] = &["morn", "day", "eve", "night", "min", "max"];
const PRECIPITATION_FIELDS: &[&str] = &["rain", "snow", "pop"];
const WIND_FIELDS: &[&str] = &["wind_speed", "wind_deg", "wind_gust"];
const OTHER_FIELDS: &[&str] = &["pressure", "humidity", "clouds", "visibility", "uvi"];

/// A value is present iff it exists, is not null, and is not an empty string.
/// Numeric zero counts as present.
fn present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Strings are embedded raw; every other value uses its JSON text.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn quoted(value: &Value) -> String {
    format!("\"{}\"", render(value))
}

fn field<'a>(source: &'a Value, key: &str) -> Option<&'a Value> {
    source.get(key).filter(|value| present(value))
}

/// `key=value` for each present field, in the order given.
fn join_fields(source: &Value, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .filter_map(|key| field(source, key).map(|value| format!("{key}={}", render(value))))
        .collect()
}

fn insert_group(out: &mut Map<String, Value>, group: Group, parts: Vec<String>) {
    if !parts.is_empty() {
        out.insert(group.key().to_string(), Value::String(parts.join(",")));
    }
}

/// Stringify one weather point (`current`, or one `hourly`/`daily` entry)
/// into its grouped string fields. Groups with no source data are omitted,
/// except `precipitation`, which always defaults its fields to 0.
pub fn point(source: &Value) -> Map<String, Value> {
    let mut out = Map::new();

    if let Some(dt) = field(source, "dt") {
        out.insert(Group::Dt.key().to_string(), dt.clone());
    }

    insert_group(&mut out, Group::SunMoon, join_fields(source, SUN_MOON_FIELDS));
    insert_group(&mut out, Group::Temperature, temperature_parts(source));

    let precipitation: Vec<String> = PRECIPITATION_FIELDS
        .iter()
        .map(|key| {
            let value = precipitation_value(source, key).unwrap_or_else(|| "0".to_string());
            format!("{key}={value}")
        })
        .collect();
    out.insert(
        Group::Precipitation.key().to_string(),
        Value::String(precipitation.join(",")),
    );

    insert_group(&mut out, Group::Wind, join_fields(source, WIND_FIELDS));
    insert_group(&mut out, Group::Weather, weather_parts(source));
    insert_group(&mut out, Group::Other, join_fields(source, OTHER_FIELDS));

    out
}

/// `temp`/`feels_like`/`dew_point` are scalars on current/hourly points and
/// `morn..max` records on daily points.
fn temperature_parts(source: &Value) -> Vec<String> {
    let mut parts = Vec::new();
    for key in TEMPERATURE_FIELDS {
        match source.get(*key) {
            Some(Value::Object(sub)) => {
                for sub_key in TEMPERATURE_SUBKEYS {
                    if let Some(value) = sub.get(*sub_key).filter(|value| present(value)) {
                        parts.push(format!("{key}_{sub_key}={}", render(value)));
                    }
                }
            }
            Some(value) if present(value) => parts.push(format!("{key}={}", render(value))),
            _ => {}
        }
    }
    parts
}

/// Hourly rain/snow arrive as `{"1h": mm}` records; daily ones as scalars.
fn precipitation_value(source: &Value, key: &str) -> Option<String> {
    match source.get(key) {
        Some(Value::Object(sub)) => sub.get("1h").filter(|value| present(value)).map(render),
        Some(value) if present(value) => Some(render(value)),
        _ => None,
    }
}

fn weather_parts(source: &Value) -> Vec<String> {
    let Some(first) = source
        .get("weather")
        .and_then(Value::as_array)
        .and_then(|conditions| conditions.first())
    else {
        return Vec::new();
    };

    let mut parts = join_fields(first, &["id", "main", "icon"]);
    if let Some(description) = field(first, "description") {
        parts.push(format!("description={}", quoted(description)));
    }
    parts
}

/// Top-level location metadata as one comma-joined string.
pub fn meta(payload: &Value) -> String {
    join_fields(payload, META_FIELDS).join(",")
}

/// One minutely precipitation point as a single-key record.
pub fn minutely_point(source: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    insert_group(
        &mut out,
        Group::Precipitation,
        join_fields(source, &["dt", "precipitation"]),
    );
    out
}

/// One alert as a single string: timestamps unquoted, free text quoted.
pub fn alert(source: &Value) -> String {
    let mut parts = join_fields(source, &["start", "end"]);
    for key in ["sender_name", "event", "description"] {
        if let Some(value) = field(source, key) {
            parts.push(format!("{key}={}", quoted(value)));
        }
    }
    parts.join(",")
}
