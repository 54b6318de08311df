use anyhow::Result;
use serde_json::{Map, Value};

use crate::{
    agent::Agent,
    config::Mode,
    event::{Event, EventSink},
    stringify,
};

/// The six derived fields, in emission order.
pub const OUTPUT_KEYS: &[&str] = &[
    "str_meta",
    "str_current",
    "str_minutely",
    "str_hourly",
    "str_daily",
    "str_alerts",
];

/// Reformats OneCall payloads into flattened, human-scannable string groups.
/// Stateless; one incoming event yields exactly one outgoing event.
#[derive(Debug, Clone)]
pub struct WeatherStringifier {
    mode: Mode,
}

impl WeatherStringifier {
    pub fn new(mode: Mode) -> Self {
        Self { mode }
    }

    pub async fn receive(&self, event: &Event, sink: &mut dyn EventSink) -> Result<()> {
        sink.emit(self.transform(&event.payload)).await
    }

    pub fn transform(&self, payload: &Value) -> Value {
        transform(payload, self.mode)
    }
}

impl Agent for WeatherStringifier {}

/// Derive the six `str_*` fields from a OneCall payload. `Merge` overlays
/// them on a copy of the payload; `Clean` emits only them.
pub fn transform(payload: &Value, mode: Mode) -> Value {
    let mut out = match mode {
        Mode::Merge => payload.as_object().cloned().unwrap_or_default(),
        Mode::Clean => Map::new(),
    };

    out.insert(
        "str_meta".to_string(),
        Value::String(stringify::meta(payload)),
    );
    out.insert(
        "str_current".to_string(),
        Value::Object(stringify::point(section(payload, "current"))),
    );
    out.insert(
        "str_minutely".to_string(),
        Value::Array(
            section_array(payload, "minutely")
                .iter()
                .map(|entry| Value::Object(stringify::minutely_point(entry)))
                .collect(),
        ),
    );
    out.insert(
        "str_hourly".to_string(),
        Value::Array(
            section_array(payload, "hourly")
                .iter()
                .map(|entry| Value::Object(stringify::point(entry)))
                .collect(),
        ),
    );
    out.insert(
        "str_daily".to_string(),
        Value::Array(
            section_array(payload, "daily")
                .iter()
                .map(|entry| Value::Object(stringify::point(entry)))
                .collect(),
        ),
    );
    out.insert(
        "str_alerts".to_string(),
        Value::Array(
            section_array(payload, "alerts")
                .iter()
                .map(|entry| Value::String(stringify::alert(entry)))
                .collect(),
        ),
    );

    Value::Object(out)
}

/// An absent section stringifies like an empty record.
fn section<'a>(payload: &'a Value, key: &str) -> &'a Value {
    payload.get(key).unwrap_or(&Value::Null)
}

fn section_array<'a>(payload: &'a Value, key: &str) -> &'a [Value] {
    payload
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
