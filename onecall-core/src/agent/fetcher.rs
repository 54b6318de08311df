use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;

use crate::{agent::Agent, config::FetcherSettings, event::EventSink};

pub const ONECALL_URL: &str = "https://api.openweathermap.org/data/2.5/onecall";

/// Polls the OneCall endpoint and emits the raw response body as an event.
/// One GET per `check` call; scheduling belongs to the host.
#[derive(Debug, Clone)]
pub struct WeatherFetcher {
    settings: FetcherSettings,
    http: Client,
}

impl WeatherFetcher {
    pub fn new(settings: FetcherSettings) -> Self {
        Self {
            settings,
            http: Client::new(),
        }
    }

    fn query(&self) -> [(&'static str, &str); 5] {
        [
            ("lat", self.settings.latitude.as_str()),
            ("lon", self.settings.longitude.as_str()),
            ("units", self.settings.units.as_str()),
            ("lang", self.settings.language.as_str()),
            ("APPID", self.settings.api_key.as_str()),
        ]
    }

    /// Run one poll cycle. A non-2xx response is not an error: it only
    /// suppresses this cycle's event. Transport and JSON-parse failures
    /// propagate for the host to log.
    pub async fn check(&self, sink: &mut dyn EventSink) -> Result<()> {
        log::debug!(
            "Polling OneCall for lat={}, lon={}",
            self.settings.latitude,
            self.settings.longitude,
        );

        let res = self
            .http
            .get(ONECALL_URL)
            .query(&self.query())
            .send()
            .await
            .context("Failed to send request to the OneCall endpoint")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read OneCall response body")?;

        if !status.is_success() {
            log::warn!(
                "OneCall request failed with status {}: {}",
                status,
                truncate_body(&body),
            );
            return Ok(());
        }

        let payload: Value =
            serde_json::from_str(&body).context("Failed to parse OneCall response JSON")?;

        sink.emit(payload).await?;
        Ok(())
    }
}

impl Agent for WeatherFetcher {
    fn expected_update_period_days(&self) -> i64 {
        self.settings.expected_update_period_in_days
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }
    // Cut on a char boundary; a fixed byte offset would panic mid-character.
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
