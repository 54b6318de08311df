use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};
use thiserror::Error;

/// Measurement system passed through to the OneCall endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Units {
    Standard,
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Standard => "standard",
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Standard, Units::Metric, Units::Imperial]
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Units {
    type Error = OptionViolation;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "standard" => Ok(Units::Standard),
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            _ => Err(OptionViolation::Units),
        }
    }
}

/// Whether the stringifier layers its derived fields over the incoming
/// payload or replaces it entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Merge,
    Clean,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Merge => "merge",
            Mode::Clean => "clean",
        }
    }

    pub const fn all() -> &'static [Mode] {
        &[Mode::Merge, Mode::Clean]
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Mode {
    type Error = OptionViolation;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "merge" => Ok(Mode::Merge),
            "clean" => Ok(Mode::Clean),
            _ => Err(OptionViolation::Mode),
        }
    }
}

/// One rejected option. Validation collects every violation before failing,
/// so a misconfigured agent reports all of its problems at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OptionViolation {
    #[error("api_key must be a non-empty hexadecimal string")]
    ApiKey,
    #[error("latitude must be a number strictly between -90 and 90")]
    Latitude,
    #[error("longitude must be a number strictly between -180 and 180")]
    Longitude,
    #[error("units must be one of: standard, metric, imperial")]
    Units,
    #[error("expected_update_period_in_days must be a positive integer")]
    UpdatePeriod,
    #[error("mode must be one of: merge, clean")]
    Mode,
}

#[derive(Debug, Error)]
#[error("invalid options: {}", summarize(.violations))]
pub struct OptionsError {
    pub violations: Vec<OptionViolation>,
}

fn summarize(violations: &[OptionViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Raw fetcher options, as delivered by the host (all user-facing values are
/// strings until validation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherOptions {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub latitude: String,
    #[serde(default)]
    pub longitude: String,
    #[serde(default = "default_units")]
    pub units: String,
    #[serde(default = "default_language")]
    pub language: String,
    pub expected_update_period_in_days: Option<i64>,
}

fn default_units() -> String {
    Units::Metric.as_str().to_string()
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for FetcherOptions {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            latitude: String::new(),
            longitude: String::new(),
            units: default_units(),
            language: default_language(),
            expected_update_period_in_days: None,
        }
    }
}

/// Validated, ready-to-use fetcher settings.
#[derive(Debug, Clone)]
pub struct FetcherSettings {
    pub api_key: String,
    pub latitude: String,
    pub longitude: String,
    pub units: Units,
    pub language: String,
    pub expected_update_period_in_days: i64,
}

impl FetcherOptions {
    /// Substitute `{{ name }}` placeholders from the host-supplied variable
    /// map. Runs once per invocation, before validation; unknown placeholders
    /// are left as-is.
    pub fn resolve(&self, vars: &HashMap<String, String>) -> FetcherOptions {
        FetcherOptions {
            api_key: substitute(&self.api_key, vars),
            latitude: substitute(&self.latitude, vars),
            longitude: substitute(&self.longitude, vars),
            units: substitute(&self.units, vars),
            language: substitute(&self.language, vars),
            expected_update_period_in_days: self.expected_update_period_in_days,
        }
    }

    /// Check every option, collecting all violations rather than stopping at
    /// the first. A failed validation blocks activation of the agent.
    pub fn validate(&self) -> Result<FetcherSettings, OptionsError> {
        let mut violations = Vec::new();

        if !is_hex_key(&self.api_key) {
            violations.push(OptionViolation::ApiKey);
        }
        if !coordinate_in_range(&self.latitude, 90) {
            violations.push(OptionViolation::Latitude);
        }
        if !coordinate_in_range(&self.longitude, 180) {
            violations.push(OptionViolation::Longitude);
        }

        let units = match Units::try_from(self.units.as_str()) {
            Ok(units) => Some(units),
            Err(violation) => {
                violations.push(violation);
                None
            }
        };

        let days = match self.expected_update_period_in_days {
            None => crate::agent::DEFAULT_EXPECTED_UPDATE_PERIOD_DAYS,
            Some(days) if days > 0 => days,
            Some(_) => {
                violations.push(OptionViolation::UpdatePeriod);
                0
            }
        };

        match (units, violations.is_empty()) {
            (Some(units), true) => Ok(FetcherSettings {
                api_key: self.api_key.clone(),
                latitude: self.latitude.clone(),
                longitude: self.longitude.clone(),
                units,
                language: self.language.clone(),
                expected_update_period_in_days: days,
            }),
            _ => Err(OptionsError { violations }),
        }
    }
}

/// Raw stringifier options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StringifierOptions {
    #[serde(default = "default_mode")]
    pub mode: String,
}

fn default_mode() -> String {
    Mode::Merge.as_str().to_string()
}

impl Default for StringifierOptions {
    fn default() -> Self {
        Self { mode: default_mode() }
    }
}

impl StringifierOptions {
    pub fn validate(&self) -> Result<Mode, OptionsError> {
        Mode::try_from(self.mode.as_str()).map_err(|violation| OptionsError {
            violations: vec![violation],
        })
    }
}

fn is_hex_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_hexdigit())
}

/// Truncates before the range check, so fractional values just inside the
/// boundary ("89.9999") always pass while "90" and "90.5" are rejected.
/// Kept as observed legacy behavior rather than a proper float comparison.
fn coordinate_in_range(raw: &str, limit: i64) -> bool {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => {
            let truncated = value.trunc() as i64;
            truncated > -limit && truncated < limit
        }
        _ => false,
    }
}

fn substitute(raw: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let name = after[..end].trim();
                match vars.get(name) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Top-level configuration stored on disk, used by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Example TOML:
    /// [fetcher]
    /// api_key = "..."
    /// latitude = "51.5"
    /// longitude = "-0.12"
    pub fetcher: Option<FetcherOptions>,

    /// [stringifier]
    /// mode = "merge"
    pub stringifier: Option<StringifierOptions>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "onecall-agents", "onecall-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_options() -> FetcherOptions {
        FetcherOptions {
            api_key: "deadbeef0123".to_string(),
            latitude: "51.5074".to_string(),
            longitude: "-0.1278".to_string(),
            ..FetcherOptions::default()
        }
    }

    #[test]
    fn units_as_str_roundtrip() {
        for units in Units::all() {
            let parsed = Units::try_from(units.as_str()).expect("roundtrip should succeed");
            assert_eq!(*units, parsed);
        }
    }

    #[test]
    fn mode_as_str_roundtrip() {
        for mode in Mode::all() {
            let parsed = Mode::try_from(mode.as_str()).expect("roundtrip should succeed");
            assert_eq!(*mode, parsed);
        }
    }

    #[test]
    fn mode_parse_is_case_insensitive() {
        assert_eq!(Mode::try_from("Merge").unwrap(), Mode::Merge);
        assert_eq!(Mode::try_from("CLEAN").unwrap(), Mode::Clean);
    }

    #[test]
    fn invalid_mode_is_rejected_before_processing() {
        let options = StringifierOptions {
            mode: "Invalid".to_string(),
        };
        let err = options.validate().unwrap_err();
        assert_eq!(err.violations, vec![OptionViolation::Mode]);
    }

    #[test]
    fn missing_mode_defaults_to_merge() {
        let options: StringifierOptions = toml::from_str("").unwrap();
        assert_eq!(options.validate().unwrap(), Mode::Merge);
    }

    #[test]
    fn valid_options_produce_settings() {
        let settings = valid_options().validate().expect("options are valid");
        assert_eq!(settings.units, Units::Metric);
        assert_eq!(settings.language, "en");
        assert_eq!(settings.expected_update_period_in_days, 10);
    }

    #[test]
    fn all_violations_are_collected() {
        let options = FetcherOptions {
            api_key: String::new(),
            latitude: "not-a-number".to_string(),
            longitude: "200".to_string(),
            units: "kelvin".to_string(),
            language: "en".to_string(),
            expected_update_period_in_days: Some(0),
        };
        let err = options.validate().unwrap_err();
        assert_eq!(
            err.violations,
            vec![
                OptionViolation::ApiKey,
                OptionViolation::Latitude,
                OptionViolation::Longitude,
                OptionViolation::Units,
                OptionViolation::UpdatePeriod,
            ]
        );
        assert!(err.to_string().contains("api_key"));
        assert!(err.to_string().contains("units"));
    }

    #[test]
    fn coordinate_check_truncates_before_comparing() {
        // Fractional values just inside the boundary pass.
        assert!(coordinate_in_range("89.9999", 90));
        assert!(coordinate_in_range("-89.9999", 90));
        // Whole-number and past-boundary values are rejected.
        assert!(!coordinate_in_range("90", 90));
        assert!(!coordinate_in_range("90.5", 90));
        assert!(!coordinate_in_range("-90", 90));
        assert!(!coordinate_in_range("not-a-number", 90));
        assert!(coordinate_in_range("0", 90));
    }

    #[test]
    fn api_key_must_be_hex() {
        assert!(is_hex_key("DEADbeef0123"));
        assert!(!is_hex_key(""));
        assert!(!is_hex_key("not-hex"));
        assert!(!is_hex_key("abc 123"));
    }

    #[test]
    fn positive_update_period_is_kept() {
        let options = FetcherOptions {
            expected_update_period_in_days: Some(3),
            ..valid_options()
        };
        let settings = options.validate().unwrap();
        assert_eq!(settings.expected_update_period_in_days, 3);
    }

    #[test]
    fn placeholders_resolve_from_host_variables() {
        let vars = HashMap::from([
            ("secret".to_string(), "deadbeef".to_string()),
            ("lat".to_string(), "48.85".to_string()),
        ]);
        let options = FetcherOptions {
            api_key: "{{ secret }}".to_string(),
            latitude: "{{lat}}".to_string(),
            longitude: "2.35".to_string(),
            ..FetcherOptions::default()
        };
        let resolved = options.resolve(&vars);
        assert_eq!(resolved.api_key, "deadbeef");
        assert_eq!(resolved.latitude, "48.85");
        assert!(resolved.validate().is_ok());
    }

    #[test]
    fn unknown_placeholders_are_left_verbatim() {
        let options = FetcherOptions {
            api_key: "{{ missing }}".to_string(),
            ..FetcherOptions::default()
        };
        let resolved = options.resolve(&HashMap::new());
        assert_eq!(resolved.api_key, "{{ missing }}");
    }
}
