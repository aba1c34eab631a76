//! Threshold rules that turn a scored reading into alerts.

use std::collections::HashMap;

use tracing::warn;

use crate::db::models::{AlertSeverity, Measurement, NewAlert};

pub const CO2_WARNING_LIMIT: &str = "CO2_WARNING_LIMIT";
pub const CO2_CRITICAL_LIMIT: &str = "CO2_CRITICAL_LIMIT";

pub const DEFAULT_CO2_WARNING_LIMIT: f64 = 1000.0;
pub const DEFAULT_CO2_CRITICAL_LIMIT: f64 = 1500.0;

/// AQI above this value raises a "poor air quality" warning.
pub const POOR_AQI_THRESHOLD: f64 = 60.0;

/// Read-only view of the settings store.
pub trait SettingsLookup {
    fn get(&self, key: &str) -> Option<&str>;
}

impl SettingsLookup for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<&str> {
        HashMap::get(self, key).map(String::as_str)
    }
}

/// CO2 limits resolved from a settings snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Co2Thresholds {
    pub warning: f64,
    pub critical: f64,
}

impl Default for Co2Thresholds {
    fn default() -> Self {
        Self {
            warning: DEFAULT_CO2_WARNING_LIMIT,
            critical: DEFAULT_CO2_CRITICAL_LIMIT,
        }
    }
}

impl Co2Thresholds {
    pub fn from_settings(settings: &impl SettingsLookup) -> Self {
        Self {
            warning: limit(settings, CO2_WARNING_LIMIT, DEFAULT_CO2_WARNING_LIMIT),
            critical: limit(settings, CO2_CRITICAL_LIMIT, DEFAULT_CO2_CRITICAL_LIMIT),
        }
    }
}

/// Missing or unparseable values fall back to `default`.
fn limit(settings: &impl SettingsLookup, key: &str, default: f64) -> f64 {
    match settings.get(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => {
                warn!(key, value = raw, default, "Setting is not a number, using default");
                default
            }
        },
    }
}

/// An alert the policy wants raised, not yet tied to a measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateAlert {
    pub message: String,
    pub severity: AlertSeverity,
}

impl CandidateAlert {
    fn new(message: String, severity: AlertSeverity) -> Self {
        Self { message, severity }
    }

    /// Bind the alert to the measurement that triggered it.
    pub fn attach(self, measurement: &Measurement) -> NewAlert {
        NewAlert {
            measurement_id: measurement.id,
            message: self.message,
            severity: self.severity,
        }
    }
}

/// Evaluate a reading against the current thresholds.
///
/// The CO2 rule yields at most one alert (critical wins over warning). The
/// AQI rule is independent, so a single reading can produce two alerts. CO2
/// alerts always come first.
pub fn evaluate(co2_ppm: f64, aqi: f64, settings: &impl SettingsLookup) -> Vec<CandidateAlert> {
    let limits = Co2Thresholds::from_settings(settings);
    let mut alerts = Vec::with_capacity(2);

    if co2_ppm > limits.critical {
        alerts.push(CandidateAlert::new(
            format!(
                "CRITICAL: CO2 at {} ppm (limit: {})",
                ppm_text(co2_ppm),
                limit_text(limits.critical)
            ),
            AlertSeverity::Critical,
        ));
    } else if co2_ppm > limits.warning {
        alerts.push(CandidateAlert::new(
            format!(
                "WARNING: CO2 at {} ppm (limit: {})",
                ppm_text(co2_ppm),
                limit_text(limits.warning)
            ),
            AlertSeverity::Warning,
        ));
    }

    if aqi > POOR_AQI_THRESHOLD {
        alerts.push(CandidateAlert::new(
            format!("Poor Air Quality Index: {aqi:?}"),
            AlertSeverity::Warning,
        ));
    }

    alerts
}

/// Measured value as it appears in alert text: `1600`, `950.5`, `1e+300`.
fn ppm_text(value: f64) -> String {
    if needs_exponent(value) {
        exponent_text(value)
    } else {
        value.to_string()
    }
}

/// Configured limit as it appears in alert text: `1500.0`, `1e+20`.
fn limit_text(value: f64) -> String {
    if needs_exponent(value) {
        exponent_text(value)
    } else {
        format!("{value:?}")
    }
}

// Plain rendering of these magnitudes runs to hundreds of digits, which
// would not fit in `alerts.message`.
fn needs_exponent(value: f64) -> bool {
    let magnitude = value.abs();
    magnitude >= 1e16 || (magnitude != 0.0 && magnitude < 1e-4)
}

/// `{:e}` with a signed, two-digit exponent: `2.5e-5` becomes `2.5e-05`.
fn exponent_text(value: f64) -> String {
    let raw = format!("{value:e}");
    match raw.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => raw,
    }
}
