use serde::Serialize;
use utoipa::ToSchema;

use crate::db::models::WindowStats;

pub const PERIOD_LAST_24H: &str = "last_24h";
pub const NO_DATA_MESSAGE: &str = "No data for selected period";

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Averages {
    pub temperature: f64,
    pub humidity: f64,
    pub co2: f64,
    /// Absent when any measurement in the window has no AQI.
    pub aqi: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AnalyticsSummary {
    pub sensor_id: i64,
    pub period: String,
    pub measurements_count: i64,
    pub averages: Averages,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NoData {
    pub message: String,
}

/// Result of the windowed analytics query: either a summary or an explicit
/// "no data" marker, never a zero-filled summary.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum SensorAnalytics {
    Summary(AnalyticsSummary),
    NoData(NoData),
}

impl SensorAnalytics {
    pub fn no_data() -> Self {
        Self::NoData(NoData {
            message: NO_DATA_MESSAGE.to_owned(),
        })
    }
}

pub fn summarize(sensor_id: i64, stats: WindowStats) -> SensorAnalytics {
    if stats.count == 0 {
        return SensorAnalytics::no_data();
    }

    SensorAnalytics::Summary(AnalyticsSummary {
        sensor_id,
        period: PERIOD_LAST_24H.to_owned(),
        measurements_count: stats.count,
        averages: Averages {
            temperature: round2(stats.avg_temperature.unwrap_or_default()),
            humidity: round2(stats.avg_humidity.unwrap_or_default()),
            co2: round2(stats.avg_co2.unwrap_or_default()),
            aqi: stats.avg_aqi.map(round2),
        },
    })
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
