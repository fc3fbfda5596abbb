//! Readings API.

use super::DateRange;
use crate::client::EnvmonClient;
use crate::error::Result;
use crate::types::{Reading, ReadingInput, ReadingQuality};

/// Query parameters for listing readings.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ReadingFilters {
    /// Only readings from this sensor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor: Option<u64>,
    #[serde(rename = "startDate", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Only readings with this quality grade.
    #[serde(rename = "calidad_dato", skip_serializing_if = "Option::is_none")]
    pub quality: Option<ReadingQuality>,
    /// Maximum number of readings to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

#[derive(serde::Serialize)]
struct ReportQuery<'a> {
    sensor: u64,
    start_date: &'a str,
    end_date: &'a str,
}

#[derive(serde::Serialize)]
struct StatsQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    sensor: Option<u64>,
    #[serde(flatten)]
    range: &'a DateRange,
}

/// Readings API client.
pub struct ReadingsApi {
    client: EnvmonClient,
}

impl ReadingsApi {
    pub(crate) fn new(client: EnvmonClient) -> Self {
        Self { client }
    }

    /// List all readings.
    pub async fn list(&self) -> Result<Vec<Reading>> {
        self.client.get("readings/").await
    }

    /// List readings matching `filters`.
    pub async fn list_with_filters(&self, filters: &ReadingFilters) -> Result<Vec<Reading>> {
        self.client.get_with_query("readings/", filters).await
    }

    /// Get a reading by ID.
    pub async fn get(&self, id: u64) -> Result<Reading> {
        self.client.get(&format!("readings/{}/", id)).await
    }

    /// Record a new reading.
    pub async fn create(&self, reading: &ReadingInput) -> Result<Reading> {
        self.client.post("readings/", reading).await
    }

    /// Replace a reading.
    pub async fn update(&self, id: u64, reading: &ReadingInput) -> Result<Reading> {
        self.client.put(&format!("readings/{}/", id), reading).await
    }

    /// Delete a reading.
    pub async fn delete(&self, id: u64) -> Result<()> {
        self.client.delete(&format!("readings/{}/", id)).await
    }

    /// Aggregate statistics, optionally for one sensor.
    pub async fn stats(
        &self,
        sensor: Option<u64>,
        range: &DateRange,
    ) -> Result<serde_json::Value> {
        self.client
            .get_with_query("readings/stats/", &StatsQuery { sensor, range })
            .await
    }

    /// Download the CSV report of one sensor's readings.
    pub async fn download_report(
        &self,
        sensor: u64,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<u8>> {
        self.client
            .get_bytes(
                "readings/report/",
                &ReportQuery {
                    sensor,
                    start_date,
                    end_date,
                },
            )
            .await
    }

    /// File name the web front-end uses for a downloaded sensor report.
    pub fn report_file_name(sensor: u64, start_date: &str, end_date: &str) -> String {
        format!("reporte_sensor_{}_{}_{}.csv", sensor, start_date, end_date)
    }
}
