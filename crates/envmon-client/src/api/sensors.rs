//! Sensors API.

use super::DateRange;
use crate::client::EnvmonClient;
use crate::error::Result;
use crate::types::{Alert, Reading, Sensor, SensorInput};

/// Sensors API client.
pub struct SensorsApi {
    client: EnvmonClient,
}

impl SensorsApi {
    pub(crate) fn new(client: EnvmonClient) -> Self {
        Self { client }
    }

    /// List all sensors.
    pub async fn list(&self) -> Result<Vec<Sensor>> {
        self.client.get("sensores/").await
    }

    /// Get a sensor by ID.
    pub async fn get(&self, id: u64) -> Result<Sensor> {
        self.client.get(&format!("sensores/{}/", id)).await
    }

    /// Create a new sensor.
    pub async fn create(&self, sensor: &SensorInput) -> Result<Sensor> {
        self.client.post("sensores/", sensor).await
    }

    /// Replace a sensor.
    pub async fn update(&self, id: u64, sensor: &SensorInput) -> Result<Sensor> {
        self.client.put(&format!("sensores/{}/", id), sensor).await
    }

    /// Delete a sensor.
    pub async fn delete(&self, id: u64) -> Result<()> {
        self.client.delete(&format!("sensores/{}/", id)).await
    }

    /// Readings taken by a sensor within a date window.
    pub async fn readings(&self, id: u64, range: &DateRange) -> Result<Vec<Reading>> {
        self.client
            .get_with_query(&format!("sensores/{}/lecturas/", id), range)
            .await
    }

    /// Alerts raised for a sensor.
    pub async fn alerts(&self, id: u64) -> Result<Vec<Alert>> {
        self.client.get(&format!("sensores/{}/alertas/", id)).await
    }
}
