//! Stations API.

use crate::client::EnvmonClient;
use crate::error::Result;
use crate::types::{Sensor, Station, StationInput};

/// Stations API client.
pub struct StationsApi {
    client: EnvmonClient,
}

impl StationsApi {
    pub(crate) fn new(client: EnvmonClient) -> Self {
        Self { client }
    }

    /// List all stations.
    pub async fn list(&self) -> Result<Vec<Station>> {
        self.client.get("estaciones/").await
    }

    /// Get a station by ID.
    pub async fn get(&self, id: u64) -> Result<Station> {
        self.client.get(&format!("estaciones/{}/", id)).await
    }

    /// Create a new station.
    pub async fn create(&self, station: &StationInput) -> Result<Station> {
        self.client.post("estaciones/", station).await
    }

    /// Replace a station.
    pub async fn update(&self, id: u64, station: &StationInput) -> Result<Station> {
        self.client.put(&format!("estaciones/{}/", id), station).await
    }

    /// Delete a station.
    pub async fn delete(&self, id: u64) -> Result<()> {
        self.client.delete(&format!("estaciones/{}/", id)).await
    }

    /// List the sensors installed at a station.
    pub async fn sensors(&self, id: u64) -> Result<Vec<Sensor>> {
        self.client.get(&format!("estaciones/{}/sensores/", id)).await
    }
}
