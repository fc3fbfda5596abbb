//! Zones API.

use crate::client::EnvmonClient;
use crate::error::Result;
use crate::types::{Station, Zone, ZoneInput};

/// Zones API client.
pub struct ZonesApi {
    client: EnvmonClient,
}

impl ZonesApi {
    pub(crate) fn new(client: EnvmonClient) -> Self {
        Self { client }
    }

    /// List all zones.
    pub async fn list(&self) -> Result<Vec<Zone>> {
        self.client.get("zonas/").await
    }

    /// Get a zone by ID.
    pub async fn get(&self, id: u64) -> Result<Zone> {
        self.client.get(&format!("zonas/{}/", id)).await
    }

    /// Create a new zone.
    pub async fn create(&self, zone: &ZoneInput) -> Result<Zone> {
        self.client.post("zonas/", zone).await
    }

    /// Replace a zone.
    pub async fn update(&self, id: u64, zone: &ZoneInput) -> Result<Zone> {
        self.client.put(&format!("zonas/{}/", id), zone).await
    }

    /// Delete a zone.
    pub async fn delete(&self, id: u64) -> Result<()> {
        self.client.delete(&format!("zonas/{}/", id)).await
    }

    /// List the stations inside a zone.
    pub async fn stations(&self, id: u64) -> Result<Vec<Station>> {
        self.client.get(&format!("zonas/{}/estaciones/", id)).await
    }
}
