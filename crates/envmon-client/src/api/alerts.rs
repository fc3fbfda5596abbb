//! Alerts API.

use super::DateRange;
use crate::client::EnvmonClient;
use crate::error::Result;
use crate::types::{Alert, AlertInput, AlertLevel, AttendAlertRequest};

/// Query parameters for listing alerts.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct AlertFilters {
    /// Only attended (`true`) or pending (`false`) alerts.
    #[serde(rename = "atendida", skip_serializing_if = "Option::is_none")]
    pub attended: Option<bool>,
    #[serde(rename = "tipo_alerta", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "nivel_alerta", skip_serializing_if = "Option::is_none")]
    pub level: Option<AlertLevel>,
    #[serde(rename = "fecha_inicio", skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(rename = "fecha_fin", skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

/// Alerts API client.
pub struct AlertsApi {
    client: EnvmonClient,
}

impl AlertsApi {
    pub(crate) fn new(client: EnvmonClient) -> Self {
        Self { client }
    }

    /// List all alerts.
    pub async fn list(&self) -> Result<Vec<Alert>> {
        self.client.get("alerts/").await
    }

    /// List alerts matching `filters`.
    pub async fn list_with_filters(&self, filters: &AlertFilters) -> Result<Vec<Alert>> {
        self.client.get_with_query("alerts/", filters).await
    }

    /// List alerts nobody has attended yet.
    pub async fn pending(&self) -> Result<Vec<Alert>> {
        self.list_with_filters(&AlertFilters {
            attended: Some(false),
            ..Default::default()
        })
        .await
    }

    /// Get an alert by ID.
    pub async fn get(&self, id: u64) -> Result<Alert> {
        self.client.get(&format!("alerts/{}/", id)).await
    }

    /// Raise a new alert.
    pub async fn create(&self, alert: &AlertInput) -> Result<Alert> {
        self.client.post("alerts/", alert).await
    }

    /// Replace an alert.
    pub async fn update(&self, id: u64, alert: &AlertInput) -> Result<Alert> {
        self.client.put(&format!("alerts/{}/", id), alert).await
    }

    /// Delete an alert.
    pub async fn delete(&self, id: u64) -> Result<()> {
        self.client.delete(&format!("alerts/{}/", id)).await
    }

    /// Mark an alert as attended by `user_id`, stamped with the current time.
    pub async fn attend(&self, id: u64, user_id: u64) -> Result<Alert> {
        let request = AttendAlertRequest {
            attended_by: user_id,
            attended_at: chrono::Utc::now().to_rfc3339(),
        };
        self.client
            .put(&format!("alerts/{}/attend/", id), &request)
            .await
    }

    /// Aggregate alert statistics.
    pub async fn stats(&self, range: &DateRange) -> Result<serde_json::Value> {
        self.client.get_with_query("alerts/stats/", range).await
    }
}
