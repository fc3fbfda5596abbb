//! Reports API.

use crate::client::EnvmonClient;
use crate::error::Result;
use crate::types::{
    AutomaticReportRequest, GenerateReportRequest, Report, ReportDetail, ReportDetailInput,
    ReportInput,
};

/// Reports API client.
pub struct ReportsApi {
    client: EnvmonClient,
}

impl ReportsApi {
    pub(crate) fn new(client: EnvmonClient) -> Self {
        Self { client }
    }

    /// List all reports.
    pub async fn list(&self) -> Result<Vec<Report>> {
        self.client.get("reports/").await
    }

    /// Get a report by ID, including its details.
    pub async fn get(&self, id: u64) -> Result<Report> {
        self.client.get(&format!("reports/{}/", id)).await
    }

    /// Create a new report.
    pub async fn create(&self, report: &ReportInput) -> Result<Report> {
        self.client.post("reports/", report).await
    }

    /// Replace a report.
    pub async fn update(&self, id: u64, report: &ReportInput) -> Result<Report> {
        self.client.put(&format!("reports/{}/", id), report).await
    }

    /// Delete a report.
    pub async fn delete(&self, id: u64) -> Result<()> {
        self.client.delete(&format!("reports/{}/", id)).await
    }

    /// Append a detail section to a report.
    pub async fn add_detail(
        &self,
        report_id: u64,
        detail: &ReportDetailInput,
    ) -> Result<ReportDetail> {
        self.client
            .post(&format!("reports/{}/detalles/", report_id), detail)
            .await
    }

    /// Replace a detail section.
    pub async fn update_detail(
        &self,
        report_id: u64,
        detail_id: u64,
        detail: &ReportDetailInput,
    ) -> Result<ReportDetail> {
        self.client
            .put(
                &format!("reports/{}/detalles/{}/", report_id, detail_id),
                detail,
            )
            .await
    }

    /// Remove a detail section.
    pub async fn delete_detail(&self, report_id: u64, detail_id: u64) -> Result<()> {
        self.client
            .delete(&format!("reports/{}/detalles/{}/", report_id, detail_id))
            .await
    }

    /// Schedule automatic report generation.
    pub async fn generate_automatic(
        &self,
        kind: impl Into<String>,
        frequency: impl Into<String>,
    ) -> Result<serde_json::Value> {
        let request = AutomaticReportRequest {
            kind: kind.into(),
            frequency: frequency.into(),
        };
        self.client.post("reports/automatic/", &request).await
    }

    /// Generate a report file and return its bytes.
    pub async fn generate(&self, request: &GenerateReportRequest) -> Result<Vec<u8>> {
        self.client.post_bytes("reports/generate/", request).await
    }
}
