//! API endpoint implementations.

mod alerts;
mod auth;
mod readings;
mod reports;
mod roles;
mod sensors;
mod stations;
mod users;
mod zones;

pub use alerts::{AlertFilters, AlertsApi};
pub use auth::AuthApi;
pub use readings::{ReadingFilters, ReadingsApi};
pub use reports::ReportsApi;
pub use roles::RolesApi;
pub use sensors::SensorsApi;
pub use stations::StationsApi;
pub use users::UsersApi;
pub use zones::ZonesApi;

/// Date window accepted by listing and statistics endpoints.
#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    /// Inclusive start date (`YYYY-MM-DD`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Inclusive end date (`YYYY-MM-DD`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Maximum number of rows to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}
