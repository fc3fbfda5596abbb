//! Request and response types for the envmon API.
//!
//! These types mirror the server's API contract. The server uses Spanish
//! field names on the wire; they are mapped onto English field names here.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

/// Credentials for the login endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Token pair and identity returned by a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Short-lived access token.
    pub access: String,
    /// Long-lived refresh token.
    pub refresh: String,
    /// The authenticated user.
    pub user: User,
}

/// Body sent to the token-refresh endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Token-refresh response. The refresh token is only present when the
/// server rotates it.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Self-service registration form.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Users and roles
// ─────────────────────────────────────────────────────────────────────────────

/// Account state of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountState {
    #[serde(rename = "activo")]
    Active,
    #[serde(rename = "inactivo")]
    Inactive,
    #[serde(rename = "bloqueado")]
    Blocked,
}

/// A platform user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(
        rename = "estado_cuenta",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub account_state: Option<AccountState>,
    #[serde(
        rename = "fecha_registro",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub registered_at: Option<String>,
}

/// Fields accepted when creating or updating a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserInput {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(
        rename = "estado_cuenta",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub account_state: Option<AccountState>,
}

/// A role that can be assigned to users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: u64,
    #[serde(rename = "nombre_rol")]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
    pub is_active: bool,
}

/// Fields accepted when creating or updating a role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleInput {
    #[serde(rename = "nombre_rol")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    pub is_active: bool,
}

/// Assignment of a role to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRole {
    pub id: u64,
    #[serde(rename = "usuario")]
    pub user: u64,
    #[serde(rename = "rol")]
    pub role: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Zones and stations
// ─────────────────────────────────────────────────────────────────────────────

/// A monitored geographic zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: u64,
    #[serde(rename = "nombre_zona")]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    #[serde(rename = "latitud")]
    pub latitude: Option<f64>,
    #[serde(rename = "longitud")]
    pub longitude: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
    pub is_active: bool,
}

/// Fields accepted when creating or updating a zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneInput {
    #[serde(rename = "nombre_zona")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "latitud")]
    pub latitude: Option<f64>,
    #[serde(rename = "longitud")]
    pub longitude: Option<f64>,
    pub is_active: bool,
}

/// A monitoring station inside a zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub id: u64,
    #[serde(rename = "nombre_estacion")]
    pub name: String,
    #[serde(rename = "ubicacion", default)]
    pub location: String,
    #[serde(rename = "latitud")]
    pub latitude: Option<f64>,
    #[serde(rename = "longitud")]
    pub longitude: Option<f64>,
    /// Owning zone ID.
    #[serde(rename = "zona")]
    pub zone: u64,
    pub created_at: String,
    pub updated_at: String,
    pub is_active: bool,
}

/// Fields accepted when creating or updating a station.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationInput {
    #[serde(rename = "nombre_estacion")]
    pub name: String,
    #[serde(rename = "ubicacion")]
    pub location: String,
    #[serde(rename = "latitud")]
    pub latitude: Option<f64>,
    #[serde(rename = "longitud")]
    pub longitude: Option<f64>,
    #[serde(rename = "zona")]
    pub zone: u64,
    pub is_active: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Sensors and readings
// ─────────────────────────────────────────────────────────────────────────────

/// Operating state of a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorState {
    #[serde(rename = "activo")]
    Active,
    #[serde(rename = "inactivo")]
    Inactive,
    #[serde(rename = "mantenimiento")]
    Maintenance,
    #[serde(rename = "calibracion")]
    Calibration,
}

/// A sensor installed at a station.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sensor {
    pub id: u64,
    #[serde(rename = "tipo_sensor")]
    pub kind: String,
    #[serde(rename = "modelo")]
    pub model: String,
    #[serde(rename = "unidad_medida")]
    pub unit: String,
    #[serde(rename = "fecha_instalacion")]
    pub installed_on: String,
    #[serde(rename = "fecha_ultima_calibracion", default)]
    pub last_calibrated_on: Option<String>,
    #[serde(rename = "estado")]
    pub state: SensorState,
    /// Owning station ID.
    #[serde(rename = "estacion")]
    pub station: u64,
    #[serde(rename = "rango_minimo", default)]
    pub range_min: Option<f64>,
    #[serde(rename = "rango_maximo", default)]
    pub range_max: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
    pub is_active: bool,
}

/// Fields accepted when creating or updating a sensor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorInput {
    #[serde(rename = "tipo_sensor")]
    pub kind: String,
    #[serde(rename = "modelo")]
    pub model: String,
    #[serde(rename = "unidad_medida")]
    pub unit: String,
    #[serde(rename = "fecha_instalacion")]
    pub installed_on: String,
    #[serde(rename = "fecha_ultima_calibracion")]
    pub last_calibrated_on: Option<String>,
    #[serde(rename = "estado")]
    pub state: SensorState,
    #[serde(rename = "estacion")]
    pub station: u64,
    #[serde(rename = "rango_minimo")]
    pub range_min: Option<f64>,
    #[serde(rename = "rango_maximo")]
    pub range_max: Option<f64>,
    pub is_active: bool,
}

/// Quality grade attached to a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadingQuality {
    #[serde(rename = "bueno")]
    Good,
    #[serde(rename = "regular")]
    Fair,
    #[serde(rename = "malo")]
    Poor,
}

/// A single sensor measurement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub id: u64,
    pub sensor: u64,
    #[serde(rename = "valor")]
    pub value: f64,
    #[serde(rename = "fecha_hora")]
    pub taken_at: String,
    #[serde(rename = "calidad_dato")]
    pub quality: ReadingQuality,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields accepted when creating or updating a reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingInput {
    pub sensor: u64,
    #[serde(rename = "valor")]
    pub value: f64,
    #[serde(rename = "fecha_hora")]
    pub taken_at: String,
    #[serde(rename = "calidad_dato")]
    pub quality: ReadingQuality,
}

// ─────────────────────────────────────────────────────────────────────────────
// Alerts
// ─────────────────────────────────────────────────────────────────────────────

/// Severity of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
    Critical,
}

/// An alert raised by the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: u64,
    #[serde(rename = "tipo_alerta")]
    pub kind: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    #[serde(rename = "nivel_alerta")]
    pub level: AlertLevel,
    #[serde(rename = "fecha_hora")]
    pub raised_at: String,
    #[serde(rename = "atendida")]
    pub attended: bool,
    #[serde(rename = "atendida_por", default)]
    pub attended_by: Option<u64>,
    #[serde(rename = "fecha_atencion", default)]
    pub attended_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields accepted when creating or updating an alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertInput {
    #[serde(rename = "tipo_alerta")]
    pub kind: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "nivel_alerta")]
    pub level: AlertLevel,
    #[serde(rename = "fecha_hora")]
    pub raised_at: String,
    #[serde(rename = "atendida")]
    pub attended: bool,
}

/// Marks an alert as attended.
#[derive(Debug, Clone, Serialize)]
pub struct AttendAlertRequest {
    #[serde(rename = "atendida_por")]
    pub attended_by: u64,
    #[serde(rename = "fecha_atencion")]
    pub attended_at: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Reports
// ─────────────────────────────────────────────────────────────────────────────

/// Kind of content held by a report detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportContentType {
    #[serde(rename = "texto")]
    Text,
    #[serde(rename = "grafico")]
    Chart,
    #[serde(rename = "tabla")]
    Table,
    #[serde(rename = "resumen")]
    Summary,
}

/// A section of a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDetail {
    pub id: u64,
    /// Owning report ID.
    #[serde(rename = "reporte")]
    pub report: u64,
    #[serde(rename = "contenido")]
    pub content: String,
    #[serde(rename = "tipo_contenido")]
    pub content_type: ReportContentType,
    #[serde(rename = "orden")]
    pub position: u32,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields accepted when adding or updating a report detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDetailInput {
    #[serde(rename = "contenido")]
    pub content: String,
    #[serde(rename = "tipo_contenido")]
    pub content_type: ReportContentType,
    #[serde(rename = "orden")]
    pub position: u32,
}

/// A stored report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: u64,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    /// ID of the user who generated it.
    #[serde(rename = "generado_por")]
    pub generated_by: u64,
    #[serde(rename = "periodo_inicio")]
    pub period_start: String,
    #[serde(rename = "periodo_fin")]
    pub period_end: String,
    pub created_at: String,
    pub updated_at: String,
    pub is_active: bool,
    #[serde(rename = "detalles", default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ReportDetail>>,
}

/// Fields accepted when creating or updating a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportInput {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "generado_por")]
    pub generated_by: u64,
    #[serde(rename = "periodo_inicio")]
    pub period_start: String,
    #[serde(rename = "periodo_fin")]
    pub period_end: String,
    pub is_active: bool,
}

/// Subject of a generated report file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportSubject {
    Alerts,
    Sensors,
    Readings,
    Maintenance,
}

/// Parameters for generating a report file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReportRequest {
    #[serde(rename = "type")]
    pub subject: ReportSubject,
    pub start_date: String,
    pub end_date: String,
}

/// Parameters for scheduling automatic reports.
#[derive(Debug, Clone, Serialize)]
pub struct AutomaticReportRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub frequency: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_wire_names() {
        let zone: Zone = serde_json::from_value(serde_json::json!({
            "id": 3,
            "nombre_zona": "Norte",
            "descripcion": "Cuenca alta",
            "latitud": -0.18,
            "longitud": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z",
            "is_active": true
        }))
        .unwrap();

        assert_eq!(zone.name, "Norte");
        assert_eq!(zone.latitude, Some(-0.18));
        assert!(zone.longitude.is_none());
    }

    #[test]
    fn test_sensor_state_wire_values() {
        assert_eq!(
            serde_json::to_value(SensorState::Calibration).unwrap(),
            "calibracion"
        );
        assert_eq!(
            serde_json::from_value::<ReadingQuality>("malo".into()).unwrap(),
            ReadingQuality::Poor
        );
        assert_eq!(
            serde_json::to_value(AccountState::Blocked).unwrap(),
            "bloqueado"
        );
    }

    #[test]
    fn test_generate_report_request_shape() {
        let body = serde_json::to_value(GenerateReportRequest {
            subject: ReportSubject::Readings,
            start_date: "2024-01-01".to_string(),
            end_date: "2024-01-31".to_string(),
        })
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "type": "readings",
                "startDate": "2024-01-01",
                "endDate": "2024-01-31"
            })
        );
    }

    #[test]
    fn test_refresh_response_without_rotation() {
        let response: RefreshResponse =
            serde_json::from_value(serde_json::json!({"access": "A2"})).unwrap();
        assert_eq!(response.access, "A2");
        assert!(response.refresh.is_none());
    }

    #[test]
    fn test_login_user_without_account_fields() {
        let auth: AuthResponse = serde_json::from_value(serde_json::json!({
            "access": "A1",
            "refresh": "R1",
            "user": {"id": 1, "username": "ana", "email": "a@b.c", "first_name": "Ana", "last_name": "R"}
        }))
        .unwrap();
        assert!(auth.user.account_state.is_none());
    }
}
