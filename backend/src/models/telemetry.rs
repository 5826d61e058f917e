//! Raw GPS fixes and the ingestion payloads that carry them.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationErrors};

use crate::models::lap::LapSummary;
use crate::types::SessionId;
use crate::validation::rules;

pub const DEFAULT_TELEMETRY_LIMIT: i64 = 1000;
pub const MAX_TELEMETRY_LIMIT: i64 = 10_000;

/// One fix as submitted by a client. Every field is optional on the wire so
/// that missing values surface as validation errors instead of decode errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct TelemetryPointInput {
    #[validate(required, range(min = -90.0, max = 90.0, code = "latitude_out_of_range"))]
    pub lat: Option<f64>,
    #[validate(required, range(min = -180.0, max = 180.0, code = "longitude_out_of_range"))]
    pub lng: Option<f64>,
    pub speed: Option<f64>,
    pub altitude: Option<f64>,
    pub accuracy: Option<f64>,
    /// Unix epoch milliseconds.
    #[validate(required, range(min = 0, code = "timestamp_negative"))]
    pub timestamp: Option<i64>,
}

impl TelemetryPointInput {
    /// Converts a wire point into an appendable one, or returns why it is unusable.
    pub fn to_new_point(&self) -> Result<NewTelemetryPoint, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let lat = self.lat.unwrap_or(f64::NAN);
        if let Err(err) = rules::validate_latitude(lat) {
            errors.add("lat", err);
        }
        let lng = self.lng.unwrap_or(f64::NAN);
        if let Err(err) = rules::validate_longitude(lng) {
            errors.add("lng", err);
        }
        let timestamp = self.timestamp.unwrap_or(-1);
        if let Err(err) = rules::validate_timestamp(timestamp) {
            errors.add("timestamp", err);
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewTelemetryPoint {
            lat,
            lng,
            speed: self.speed.filter(|v| v.is_finite()),
            altitude: self.altitude.filter(|v| v.is_finite()),
            accuracy: self.accuracy.filter(|v| v.is_finite()),
            timestamp,
        })
    }
}

/// A validated point ready to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTelemetryPoint {
    pub lat: f64,
    pub lng: f64,
    pub speed: Option<f64>,
    pub altitude: Option<f64>,
    pub accuracy: Option<f64>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryPoint {
    pub id: i64,
    pub session_id: SessionId,
    pub lat: f64,
    pub lng: f64,
    pub speed: Option<f64>,
    pub altitude: Option<f64>,
    pub accuracy: Option<f64>,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    #[validate(required)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    #[validate(length(min = 1, code = "points_required"), nested)]
    pub points: Vec<TelemetryPointInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub message: String,
    pub points_ingested: usize,
    pub points_rejected: usize,
    pub lap_detected: bool,
    pub lap: Option<LapSummary>,
}

#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct TelemetryQuery {
    /// Maximum number of points to return (default: 1000, max: 10000).
    #[serde(default = "default_telemetry_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_telemetry_limit() -> i64 {
    DEFAULT_TELEMETRY_LIMIT
}

impl TelemetryQuery {
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, MAX_TELEMETRY_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.max(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryPage {
    pub session_id: SessionId,
    pub points: Vec<TelemetryPoint>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64, timestamp: i64) -> TelemetryPointInput {
        TelemetryPointInput {
            lat: Some(lat),
            lng: Some(lng),
            timestamp: Some(timestamp),
            ..Default::default()
        }
    }

    #[test]
    fn equator_and_prime_meridian_are_valid_coordinates() {
        let converted = point(0.0, 0.0, 1_700_000_000_000)
            .to_new_point()
            .expect("zero coordinates are valid");
        assert_eq!(converted.lat, 0.0);
        assert_eq!(converted.lng, 0.0);
    }

    #[test]
    fn out_of_range_latitude_is_rejected() {
        let errors = point(90.5, 10.0, 1).to_new_point().unwrap_err();
        assert!(errors.field_errors().contains_key("lat"));
    }

    #[test]
    fn missing_timestamp_is_rejected() {
        let input = TelemetryPointInput {
            lat: Some(10.0),
            lng: Some(10.0),
            ..Default::default()
        };
        assert!(input.to_new_point().is_err());
        assert!(input.validate().is_err());
    }

    #[test]
    fn ingest_request_without_points_fails_validation() {
        let request: IngestRequest = serde_json::from_value(serde_json::json!({
            "sessionId": SessionId::new(),
        }))
        .expect("deserialize");
        assert!(request.validate().is_err());
    }

    #[test]
    fn ingest_request_flags_nested_point_errors() {
        let request: IngestRequest = serde_json::from_value(serde_json::json!({
            "sessionId": SessionId::new(),
            "points": [
                { "lat": 10.0, "lng": 10.0, "timestamp": 1 },
                { "lat": 10.0, "lng": 200.0, "timestamp": 2 }
            ]
        }))
        .expect("deserialize");
        assert!(request.validate().is_err());
    }

    #[test]
    fn telemetry_query_clamps_limit() {
        let query = TelemetryQuery {
            limit: 50_000,
            offset: -1,
        };
        assert_eq!(query.limit(), MAX_TELEMETRY_LIMIT);
        assert_eq!(query.offset(), 0);
    }
}
