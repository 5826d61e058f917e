//! Common validation rules shared across request payloads and the store adapter.

use validator::ValidationError;

/// Validates a WGS84 latitude.
///
/// Requirements:
/// - Finite
/// - Between -90 and 90 degrees inclusive
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(ValidationError::new("latitude_out_of_range"));
    }
    Ok(())
}

/// Validates a WGS84 longitude.
///
/// Requirements:
/// - Finite
/// - Between -180 and 180 degrees inclusive
pub fn validate_longitude(lng: f64) -> Result<(), ValidationError> {
    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        return Err(ValidationError::new("longitude_out_of_range"));
    }
    Ok(())
}

/// Validates a fix timestamp in Unix epoch milliseconds.
pub fn validate_timestamp(timestamp: i64) -> Result<(), ValidationError> {
    if timestamp < 0 {
        return Err(ValidationError::new("timestamp_negative"));
    }
    Ok(())
}
