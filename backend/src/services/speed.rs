//! Top/average speed over a set of fixes.

use crate::models::telemetry::TelemetryPoint;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpeedSummary {
    pub top_speed: f64,
    pub avg_speed: f64,
}

impl SpeedSummary {
    /// Aggregates declared speeds. Missing, zero and non-finite speeds are
    /// excluded from both the maximum and the mean; an empty set yields zeros.
    /// Values pass through in the unit reported by the client (m/s).
    pub fn from_speeds<I>(speeds: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let reported: Vec<f64> = speeds
            .into_iter()
            .flatten()
            .filter(|speed| speed.is_finite() && *speed > 0.0)
            .collect();

        if reported.is_empty() {
            return Self::default();
        }

        let top_speed = reported.iter().copied().fold(f64::MIN, f64::max);
        let avg_speed = reported.iter().sum::<f64>() / reported.len() as f64;

        Self {
            top_speed,
            avg_speed,
        }
    }

    pub fn from_points(points: &[TelemetryPoint]) -> Self {
        Self::from_speeds(points.iter().map(|point| point.speed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_speed_is_excluded_not_zeroed() {
        let summary = SpeedSummary::from_speeds([Some(2.0), Some(4.0), None]);
        assert_eq!(summary.top_speed, 4.0);
        assert_eq!(summary.avg_speed, 3.0);
    }

    #[test]
    fn empty_set_yields_zeros() {
        assert_eq!(SpeedSummary::from_speeds([]), SpeedSummary::default());
        assert_eq!(
            SpeedSummary::from_speeds([None, None]),
            SpeedSummary {
                top_speed: 0.0,
                avg_speed: 0.0
            }
        );
    }

    #[test]
    fn zero_and_non_finite_speeds_are_ignored() {
        let summary = SpeedSummary::from_speeds([Some(0.0), Some(f64::NAN), Some(6.0)]);
        assert_eq!(summary.top_speed, 6.0);
        assert_eq!(summary.avg_speed, 6.0);
    }
}
