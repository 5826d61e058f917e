//! Great-circle distance between GPS coordinates.

use crate::models::{telemetry::TelemetryPoint, track::Waypoint};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Anything carrying a latitude/longitude pair in degrees.
pub trait Coordinates {
    fn lat(&self) -> f64;
    fn lng(&self) -> f64;
}

impl Coordinates for Waypoint {
    fn lat(&self) -> f64 {
        self.lat
    }

    fn lng(&self) -> f64 {
        self.lng
    }
}

impl Coordinates for TelemetryPoint {
    fn lat(&self) -> f64 {
        self.lat
    }

    fn lng(&self) -> f64 {
        self.lng
    }
}

/// Haversine distance in meters. Inputs are not validated.
pub fn distance<A: Coordinates + ?Sized, B: Coordinates + ?Sized>(a: &A, b: &B) -> f64 {
    haversine_m(a.lat(), a.lng(), b.lat(), b.lng())
}

pub fn haversine_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMES_SQUARE: Waypoint = Waypoint {
        lat: 40.7589,
        lng: -73.9851,
    };
    const NEARBY: Waypoint = Waypoint {
        lat: 40.759,
        lng: -73.984,
    };
    const LONDON: Waypoint = Waypoint {
        lat: 51.5074,
        lng: -0.1278,
    };

    #[test]
    fn identical_coordinates_are_zero_apart() {
        assert_eq!(distance(&TIMES_SQUARE, &TIMES_SQUARE), 0.0);
        assert_eq!(distance(&LONDON, &LONDON), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        assert_eq!(distance(&TIMES_SQUARE, &LONDON), distance(&LONDON, &TIMES_SQUARE));
        assert_eq!(distance(&TIMES_SQUARE, &NEARBY), distance(&NEARBY, &TIMES_SQUARE));
    }

    #[test]
    fn triangle_inequality_holds() {
        let points = [TIMES_SQUARE, NEARBY, LONDON, Waypoint::new(-33.8688, 151.2093)];
        for a in &points {
            for b in &points {
                for c in &points {
                    let direct = distance(a, c);
                    let detour = distance(a, b) + distance(b, c);
                    assert!(direct <= detour + 1e-6, "{direct} > {detour}");
                }
            }
        }
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = haversine_m(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111_194.9).abs() < 1.0, "got {d}");
    }

    #[test]
    fn new_york_to_london_matches_known_distance() {
        let d = distance(&TIMES_SQUARE, &LONDON);
        assert!((d / 1000.0 - 5_570.0).abs() < 25.0, "got {d}");
    }
}
