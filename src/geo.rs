//! Great-circle distance and search-radius handling.

use crate::error::{KestrelError, Result};
use geo::{Distance, Haversine, Point};

pub const MIN_DISTANCE_KM: f64 = 1.0;
pub const MAX_DISTANCE_KM: f64 = 500.0;
pub const DEFAULT_DISTANCE_KM: f64 = 25.0;

/// eBird rejects notable-observation radii above 50 km.
pub const MAX_NOTABLE_DISTANCE_KM: f64 = 50.0;

/// Haversine distance in kilometres between two lat/lng points.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let from = Point::new(lng1, lat1);
    let to = Point::new(lng2, lat2);
    Haversine::distance(from, to) / 1000.0
}

/// Rounds to one decimal place, the precision shown to clients.
pub fn round_km(km: f64) -> f64 {
    (km * 10.0).round() / 10.0
}

/// Clamps a requested radius into the range the provider accepts.
pub fn clamp_distance(km: f64) -> Result<f64> {
    if !km.is_finite() {
        return Err(KestrelError::bad_input("distance must be a finite number"));
    }
    Ok(km.clamp(MIN_DISTANCE_KM, MAX_DISTANCE_KM))
}

/// Parses a raw distance parameter. Absent means the default radius.
pub fn parse_distance(raw: Option<&str>) -> Result<f64> {
    match raw.map(str::trim) {
        None | Some("") => Ok(DEFAULT_DISTANCE_KM),
        Some(value) => {
            let km: f64 = value
                .parse()
                .map_err(|_| KestrelError::bad_input(format!("distance '{}' is not a number", value)))?;
            clamp_distance(km)
        }
    }
}

pub fn is_valid_lat(lat: f64) -> bool {
    lat.is_finite() && (-90.0..=90.0).contains(&lat)
}

pub fn is_valid_lng(lng: f64) -> bool {
    lng.is_finite() && (-180.0..=180.0).contains(&lng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_haversine_same_point_is_zero() {
        assert_eq!(haversine_km(40.0, -75.0, 40.0, -75.0), 0.0);
    }

    #[test]
    fn test_haversine_known_distance() {
        // Philadelphia City Hall to Independence Hall
        let km = haversine_km(39.9526, -75.1652, 39.9489, -75.1500);
        assert_eq!(round_km(km), 1.4);

        // One degree of latitude is about 111.2 km
        let km = haversine_km(0.0, 0.0, 1.0, 0.0);
        assert_eq!(round_km(km), 111.2);
    }

    #[rstest]
    #[case(600.0, 500.0)]
    #[case(0.0, 1.0)]
    #[case(-3.0, 1.0)]
    #[case(25.5, 25.5)]
    #[case(500.0, 500.0)]
    fn test_clamp_distance(#[case] requested: f64, #[case] expected: f64) {
        assert_eq!(clamp_distance(requested).unwrap(), expected);
    }

    #[test]
    fn test_clamp_distance_rejects_nan() {
        assert!(matches!(clamp_distance(f64::NAN), Err(KestrelError::BadInput(_))));
    }

    #[rstest]
    #[case(None, 25.0)]
    #[case(Some(""), 25.0)]
    #[case(Some("10"), 10.0)]
    #[case(Some(" 600 "), 500.0)]
    #[case(Some("0"), 1.0)]
    fn test_parse_distance(#[case] raw: Option<&str>, #[case] expected: f64) {
        assert_eq!(parse_distance(raw).unwrap(), expected);
    }

    #[test]
    fn test_parse_distance_rejects_text() {
        assert!(matches!(parse_distance(Some("far")), Err(KestrelError::BadInput(_))));
        assert!(matches!(parse_distance(Some("inf")), Err(KestrelError::BadInput(_))));
    }

    #[test]
    fn test_coordinate_ranges() {
        assert!(is_valid_lat(-90.0));
        assert!(!is_valid_lat(90.5));
        assert!(is_valid_lng(180.0));
        assert!(!is_valid_lng(f64::NAN));
    }
}
