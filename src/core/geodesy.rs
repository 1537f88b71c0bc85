// geodesy.rs - Distances between coordinates on the Earth

use crate::data::LatLon;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Mean Earth radius (IUGG), km
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

// WGS-84 ellipsoid
const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// Distance model used for co-occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistanceMethod {
    /// Ellipsoidal distance on WGS-84 (Vincenty)
    #[default]
    Geodesic,
    /// Spherical distance (haversine)
    GreatCircle,
}

impl FromStr for DistanceMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "geodesic" | "vincenty" => Ok(DistanceMethod::Geodesic),
            "great-circle" | "greatcircle" | "haversine" => Ok(DistanceMethod::GreatCircle),
            _ => Err(format!(
                "Unknown distance method: {}. Use: geodesic, great-circle",
                s
            )),
        }
    }
}

impl DistanceMethod {
    pub fn description(&self) -> &'static str {
        match self {
            DistanceMethod::Geodesic => "geodesic (WGS-84)",
            DistanceMethod::GreatCircle => "great-circle (haversine)",
        }
    }

    pub fn distance_km(&self, a: LatLon, b: LatLon) -> f64 {
        match self {
            DistanceMethod::GreatCircle => haversine_km(a, b),
            DistanceMethod::Geodesic => vincenty_km(a, b).unwrap_or_else(|| haversine_km(a, b)),
        }
    }
}

pub fn haversine_km(a: LatLon, b: LatLon) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let dphi = (b.latitude - a.latitude).to_radians();
    let dlambda = (b.longitude - a.longitude).to_radians();

    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Vincenty inverse formula; `None` when the iteration fails to converge
pub fn vincenty_km(a: LatLon, b: LatLon) -> Option<f64> {
    if a == b {
        return Some(0.0);
    }

    let semi_minor = (1.0 - WGS84_F) * WGS84_A;
    let l = (b.longitude - a.longitude).to_radians();
    let u1 = ((1.0 - WGS84_F) * a.latitude.to_radians().tan()).atan();
    let u2 = ((1.0 - WGS84_F) * b.latitude.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    for _ in 0..200 {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();
        if sin_sigma == 0.0 {
            return Some(0.0);
        }
        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // Equatorial line
        let cos_2sigma_m = if cos_sq_alpha == 0.0 {
            0.0
        } else {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        };
        let c = WGS84_F / 16.0 * cos_sq_alpha * (4.0 + WGS84_F * (4.0 - 3.0 * cos_sq_alpha));
        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * WGS84_F
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

        if (lambda - previous).abs() < 1e-12 {
            let u_sq = cos_sq_alpha * (WGS84_A * WGS84_A - semi_minor * semi_minor)
                / (semi_minor * semi_minor);
            let big_a =
                1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
            let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
            let delta_sigma = big_b
                * sin_sigma
                * (cos_2sigma_m
                    + big_b / 4.0
                        * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                            - big_b / 6.0
                                * cos_2sigma_m
                                * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                                * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));
            let meters = semi_minor * big_a * (sigma - delta_sigma);
            return Some(meters / 1000.0);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_degree_of_latitude() {
        let a = LatLon::new(0.0, 0.0);
        let b = LatLon::new(1.0, 0.0);
        // 1 degree of arc on the mean sphere
        assert!((haversine_km(a, b) - 111.195).abs() < 0.01);
        // Meridian arc from the equator on WGS-84
        assert!((vincenty_km(a, b).unwrap() - 110.574).abs() < 0.01);
    }

    #[test]
    fn test_distances_are_symmetric() {
        let a = LatLon::new(45.4642, 9.19);
        let b = LatLon::new(41.9028, 12.4964);
        for method in [DistanceMethod::Geodesic, DistanceMethod::GreatCircle] {
            let ab = method.distance_km(a, b);
            let ba = method.distance_km(b, a);
            assert!((ab - ba).abs() < 1e-6);
            assert!(ab > 470.0 && ab < 490.0);
        }
    }

    #[test]
    fn test_coincident_points() {
        let a = LatLon::new(10.0, 20.0);
        assert_eq!(DistanceMethod::Geodesic.distance_km(a, a), 0.0);
        assert_eq!(DistanceMethod::GreatCircle.distance_km(a, a), 0.0);
    }

    #[test]
    fn test_antipodal_falls_back() {
        let a = LatLon::new(0.0, 0.0);
        let b = LatLon::new(0.5, 179.7);
        let d = DistanceMethod::Geodesic.distance_km(a, b);
        assert!(d.is_finite());
        assert!(d > 19_000.0 && d < 20_100.0);
    }

    #[test]
    fn test_parse_method() {
        assert_eq!("great-circle".parse::<DistanceMethod>().unwrap(), DistanceMethod::GreatCircle);
        assert_eq!("Geodesic".parse::<DistanceMethod>().unwrap(), DistanceMethod::Geodesic);
        assert!("manhattan".parse::<DistanceMethod>().is_err());
    }
}
