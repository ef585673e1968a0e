//! Great-circle distance and geofence verdicts.
//!
//! Pure functions: the fence configuration is injected by the caller, so
//! per-tenant and per-test fences need no global state. Inputs are assumed to
//! be valid latitude/longitude pairs; range checking happens upstream, before
//! the request reaches this module.

use common::config;
use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters (spherical approximation).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A circular fence: check-ins are valid within `radius_m` of the center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeofenceConfig {
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_m: f64,
}

impl GeofenceConfig {
    /// Builds the fence from the application configuration.
    pub fn from_app_config() -> Self {
        Self {
            center_lat: config::geofence_center_lat(),
            center_lon: config::geofence_center_lon(),
            radius_m: config::geofence_radius_m(),
        }
    }
}

/// Haversine distance in meters between two coordinate pairs.
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Whether the point lies inside the fence. The boundary itself counts as
/// inside.
pub fn is_within_fence(lat: f64, lon: f64, fence: &GeofenceConfig) -> bool {
    distance_meters(lat, lon, fence.center_lat, fence.center_lon) <= fence.radius_m
}
