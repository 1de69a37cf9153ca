use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Earth's radius in meters (for Haversine formula)
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    #[schema(example = 12.9716)]
    pub latitude: f64,
    #[schema(example = 77.5946)]
    pub longitude: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum CoordinateError {
    #[error("coordinates must be finite numbers")]
    NotFinite,

    #[error("latitude {0} is outside -90..=90")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside -180..=180")]
    LongitudeOutOfRange(f64),
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Range check for values coming from devices or stored settings.
    /// `distance_meters` does not call this; out-of-range input there just
    /// yields a meaningless distance.
    pub fn validate(&self) -> Result<(), CoordinateError> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(CoordinateError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(self.longitude));
        }
        Ok(())
    }
}

/// Input to a single geofence check, built at check-in/check-out time.
#[derive(Debug, Clone, Copy)]
pub struct AttendanceCheckEvent {
    pub actor_location: GeoPoint,
    pub reference_location: GeoPoint,
    pub allowed_radius_meters: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct GeofenceResult {
    #[schema(example = 61.8)]
    pub distance_meters: f64,
    #[schema(example = true)]
    pub validated: bool,
}

/// Great-circle distance between two points in meters.
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1_rad = a.latitude.to_radians();
    let lat2_rad = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // rounding can push h a hair above 1 for antipodal points
    let c = 2.0 * h.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_METERS * c
}

pub fn validate_geofence(event: &AttendanceCheckEvent) -> GeofenceResult {
    let distance_meters = distance_meters(event.actor_location, event.reference_location);

    GeofenceResult {
        distance_meters,
        validated: distance_meters <= event.allowed_radius_meters,
    }
}

/// Shorthand for `validate_geofence` without building the event by hand.
pub fn check(actor: GeoPoint, reference: GeoPoint, allowed_radius_meters: f64) -> GeofenceResult {
    validate_geofence(&AttendanceCheckEvent {
        actor_location: actor,
        reference_location: reference,
        allowed_radius_meters,
    })
}
