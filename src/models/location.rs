use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decimal places kept when a peer's coordinates are shared (about 1.1 km at
/// the equator).
pub const REDACTION_DECIMALS: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("coordinates must be finite numbers")]
    NonFinite,
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

impl Coords {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn check(&self) -> Result<(), LocationError> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(LocationError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(LocationError::LatitudeOutOfRange(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(LocationError::LongitudeOutOfRange(self.longitude));
        }
        Ok(())
    }

    pub fn rounded(&self, decimals: i32) -> Self {
        Self {
            latitude: round_to(self.latitude, decimals),
            longitude: round_to(self.longitude, decimals),
        }
    }
}

/// Location as reported by the mobile client (expo `LocationObject`). Extra
/// fields such as accuracy or altitude are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub coords: Coords,
    pub timestamp: f64,
    // Self-reported by the client; never used for any decision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mocked: Option<bool>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, timestamp: f64) -> Self {
        Self {
            coords: Coords::new(latitude, longitude),
            timestamp,
            mocked: None,
        }
    }

    /// Copy of this location with coordinates rounded to the sharing precision.
    pub fn redacted(&self) -> Self {
        Self {
            coords: self.coords.rounded(REDACTION_DECIMALS),
            ..self.clone()
        }
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_accepts_boundaries() {
        assert!(Coords::new(90.0, 180.0).check().is_ok());
        assert!(Coords::new(-90.0, -180.0).check().is_ok());
        assert!(Coords::new(0.0, 0.0).check().is_ok());
    }

    #[test]
    fn check_rejects_out_of_range_and_non_finite() {
        assert_eq!(
            Coords::new(90.5, 0.0).check(),
            Err(LocationError::LatitudeOutOfRange(90.5))
        );
        assert_eq!(
            Coords::new(0.0, -180.01).check(),
            Err(LocationError::LongitudeOutOfRange(-180.01))
        );
        assert_eq!(
            Coords::new(f64::NAN, 0.0).check(),
            Err(LocationError::NonFinite)
        );
        assert_eq!(
            Coords::new(0.0, f64::INFINITY).check(),
            Err(LocationError::NonFinite)
        );
    }

    #[test]
    fn redacted_rounds_to_two_decimals_and_keeps_metadata() {
        let mut loc = Location::new(37.33182, -122.03118, 1_700_000_000_000.0);
        loc.mocked = Some(true);
        let red = loc.redacted();
        assert_eq!(red.coords, Coords::new(37.33, -122.03));
        assert_eq!(red.timestamp, loc.timestamp);
        assert_eq!(red.mocked, Some(true));
    }

    #[test]
    fn deserializes_client_payload_with_extra_fields() {
        let raw = r#"{
            "coords": {"latitude": 37.0, "longitude": -122.0, "accuracy": 5.0, "altitude": null},
            "timestamp": 1700000000000
        }"#;
        let loc: Location = serde_json::from_str(raw).unwrap();
        assert_eq!(loc.coords, Coords::new(37.0, -122.0));
        assert_eq!(loc.mocked, None);
    }
}
