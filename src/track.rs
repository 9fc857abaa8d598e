use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a flight is arriving at or departing the field, which selects the
/// approach vs. takeoff certification level as the source noise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightDirection {
    Arrival,
    Departure,
}

/// Single position report from a flight track
///
/// Externally produced (e.g. by a track data provider), read-only, transient
/// per request. Optional fields silently disable the terms that depend on
/// them: a missing heading drops the lateral attenuation term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackPosition {
    /// Time this position was reported
    pub timestamp: DateTime<Utc>,

    /// Latitude in decimal degrees
    pub latitude: f64,

    /// Longitude in decimal degrees
    pub longitude: f64,

    /// Altitude in feet MSL as reported by the track data
    pub altitude_msl_ft: f64,

    /// Ground speed in knots, if reported
    pub groundspeed_kts: Option<f64>,

    /// True heading in degrees, if reported
    pub heading: Option<f64>,
}

/// A configured ground location where noise exposure is evaluated
///
/// The observer set is static per deployment and substitutable: pass whatever
/// list fits the airfield's surroundings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserverLocation {
    /// Stable identifier, e.g. "wainscott-main"
    pub id: String,

    /// Human-readable name for narratives and display
    pub name: String,

    pub latitude: f64,
    pub longitude: f64,
}

impl ObserverLocation {
    pub fn new(id: &str, name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            latitude,
            longitude,
        }
    }
}
