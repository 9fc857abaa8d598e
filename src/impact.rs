//! Per-flight noise impact aggregation.
//!
//! Runs the ground-noise calculator over every (track position x observer)
//! pair, sums any weather adjustment on top, and reduces to flight-level and
//! per-observer summaries. The per-observer fan-out is embarrassingly
//! parallel and runs as a rayon parallel map.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::bearing_deg;
use crate::ground_noise::{GroundNoiseCalculator, round_db};
use crate::profiles::{AircraftNoiseProfile, Confidence, NoiseDataSource};
use crate::track::{FlightDirection, ObserverLocation, TrackPosition};
use crate::weather::{self, TemperatureProfile, WindConditions};

/// Assumed spacing between consecutive track positions. Track providers
/// report at roughly this cadence; exposure durations derived from it are an
/// approximation and are not validated against actual timestamp gaps.
pub const POSITION_INTERVAL_SECONDS: u32 = 5;

/// Exposure thresholds tracked per observer, dB
pub const EXPOSURE_THRESHOLD_DB: f64 = 65.0;
pub const HIGH_EXPOSURE_THRESHOLD_DB: f64 = 75.0;

/// Noise impact at a single observer over a whole flight
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObserverImpact {
    pub observer_id: String,
    pub observer_name: String,

    /// Loudest estimate at this observer over the flight, dB
    pub max_db: f64,

    /// Minimum slant distance over the flight, feet
    pub closest_approach_ft: f64,

    /// Cumulative seconds at or above 65 dB, at the assumed 5 s cadence
    pub seconds_above_65db: u32,

    /// Cumulative seconds at or above 75 dB
    pub seconds_above_75db: u32,
}

/// The slice of profile data callers need alongside an impact, so the UI can
/// show where the numbers came from without a second lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub takeoff_db: f64,
    pub approach_db: f64,
    pub data_source: NoiseDataSource,
    pub confidence: Confidence,
}

impl From<&AircraftNoiseProfile> for ProfileSummary {
    fn from(profile: &AircraftNoiseProfile) -> Self {
        Self {
            manufacturer: profile.manufacturer.clone(),
            model: profile.model.clone(),
            takeoff_db: profile.takeoff_db,
            approach_db: profile.approach_db,
            data_source: profile.data_source,
            confidence: profile.confidence,
        }
    }
}

/// Flight-level noise summary across the configured observer set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightNoiseImpact {
    /// Opaque flight identifier from the track provider
    pub flight_id: String,

    pub aircraft_type: String,
    pub direction: FlightDirection,
    pub profile: ProfileSummary,

    /// Loudest estimate at the primary (first configured) observer, dB
    pub max_ground_db: f64,

    /// Mean estimate at the primary observer over the track, dB
    pub avg_ground_db: f64,

    /// Approximate exposure duration: position count x the assumed 5 s
    /// reporting interval. Not corrected for gaps in the track.
    pub exposure_seconds: u32,

    pub position_count: usize,

    pub observer_impacts: Vec<ObserverImpact>,
}

/// Orchestrates the calculator across a whole track and observer set
pub struct FlightImpactAggregator {
    calculator: GroundNoiseCalculator,
    observers: Vec<ObserverLocation>,
}

impl FlightImpactAggregator {
    pub fn new(calculator: GroundNoiseCalculator, observers: Vec<ObserverLocation>) -> Self {
        Self { calculator, observers }
    }

    pub fn observers(&self) -> &[ObserverLocation] {
        &self.observers
    }

    /// Estimate at one observer for one position, with the weather delta
    /// summed on top of the physics baseline and the result re-floored
    fn adjusted_db(
        &self,
        profile: &AircraftNoiseProfile,
        position: &TrackPosition,
        observer: &ObserverLocation,
        direction: FlightDirection,
        wind: Option<&WindConditions>,
        temperature: Option<&TemperatureProfile>,
    ) -> (f64, f64) {
        let estimate = self
            .calculator
            .estimate_at_position(profile, position, observer, direction);
        let slant_ft = estimate.slant_distance_ft().unwrap_or(0.0);

        let adjustment = if wind.is_some() || temperature.is_some() {
            let bearing = bearing_deg(
                position.latitude,
                position.longitude,
                observer.latitude,
                observer.longitude,
            );
            weather::adjust(wind, temperature, bearing, position.altitude_msl_ft).total_db
        } else {
            0.0
        };

        (round_db((estimate.db + adjustment).max(0.0)), slant_ft)
    }

    /// Aggregate noise impact for an entire flight track.
    ///
    /// Flight-level max/avg are taken against the primary observer (the first
    /// in the configured set); the per-observer breakdown covers all of them.
    /// Empty tracks or an empty observer set produce a zeroed impact rather
    /// than an error.
    pub fn aggregate(
        &self,
        flight_id: &str,
        profile: &AircraftNoiseProfile,
        track: &[TrackPosition],
        direction: FlightDirection,
        wind: Option<&WindConditions>,
        temperature: Option<&TemperatureProfile>,
    ) -> FlightNoiseImpact {
        let observer_impacts: Vec<ObserverImpact> = self
            .observers
            .par_iter()
            .map(|observer| {
                let mut max_db: f64 = 0.0;
                let mut closest_ft = f64::INFINITY;
                let mut seconds_above_65db = 0;
                let mut seconds_above_75db = 0;

                for position in track {
                    let (db, slant_ft) =
                        self.adjusted_db(profile, position, observer, direction, wind, temperature);

                    max_db = max_db.max(db);
                    closest_ft = closest_ft.min(slant_ft);
                    if db >= EXPOSURE_THRESHOLD_DB {
                        seconds_above_65db += POSITION_INTERVAL_SECONDS;
                    }
                    if db >= HIGH_EXPOSURE_THRESHOLD_DB {
                        seconds_above_75db += POSITION_INTERVAL_SECONDS;
                    }
                }

                ObserverImpact {
                    observer_id: observer.id.clone(),
                    observer_name: observer.name.clone(),
                    max_db: round_db(max_db),
                    closest_approach_ft: if closest_ft.is_finite() {
                        closest_ft.round()
                    } else {
                        0.0
                    },
                    seconds_above_65db,
                    seconds_above_75db,
                }
            })
            .collect();

        // Flight-level figures come from the primary observer's series
        let (max_ground_db, avg_ground_db) = match self.observers.first() {
            Some(primary) if !track.is_empty() => {
                let series: Vec<f64> = track
                    .iter()
                    .map(|position| {
                        self.adjusted_db(profile, position, primary, direction, wind, temperature)
                            .0
                    })
                    .collect();
                let max = series.iter().cloned().fold(0.0, f64::max);
                let avg = series.iter().sum::<f64>() / series.len() as f64;
                (round_db(max), round_db(avg))
            }
            _ => (0.0, 0.0),
        };

        debug!(
            "Flight {} ({} {:?}): max {:.1} dB, avg {:.1} dB over {} positions",
            flight_id,
            profile.icao_type,
            direction,
            max_ground_db,
            avg_ground_db,
            track.len()
        );

        FlightNoiseImpact {
            flight_id: flight_id.to_string(),
            aircraft_type: profile.icao_type.clone(),
            direction,
            profile: ProfileSummary::from(profile),
            max_ground_db,
            avg_ground_db,
            exposure_seconds: track.len() as u32 * POSITION_INTERVAL_SECONDS,
            position_count: track.len(),
            observer_impacts,
        }
    }
}

/// Plain-language description of the loudest pass near a chosen observer,
/// e.g. for complaint-response summaries. Returns `None` when the observer is
/// not in the impact's breakdown. Appends a data-quality caveat when the
/// source level was not certified.
pub fn describe_loudest_pass(impact: &FlightNoiseImpact, observer_id: &str) -> Option<String> {
    let observer = impact
        .observer_impacts
        .iter()
        .find(|o| o.observer_id == observer_id)?;

    let phase = match impact.direction {
        FlightDirection::Arrival => "arriving",
        FlightDirection::Departure => "departing",
    };

    let mut sentence = format!(
        "{} aircraft {} reached an estimated {:.1} dB at {}, passing within {:.0} ft.",
        capitalize(phase),
        impact.aircraft_type,
        observer.max_db,
        observer.observer_name,
        observer.closest_approach_ft,
    );

    if impact.profile.data_source != NoiseDataSource::Certified {
        sentence.push_str(&format!(
            " Estimate is based on a category average; no certified noise data for {}.",
            impact.aircraft_type
        ));
    }

    Some(sentence)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
