//! Core propagation physics: source level at the certification reference
//! distance down to an estimated ground level at an observer.
//!
//! The model is the certification-based one used by airport noise dashboards:
//! inverse-square geometric spreading from the 1000 ft reference, a fixed
//! broadband atmospheric absorption coefficient, and the SAE-AIR-5662 lateral
//! attenuation curve for observers off to the side of the flight path.
//! Everything here is pure, deterministic, and total: degenerate geometry is
//! clamped before any logarithm and results are floored at 0 dB.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::geometry::{haversine_distance_ft, lateral_angle_deg, slant_distance_ft};
use crate::profiles::{AircraftNoiseProfile, Confidence, NoiseDataSource};
use crate::track::{FlightDirection, ObserverLocation, TrackPosition};

/// Certification measurement reference distance (1000 ft = 304.8 m)
pub const CERTIFICATION_REFERENCE_DISTANCE_FT: f64 = 1000.0;

/// Broadband A-weighted atmospheric absorption, dB per 1000 ft of path
pub const ATMOSPHERIC_ABSORPTION_DB_PER_1000_FT: f64 = 0.5;

/// Floor on the acoustic path length, preventing singular spreading loss when
/// the aircraft is essentially on top of the observer
pub const MIN_SLANT_DISTANCE_FT: f64 = 100.0;

/// Lateral attenuation as a function of the angle between the flight path and
/// the observer, sampled at fixed 10-degree steps from 0 (directly below, no
/// extra loss) to 90 degrees (abeam, full loss). Values between samples are
/// linearly interpolated.
///
/// Passed as configuration rather than hard-coded so the physics can be tested
/// against alternative curves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LateralAttenuationTable {
    /// Attenuation in dB at 0, 10, 20, ... 90 degrees
    pub attenuation_db: [f64; 10],
}

impl Default for LateralAttenuationTable {
    /// SAE-AIR-5662 curve
    fn default() -> Self {
        Self {
            attenuation_db: [0.0, 0.5, 1.2, 2.5, 4.0, 5.5, 7.0, 8.5, 9.5, 10.0],
        }
    }
}

impl LateralAttenuationTable {
    /// Attenuation for an arbitrary lateral angle, linearly interpolated
    /// between the 10-degree samples. Angles outside 0-90 are clamped.
    pub fn attenuation_at(&self, angle_deg: f64) -> f64 {
        let angle = angle_deg.abs().clamp(0.0, 90.0);
        let lower_idx = ((angle / 10.0).floor() as usize).min(8);
        let lower_angle = lower_idx as f64 * 10.0;
        let ratio = (angle - lower_angle) / 10.0;
        let lower = self.attenuation_db[lower_idx];
        let upper = self.attenuation_db[lower_idx + 1];
        lower + ratio * (upper - lower)
    }
}

/// Breakdown of how a ground estimate was derived, for diagnostics and display
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoiseDecomposition {
    /// Source level at the certification reference distance
    pub source_db: f64,

    /// Inverse-square spreading loss relative to the 1000 ft reference
    pub geometric_db: f64,

    /// Broadband atmospheric absorption along the slant path
    pub atmospheric_db: f64,

    /// Lateral attenuation; 0 when no heading was available
    pub lateral_db: f64,

    pub slant_distance_ft: f64,
    pub horizontal_distance_ft: f64,
}

/// Ground-level noise estimate at a specific observer location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoiseEstimate {
    /// Estimated LAmax at the observer, floored at 0 and rounded to 0.1 dB
    pub db: f64,

    /// Provenance inherited from the profile that supplied the source level
    pub source: NoiseDataSource,
    pub confidence: Confidence,

    /// Advisory annotation for UI flagging, e.g. when the source level is a
    /// category average rather than certified data. Never a failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub decomposition: Option<NoiseDecomposition>,
}

impl NoiseEstimate {
    /// Slant distance from the decomposition, when present
    pub fn slant_distance_ft(&self) -> Option<f64> {
        self.decomposition.as_ref().map(|d| d.slant_distance_ft)
    }
}

/// Round to one decimal place, matching the precision the model actually has
pub(crate) fn round_db(db: f64) -> f64 {
    (db * 10.0).round() / 10.0
}

/// Physics core mapping a source level and relative geometry to a ground-level
/// estimate. Stateless apart from the lateral attenuation curve it was
/// configured with; safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct GroundNoiseCalculator {
    lateral_table: LateralAttenuationTable,
}

impl GroundNoiseCalculator {
    pub fn new(lateral_table: LateralAttenuationTable) -> Self {
        Self { lateral_table }
    }

    /// Ground-level estimate at an observer from a source level at altitude.
    ///
    /// `altitude_agl_ft` is height above the observer's ground. When `heading`
    /// is `None` the lateral term is omitted (treated as 0). The returned
    /// estimate always carries the full decomposition; source/confidence are
    /// placeholders (`Certified`/`High`) until a profile stamps them via
    /// [`estimate_at_position`](Self::estimate_at_position).
    pub fn calculate(
        &self,
        source_db: f64,
        altitude_agl_ft: f64,
        observer_lat: f64,
        observer_lon: f64,
        aircraft_lat: f64,
        aircraft_lon: f64,
        heading: Option<f64>,
    ) -> NoiseEstimate {
        let horizontal_ft =
            haversine_distance_ft(observer_lat, observer_lon, aircraft_lat, aircraft_lon);
        let slant_ft = slant_distance_ft(altitude_agl_ft, horizontal_ft);

        // Clamp before the logarithm so an aircraft directly overhead at zero
        // altitude cannot produce a non-finite result
        let effective_slant_ft = slant_ft.max(MIN_SLANT_DISTANCE_FT);

        let geometric_db =
            20.0 * (effective_slant_ft / CERTIFICATION_REFERENCE_DISTANCE_FT).log10();
        let atmospheric_db =
            (effective_slant_ft / 1000.0) * ATMOSPHERIC_ABSORPTION_DB_PER_1000_FT;

        let lateral_db = match heading {
            Some(heading) => {
                let angle = lateral_angle_deg(
                    observer_lat,
                    observer_lon,
                    aircraft_lat,
                    aircraft_lon,
                    heading,
                );
                self.lateral_table.attenuation_at(angle)
            }
            None => 0.0,
        };

        let ground_db = (source_db - geometric_db - atmospheric_db - lateral_db).max(0.0);

        trace!(
            "Ground noise: source={:.1} slant={:.0}ft geo={:.1} atm={:.1} lat={:.1} -> {:.1} dB",
            source_db, slant_ft, geometric_db, atmospheric_db, lateral_db, ground_db
        );

        NoiseEstimate {
            db: round_db(ground_db),
            source: NoiseDataSource::Certified,
            confidence: Confidence::High,
            warning: None,
            decomposition: Some(NoiseDecomposition {
                source_db,
                geometric_db: round_db(geometric_db),
                atmospheric_db: round_db(atmospheric_db),
                lateral_db: round_db(lateral_db),
                slant_distance_ft: slant_ft.round(),
                horizontal_distance_ft: horizontal_ft.round(),
            }),
        }
    }

    /// Estimate at an observer for a single track position, using the profile
    /// to select the source level for the flight phase and stamp provenance.
    /// Non-certified profiles get an advisory warning on the estimate.
    pub fn estimate_at_position(
        &self,
        profile: &AircraftNoiseProfile,
        position: &TrackPosition,
        observer: &ObserverLocation,
        direction: FlightDirection,
    ) -> NoiseEstimate {
        let mut estimate = self.calculate(
            profile.source_db(direction),
            position.altitude_msl_ft,
            observer.latitude,
            observer.longitude,
            position.latitude,
            position.longitude,
            position.heading,
        );

        estimate.source = profile.data_source;
        estimate.confidence = profile.confidence;
        if profile.data_source != NoiseDataSource::Certified {
            estimate.warning = Some(format!(
                "No certified noise data for {}. Using {} average.",
                profile.icao_type, profile.category
            ));
        }

        estimate
    }

    /// Coarse estimate with no track data, assuming the aircraft passes
    /// directly overhead at the given altitude. Only the geometric term
    /// applies; useful for headline figures before a track is available.
    pub fn simple_overhead_estimate(
        &self,
        profile: &AircraftNoiseProfile,
        altitude_ft: f64,
        direction: FlightDirection,
    ) -> NoiseEstimate {
        let source_db = profile.source_db(direction);
        let geometric_db = 20.0
            * (altitude_ft.max(MIN_SLANT_DISTANCE_FT) / CERTIFICATION_REFERENCE_DISTANCE_FT)
                .log10();
        let ground_db = (source_db - geometric_db).max(0.0);

        NoiseEstimate {
            db: round_db(ground_db),
            source: profile.data_source,
            confidence: profile.confidence,
            warning: (profile.data_source != NoiseDataSource::Certified)
                .then(|| format!("Using category estimate for {}", profile.icao_type)),
            decomposition: None,
        }
    }

    /// Scalar kernel for the estimate directly below the flight path: no
    /// lateral term, plain distances in. This is the monotonically decreasing
    /// function the footprint generator root-finds against.
    pub fn ground_db_directly_below(
        &self,
        source_db: f64,
        altitude_ft: f64,
        horizontal_ft: f64,
    ) -> f64 {
        let slant_ft = slant_distance_ft(altitude_ft, horizontal_ft).max(MIN_SLANT_DISTANCE_FT);
        let geometric_db = 20.0 * (slant_ft / CERTIFICATION_REFERENCE_DISTANCE_FT).log10();
        let atmospheric_db = (slant_ft / 1000.0) * ATMOSPHERIC_ABSORPTION_DB_PER_1000_FT;
        (source_db - geometric_db - atmospheric_db).max(0.0)
    }
}
