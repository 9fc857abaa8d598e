//! Altitude compliance against category-specific minimums.
//!
//! Evaluates each track position's height above the field against the minimum
//! for the aircraft's category. Positions inside the approach/departure
//! exclusion zone (close to the field and low, where aircraft have to be low)
//! are skipped rather than counted as violations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::{FEET_PER_NM, haversine_distance_ft};
use crate::profiles::AircraftCategory;
use crate::track::TrackPosition;

/// Altitude rules for one airfield
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AltitudeRules {
    /// Airfield reference point
    pub field_lat: f64,
    pub field_lon: f64,

    /// Field elevation in feet MSL; AGL = reported MSL minus this
    pub field_elevation_ft: f64,

    /// Minimum AGL by category, feet
    pub helicopter_min_agl_ft: f64,
    pub jet_min_agl_ft: f64,
    pub fixed_wing_min_agl_ft: f64,
    pub unknown_min_agl_ft: f64,

    /// Radius of the approach/departure exclusion zone, nautical miles
    pub exclusion_radius_nm: f64,

    /// AGL ceiling of the exclusion zone, feet: positions below this and
    /// inside the radius are not evaluated
    pub exclusion_agl_ft: f64,
}

impl AltitudeRules {
    /// Default minimums around an airfield reference point
    pub fn for_field(field_lat: f64, field_lon: f64, field_elevation_ft: f64) -> Self {
        Self {
            field_lat,
            field_lon,
            field_elevation_ft,
            helicopter_min_agl_ft: 1_000.0,
            jet_min_agl_ft: 2_000.0,
            fixed_wing_min_agl_ft: 1_500.0,
            unknown_min_agl_ft: 1_000.0,
            exclusion_radius_nm: 3.0,
            exclusion_agl_ft: 1_500.0,
        }
    }

    pub fn min_agl_ft(&self, category: AircraftCategory) -> f64 {
        match category {
            AircraftCategory::Helicopter => self.helicopter_min_agl_ft,
            AircraftCategory::Jet => self.jet_min_agl_ft,
            AircraftCategory::FixedWing => self.fixed_wing_min_agl_ft,
            AircraftCategory::Unknown => self.unknown_min_agl_ft,
        }
    }
}

/// One position found below the applicable minimum
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AltitudeViolation {
    /// Index into the evaluated track
    pub index: usize,

    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,

    /// Height above the field at this position
    pub agl_ft: f64,

    /// How far below the minimum the aircraft was
    pub deficit_ft: f64,
}

/// Summary of a track's altitude compliance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AltitudeComplianceReport {
    pub category: AircraftCategory,
    pub min_required_agl_ft: f64,

    /// Positions evaluated against the minimum (exclusion zone removed)
    pub evaluated_count: usize,

    /// Positions skipped as approach/departure traffic
    pub excluded_count: usize,

    pub compliant_count: usize,

    /// compliant / evaluated; 1.0 for empty or fully excluded tracks
    pub compliance_rate: f64,

    /// Lowest AGL seen among evaluated positions, if any were evaluated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_agl_observed_ft: Option<f64>,

    pub violations: Vec<AltitudeViolation>,
}

/// Checks track altitude against an airfield's category minimums
pub struct AltitudeComplianceChecker {
    rules: AltitudeRules,
}

impl AltitudeComplianceChecker {
    pub fn new(rules: AltitudeRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &AltitudeRules {
        &self.rules
    }

    /// Evaluate a track for one aircraft category.
    ///
    /// AGL is the reported MSL altitude minus the field elevation. Positions
    /// within the exclusion radius of the field and below the exclusion AGL
    /// ceiling are approach/departure traffic and are not evaluated.
    pub fn check(
        &self,
        track: &[TrackPosition],
        category: AircraftCategory,
    ) -> AltitudeComplianceReport {
        let min_agl = self.rules.min_agl_ft(category);
        let exclusion_radius_ft = self.rules.exclusion_radius_nm * FEET_PER_NM;

        let mut evaluated_count = 0;
        let mut excluded_count = 0;
        let mut compliant_count = 0;
        let mut min_agl_observed: Option<f64> = None;
        let mut violations = Vec::new();

        for (index, position) in track.iter().enumerate() {
            let agl_ft = position.altitude_msl_ft - self.rules.field_elevation_ft;

            let field_distance_ft = haversine_distance_ft(
                self.rules.field_lat,
                self.rules.field_lon,
                position.latitude,
                position.longitude,
            );
            if field_distance_ft < exclusion_radius_ft && agl_ft < self.rules.exclusion_agl_ft {
                excluded_count += 1;
                continue;
            }

            evaluated_count += 1;
            min_agl_observed = Some(min_agl_observed.map_or(agl_ft, |m: f64| m.min(agl_ft)));

            if agl_ft >= min_agl {
                compliant_count += 1;
            } else {
                violations.push(AltitudeViolation {
                    index,
                    timestamp: position.timestamp,
                    latitude: position.latitude,
                    longitude: position.longitude,
                    agl_ft,
                    deficit_ft: min_agl - agl_ft,
                });
            }
        }

        let compliance_rate = if evaluated_count > 0 {
            compliant_count as f64 / evaluated_count as f64
        } else {
            1.0
        };

        debug!(
            "Altitude compliance for {:?}: {}/{} compliant, {} excluded, {} violations",
            category,
            compliant_count,
            evaluated_count,
            excluded_count,
            violations.len()
        );

        AltitudeComplianceReport {
            category,
            min_required_agl_ft: min_agl,
            evaluated_count,
            excluded_count,
            compliant_count,
            compliance_rate,
            min_agl_observed_ft: min_agl_observed,
            violations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const FIELD_LAT: f64 = 40.9590;
    const FIELD_LON: f64 = -72.2516;
    const FIELD_ELEVATION_FT: f64 = 55.0;

    fn position(lat: f64, lon: f64, altitude_msl_ft: f64) -> TrackPosition {
        TrackPosition {
            timestamp: Utc.with_ymd_and_hms(2025, 6, 14, 11, 0, 0).unwrap(),
            latitude: lat,
            longitude: lon,
            altitude_msl_ft,
            groundspeed_kts: None,
            heading: None,
        }
    }

    fn checker() -> AltitudeComplianceChecker {
        AltitudeComplianceChecker::new(AltitudeRules::for_field(
            FIELD_LAT,
            FIELD_LON,
            FIELD_ELEVATION_FT,
        ))
    }

    #[test]
    fn test_compliant_track() {
        // Helicopter well above 1000 ft AGL, far from the field
        let track = vec![
            position(40.80, -72.40, 2_055.0),
            position(40.81, -72.41, 2_255.0),
        ];
        let report = checker().check(&track, AircraftCategory::Helicopter);
        assert_eq!(report.evaluated_count, 2);
        assert_eq!(report.compliance_rate, 1.0);
        assert!(report.violations.is_empty());
        assert_eq!(report.min_agl_observed_ft, Some(2_000.0));
    }

    #[test]
    fn test_violation_reports_deficit() {
        // Helicopter at 655 ft MSL = 600 ft AGL, 400 ft below the minimum,
        // well outside the exclusion radius
        let track = vec![position(40.80, -72.40, 655.0)];
        let report = checker().check(&track, AircraftCategory::Helicopter);
        assert_eq!(report.violations.len(), 1);
        let violation = &report.violations[0];
        assert_eq!(violation.agl_ft, 600.0);
        assert_eq!(violation.deficit_ft, 400.0);
        assert_eq!(report.compliance_rate, 0.0);
    }

    #[test]
    fn test_low_positions_near_field_are_excluded() {
        // 500 ft AGL half a mile from the threshold: approach traffic
        let track = vec![position(40.9600, -72.2400, 555.0)];
        let report = checker().check(&track, AircraftCategory::Jet);
        assert_eq!(report.excluded_count, 1);
        assert_eq!(report.evaluated_count, 0);
        assert!(report.violations.is_empty());
        assert_eq!(report.compliance_rate, 1.0);
        assert_eq!(report.min_agl_observed_ft, None);
    }

    #[test]
    fn test_high_positions_near_field_are_evaluated() {
        // Directly over the field but at 3055 ft MSL = 3000 ft AGL: above the
        // exclusion ceiling, so a jet is evaluated (and compliant)
        let track = vec![position(FIELD_LAT, FIELD_LON, 3_055.0)];
        let report = checker().check(&track, AircraftCategory::Jet);
        assert_eq!(report.evaluated_count, 1);
        assert_eq!(report.compliant_count, 1);
    }

    #[test]
    fn test_category_minimums_differ() {
        // 1800 ft AGL far from the field: fine for a helicopter, a violation
        // for a jet
        let track = vec![position(40.80, -72.40, 1_855.0)];
        let heli = checker().check(&track, AircraftCategory::Helicopter);
        assert!(heli.violations.is_empty());
        let jet = checker().check(&track, AircraftCategory::Jet);
        assert_eq!(jet.violations.len(), 1);
        assert_eq!(jet.violations[0].deficit_ft, 200.0);
    }

    #[test]
    fn test_empty_track_is_fully_compliant() {
        let report = checker().check(&[], AircraftCategory::FixedWing);
        assert_eq!(report.compliance_rate, 1.0);
        assert_eq!(report.evaluated_count, 0);
        assert!(report.min_agl_observed_ft.is_none());
    }
}
