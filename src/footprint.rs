//! Spatial noise-footprint geometry.
//!
//! For each contour band, walks the (downsampled) track and root-finds the
//! horizontal distance at which the directly-below ground estimate drops to
//! the band's minimum, then offsets each point perpendicular to the local
//! track bearing on both sides to form a ribbon polygon. The output is plain
//! lat/lon geometry plus a GeoJSON view; rendering belongs to the caller.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::{bearing_deg, offset_position};
use crate::ground_noise::{GroundNoiseCalculator, round_db};
use crate::profiles::AircraftNoiseProfile;
use crate::track::{FlightDirection, TrackPosition};

/// Upper bound on the corridor half-width search, feet. Generous: even a
/// 94 dB heavy-jet source falls below every band minimum well inside this.
const SEARCH_MAX_DISTANCE_FT: f64 = 50_000.0;

/// Bisection iterations; resolves the search interval to well under a foot
const SEARCH_ITERATIONS: u32 = 30;

/// Cap on how many track points feed the ribbon builder; longer tracks are
/// downsampled with a uniform stride
const MAX_FOOTPRINT_POINTS: usize = 60;

/// A dB band rendered as one corridor polygon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContourBand {
    /// Lower edge of the band, dB
    pub min_db: f64,

    /// Display label, e.g. "70-80 dB"
    pub label: String,

    /// Display color as a hex string
    pub color: String,

    /// Cap on the corridor half-width for this band, feet
    pub max_width_ft: f64,
}

impl ContourBand {
    pub fn new(min_db: f64, label: &str, color: &str, max_width_ft: f64) -> Self {
        Self {
            min_db,
            label: label.to_string(),
            color: color.to_string(),
            max_width_ft,
        }
    }
}

/// Default descending band set for footprint display
pub fn default_contour_bands() -> Vec<ContourBand> {
    vec![
        ContourBand::new(80.0, ">80 dB", "#d73027", 3_000.0),
        ContourBand::new(70.0, "70-80 dB", "#fc8d59", 6_000.0),
        ContourBand::new(60.0, "60-70 dB", "#fee08b", 12_000.0),
        ContourBand::new(50.0, "50-60 dB", "#91cf60", 20_000.0),
    ]
}

/// A simple lat/lon pair for footprint geometry
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// One band's ribbon polygon along the track
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContourRibbon {
    pub band: ContourBand,

    /// Closed ring: left-side offsets in track order, then right-side offsets
    /// reversed, then the first point repeated
    pub ring: Vec<GeoPoint>,
}

/// Ground level directly below one kept track point, for the simplified
/// per-point dB series returned alongside the ribbons
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FootprintSample {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_ft: f64,
    pub db: f64,
}

/// Complete footprint for one flight: all bands' ribbons plus the dB series
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NoiseFootprint {
    pub ribbons: Vec<ContourRibbon>,
    pub samples: Vec<FootprintSample>,
}

/// Builds contour-band geometry from a track using the ground-noise kernel
pub struct FootprintGenerator {
    calculator: GroundNoiseCalculator,
    bands: Vec<ContourBand>,
}

impl FootprintGenerator {
    pub fn new(calculator: GroundNoiseCalculator, bands: Vec<ContourBand>) -> Self {
        Self { calculator, bands }
    }

    pub fn with_default_bands(calculator: GroundNoiseCalculator) -> Self {
        Self::new(calculator, default_contour_bands())
    }

    /// Horizontal distance at which the directly-below estimate falls to
    /// `min_db`, found by bisection on the monotonically decreasing kernel.
    /// Returns 0 when the level directly below is already under the minimum.
    fn band_half_width_ft(&self, source_db: f64, altitude_ft: f64, min_db: f64) -> f64 {
        if self
            .calculator
            .ground_db_directly_below(source_db, altitude_ft, 0.0)
            < min_db
        {
            return 0.0;
        }
        if self
            .calculator
            .ground_db_directly_below(source_db, altitude_ft, SEARCH_MAX_DISTANCE_FT)
            >= min_db
        {
            return SEARCH_MAX_DISTANCE_FT;
        }

        let mut low = 0.0;
        let mut high = SEARCH_MAX_DISTANCE_FT;
        for _ in 0..SEARCH_ITERATIONS {
            let mid = (low + high) / 2.0;
            if self
                .calculator
                .ground_db_directly_below(source_db, altitude_ft, mid)
                >= min_db
            {
                low = mid;
            } else {
                high = mid;
            }
        }
        (low + high) / 2.0
    }

    /// Bearing of the track at index `i`, taken from its neighbors
    fn local_bearing_deg(points: &[TrackPosition], i: usize) -> f64 {
        let (from, to) = if i + 1 < points.len() {
            (&points[i], &points[i + 1])
        } else {
            (&points[i - 1], &points[i])
        };
        bearing_deg(from.latitude, from.longitude, to.latitude, to.longitude)
    }

    /// Generate footprint geometry for a flight track.
    ///
    /// Tracks with fewer than two positions return an empty footprint rather
    /// than an error; there is no corridor without a direction of travel.
    pub fn generate(
        &self,
        profile: &AircraftNoiseProfile,
        track: &[TrackPosition],
        direction: FlightDirection,
    ) -> NoiseFootprint {
        if track.len() < 2 {
            debug!(
                "Track has {} position(s), returning empty footprint",
                track.len()
            );
            return NoiseFootprint::default();
        }

        let source_db = profile.source_db(direction);

        // Uniform-stride downsample; always keeps the first point and most of
        // the shape, which is enough for display-scale corridors
        let stride = track.len().div_ceil(MAX_FOOTPRINT_POINTS);
        let points: Vec<TrackPosition> = track.iter().step_by(stride).cloned().collect();

        let samples: Vec<FootprintSample> = points
            .iter()
            .map(|p| FootprintSample {
                latitude: p.latitude,
                longitude: p.longitude,
                altitude_ft: p.altitude_msl_ft,
                db: round_db(self.calculator.ground_db_directly_below(
                    source_db,
                    p.altitude_msl_ft,
                    0.0,
                )),
            })
            .collect();

        let mut ribbons = Vec::with_capacity(self.bands.len());
        for band in &self.bands {
            let mut left = Vec::with_capacity(points.len());
            let mut right = Vec::with_capacity(points.len());

            for (i, point) in points.iter().enumerate() {
                let half_width = self
                    .band_half_width_ft(source_db, point.altitude_msl_ft, band.min_db)
                    .min(band.max_width_ft);

                let track_bearing = Self::local_bearing_deg(&points, i);
                let (left_lat, left_lon) = offset_position(
                    point.latitude,
                    point.longitude,
                    (track_bearing + 270.0) % 360.0,
                    half_width,
                );
                let (right_lat, right_lon) = offset_position(
                    point.latitude,
                    point.longitude,
                    (track_bearing + 90.0) % 360.0,
                    half_width,
                );
                left.push(GeoPoint { latitude: left_lat, longitude: left_lon });
                right.push(GeoPoint { latitude: right_lat, longitude: right_lon });
            }

            // Left side forward, right side back, closed
            let mut ring = left;
            ring.extend(right.into_iter().rev());
            if let Some(first) = ring.first().copied() {
                ring.push(first);
            }

            ribbons.push(ContourRibbon { band: band.clone(), ring });
        }

        debug!(
            "Generated footprint for {}: {} bands over {} points ({} raw)",
            profile.icao_type,
            ribbons.len(),
            points.len(),
            track.len()
        );

        NoiseFootprint { ribbons, samples }
    }
}

/// Render a footprint as a GeoJSON FeatureCollection: one Polygon feature per
/// band ribbon, one Point feature per dB sample. Coordinates are
/// [longitude, latitude] per the GeoJSON spec.
pub fn to_geojson(footprint: &NoiseFootprint) -> serde_json::Value {
    let mut features: Vec<serde_json::Value> = footprint
        .ribbons
        .iter()
        .map(|ribbon| {
            let ring: Vec<[f64; 2]> = ribbon
                .ring
                .iter()
                .map(|p| [p.longitude, p.latitude])
                .collect();
            serde_json::json!({
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [ring]
                },
                "properties": {
                    "minDb": ribbon.band.min_db,
                    "label": ribbon.band.label,
                    "color": ribbon.band.color
                }
            })
        })
        .collect();

    features.extend(footprint.samples.iter().map(|sample| {
        serde_json::json!({
            "type": "Feature",
            "geometry": {
                "type": "Point",
                "coordinates": [sample.longitude, sample.latitude]
            },
            "properties": {
                "db": sample.db,
                "altitudeFt": sample.altitude_ft
            }
        })
    }));

    serde_json::json!({
        "type": "FeatureCollection",
        "features": features
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::{AircraftCategory, NoiseProfileRepository, StaticProfileRepository};
    use chrono::{TimeZone, Utc};

    fn position(lat: f64, lon: f64, altitude_ft: f64) -> TrackPosition {
        TrackPosition {
            timestamp: Utc.with_ymd_and_hms(2025, 6, 14, 9, 30, 0).unwrap(),
            latitude: lat,
            longitude: lon,
            altitude_msl_ft: altitude_ft,
            groundspeed_kts: None,
            heading: None,
        }
    }

    fn jet_profile() -> AircraftNoiseProfile {
        StaticProfileRepository::builtin().get_profile("GLF5", AircraftCategory::Jet)
    }

    fn generator() -> FootprintGenerator {
        FootprintGenerator::with_default_bands(GroundNoiseCalculator::default())
    }

    #[test]
    fn test_short_track_returns_empty() {
        let generator = generator();
        let profile = jet_profile();
        let empty = generator.generate(&profile, &[], FlightDirection::Departure);
        assert!(empty.ribbons.is_empty());
        assert!(empty.samples.is_empty());

        let single = generator.generate(
            &profile,
            &[position(40.95, -72.25, 1500.0)],
            FlightDirection::Departure,
        );
        assert!(single.ribbons.is_empty());
    }

    #[test]
    fn test_two_point_track_produces_one_ribbon_per_band() {
        let track = vec![
            position(40.9590, -72.2516, 1200.0),
            position(40.9590, -72.2316, 1400.0),
        ];
        let footprint = generator().generate(&jet_profile(), &track, FlightDirection::Departure);

        assert_eq!(footprint.ribbons.len(), default_contour_bands().len());
        for ribbon in &footprint.ribbons {
            // 2 left + 2 right + closing point
            assert_eq!(ribbon.ring.len(), 5);
            let first = ribbon.ring.first().unwrap();
            let last = ribbon.ring.last().unwrap();
            assert_eq!(first.latitude, last.latitude);
            assert_eq!(first.longitude, last.longitude);
        }
        assert_eq!(footprint.samples.len(), 2);
        // 88 dB jet at 1200 ft is loud directly below
        assert!(footprint.samples[0].db > 80.0);
    }

    /// Distance-based on-segment check in degree space; tolerance ~0.4 ft
    fn point_on_segment(p: &GeoPoint, a: &GeoPoint, b: &GeoPoint) -> bool {
        let abx = b.longitude - a.longitude;
        let aby = b.latitude - a.latitude;
        let apx = p.longitude - a.longitude;
        let apy = p.latitude - a.latitude;
        let len_sq = abx * abx + aby * aby;
        let t = if len_sq > 0.0 {
            ((apx * abx + apy * aby) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let dx = p.longitude - (a.longitude + t * abx);
        let dy = p.latitude - (a.latitude + t * aby);
        (dx * dx + dy * dy).sqrt() < 1e-6
    }

    /// Ray-casting point-in-polygon over a closed ring; points on an edge
    /// count as contained
    fn ring_contains(ring: &[GeoPoint], p: &GeoPoint) -> bool {
        for window in ring.windows(2) {
            if point_on_segment(p, &window[0], &window[1]) {
                return true;
            }
        }
        let mut inside = false;
        for window in ring.windows(2) {
            let (a, b) = (&window[0], &window[1]);
            if (a.latitude > p.latitude) != (b.latitude > p.latitude) {
                let cross_lon = (b.longitude - a.longitude) * (p.latitude - a.latitude)
                    / (b.latitude - a.latitude)
                    + a.longitude;
                if p.longitude < cross_lon {
                    inside = !inside;
                }
            }
        }
        inside
    }

    fn orientation(a: &GeoPoint, b: &GeoPoint, c: &GeoPoint) -> f64 {
        (b.longitude - a.longitude) * (c.latitude - a.latitude)
            - (b.latitude - a.latitude) * (c.longitude - a.longitude)
    }

    /// True only for a proper crossing (shared endpoints do not count)
    fn segments_cross(a: &GeoPoint, b: &GeoPoint, c: &GeoPoint, d: &GeoPoint) -> bool {
        let o1 = orientation(a, b, c);
        let o2 = orientation(a, b, d);
        let o3 = orientation(c, d, a);
        let o4 = orientation(c, d, b);
        o1 * o2 < 0.0 && o3 * o4 < 0.0
    }

    #[test]
    fn test_two_point_ribbons_contain_qualifying_samples() {
        let track = vec![
            position(40.9590, -72.2516, 1200.0),
            position(40.9590, -72.2316, 1400.0),
        ];
        let footprint = generator().generate(&jet_profile(), &track, FlightDirection::Departure);
        assert_eq!(footprint.ribbons.len(), default_contour_bands().len());

        for ribbon in &footprint.ribbons {
            // No two non-adjacent edges of the ring cross each other
            let edge_count = ribbon.ring.len() - 1;
            for i in 0..edge_count {
                for j in (i + 2)..edge_count {
                    // First and last edge share the closing vertex
                    if i == 0 && j == edge_count - 1 {
                        continue;
                    }
                    assert!(
                        !segments_cross(
                            &ribbon.ring[i],
                            &ribbon.ring[i + 1],
                            &ribbon.ring[j],
                            &ribbon.ring[j + 1],
                        ),
                        "{} ring self-intersects at edges {} and {}",
                        ribbon.band.label,
                        i,
                        j
                    );
                }
            }

            // Every sample at or above the band minimum lies within (or on)
            // the band's ring
            for sample in &footprint.samples {
                if sample.db >= ribbon.band.min_db {
                    let p = GeoPoint {
                        latitude: sample.latitude,
                        longitude: sample.longitude,
                    };
                    assert!(
                        ring_contains(&ribbon.ring, &p),
                        "{:.1} dB sample outside the {} ring",
                        sample.db,
                        ribbon.band.label
                    );
                }
            }
        }
    }

    #[test]
    fn test_interior_samples_are_strictly_inside_ribbon() {
        // A 3-point track: the middle sample sits between the left and right
        // offset chains, not on an end edge
        let track = vec![
            position(40.9590, -72.2516, 1200.0),
            position(40.9590, -72.2416, 1300.0),
            position(40.9590, -72.2316, 1400.0),
        ];
        let footprint = generator().generate(&jet_profile(), &track, FlightDirection::Departure);
        let middle = &footprint.samples[1];
        for ribbon in &footprint.ribbons {
            if middle.db >= ribbon.band.min_db {
                let p = GeoPoint {
                    latitude: middle.latitude,
                    longitude: middle.longitude,
                };
                assert!(ring_contains(&ribbon.ring, &p));
            }
        }
    }

    #[test]
    fn test_band_widths_nest() {
        // Lower-dB bands must reach at least as far out as higher-dB bands
        let generator = generator();
        let w80 = generator.band_half_width_ft(88.0, 1200.0, 80.0);
        let w70 = generator.band_half_width_ft(88.0, 1200.0, 70.0);
        let w60 = generator.band_half_width_ft(88.0, 1200.0, 60.0);
        let w50 = generator.band_half_width_ft(88.0, 1200.0, 50.0);
        assert!(w80 <= w70 && w70 <= w60 && w60 <= w50);
        assert!(w50 < SEARCH_MAX_DISTANCE_FT);
    }

    #[test]
    fn test_bisection_converges_at_threshold() {
        let generator = generator();
        let calc = GroundNoiseCalculator::default();
        let width = generator.band_half_width_ft(88.0, 1500.0, 60.0);
        // The level at the found width straddles the threshold tightly
        let at_width = calc.ground_db_directly_below(88.0, 1500.0, width);
        assert!((at_width - 60.0).abs() < 0.01, "got {} at {}", at_width, width);
    }

    #[test]
    fn test_worst_case_source_stays_in_search_bounds() {
        // Heaviest jet in the category table against the quietest band edge
        let generator = generator();
        let width = generator.band_half_width_ft(94.0, 500.0, 50.0);
        assert!(width < SEARCH_MAX_DISTANCE_FT);
        assert!(width > 0.0);
    }

    #[test]
    fn test_quiet_aircraft_high_up_gets_zero_width() {
        // 72 dB source at 25,000 ft is already below 80 dB directly beneath
        let generator = generator();
        assert_eq!(generator.band_half_width_ft(72.0, 25_000.0, 80.0), 0.0);
    }

    #[test]
    fn test_band_cap_limits_width() {
        let track = vec![
            position(40.9590, -72.2516, 1200.0),
            position(40.9590, -72.2316, 1200.0),
        ];
        let footprint = generator().generate(&jet_profile(), &track, FlightDirection::Departure);
        // The 50 dB ribbon is capped at 20,000 ft half-width; its ring points
        // stay within that distance of the track
        let wide = footprint
            .ribbons
            .iter()
            .find(|r| r.band.min_db == 50.0)
            .unwrap();
        for p in &wide.ring {
            let d = crate::geometry::haversine_distance_ft(
                40.9590, -72.2516, p.latitude, p.longitude,
            );
            // Within cap plus the along-track extent
            assert!(d < 20_000.0 + 6_000.0, "ring point {} ft out", d);
        }
    }

    #[test]
    fn test_long_track_is_downsampled() {
        let track: Vec<TrackPosition> = (0..300)
            .map(|i| position(40.9, -72.4 + i as f64 * 0.0005, 1500.0))
            .collect();
        let footprint = generator().generate(&jet_profile(), &track, FlightDirection::Arrival);
        assert!(footprint.samples.len() <= MAX_FOOTPRINT_POINTS);
        assert!(footprint.samples.len() >= MAX_FOOTPRINT_POINTS / 2);
    }

    #[test]
    fn test_geojson_structure() {
        let track = vec![
            position(40.9590, -72.2516, 1200.0),
            position(40.9590, -72.2316, 1400.0),
        ];
        let footprint = generator().generate(&jet_profile(), &track, FlightDirection::Departure);
        let geojson = to_geojson(&footprint);

        assert_eq!(geojson["type"], "FeatureCollection");
        let features = geojson["features"].as_array().unwrap();
        assert_eq!(features.len(), footprint.ribbons.len() + footprint.samples.len());
        assert_eq!(features[0]["geometry"]["type"], "Polygon");
        assert!(features[0]["properties"]["label"].is_string());
        let last = features.last().unwrap();
        assert_eq!(last["geometry"]["type"], "Point");
    }
}
