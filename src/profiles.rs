//! Aircraft noise certification profiles and their resolution chain.
//!
//! Profiles come from a static certification table (EASA-style LAmax levels at
//! the 1000 ft reference distance). Resolution is total: unknown types fall
//! back to a category average, and an unknown category falls back to a
//! lowest-confidence generic profile. Nothing here ever fails.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Broad airframe category used for fallback noise levels and altitude rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AircraftCategory {
    Helicopter,
    Jet,
    FixedWing,
    Unknown,
}

impl FromStr for AircraftCategory {
    type Err = std::convert::Infallible;

    /// Total over all inputs: unrecognized strings map to `Unknown`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "helicopter" | "rotorcraft" => AircraftCategory::Helicopter,
            "jet" => AircraftCategory::Jet,
            "fixed_wing" | "piston" | "turboprop" => AircraftCategory::FixedWing,
            _ => AircraftCategory::Unknown,
        })
    }
}

impl std::fmt::Display for AircraftCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AircraftCategory::Helicopter => write!(f, "helicopter"),
            AircraftCategory::Jet => write!(f, "jet"),
            AircraftCategory::FixedWing => write!(f, "fixed_wing"),
            AircraftCategory::Unknown => write!(f, "unknown"),
        }
    }
}

/// Weight class within a category, for the fallback average table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightClass {
    Light,
    Medium,
    Heavy,
}

/// Provenance of a profile's noise levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseDataSource {
    /// Taken from a published certification record
    Certified,
    /// Estimated from the category average table
    CategoryEstimate,
    /// Neither the type nor its category is known
    Unverified,
}

/// Confidence in a profile or estimate, ordered high to low so that
/// `Certified > CategoryEstimate > Unverified` maps onto `High > Medium > Low`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Noise certification data for an aircraft type
///
/// Levels are LAmax in dB at the 1000 ft certification reference distance.
/// Immutable reference data, loaded once and keyed by ICAO type code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AircraftNoiseProfile {
    /// ICAO type designator, e.g. "S76", "GLF5"
    pub icao_type: String,

    pub manufacturer: Option<String>,
    pub model: Option<String>,

    pub category: AircraftCategory,

    /// LAmax at 1000 ft during takeoff
    pub takeoff_db: f64,

    /// LAmax at 1000 ft during approach
    pub approach_db: f64,

    /// Certified EPNL triple, when the certification record carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lateral_epnl: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flyover_epnl: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approach_epnl: Option<f64>,

    pub data_source: NoiseDataSource,
    pub confidence: Confidence,
}

impl AircraftNoiseProfile {
    /// Source level for the given flight phase
    pub fn source_db(&self, direction: crate::track::FlightDirection) -> f64 {
        match direction {
            crate::track::FlightDirection::Arrival => self.approach_db,
            crate::track::FlightDirection::Departure => self.takeoff_db,
        }
    }
}

/// Category average LAmax at the 1000 ft reference, by weight class.
/// The `default` entry is the medium class except for `Unknown`, which has a
/// single generic level.
struct CategoryAverages {
    default: f64,
    light: f64,
    medium: f64,
    heavy: f64,
}

static CATEGORY_AVERAGES: Lazy<HashMap<AircraftCategory, CategoryAverages>> = Lazy::new(|| {
    HashMap::from([
        (
            AircraftCategory::Helicopter,
            CategoryAverages { default: 84.0, light: 78.0, medium: 84.0, heavy: 90.0 },
        ),
        (
            AircraftCategory::Jet,
            CategoryAverages { default: 88.0, light: 82.0, medium: 88.0, heavy: 94.0 },
        ),
        (
            AircraftCategory::FixedWing,
            CategoryAverages { default: 76.0, light: 72.0, medium: 76.0, heavy: 82.0 },
        ),
        (
            AircraftCategory::Unknown,
            CategoryAverages { default: 80.0, light: 80.0, medium: 80.0, heavy: 80.0 },
        ),
    ])
});

/// Spread between takeoff and approach levels assumed for estimated profiles
const ESTIMATE_APPROACH_OFFSET_DB: f64 = 4.0;

/// Average takeoff LAmax at 1000 ft for a category, optionally narrowed by
/// weight class
pub fn category_average_db(category: AircraftCategory, weight_class: Option<WeightClass>) -> f64 {
    let averages = &CATEGORY_AVERAGES[&category];
    match weight_class {
        Some(WeightClass::Light) => averages.light,
        Some(WeightClass::Medium) => averages.medium,
        Some(WeightClass::Heavy) => averages.heavy,
        None => averages.default,
    }
}

/// Source of aircraft noise profiles, injected wherever a type code has to be
/// resolved so deployments can swap certification tables without touching the
/// physics
pub trait NoiseProfileRepository: Send + Sync {
    /// Resolve a profile for an ICAO type code. Total over all inputs: unknown
    /// types fall back to the average for `category` (supplied by the caller's
    /// classifier), and an unknown category falls back to a generic
    /// lowest-confidence profile.
    fn get_profile(&self, icao_type: &str, category: AircraftCategory) -> AircraftNoiseProfile;
}

/// In-memory profile table backed by a `HashMap`, the standard repository for
/// deployments that load a certification file at startup
#[derive(Debug, Default)]
pub struct StaticProfileRepository {
    profiles: HashMap<String, AircraftNoiseProfile>,
}

/// On-disk shape of the certification table: `{"mappings": {"S76": {...}}}`
#[derive(Debug, Deserialize)]
struct CertificationFile {
    mappings: HashMap<String, CertificationEntry>,
}

#[derive(Debug, Deserialize)]
struct CertificationEntry {
    easa_manufacturer: Option<String>,
    easa_model: Option<String>,
    category: Option<String>,
    takeoff_db: Option<f64>,
    approach_db: Option<f64>,
    lateral_epnl: Option<f64>,
    flyover_epnl: Option<f64>,
    approach_epnl: Option<f64>,
}

impl StaticProfileRepository {
    pub fn new(profiles: Vec<AircraftNoiseProfile>) -> Self {
        Self {
            profiles: profiles
                .into_iter()
                .map(|p| (p.icao_type.to_ascii_uppercase(), p))
                .collect(),
        }
    }

    /// Empty table: every lookup resolves through the category averages.
    /// Useful for tests and for deployments without a certification file.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Load a certification table from a JSON file in the
    /// `{"mappings": {ICAO: {...}}}` shape. Entries missing noise levels are
    /// skipped with a warning rather than failing the load.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading noise certification table from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read certification table {}", path.display()))?;
        let file: CertificationFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse certification table {}", path.display()))?;

        let mut profiles = HashMap::new();
        for (icao, entry) in file.mappings {
            let icao = icao.to_ascii_uppercase();
            let (Some(takeoff_db), Some(approach_db)) = (entry.takeoff_db, entry.approach_db)
            else {
                warn!("Skipping certification entry {} with missing noise levels", icao);
                continue;
            };
            let category = entry
                .category
                .as_deref()
                .map(|c| c.parse().unwrap_or(AircraftCategory::Unknown))
                .unwrap_or(AircraftCategory::Unknown);

            profiles.insert(
                icao.clone(),
                AircraftNoiseProfile {
                    icao_type: icao,
                    manufacturer: entry.easa_manufacturer,
                    model: entry.easa_model,
                    category,
                    takeoff_db,
                    approach_db,
                    lateral_epnl: entry.lateral_epnl,
                    flyover_epnl: entry.flyover_epnl,
                    approach_epnl: entry.approach_epnl,
                    data_source: NoiseDataSource::Certified,
                    confidence: Confidence::High,
                },
            );
        }

        info!("Loaded {} certified noise profiles", profiles.len());
        Ok(Self { profiles })
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl NoiseProfileRepository for StaticProfileRepository {
    fn get_profile(&self, icao_type: &str, category: AircraftCategory) -> AircraftNoiseProfile {
        let icao = icao_type.trim().to_ascii_uppercase();

        if let Some(profile) = self.profiles.get(&icao) {
            return profile.clone();
        }

        // No certification record: estimate from the category average. When
        // the category itself is unknown the profile is tagged unverified.
        let takeoff_db = category_average_db(category, None);
        let data_source = if category == AircraftCategory::Unknown {
            NoiseDataSource::Unverified
        } else {
            NoiseDataSource::CategoryEstimate
        };

        debug!(
            "No certification data for {}, using {} average ({} dB takeoff)",
            if icao.is_empty() { "UNKN" } else { icao.as_str() },
            category,
            takeoff_db
        );

        AircraftNoiseProfile {
            icao_type: if icao.is_empty() { "UNKN".to_string() } else { icao },
            manufacturer: None,
            model: None,
            category,
            takeoff_db,
            approach_db: takeoff_db - ESTIMATE_APPROACH_OFFSET_DB,
            lateral_epnl: None,
            flyover_epnl: None,
            approach_epnl: None,
            data_source,
            confidence: Confidence::Low,
        }
    }
}
