//! airnoise - physics-based aircraft noise propagation engine
//!
//! Given an aircraft's certified source noise level, a recorded flight track,
//! observer locations, and ambient weather, this library estimates
//! ground-level sound exposure and generates spatial noise-footprint
//! geometry. It is a pure computation library: collaborators fetch tracks and
//! weather and persist results; nothing here performs I/O beyond the startup
//! loaders for reference data.
//!
//! The model: inverse-square geometric spreading from the 1000 ft
//! certification reference distance, fixed broadband atmospheric absorption,
//! SAE-AIR-5662 lateral attenuation, additive wind/inversion propagation
//! adjustments, and bounded root-finding for contour geometry.

pub mod compliance;
pub mod config;
pub mod footprint;
pub mod geometry;
pub mod ground_noise;
pub mod impact;
pub mod profiles;
pub mod track;
pub mod weather;

pub use compliance::{AltitudeComplianceChecker, AltitudeComplianceReport, AltitudeRules};
pub use config::EngineConfig;
pub use footprint::{ContourBand, FootprintGenerator, NoiseFootprint, to_geojson};
pub use ground_noise::{
    GroundNoiseCalculator, LateralAttenuationTable, NoiseDecomposition, NoiseEstimate,
};
pub use impact::{FlightImpactAggregator, FlightNoiseImpact, ObserverImpact, describe_loudest_pass};
pub use profiles::{
    AircraftCategory, AircraftNoiseProfile, Confidence, NoiseDataSource, NoiseProfileRepository,
    StaticProfileRepository,
};
pub use track::{FlightDirection, ObserverLocation, TrackPosition};
pub use weather::{
    InversionStrength, PropagationCategory, TemperatureProfile, WeatherAdjustment, WindConditions,
};
