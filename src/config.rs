//! Engine configuration.
//!
//! Bundles the tunable tables — lateral attenuation curve, contour bands,
//! observer set, altitude rules — so a deployment can load them from one TOML
//! file instead of hard-coding. Defaults reproduce the standard model.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::compliance::AltitudeRules;
use crate::footprint::{ContourBand, default_contour_bands};
use crate::ground_noise::LateralAttenuationTable;
use crate::track::ObserverLocation;

/// Complete engine configuration for one deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Lateral attenuation curve for the ground-noise calculator
    #[serde(default)]
    pub lateral_attenuation: LateralAttenuationTable,

    /// Contour bands for the footprint generator, loudest first
    #[serde(default = "default_contour_bands")]
    pub contour_bands: Vec<ContourBand>,

    /// Observer locations for impact aggregation
    #[serde(default)]
    pub observers: Vec<ObserverLocation>,

    /// Altitude rules for the compliance checker; absent means the deployment
    /// does not run altitude checks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude_rules: Option<AltitudeRules>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lateral_attenuation: LateralAttenuationTable::default(),
            contour_bands: default_contour_bands(),
            observers: Vec::new(),
            altitude_rules: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read engine config {}", path.display()))?;
        let config: EngineConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse engine config {}", path.display()))?;

        info!(
            "Loaded engine config from {}: {} contour bands, {} observers",
            path.display(),
            config.contour_bands.len(),
            config.observers.len()
        );
        Ok(config)
    }

    /// Serialize to TOML, e.g. for writing a template config
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize engine config")
    }
}
