//! Weather-driven propagation adjustments.
//!
//! Wind and temperature inversions do not change the source level; they bend
//! and trap sound on its way down. Both effects are modeled as independent
//! additive dB deltas summed onto the calculator's baseline estimate. Missing
//! weather data means calm / no inversion, i.e. a zero adjustment.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::geometry::angular_difference_deg;

/// Wind below this speed is treated as calm and contributes nothing
pub const CALM_WIND_THRESHOLD_KTS: f64 = 3.0;

/// Surface wind observation, direction in degrees the wind blows *from*
/// (meteorological convention, as reported in a METAR)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindConditions {
    /// Direction the wind is blowing from, degrees true
    pub direction_deg: f64,

    /// Sustained speed in knots
    pub speed_kts: f64,

    /// Gust speed in knots, if reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gust_kts: Option<f64>,
}

/// Strength of a temperature inversion layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InversionStrength {
    None,
    Weak,
    Moderate,
    Strong,
}

impl InversionStrength {
    /// Full enhancement applied when the aircraft is within or above the
    /// inversion layer; half of this applies below the layer base
    fn enhancement_db(self) -> f64 {
        match self {
            InversionStrength::None => 0.0,
            InversionStrength::Weak => 2.0,
            InversionStrength::Moderate => 5.0,
            InversionStrength::Strong => 8.0,
        }
    }
}

/// Vertical temperature structure relevant to propagation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperatureProfile {
    /// Surface temperature in Celsius
    pub surface_temp_c: f64,

    pub inversion_present: bool,
    pub strength: InversionStrength,

    /// Bottom of the inversion layer, feet MSL
    pub base_ft: f64,

    /// Top of the inversion layer, feet MSL
    pub top_ft: f64,
}

/// Coarse classification of the combined adjustment, for display-level
/// categorization of propagation conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropagationCategory {
    /// |total| below 3 dB
    Normal,
    /// |total| from 3 to 6 dB
    Elevated,
    /// |total| of 6 dB or more
    High,
}

impl PropagationCategory {
    fn from_total_db(total_db: f64) -> Self {
        let magnitude = total_db.abs();
        if magnitude >= 6.0 {
            PropagationCategory::High
        } else if magnitude >= 3.0 {
            PropagationCategory::Elevated
        } else {
            PropagationCategory::Normal
        }
    }
}

/// Combined weather adjustment for one aircraft/observer geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherAdjustment {
    pub wind_db: f64,
    pub inversion_db: f64,
    pub total_db: f64,
    pub category: PropagationCategory,
}

impl WeatherAdjustment {
    /// The calm / no-inversion adjustment
    pub fn none() -> Self {
        Self {
            wind_db: 0.0,
            inversion_db: 0.0,
            total_db: 0.0,
            category: PropagationCategory::Normal,
        }
    }
}

/// Wind speed at which downwind enhancement steps to its middle tier and the
/// upwind penalty strengthens
const MODERATE_WIND_KTS: f64 = 8.0;
const STRONG_WIND_KTS: f64 = 16.0;

/// Downwind observers sit inside this cone around the wind vector
const DOWNWIND_CONE_DEG: f64 = 45.0;
/// Upwind observers sit beyond this angle from the wind vector
const UPWIND_CONE_DEG: f64 = 135.0;

/// Wind-driven propagation delta for an observer at the given bearing from
/// the aircraft. Positive for downwind observers (sound carried toward them),
/// negative upwind, zero crosswind or in calm conditions.
pub fn wind_adjustment_db(wind: &WindConditions, bearing_to_observer_deg: f64) -> f64 {
    if wind.speed_kts < CALM_WIND_THRESHOLD_KTS {
        return 0.0;
    }

    // METAR direction is where the wind comes from; sound carries the other way
    let blowing_toward_deg = (wind.direction_deg + 180.0) % 360.0;
    let relative_deg = angular_difference_deg(blowing_toward_deg, bearing_to_observer_deg);

    let adjustment = if relative_deg < DOWNWIND_CONE_DEG {
        if wind.speed_kts > STRONG_WIND_KTS {
            3.0
        } else if wind.speed_kts >= MODERATE_WIND_KTS {
            2.0
        } else {
            1.0
        }
    } else if relative_deg > UPWIND_CONE_DEG {
        if wind.speed_kts >= STRONG_WIND_KTS { -3.0 } else { -2.0 }
    } else {
        // Crosswind
        0.0
    };

    trace!(
        "Wind adjustment: {:.0} kts from {:.0}, observer bearing {:.0}, relative {:.0} -> {:+.1} dB",
        wind.speed_kts, wind.direction_deg, bearing_to_observer_deg, relative_deg, adjustment
    );

    adjustment
}

/// Inversion-driven propagation delta. Sound emitted within or above the
/// inversion layer is refracted back toward the ground and gets the full
/// strength-indexed enhancement; sound emitted below the layer base only
/// interacts with the layer partially and gets half.
pub fn inversion_adjustment_db(profile: &TemperatureProfile, aircraft_altitude_ft: f64) -> f64 {
    if !profile.inversion_present {
        return 0.0;
    }

    let full = profile.strength.enhancement_db();
    if aircraft_altitude_ft >= profile.base_ft {
        full
    } else {
        full / 2.0
    }
}

/// Combined additive adjustment for one geometry. `None` for either input
/// defaults that effect to zero (calm / no inversion).
pub fn adjust(
    wind: Option<&WindConditions>,
    temperature: Option<&TemperatureProfile>,
    bearing_to_observer_deg: f64,
    aircraft_altitude_ft: f64,
) -> WeatherAdjustment {
    if wind.is_none() && temperature.is_none() {
        return WeatherAdjustment::none();
    }

    let wind_db = wind
        .map(|w| wind_adjustment_db(w, bearing_to_observer_deg))
        .unwrap_or(0.0);
    let inversion_db = temperature
        .map(|t| inversion_adjustment_db(t, aircraft_altitude_ft))
        .unwrap_or(0.0);
    let total_db = wind_db + inversion_db;

    WeatherAdjustment {
        wind_db,
        inversion_db,
        total_db,
        category: PropagationCategory::from_total_db(total_db),
    }
}
