//! Water chemistry calculators: dissolved CO₂, alkalinity units, temperature.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ensure_finite, ensure_positive, CalcError};

/// Dissolved CO₂ (ppm) from pH and carbonate hardness:
/// `12.839 × dKH × 10^(6.37 − pH)`.
pub fn co2_ppm(ph: f64, dkh: f64) -> Result<f64, CalcError> {
    ensure_positive("pH", ph)?;
    ensure_positive("dKH", dkh)?;
    Ok(12.839 * dkh * 10f64.powf(6.37 - ph))
}

// ────────────────────────────────────────────────────────────────────────────
// Alkalinity
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlkalinityUnit {
    #[serde(rename = "dKH", alias = "dkh")]
    Dkh,
    #[serde(rename = "ppm")]
    Ppm,
    #[serde(rename = "meq/L", alias = "meq")]
    MeqPerL,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Alkalinity {
    pub dkh: f64,
    pub ppm: f64,
    pub meq_per_l: f64,
}

/// Expresses one alkalinity reading in all three units.
pub fn convert_alkalinity(value: f64, from: AlkalinityUnit) -> Result<Alkalinity, CalcError> {
    ensure_positive("alkalinity", value)?;
    Ok(match from {
        AlkalinityUnit::Dkh => Alkalinity {
            dkh: value,
            ppm: value * 17.857,
            meq_per_l: value * 0.357,
        },
        AlkalinityUnit::Ppm => Alkalinity {
            dkh: value * 0.056,
            ppm: value,
            meq_per_l: value * 0.02,
        },
        AlkalinityUnit::MeqPerL => Alkalinity {
            dkh: value * 2.8,
            ppm: value * 50.0,
            meq_per_l: value,
        },
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Temperature
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TempUnit {
    #[serde(rename = "C", alias = "Celsius")]
    Celsius,
    #[default]
    #[serde(rename = "F", alias = "Fahrenheit")]
    Fahrenheit,
}

impl TempUnit {
    pub fn other(&self) -> TempUnit {
        match self {
            TempUnit::Celsius => TempUnit::Fahrenheit,
            TempUnit::Fahrenheit => TempUnit::Celsius,
        }
    }
}

impl fmt::Display for TempUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TempUnit::Celsius => f.write_str("C"),
            TempUnit::Fahrenheit => f.write_str("F"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureReading {
    /// The input converted to the other unit.
    pub converted: f64,
    pub converted_unit: TempUnit,
    pub celsius: f64,
    pub kelvin: f64,
}

pub fn convert_temperature(value: f64, from: TempUnit) -> Result<TemperatureReading, CalcError> {
    ensure_finite("temperature", value)?;
    let (converted, celsius) = match from {
        TempUnit::Fahrenheit => {
            let c = (value - 32.0) * (5.0 / 9.0);
            (c, c)
        }
        TempUnit::Celsius => (value * (9.0 / 5.0) + 32.0, value),
    };
    Ok(TemperatureReading {
        converted,
        converted_unit: from.other(),
        celsius,
        kelvin: celsius + 273.15,
    })
}
