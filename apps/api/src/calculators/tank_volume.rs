//! Tank volume estimator.
//!
//! Volume is computed in cubic input units, scaled to cubic inches, then
//! converted: 1 in³ = 0.004329 US gal = 0.0163871 L; water weighs 8.34 lb/gal.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::{ensure_non_negative, CalcError};

const GALLONS_PER_CUBIC_INCH: f64 = 0.004329;
const LITERS_PER_CUBIC_INCH: f64 = 0.0163871;
const POUNDS_PER_GALLON: f64 = 8.34;
const CUBIC_INCHES_PER_CUBIC_FOOT: f64 = 1728.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum TankShape {
    Rectangle {
        length: f64,
        width: f64,
        height: f64,
    },
    Cube {
        length: f64,
    },
    Cylinder {
        diameter: f64,
        height: f64,
    },
    Hexagonal {
        edge: f64,
        height: f64,
    },
    /// `width` is the depth at the ends, `full_width` the depth at the centre of the bow.
    BowFront {
        length: f64,
        width: f64,
        full_width: f64,
        height: f64,
    },
}

impl TankShape {
    fn dimensions(&self) -> Vec<(&'static str, f64)> {
        match *self {
            TankShape::Rectangle {
                length,
                width,
                height,
            } => vec![("length", length), ("width", width), ("height", height)],
            TankShape::Cube { length } => vec![("length", length)],
            TankShape::Cylinder { diameter, height } => {
                vec![("diameter", diameter), ("height", height)]
            }
            TankShape::Hexagonal { edge, height } => vec![("edge", edge), ("height", height)],
            TankShape::BowFront {
                length,
                width,
                full_width,
                height,
            } => vec![
                ("length", length),
                ("width", width),
                ("full_width", full_width),
                ("height", height),
            ],
        }
    }

    /// Volume in cubic input units.
    fn cubic_units(&self) -> f64 {
        match *self {
            TankShape::Rectangle {
                length,
                width,
                height,
            } => length * width * height,
            TankShape::Cube { length } => length.powi(3),
            TankShape::Cylinder { diameter, height } => PI * (diameter / 2.0).powi(2) * height,
            TankShape::Hexagonal { edge, height } => (3.0 * 3f64.sqrt() / 2.0) * edge * edge * height,
            TankShape::BowFront {
                length,
                width,
                full_width,
                height,
            } => (length * width + (PI * (length / 2.0) * (full_width - width)) / 2.0) * height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    #[default]
    Inches,
    Feet,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TankVolume {
    pub cubic_inches: f64,
    pub gallons: f64,
    pub liters: f64,
    /// Weight of the water alone.
    pub pounds: f64,
}

pub fn tank_volume(shape: &TankShape, unit: LengthUnit) -> Result<TankVolume, CalcError> {
    for (name, value) in shape.dimensions() {
        ensure_non_negative(name, value)?;
    }

    let scale = match unit {
        LengthUnit::Inches => 1.0,
        LengthUnit::Feet => CUBIC_INCHES_PER_CUBIC_FOOT,
    };
    let cubic_inches = shape.cubic_units() * scale;
    let gallons = cubic_inches * GALLONS_PER_CUBIC_INCH;

    Ok(TankVolume {
        cubic_inches,
        gallons,
        liters: cubic_inches * LITERS_PER_CUBIC_INCH,
        pounds: gallons * POUNDS_PER_GALLON,
    })
}
