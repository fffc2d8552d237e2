// Aquarium calculators: water chemistry conversions and tank volume.
// Pure functions; handlers map CalcError to 400 responses.

pub mod handlers;
pub mod tank_volume;
pub mod water;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("{0} must not be negative")]
    Negative(&'static str),

    #[error("{0} must be a finite number")]
    NotFinite(&'static str),
}

fn ensure_finite(name: &'static str, value: f64) -> Result<(), CalcError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CalcError::NotFinite(name))
    }
}

fn ensure_positive(name: &'static str, value: f64) -> Result<(), CalcError> {
    ensure_finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(CalcError::NotPositive(name))
    }
}

fn ensure_non_negative(name: &'static str, value: f64) -> Result<(), CalcError> {
    ensure_finite(name, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(CalcError::Negative(name))
    }
}
