//! Axum route handlers for the calculators. All stateless.

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::calculators::tank_volume::{tank_volume, LengthUnit, TankShape, TankVolume};
use crate::calculators::water::{
    co2_ppm, convert_alkalinity, convert_temperature, Alkalinity, AlkalinityUnit,
    TempUnit, TemperatureReading,
};
use crate::errors::AppError;

#[derive(Debug, Deserialize)]
pub struct Co2Request {
    pub ph: f64,
    pub dkh: f64,
}

#[derive(Debug, Serialize)]
pub struct Co2Response {
    pub co2_ppm: f64,
}

#[derive(Debug, Deserialize)]
pub struct AlkalinityRequest {
    pub value: f64,
    pub unit: AlkalinityUnit,
}

#[derive(Debug, Deserialize)]
pub struct TemperatureRequest {
    pub value: f64,
    #[serde(default)]
    pub unit: TempUnit,
}

#[derive(Debug, Deserialize)]
pub struct TankVolumeRequest {
    #[serde(flatten)]
    pub shape: TankShape,
    #[serde(default)]
    pub units: LengthUnit,
}

/// POST /api/v1/calculators/co2
pub async fn handle_co2(Json(req): Json<Co2Request>) -> Result<Json<Co2Response>, AppError> {
    let co2_ppm = co2_ppm(req.ph, req.dkh)?;
    Ok(Json(Co2Response { co2_ppm }))
}

/// POST /api/v1/calculators/alkalinity
pub async fn handle_alkalinity(
    Json(req): Json<AlkalinityRequest>,
) -> Result<Json<Alkalinity>, AppError> {
    Ok(Json(convert_alkalinity(req.value, req.unit)?))
}

/// POST /api/v1/calculators/temperature
pub async fn handle_temperature(
    Json(req): Json<TemperatureRequest>,
) -> Result<Json<TemperatureReading>, AppError> {
    Ok(Json(convert_temperature(req.value, req.unit)?))
}

/// POST /api/v1/calculators/tank-volume
pub async fn handle_tank_volume(
    Json(req): Json<TankVolumeRequest>,
) -> Result<Json<TankVolume>, AppError> {
    Ok(Json(tank_volume(&req.shape, req.units)?))
}
