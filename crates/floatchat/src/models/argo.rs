use anyhow::{Result, bail};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::time::normalize_measurement_time;

pub const ARGO_TABLE: &str = "argo_floats";

pub const ARGO_COLUMNS: &[&str] = &[
    "platform_number",
    "cycle_number",
    "measurement_time",
    "latitude",
    "longitude",
    "pressure",
    "temperature",
    "salinity",
    "data_quality",
];

/// One profile sample reported by an ARGO float.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MeasurementRecord {
    pub platform_number: String,
    pub cycle_number: i64,
    /// `YYYY-MM-DD HH:MM:SS` in UTC; RFC 3339 input is accepted and normalized.
    pub measurement_time: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Decibars; depth proxy.
    pub pressure: f64,
    pub temperature: f64,
    pub salinity: f64,
    pub data_quality: String,
}

impl MeasurementRecord {
    /// Checks the fixed-schema ranges and returns the record with a normalized timestamp.
    pub fn validated(mut self) -> Result<Self> {
        if self.platform_number.trim().is_empty() {
            bail!("platform_number must not be empty");
        }
        if self.cycle_number < 0 {
            bail!("cycle_number must be non-negative: {}", self.cycle_number);
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            bail!("latitude out of range (-90..90): {}", self.latitude);
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            bail!("longitude out of range (-180..180): {}", self.longitude);
        }
        if !self.pressure.is_finite() || self.pressure < 0.0 {
            bail!("pressure must be a non-negative number: {}", self.pressure);
        }
        if !self.temperature.is_finite() {
            bail!("temperature must be finite");
        }
        if !self.salinity.is_finite() {
            bail!("salinity must be finite");
        }
        self.measurement_time = normalize_measurement_time(&self.measurement_time)?;
        Ok(self)
    }
}

#[must_use]
pub fn is_argo_column(name: &str) -> bool {
    ARGO_COLUMNS
        .iter()
        .any(|column| column.eq_ignore_ascii_case(name))
}

#[must_use]
pub fn json_schema() -> Value {
    let schema = schemars::schema_for!(MeasurementRecord);
    match serde_json::to_value(schema) {
        Ok(value) => value,
        Err(error) => {
            panic!("failed to serialize generated measurement record schema: {error}");
        }
    }
}
