//! Feature extraction for the three onboard classifiers
//!
//! Each extractor is a pure function of one sensor struct and returns an
//! owned, fixed-length array whose arity matches the classifier input.
//! Inputs are neither validated nor clamped: out-of-range values pass
//! through unchanged and NaN propagates into every feature derived from it.
//! Range checking belongs to whoever produced or consumes the vector.

use crate::sensors::{DriverSensors, HealthSensors, SafetySensors, SensorSnapshot};
use crate::Domain;

pub const SAFETY_FEATURES: usize = 13;
pub const HEALTH_FEATURES: usize = 8;
pub const DRIVER_FEATURES: usize = 6;

/// Column names in vector order, as used when the classifiers were trained
pub const SAFETY_FEATURE_NAMES: [&str; SAFETY_FEATURES] = [
    "Pack_Voltage",
    "Pack_Current",
    "Instant_Power",
    "Cell_Max",
    "Cell_Min",
    "Pack_Temp",
    "Thermal_Grad",
    "Inverter_Temp",
    "Ambient_Temp",
    "Coolant_Flow",
    "Iso_Resistance",
    "Gas_PPM",
    "SoP",
];

pub const HEALTH_FEATURE_NAMES: [&str; HEALTH_FEATURES] = [
    "SoC",
    "Internal_Res",
    "Cycle_Count",
    "DoD",
    "Cell_Imbalance",
    "Coulombic_Eff",
    "Pol_Voltage",
    "Stress_Index",
];

pub const DRIVER_FEATURE_NAMES: [&str; DRIVER_FEATURES] = [
    "Speed_Avg",
    "Brake_Frequency",
    "Brake_Intensity",
    "Throttle_Variance",
    "Energy_Consumption",
    "Range_Est",
];

/// Thermal gradient proxy scale (°C per volt of cell spread)
pub const THERMAL_GRADIENT_GAIN: f32 = 5.0;

/// Power capability heuristic constants
pub const SOP_BASE_KW: f32 = 150.0;
pub const SOP_DERATE_ONSET_C: f32 = 45.0;
pub const SOP_DERATE_KW_PER_C: f32 = 2.0;

/// Instantaneous pack power in kW
pub fn instant_power_kw(pack_voltage: f32, pack_current: f32) -> f32 {
    pack_voltage * pack_current / 1000.0
}

/// Thermal gradient proxy
///
/// A true gradient needs the hottest and coldest temperature probes; the
/// cell voltage spread scaled by [`THERMAL_GRADIENT_GAIN`] is used instead.
/// This is an approximation, not a physical temperature difference.
pub fn thermal_gradient_proxy(cell_max_v: f32, cell_min_v: f32) -> f32 {
    (cell_max_v - cell_min_v) * THERMAL_GRADIENT_GAIN
}

/// State-of-power heuristic in kW
///
/// Starts at [`SOP_BASE_KW`], derates linearly by [`SOP_DERATE_KW_PER_C`]
/// per degree above [`SOP_DERATE_ONSET_C`] and floors at zero. Only pack
/// temperature is considered.
pub fn power_capability_estimate(pack_temp: f32) -> f32 {
    let derating = floor_at_zero((pack_temp - SOP_DERATE_ONSET_C) * SOP_DERATE_KW_PER_C);
    floor_at_zero(SOP_BASE_KW - derating)
}

// f32::max(NaN, 0.0) returns 0.0; a NaN input must stay NaN here.
fn floor_at_zero(x: f32) -> f32 {
    if x < 0.0 {
        0.0
    } else {
        x
    }
}

pub fn extract_safety_features(data: &SafetySensors) -> [f32; SAFETY_FEATURES] {
    [
        data.pack_voltage,
        data.pack_current,
        instant_power_kw(data.pack_voltage, data.pack_current),
        data.cell_max_v,
        data.cell_min_v,
        data.pack_temp,
        thermal_gradient_proxy(data.cell_max_v, data.cell_min_v),
        data.inverter_temp,
        data.ambient_temp,
        data.coolant_flow,
        data.iso_resistance,
        data.gas_ppm,
        power_capability_estimate(data.pack_temp),
    ]
}

pub fn extract_health_features(data: &HealthSensors) -> [f32; HEALTH_FEATURES] {
    [
        data.soc,
        data.internal_res,
        data.cycle_count,
        data.dod,
        data.cell_imbalance,
        data.coulombic_eff,
        data.pol_voltage,
        data.stress_index,
    ]
}

pub fn extract_driver_features(data: &DriverSensors) -> [f32; DRIVER_FEATURES] {
    [
        data.speed_avg,
        data.brake_freq,
        data.brake_intensity,
        data.throttle_var,
        data.energy_consumption,
        data.range_est,
    ]
}

/// All three feature vectors derived from one snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureSet {
    pub safety: [f32; SAFETY_FEATURES],
    pub health: [f32; HEALTH_FEATURES],
    pub driver: [f32; DRIVER_FEATURES],
}

impl FeatureSet {
    pub fn from_snapshot(snapshot: &SensorSnapshot) -> Self {
        Self {
            safety: extract_safety_features(&snapshot.safety),
            health: extract_health_features(&snapshot.health),
            driver: extract_driver_features(&snapshot.driver),
        }
    }

    pub fn domain(&self, domain: Domain) -> &[f32] {
        match domain {
            Domain::Safety => &self.safety,
            Domain::Health => &self.health,
            Domain::Driver => &self.driver,
        }
    }
}

/// Column names for a domain's vector
pub fn feature_names(domain: Domain) -> &'static [&'static str] {
    match domain {
        Domain::Safety => &SAFETY_FEATURE_NAMES,
        Domain::Health => &HEALTH_FEATURE_NAMES,
        Domain::Driver => &DRIVER_FEATURE_NAMES,
    }
}
