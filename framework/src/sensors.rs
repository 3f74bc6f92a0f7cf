/// Raw sensor inputs for the three monitored domains
/// Values arrive already converted to engineering units; nothing here
/// validates physical ranges.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One of the three independent sensor/classifier domains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Domain {
    Safety,
    Health,
    Driver,
}

impl Domain {
    /// Transmission order within a tick
    pub const ALL: [Domain; 3] = [Domain::Safety, Domain::Health, Domain::Driver];

    /// Classifier input arity for this domain
    pub fn feature_count(self) -> usize {
        match self {
            Domain::Safety => crate::features::SAFETY_FEATURES,
            Domain::Health => crate::features::HEALTH_FEATURES,
            Domain::Driver => crate::features::DRIVER_FEATURES,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Domain::Safety => "safety",
            Domain::Health => "health",
            Domain::Driver => "driver",
        }
    }
}

impl core::fmt::Display for Domain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Pack and safety measurements
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SafetySensors {
    pub pack_voltage: f32,   // V
    pub pack_current: f32,   // A
    pub cell_max_v: f32,     // V
    pub cell_min_v: f32,     // V
    pub pack_temp: f32,      // °C
    pub inverter_temp: f32,  // °C
    pub ambient_temp: f32,   // °C
    pub coolant_flow: f32,   // L/min
    pub iso_resistance: f32, // kΩ
    pub gas_ppm: f32,        // ppm
}

/// Battery state-of-health measurements
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HealthSensors {
    pub soc: f32,            // %
    pub internal_res: f32,   // mΩ
    pub cycle_count: f32,    // count
    pub dod: f32,            // % depth of discharge
    pub cell_imbalance: f32, // V (delta)
    pub coulombic_eff: f32,  // %
    pub pol_voltage: f32,    // V
    pub stress_index: f32,   // 0-10 scale
}

/// Driver behaviour aggregates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DriverSensors {
    pub speed_avg: f32,          // km/h
    pub brake_freq: f32,         // events/min
    pub brake_intensity: f32,    // % pressure
    pub throttle_var: f32,       // variance
    pub energy_consumption: f32, // kWh/km
    pub range_est: f32,          // km
}

/// Immutable capture of all three domains for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorSnapshot {
    pub timestamp_ms: u64,
    pub safety: SafetySensors,
    pub health: HealthSensors,
    pub driver: DriverSensors,
}

/// Source of per-tick sensor snapshots
/// Implementations: simulator, hardware acquisition, replay, etc.
pub trait SensorSource {
    /// Capture the current state of every domain
    fn snapshot(&mut self, timestamp_ms: u64) -> SensorSnapshot;
}
