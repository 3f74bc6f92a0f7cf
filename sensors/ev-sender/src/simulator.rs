//! Simulated sensor acquisition
//!
//! Stands in for the real pack, BMS and drive-behaviour inputs. Each
//! scenario draws from the same distributions the classifiers were trained
//! on, including their overlap, so the receiving side sees realistic
//! borderline vectors rather than clean textbook cases.

use std::str::FromStr;

use anyhow::bail;
use ev_telemetry::{DriverSensors, HealthSensors, SafetySensors, SensorSnapshot, SensorSource};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Vehicle condition being simulated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// Healthy pack, city driving
    Normal,
    /// Thermal/electrical stress, highway driving
    Warning,
    /// Failing pack, emergency manoeuvres
    Critical,
    /// Cycle Normal → Warning → Critical
    Rotate,
}

impl Scenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Normal => "normal",
            Scenario::Warning => "warning",
            Scenario::Critical => "critical",
            Scenario::Rotate => "rotate",
        }
    }
}

impl FromStr for Scenario {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(Scenario::Normal),
            "warning" => Ok(Scenario::Warning),
            "critical" => Ok(Scenario::Critical),
            "rotate" => Ok(Scenario::Rotate),
            other => bail!("unknown scenario '{}'", other),
        }
    }
}

const ROTATION: [Scenario; 3] = [Scenario::Normal, Scenario::Warning, Scenario::Critical];

pub struct SimulatedSensors {
    rng: StdRng,
    scenario: Scenario,
    rotate_every: u64,
    ticks: u64,
    active: Scenario,
}

impl SimulatedSensors {
    pub fn new(seed: u64, scenario: Scenario, rotate_every: u64) -> Self {
        let active = match scenario {
            Scenario::Rotate => ROTATION[0],
            fixed => fixed,
        };
        Self {
            rng: StdRng::seed_from_u64(seed),
            scenario,
            rotate_every: rotate_every.max(1),
            ticks: 0,
            active,
        }
    }

    /// Scenario used for the most recent snapshot
    pub fn active_scenario(&self) -> Scenario {
        self.active
    }

    fn advance_scenario(&mut self) {
        if self.scenario != Scenario::Rotate {
            return;
        }
        let next = ROTATION[((self.ticks / self.rotate_every) % ROTATION.len() as u64) as usize];
        if next != self.active {
            info!("Simulation scenario: {} -> {}", self.active.as_str(), next.as_str());
            self.active = next;
        }
    }

    fn normal(&mut self, mean: f32, std_dev: f32) -> f32 {
        // Box-Muller
        let u1: f32 = self.rng.gen_range(f32::EPSILON..1.0);
        let u2: f32 = self.rng.gen();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
        mean + z * std_dev
    }

    fn exponential(&mut self, mean: f32) -> f32 {
        let u: f32 = self.rng.gen_range(f32::EPSILON..1.0);
        -mean * u.ln()
    }

    fn safety(&mut self) -> SafetySensors {
        let (pack_temp, iso_resistance, gas_ppm, cell_delta, coolant_flow) = match self.active {
            Scenario::Warning => (
                self.normal(50.0, 15.0),
                self.normal(350.0, 140.0),
                self.normal(30.0, 25.0),
                self.normal(0.08, 0.06),
                self.normal(6.0, 4.0),
            ),
            Scenario::Critical => (
                self.normal(75.0, 25.0),
                self.normal(100.0, 100.0),
                self.normal(150.0, 100.0),
                self.normal(0.35, 0.20),
                self.normal(3.0, 4.0),
            ),
            _ => (
                self.normal(35.0, 12.0),
                self.normal(420.0, 120.0),
                self.exponential(10.0),
                self.normal(0.03, 0.03),
                self.normal(8.0, 3.0),
            ),
        };

        let pack_temp = pack_temp.max(0.0);
        let cell_max_v = 4.2 - self.normal(0.0, 0.05).abs();
        SafetySensors {
            pack_voltage: self.normal(350.0, 15.0).abs(),
            pack_current: self.normal(60.0, 40.0).abs(),
            cell_max_v,
            cell_min_v: cell_max_v - cell_delta.abs(),
            pack_temp,
            inverter_temp: (pack_temp + self.normal(5.0, 5.0)).max(0.0),
            ambient_temp: self.normal(25.0, 10.0),
            coolant_flow: coolant_flow.max(0.0),
            iso_resistance: iso_resistance.max(0.0),
            gas_ppm: gas_ppm.max(0.0),
        }
    }

    fn health(&mut self) -> HealthSensors {
        // latent state of health, %
        let soh: f32 = match self.active {
            Scenario::Warning => self.rng.gen_range(72.0..88.0),
            Scenario::Critical => self.rng.gen_range(60.0..76.0),
            _ => self.rng.gen_range(84.0..100.0),
        };

        let cycle_count = ((100.0 - soh) * 50.0 + self.normal(0.0, 500.0)).max(0.0).round();
        HealthSensors {
            soc: self.rng.gen_range(10.0..100.0),
            internal_res: ((150.0 - soh) + self.normal(0.0, 20.0)).max(50.0),
            cycle_count,
            dod: self.rng.gen_range(10.0..90.0),
            cell_imbalance: ((100.0 - soh) / 500.0 + self.normal(0.0, 0.05)).max(0.0),
            coulombic_eff: (95.0 + soh / 25.0 + self.normal(0.0, 1.0)).min(100.0),
            pol_voltage: ((100.0 - soh) / 200.0 + self.normal(0.0, 0.05)).max(0.0),
            stress_index: (cycle_count / 1000.0 + self.normal(0.0, 0.5)).max(0.0),
        }
    }

    fn driver(&mut self) -> DriverSensors {
        let (speed_avg, brake_freq, throttle_var, brake_intensity) = match self.active {
            Scenario::Warning => (
                self.normal(65.0, 20.0),
                self.normal(3.0, 3.0),
                self.normal(10.0, 5.0),
                self.normal(15.0, 10.0),
            ),
            Scenario::Critical => (
                self.rng.gen_range(10.0..100.0),
                self.normal(5.0, 5.0),
                self.normal(50.0, 20.0),
                self.normal(85.0, 15.0),
            ),
            _ => (
                self.normal(30.0, 15.0),
                self.normal(15.0, 8.0),
                self.normal(20.0, 10.0),
                self.normal(35.0, 15.0),
            ),
        };

        DriverSensors {
            speed_avg: (speed_avg * (1.0 + self.normal(0.0, 0.1))).max(0.0),
            brake_freq: brake_freq.max(0.0),
            brake_intensity: brake_intensity.clamp(0.0, 100.0),
            throttle_var: throttle_var.max(0.0),
            energy_consumption: self.normal(0.15, 0.05).max(0.0),
            range_est: self.normal(150.0, 40.0).max(0.0),
        }
    }
}

impl SensorSource for SimulatedSensors {
    fn snapshot(&mut self, timestamp_ms: u64) -> SensorSnapshot {
        self.advance_scenario();
        self.ticks += 1;
        SensorSnapshot {
            timestamp_ms,
            safety: self.safety(),
            health: self.health(),
            driver: self.driver(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mean<F: Fn(&SensorSnapshot) -> f32>(sim: &mut SimulatedSensors, n: usize, f: F) -> f32 {
        (0..n).map(|i| f(&sim.snapshot(i as u64 * 100))).sum::<f32>() / n as f32
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = SimulatedSensors::new(7, Scenario::Normal, 100);
        let mut b = SimulatedSensors::new(7, Scenario::Normal, 100);
        for t in 0..20 {
            assert_eq!(a.snapshot(t), b.snapshot(t));
        }
    }

    #[test]
    fn test_values_stay_physical() {
        let mut sim = SimulatedSensors::new(1, Scenario::Critical, 100);
        for t in 0..500 {
            let s = sim.snapshot(t);
            assert!(s.safety.pack_temp >= 0.0);
            assert!(s.safety.cell_min_v <= s.safety.cell_max_v);
            assert!(s.safety.iso_resistance >= 0.0);
            assert!((10.0..100.0).contains(&s.health.soc));
            assert!(s.health.internal_res >= 50.0);
            assert!(s.health.coulombic_eff <= 100.0);
            assert!((0.0..=100.0).contains(&s.driver.brake_intensity));
            assert!(s.driver.speed_avg >= 0.0);
        }
    }

    #[test]
    fn test_scenarios_separate_on_average() {
        let mut normal = SimulatedSensors::new(3, Scenario::Normal, 100);
        let mut critical = SimulatedSensors::new(3, Scenario::Critical, 100);

        let normal_temp = mean(&mut normal, 500, |s| s.safety.pack_temp);
        let critical_temp = mean(&mut critical, 500, |s| s.safety.pack_temp);
        assert!(critical_temp > normal_temp + 20.0);

        let normal_brake = mean(&mut normal, 500, |s| s.driver.brake_intensity);
        let critical_brake = mean(&mut critical, 500, |s| s.driver.brake_intensity);
        assert!(critical_brake > normal_brake + 30.0);
    }

    #[test]
    fn test_rotation() {
        let mut sim = SimulatedSensors::new(5, Scenario::Rotate, 3);
        let mut seen = Vec::new();
        for t in 0..9 {
            sim.snapshot(t);
            seen.push(sim.active_scenario());
        }
        assert_eq!(
            seen,
            vec![
                Scenario::Normal,
                Scenario::Normal,
                Scenario::Normal,
                Scenario::Warning,
                Scenario::Warning,
                Scenario::Warning,
                Scenario::Critical,
                Scenario::Critical,
                Scenario::Critical,
            ]
        );
    }

    #[test]
    fn test_scenario_parsing() {
        assert_eq!("Critical".parse::<Scenario>().unwrap(), Scenario::Critical);
        assert_eq!("rotate".parse::<Scenario>().unwrap(), Scenario::Rotate);
        assert!("offroad".parse::<Scenario>().is_err());
    }
}
