/// Configuration management for the EV telemetry sender
/// Defaults match the receiver's published identifier table; environment
/// variables and an optional JSON file override them at startup.
use std::path::Path;

use anyhow::{bail, Context};
use ev_telemetry::{OverflowPolicy, TransmitConfig};
use serde::{Deserialize, Serialize};

use crate::simulator::Scenario;

/// Gateway network configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// UDP address of the CAN gateway that puts frames on the bus
    pub bus_gateway: String,
    /// Write timeout for one frame; a stalled link reports a bus timeout
    pub send_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bus_gateway: "127.0.0.1:20000".to_string(),
            send_timeout_ms: 20,
        }
    }
}

/// Sensor simulation configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    pub scenario: Scenario,
    /// Ticks spent in each scenario when rotating
    pub rotate_every_ticks: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            scenario: Scenario::Rotate,
            rotate_every_ticks: 100,
        }
    }
}

/// Master system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub network: NetworkConfig,
    pub transmit: TransmitConfig,
    pub simulation: SimulationConfig,
    /// Emit a JSON status line every N ticks (0 disables)
    pub status_interval_ticks: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            transmit: TransmitConfig::default(),
            simulation: SimulationConfig::default(),
            status_interval_ticks: 50, // 5 s at 10 Hz
        }
    }
}

impl SystemConfig {
    /// Load the configuration for this run
    ///
    /// `EV_CONFIG` names a JSON file to start from; otherwise defaults are
    /// used. Individual environment variables are applied on top:
    ///
    /// ```bash
    /// export EV_BUS_GATEWAY="192.168.4.1:20000"
    /// export EV_SEND_TIMEOUT_MS=20
    /// export EV_MAX_RETRIES=3
    /// export EV_OVERFLOW_POLICY=reject     # or truncate
    /// export EV_SIM_SEED=7
    /// export EV_SIM_SCENARIO=critical      # normal, warning, critical, rotate
    /// ```
    pub fn load() -> anyhow::Result<Self> {
        let config = match std::env::var("EV_CONFIG") {
            Ok(path) => Self::from_file(&path)?.with_overrides(|key| std::env::var(key).ok())?,
            Err(_) => Self::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> anyhow::Result<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Load the full configuration from a JSON file; missing fields keep
    /// their defaults
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.transmit.validate().context("invalid transmit config")?;
        if self.network.send_timeout_ms == 0 {
            bail!("send timeout must be non-zero");
        }
        // one frame timing out on every attempt must still fit a period
        let attempts = self.transmit.max_retries as u64 + 1;
        let worst_frame_ms = attempts * self.network.send_timeout_ms;
        if worst_frame_ms >= self.transmit.period_ms as u64 {
            bail!(
                "{} attempts x {} ms send timeout ({} ms) does not fit the {} ms period",
                attempts,
                self.network.send_timeout_ms,
                worst_frame_ms,
                self.transmit.period_ms
            );
        }
        Ok(())
    }

    fn with_overrides<F>(mut self, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("EV_BUS_GATEWAY") {
            self.network.bus_gateway = addr;
        }
        if let Some(ms) = lookup("EV_SEND_TIMEOUT_MS") {
            self.network.send_timeout_ms = ms
                .parse()
                .with_context(|| format!("EV_SEND_TIMEOUT_MS={}", ms))?;
        }
        if let Some(retries) = lookup("EV_MAX_RETRIES") {
            self.transmit.max_retries = retries
                .parse()
                .with_context(|| format!("EV_MAX_RETRIES={}", retries))?;
        }
        if let Some(policy) = lookup("EV_OVERFLOW_POLICY") {
            self.transmit.overflow_policy = match policy.to_lowercase().as_str() {
                "reject" | "strict" => OverflowPolicy::Reject,
                "truncate" => OverflowPolicy::Truncate,
                other => bail!("unknown overflow policy '{}'", other),
            };
        }
        if let Some(seed) = lookup("EV_SIM_SEED") {
            self.simulation.seed = seed
                .parse()
                .with_context(|| format!("EV_SIM_SEED={}", seed))?;
        }
        if let Some(scenario) = lookup("EV_SIM_SCENARIO") {
            self.simulation.scenario = scenario.parse()?;
        }
        Ok(self)
    }
}
