/// Transmission configuration
/// Built once at startup and handed to the scheduler; tests substitute
/// their own identifier tables and periods.
use log::info;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::fragment::{capacity_bytes, frames_required, OverflowPolicy, BYTES_PER_FEATURE};
use crate::frame::MAX_STANDARD_ID;
use crate::Domain;

/// 10 Hz
pub const DEFAULT_PERIOD_MS: u32 = 100;
pub const DEFAULT_MAX_RETRIES: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("cycle period must be non-zero")]
    ZeroPeriod,
    #[error("{0} has no frame identifiers")]
    NoIdentifiers(Domain),
    #[error("{domain} identifier {id:#05x} exceeds the 11-bit range")]
    IdentifierOutOfRange { domain: Domain, id: u16 },
    #[error("{0} identifiers are not strictly ascending")]
    NotAscending(Domain),
    #[error("identifier {0:#05x} is allocated to more than one domain")]
    Shared(u16),
}

/// Pre-allocated frame identifiers per domain, ascending
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IdentifierTable {
    pub safety: Vec<u16>,
    pub health: Vec<u16>,
    pub driver: Vec<u16>,
}

impl Default for IdentifierTable {
    fn default() -> Self {
        Self {
            safety: vec![0x100, 0x101, 0x102],
            health: vec![0x200, 0x201],
            driver: vec![0x300, 0x301],
        }
    }
}

impl IdentifierTable {
    /// Table with enough consecutive identifiers per domain to carry every
    /// feature, starting at each domain's default base id
    pub fn provisioned() -> Self {
        let base = Self::default();
        let run = |start: u16, domain: Domain| -> Vec<u16> {
            (0..frames_required(domain.feature_count()) as u16)
                .map(|i| start + i)
                .collect()
        };
        Self {
            safety: run(base.safety[0], Domain::Safety),
            health: run(base.health[0], Domain::Health),
            driver: run(base.driver[0], Domain::Driver),
        }
    }

    pub fn for_domain(&self, domain: Domain) -> &[u16] {
        match domain {
            Domain::Safety => &self.safety,
            Domain::Health => &self.health,
            Domain::Driver => &self.driver,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen: Vec<u16> = Vec::new();
        for domain in Domain::ALL {
            let ids = self.for_domain(domain);
            if ids.is_empty() {
                return Err(ConfigError::NoIdentifiers(domain));
            }
            if let Some(&id) = ids.iter().find(|&&id| id > MAX_STANDARD_ID) {
                return Err(ConfigError::IdentifierOutOfRange { domain, id });
            }
            if ids.windows(2).any(|w| w[0] >= w[1]) {
                return Err(ConfigError::NotAscending(domain));
            }
            if let Some(&id) = ids.iter().find(|id| seen.contains(id)) {
                return Err(ConfigError::Shared(id));
            }
            seen.extend_from_slice(ids);
        }
        Ok(())
    }
}

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TransmitConfig {
    /// Time between cycle starts
    pub period_ms: u32,
    pub identifiers: IdentifierTable,
    pub overflow_policy: OverflowPolicy,
    /// Extra attempts per frame after the first failure
    pub max_retries: u8,
}

impl Default for TransmitConfig {
    fn default() -> Self {
        Self {
            period_ms: DEFAULT_PERIOD_MS,
            identifiers: IdentifierTable::default(),
            overflow_policy: OverflowPolicy::default(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl TransmitConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period_ms == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        self.identifiers.validate()
    }

    /// Log the published frame layout, one line per domain
    pub fn log_layout(&self) {
        info!(
            "Cycle {} ms, overflow policy {:?}, {} retries per frame",
            self.period_ms, self.overflow_policy, self.max_retries
        );
        for domain in Domain::ALL {
            let ids = self.identifiers.for_domain(domain);
            let needed = domain.feature_count() * BYTES_PER_FEATURE;
            let capacity = capacity_bytes(ids);
            info!(
                "  {}: {} features, {} bytes, ids {:03X?} ({} bytes){}",
                domain,
                domain.feature_count(),
                needed,
                ids,
                capacity,
                if needed > capacity { " OVER BUDGET" } else { "" }
            );
        }
    }
}
