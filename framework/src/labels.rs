/// Classifier output interpretation
/// Maps a class index to the status text shown by the receiving unit.
/// Every index maps to something; out-of-range values land on the
/// default arm.
use crate::Domain;

/// Safety classifier output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyStatus {
    Normal,
    Warning,
    Critical,
    Unknown,
}

impl SafetyStatus {
    pub fn from_index(class_idx: i32) -> Self {
        match class_idx {
            0 => SafetyStatus::Normal,
            1 => SafetyStatus::Warning,
            2 => SafetyStatus::Critical,
            _ => SafetyStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyStatus::Normal => "NORMAL",
            SafetyStatus::Warning => "WARNING (Thermal/Elec Risk)",
            SafetyStatus::Critical => "CRITICAL FAILURE",
            SafetyStatus::Unknown => "UNKNOWN",
        }
    }
}

/// Health classifier output (binary)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Good,
    Bad,
}

impl HealthStatus {
    pub fn from_index(class_idx: i32) -> Self {
        if class_idx == 0 {
            HealthStatus::Good
        } else {
            HealthStatus::Bad
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Good => "GOOD",
            HealthStatus::Bad => "BAD (Replace/Service)",
        }
    }
}

/// Driver classifier output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrivingStyle {
    City,
    Highway,
    Emergency,
    Unknown,
}

impl DrivingStyle {
    pub fn from_index(class_idx: i32) -> Self {
        match class_idx {
            0 => DrivingStyle::City,
            1 => DrivingStyle::Highway,
            2 => DrivingStyle::Emergency,
            _ => DrivingStyle::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DrivingStyle::City => "CITY (Stop-and-Go)",
            DrivingStyle::Highway => "HIGHWAY (Steady)",
            DrivingStyle::Emergency => "EMERGENCY (Panic)",
            DrivingStyle::Unknown => "UNKNOWN",
        }
    }
}

pub fn safety_label(class_idx: i32) -> &'static str {
    SafetyStatus::from_index(class_idx).as_str()
}

pub fn health_label(class_idx: i32) -> &'static str {
    HealthStatus::from_index(class_idx).as_str()
}

pub fn driver_label(class_idx: i32) -> &'static str {
    DrivingStyle::from_index(class_idx).as_str()
}

/// Label lookup by domain
pub fn label(domain: Domain, class_idx: i32) -> &'static str {
    match domain {
        Domain::Safety => safety_label(class_idx),
        Domain::Health => health_label(class_idx),
        Domain::Driver => driver_label(class_idx),
    }
}
