//! EV Telemetry Encoder
//!
//! Turns per-tick sensor snapshots from an electric vehicle into the
//! feature vectors expected by three onboard classifiers (pack safety,
//! battery health, driving style) and ships them over a shared CAN bus in
//! 8-byte frames with pre-allocated identifiers.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌────────────┐   ┌─────────┐
//! │ SensorSource │──▶│ FeatureSet    │──▶│ fragment() │──▶│ CanBus  │
//! │  (snapshot)  │   │ 13 / 8 / 6    │   │ FrameSet×3 │   │ send()  │
//! └──────────────┘   └───────────────┘   └────────────┘   └─────────┘
//!          ▲                                                   │
//!          └──────── TransmissionScheduler (10 Hz) ────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use ev_telemetry::{RecordingBus, SystemClock, TransmissionScheduler, TransmitConfig};
//! # use ev_telemetry::{SensorSnapshot, SensorSource};
//! # struct Sim;
//! # impl SensorSource for Sim {
//! #     fn snapshot(&mut self, t: u64) -> SensorSnapshot {
//! #         SensorSnapshot { timestamp_ms: t, ..Default::default() }
//! #     }
//! # }
//!
//! let mut scheduler = TransmissionScheduler::new(
//!     TransmitConfig::default(),
//!     RecordingBus::new(),
//!     SystemClock::new(),
//! )
//! .unwrap();
//! let mut sensors = Sim;
//!
//! loop {
//!     let report = scheduler.tick(&mut sensors);
//!     if !report.is_clean() {
//!         // a domain was truncated or dropped this tick
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`sensors`] - Raw sensor structs, snapshot, source trait
//! - [`features`] - Pure feature extractors and derived heuristics
//! - [`frame`] - CAN frame type and bus send primitive
//! - [`fragment`] - Vector → frame encoding, overflow policy, reassembly
//! - [`scheduler`] - Fixed-rate cycle, retry/skip policy, statistics
//! - [`labels`] - Classifier output to status text
//! - [`config`] - Identifier tables and scheduler configuration

pub mod config;
pub mod features;
pub mod fragment;
pub mod frame;
pub mod labels;
pub mod scheduler;
pub mod sensors;

pub use config::{ConfigError, IdentifierTable, TransmitConfig};
pub use features::{
    extract_driver_features, extract_health_features, extract_safety_features, feature_names,
    FeatureSet,
};
pub use fragment::{
    fragment, reassemble, FragmentError, FrameSet, OverflowPolicy, ReassemblyError,
};
pub use frame::{BusError, CanBus, Frame, RecordingBus};
pub use labels::{driver_label, health_label, label, safety_label};
pub use scheduler::{
    Clock, DomainError, DomainReport, ManualClock, SchedulerState, SchedulerStats, SystemClock,
    TickReport, TransmissionScheduler,
};
pub use sensors::{
    Domain, DriverSensors, HealthSensors, SafetySensors, SensorSnapshot, SensorSource,
};
