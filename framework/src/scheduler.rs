//! Fixed-rate transmission scheduler
//!
//! Two states:
//!
//! ```text
//!          deadline reached
//!   IDLE ───────────────────▶ TRANSMITTING
//!    ▲                              │
//!    └──────────────────────────────┘
//!      all three domains handed to the bus
//! ```
//!
//! Each cycle runs snapshot → extract → fragment → send for Safety, Health
//! and Driver, in that order, frames in ascending identifier order. A frame
//! that keeps failing after `max_retries` extra attempts abandons the rest
//! of its domain for this tick only; the next domain is still sent. Nothing
//! here is fatal: a dropped domain simply reappears on the next tick.
//!
//! Retries are also bounded in time. Each domain may retry only within its
//! share of what is left before the next deadline (a third for Safety, half
//! the remainder for Health, the rest for Driver), and a retry is skipped
//! when repeating the last attempt would run past that share. A stalled
//! domain therefore cannot push the following domains past the deadline.
//!
//! Deadlines advance by exactly one period from the previous cycle start,
//! so cadence does not drift with cycle duration. If whole periods are
//! missed the schedule restarts from "now" rather than bursting.

use std::time::Instant;

use log::{debug, warn};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::config::{ConfigError, TransmitConfig};
use crate::features::FeatureSet;
use crate::fragment::{fragment, FragmentError, FrameSet};
use crate::frame::{BusError, CanBus};
use crate::sensors::{SensorSnapshot, SensorSource};
use crate::Domain;

/// Millisecond clock used for cycle deadlines
pub trait Clock {
    fn now_ms(&self) -> u64;
    fn sleep_ms(&mut self, ms: u64);
}

/// Wall clock backed by `Instant` and `thread::sleep`
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn sleep_ms(&mut self, ms: u64) {
        std::thread::sleep(std::time::Duration::from_millis(ms));
    }
}

/// Deterministic clock: time only moves when slept or advanced
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now_ms: u64,
    slept_ms: u64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate time spent outside of sleeping (e.g. a slow bus)
    pub fn advance(&mut self, ms: u64) {
        self.now_ms += ms;
    }

    /// Total time spent in `sleep_ms`
    pub fn slept_ms(&self) -> u64 {
        self.slept_ms
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn sleep_ms(&mut self, ms: u64) {
        self.now_ms += ms;
        self.slept_ms += ms;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum SchedulerState {
    Idle,
    Transmitting,
}

/// Why a domain's frames did not all reach the bus this tick
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error(transparent)]
    Encoding(#[from] FragmentError),
    #[error("frame {id:#05x} failed after {attempts} attempts: {source}")]
    Transmit {
        id: u16,
        attempts: u32,
        source: BusError,
    },
}

/// Outcome of one domain within one tick
#[derive(Debug, Clone, PartialEq)]
pub struct DomainReport {
    pub domain: Domain,
    pub frames_planned: usize,
    pub frames_sent: usize,
    pub retries: u32,
    pub dropped_features: usize,
    pub error: Option<DomainError>,
}

impl DomainReport {
    fn new(domain: Domain) -> Self {
        Self {
            domain,
            frames_planned: 0,
            frames_sent: 0,
            retries: 0,
            dropped_features: 0,
            error: None,
        }
    }

    /// Every planned frame went out
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.frames_sent == self.frames_planned
    }
}

/// Outcome of one full cycle
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub started_ms: u64,
    pub domains: Vec<DomainReport>,
}

impl TickReport {
    pub fn frames_sent(&self) -> usize {
        self.domains.iter().map(|d| d.frames_sent).sum()
    }

    pub fn domain(&self, domain: Domain) -> Option<&DomainReport> {
        self.domains.iter().find(|d| d.domain == domain)
    }

    /// No domain dropped and nothing truncated
    pub fn is_clean(&self) -> bool {
        self.domains
            .iter()
            .all(|d| d.is_complete() && d.dropped_features == 0)
    }
}

/// Running totals since startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SchedulerStats {
    pub ticks: u64,
    pub frames_sent: u64,
    pub frames_failed: u64,
    pub retries: u64,
    pub domains_dropped: u64,
    pub domains_truncated: u64,
    pub overruns: u64,
}

pub struct TransmissionScheduler<B: CanBus, C: Clock> {
    config: TransmitConfig,
    bus: B,
    clock: C,
    state: SchedulerState,
    next_deadline_ms: Option<u64>,
    tick: u64,
    stats: SchedulerStats,
}

impl<B: CanBus, C: Clock> TransmissionScheduler<B, C> {
    pub fn new(config: TransmitConfig, bus: B, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            bus,
            clock,
            state: SchedulerState::Idle,
            next_deadline_ms: None,
            tick: 0,
            stats: SchedulerStats::default(),
        })
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn config(&self) -> &TransmitConfig {
        &self.config
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Deadline of the next cycle, once the first cycle has run
    pub fn next_deadline_ms(&self) -> Option<u64> {
        self.next_deadline_ms
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Wait for the next deadline, capture a snapshot and transmit it
    pub fn tick<S: SensorSource + ?Sized>(&mut self, source: &mut S) -> TickReport {
        self.wait_for_deadline();
        let snapshot = source.snapshot(self.clock.now_ms());
        self.run_cycle(&snapshot)
    }

    /// IDLE: sleep until the next deadline (returns at once on the first tick
    /// or when already late)
    pub fn wait_for_deadline(&mut self) {
        self.state = SchedulerState::Idle;
        if let Some(deadline) = self.next_deadline_ms {
            let now = self.clock.now_ms();
            if deadline > now {
                self.clock.sleep_ms(deadline - now);
            }
        }
    }

    /// TRANSMITTING: extract, fragment and send all three domains
    pub fn run_cycle(&mut self, snapshot: &SensorSnapshot) -> TickReport {
        self.state = SchedulerState::Transmitting;

        let started_ms = self.clock.now_ms();
        self.tick += 1;
        let cycle_start = self.cycle_start(started_ms);

        let features = FeatureSet::from_snapshot(snapshot);
        let deadline = cycle_start + self.config.period_ms as u64;
        let domains = Domain::ALL
            .iter()
            .enumerate()
            .map(|(i, &domain)| {
                let retry_until = self.retry_window(deadline, Domain::ALL.len() - i);
                self.transmit_domain(domain, features.domain(domain), retry_until)
            })
            .collect();

        let report = TickReport {
            tick: self.tick,
            started_ms,
            domains,
        };

        self.stats.ticks += 1;
        self.schedule_next(cycle_start);
        self.state = SchedulerState::Idle;

        debug!(
            "tick {} @ {} ms: {} frames sent",
            report.tick,
            report.started_ms,
            report.frames_sent()
        );
        report
    }

    /// Nominal start of this cycle: the pending deadline while on cadence,
    /// otherwise the actual start time
    fn cycle_start(&mut self, started_ms: u64) -> u64 {
        let period = self.config.period_ms as u64;
        match self.next_deadline_ms {
            Some(deadline) if started_ms >= deadline && started_ms - deadline < period => deadline,
            Some(deadline) if started_ms >= deadline => {
                let missed = (started_ms - deadline) / period;
                warn!(
                    "tick {} started {} ms late, {} deadline(s) missed; resynchronizing",
                    self.tick,
                    started_ms - deadline,
                    missed
                );
                self.stats.overruns += 1;
                started_ms
            }
            _ => started_ms,
        }
    }

    fn schedule_next(&mut self, cycle_start: u64) {
        let period = self.config.period_ms as u64;
        let next = cycle_start + period;
        let now = self.clock.now_ms();

        if now > next {
            self.stats.overruns += 1;
            warn!(
                "tick {} overran its {} ms period by {} ms",
                self.tick,
                period,
                now - next
            );
        }
        self.next_deadline_ms = Some(next);
    }

    /// End of the current domain's retry window: an equal share of the time
    /// left before `deadline` among the domains still to send
    fn retry_window(&self, deadline: u64, domains_left: usize) -> u64 {
        let now = self.clock.now_ms();
        now + deadline.saturating_sub(now) / domains_left.max(1) as u64
    }

    fn transmit_domain(
        &mut self,
        domain: Domain,
        features: &[f32],
        retry_until: u64,
    ) -> DomainReport {
        let mut report = DomainReport::new(domain);
        let ids = self.config.identifiers.for_domain(domain);

        let frame_set = match fragment(domain, features, ids, self.config.overflow_policy) {
            Ok(set) => set,
            Err(e) => {
                warn!("tick {}: {} dropped: {}", self.tick, domain, e);
                self.stats.domains_dropped += 1;
                report.error = Some(e.into());
                return report;
            }
        };

        if frame_set.is_truncated() {
            self.stats.domains_truncated += 1;
        }
        report.dropped_features = frame_set.dropped_features();
        report.frames_planned = frame_set.frames().len();

        if let Err(e) = self.send_frames(&frame_set, &mut report, retry_until) {
            warn!(
                "tick {}: {} dropped after {}/{} frames: {}",
                self.tick, domain, report.frames_sent, report.frames_planned, e
            );
            self.stats.domains_dropped += 1;
            report.error = Some(e);
        }
        report
    }

    fn send_frames(
        &mut self,
        frame_set: &FrameSet,
        report: &mut DomainReport,
        retry_until: u64,
    ) -> Result<(), DomainError> {
        let max_attempts = self.config.max_retries as u32 + 1;

        for frame in frame_set.frames() {
            let mut attempts = 0;
            loop {
                attempts += 1;
                let attempt_start = self.clock.now_ms();
                match self.bus.send(frame.id(), frame.payload()) {
                    Ok(()) => {
                        report.frames_sent += 1;
                        self.stats.frames_sent += 1;
                        break;
                    }
                    Err(e) if attempts < max_attempts => {
                        let now = self.clock.now_ms();
                        let attempt_ms = now.saturating_sub(attempt_start);
                        if now + attempt_ms >= retry_until {
                            debug!(
                                "frame {:#05x}: no time to retry before {} ms",
                                frame.id(),
                                retry_until
                            );
                            self.stats.frames_failed += 1;
                            return Err(DomainError::Transmit {
                                id: frame.id(),
                                attempts,
                                source: e,
                            });
                        }
                        debug!("frame {:#05x} attempt {} failed: {}", frame.id(), attempts, e);
                        report.retries += 1;
                        self.stats.retries += 1;
                    }
                    Err(e) => {
                        self.stats.frames_failed += 1;
                        return Err(DomainError::Transmit {
                            id: frame.id(),
                            attempts,
                            source: e,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdentifierTable;
    use crate::features::{extract_driver_features, extract_health_features};
    use crate::fragment::{reassemble, OverflowPolicy};
    use crate::frame::RecordingBus;
    use crate::sensors::{DriverSensors, HealthSensors, SafetySensors};
    use std::cell::Cell;

    fn snapshot() -> SensorSnapshot {
        SensorSnapshot {
            timestamp_ms: 0,
            safety: SafetySensors {
                pack_voltage: 380.0,
                pack_current: 50.0,
                cell_max_v: 4.05,
                cell_min_v: 3.95,
                pack_temp: 40.0,
                inverter_temp: 55.0,
                ambient_temp: 25.0,
                coolant_flow: 5.0,
                iso_resistance: 1200.0,
                gas_ppm: 0.0,
            },
            health: HealthSensors {
                soc: 76.0,
                internal_res: 88.0,
                cycle_count: 310.0,
                dod: 40.0,
                cell_imbalance: 0.03,
                coulombic_eff: 98.5,
                pol_voltage: 0.09,
                stress_index: 0.8,
            },
            driver: DriverSensors {
                speed_avg: 42.0,
                brake_freq: 11.0,
                brake_intensity: 33.0,
                throttle_var: 18.0,
                energy_consumption: 0.16,
                range_est: 170.0,
            },
        }
    }

    struct Replay(SensorSnapshot);

    impl SensorSource for Replay {
        fn snapshot(&mut self, timestamp_ms: u64) -> SensorSnapshot {
            SensorSnapshot {
                timestamp_ms,
                ..self.0
            }
        }
    }

    fn scheduler(config: TransmitConfig) -> TransmissionScheduler<RecordingBus, ManualClock> {
        TransmissionScheduler::new(config, RecordingBus::new(), ManualClock::new()).unwrap()
    }

    /// Clock shared with a bus that burns time while sending
    struct SharedClock<'a>(&'a Cell<u64>);

    impl Clock for SharedClock<'_> {
        fn now_ms(&self) -> u64 {
            self.0.get()
        }
        fn sleep_ms(&mut self, ms: u64) {
            self.0.set(self.0.get() + ms);
        }
    }

    /// Bus whose sends to `stalled` ids hang for `stall_ms` and then time
    /// out; other sends take 2 ms. Records (id, start time) of every attempt.
    struct StallingBus<'a> {
        clock: &'a Cell<u64>,
        stalled: Vec<u16>,
        stall_ms: u64,
        sends: Vec<(u16, u64)>,
    }

    impl<'a> StallingBus<'a> {
        fn new(clock: &'a Cell<u64>, stalled: &[u16], stall_ms: u64) -> Self {
            Self {
                clock,
                stalled: stalled.to_vec(),
                stall_ms,
                sends: Vec::new(),
            }
        }

        fn first_send(&self, id: u16) -> Option<u64> {
            self.sends.iter().find(|(i, _)| *i == id).map(|&(_, t)| t)
        }
    }

    impl CanBus for StallingBus<'_> {
        fn send(&mut self, id: u16, _data: &[u8]) -> Result<(), BusError> {
            let now = self.clock.get();
            self.sends.push((id, now));
            if self.stalled.contains(&id) {
                self.clock.set(now + self.stall_ms);
                Err(BusError::Timeout)
            } else {
                self.clock.set(now + 2);
                Ok(())
            }
        }
    }

    fn provisioned() -> TransmitConfig {
        TransmitConfig {
            identifiers: IdentifierTable::provisioned(),
            overflow_policy: OverflowPolicy::Reject,
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = TransmitConfig {
            period_ms: 0,
            ..Default::default()
        };
        let result = TransmissionScheduler::new(config, RecordingBus::new(), ManualClock::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_default_table_sends_in_domain_and_id_order() {
        let mut sched = scheduler(TransmitConfig::default());
        let report = sched.run_cycle(&snapshot());

        let ids: Vec<u16> = sched.bus().frames().iter().map(|f| f.id()).collect();
        assert_eq!(ids, vec![0x100, 0x101, 0x102, 0x200, 0x201, 0x300, 0x301]);
        assert_eq!(report.frames_sent(), 7);
        assert_eq!(sched.state(), SchedulerState::Idle);

        // default table truncates every domain and says so
        assert_eq!(report.domain(Domain::Safety).unwrap().dropped_features, 7);
        assert_eq!(report.domain(Domain::Health).unwrap().dropped_features, 4);
        assert_eq!(report.domain(Domain::Driver).unwrap().dropped_features, 2);
        assert!(!report.is_clean());
        assert_eq!(sched.stats().domains_truncated, 3);
    }

    #[test]
    fn test_provisioned_table_round_trips_each_domain() {
        let mut sched = scheduler(provisioned());
        let snap = snapshot();
        let report = sched.run_cycle(&snap);
        assert!(report.is_clean());

        let frames = sched.bus().frames();
        let ids = &sched.config().identifiers;
        let collect = |domain: Domain| {
            let domain_ids = ids.for_domain(domain);
            let mine: Vec<_> = frames
                .iter()
                .filter(|f| domain_ids.contains(&f.id()))
                .copied()
                .collect();
            reassemble(&mine).unwrap()
        };

        let features = FeatureSet::from_snapshot(&snap);
        assert_eq!(collect(Domain::Safety), features.safety.to_vec());
        assert_eq!(collect(Domain::Health), extract_health_features(&snap.health).to_vec());
        assert_eq!(collect(Domain::Driver), extract_driver_features(&snap.driver).to_vec());
    }

    #[test]
    fn test_overflow_reject_drops_only_that_domain() {
        let config = TransmitConfig {
            overflow_policy: OverflowPolicy::Reject,
            identifiers: IdentifierTable {
                safety: vec![0x100, 0x101, 0x102],
                ..IdentifierTable::provisioned()
            },
            ..Default::default()
        };
        let mut sched = scheduler(config);
        let report = sched.run_cycle(&snapshot());

        let safety = report.domain(Domain::Safety).unwrap();
        assert!(matches!(
            safety.error,
            Some(DomainError::Encoding(FragmentError::EncodingOverflow {
                needed_bytes: 52,
                capacity_bytes: 24,
                ..
            }))
        ));
        assert_eq!(safety.frames_sent, 0);
        assert!(report.domain(Domain::Health).unwrap().is_complete());
        assert!(report.domain(Domain::Driver).unwrap().is_complete());
        assert_eq!(sched.stats().domains_dropped, 1);
    }

    #[test]
    fn test_transient_failure_is_retried() {
        let mut sched = scheduler(provisioned());
        sched.bus_mut().fail_next(2);
        let report = sched.run_cycle(&snapshot());

        assert!(report.is_clean());
        assert_eq!(report.domain(Domain::Safety).unwrap().retries, 2);
        assert_eq!(sched.stats().retries, 2);
        assert_eq!(sched.bus().frames().len(), 7 + 4 + 3);
    }

    #[test]
    fn test_persistent_failure_skips_to_next_domain() {
        let mut sched = scheduler(provisioned());
        sched.bus_mut().fail_id(0x201);
        let report = sched.run_cycle(&snapshot());

        let health = report.domain(Domain::Health).unwrap();
        assert_eq!(health.frames_sent, 1);
        assert_eq!(health.retries, 3);
        assert_eq!(
            health.error,
            Some(DomainError::Transmit {
                id: 0x201,
                attempts: 4,
                source: BusError::BusOff,
            })
        );
        assert!(report.domain(Domain::Safety).unwrap().is_complete());
        assert!(report.domain(Domain::Driver).unwrap().is_complete());

        // 7 safety + 1 health + 4 failed attempts + 3 driver
        assert_eq!(sched.bus().attempts(), 7 + 1 + 4 + 3);
        let stats = sched.stats();
        assert_eq!(stats.frames_failed, 1);
        assert_eq!(stats.domains_dropped, 1);
    }

    #[test]
    fn test_zero_retries_gives_up_immediately() {
        let config = TransmitConfig {
            max_retries: 0,
            ..provisioned()
        };
        let mut sched = scheduler(config);
        sched.bus_mut().fail_id(0x100);
        let report = sched.run_cycle(&snapshot());
        assert_eq!(
            report.domain(Domain::Safety).unwrap().error,
            Some(DomainError::Transmit {
                id: 0x100,
                attempts: 1,
                source: BusError::BusOff,
            })
        );
    }

    #[test]
    fn test_fixed_cadence() {
        let mut sched = scheduler(TransmitConfig::default());
        let mut source = Replay(snapshot());

        let first = sched.tick(&mut source);
        assert_eq!(first.started_ms, 0);
        assert_eq!(sched.next_deadline_ms(), Some(100));

        // a 30 ms cycle does not push the cadence
        sched.clock_mut().advance(30);
        let second = sched.tick(&mut source);
        assert_eq!(second.started_ms, 100);
        assert_eq!(sched.next_deadline_ms(), Some(200));

        let third = sched.tick(&mut source);
        assert_eq!(third.started_ms, 200);
        assert_eq!(third.tick, 3);
        assert_eq!(sched.clock().slept_ms(), 170);
        assert_eq!(sched.stats().overruns, 0);
    }

    #[test]
    fn test_missed_deadlines_resynchronize() {
        let mut sched = scheduler(TransmitConfig::default());
        let mut source = Replay(snapshot());
        sched.tick(&mut source);

        // stalled past two deadlines
        sched.clock_mut().advance(250);
        let late = sched.tick(&mut source);
        assert_eq!(late.started_ms, 250);
        assert_eq!(sched.next_deadline_ms(), Some(350));
        assert_eq!(sched.stats().overruns, 1);

        // slightly late keeps the original cadence
        sched.tick(&mut source);
        assert_eq!(sched.next_deadline_ms(), Some(450));
        sched.clock_mut().advance(120);
        let report = sched.tick(&mut source);
        assert_eq!(report.started_ms, 470);
        assert_eq!(sched.next_deadline_ms(), Some(550));
        assert_eq!(sched.stats().overruns, 1);
    }

    #[test]
    fn test_slow_bus_counts_overrun() {
        struct SlowBus<'a> {
            clock: &'a Cell<u64>,
        }
        impl CanBus for SlowBus<'_> {
            fn send(&mut self, _id: u16, _data: &[u8]) -> Result<(), BusError> {
                self.clock.set(self.clock.get() + 20);
                Ok(())
            }
        }

        let time = Cell::new(0);
        let mut sched = TransmissionScheduler::new(
            TransmitConfig::default(),
            SlowBus { clock: &time },
            SharedClock(&time),
        )
        .unwrap();

        // 7 frames x 20 ms = 140 ms > 100 ms period
        sched.run_cycle(&snapshot());
        assert_eq!(time.get(), 140);
        assert_eq!(sched.stats().overruns, 1);
        assert_eq!(sched.next_deadline_ms(), Some(100));

        // next cycle starts immediately, still on the original cadence
        let mut source = Replay(snapshot());
        let report = sched.tick(&mut source);
        assert_eq!(report.started_ms, 140);
        assert_eq!(sched.next_deadline_ms(), Some(200));
    }

    #[test]
    fn test_stalled_domain_leaves_time_for_the_next() {
        let time = Cell::new(0);
        let bus = StallingBus::new(&time, &[0x100], 30);
        let mut sched = TransmissionScheduler::new(provisioned(), bus, SharedClock(&time)).unwrap();

        let report = sched.run_cycle(&snapshot());
        let deadline = sched.next_deadline_ms().unwrap();
        assert_eq!(deadline, 100);

        // one 30 ms timeout fits Safety's third of the cycle, a second would not
        let safety = report.domain(Domain::Safety).unwrap();
        assert_eq!(
            safety.error,
            Some(DomainError::Transmit {
                id: 0x100,
                attempts: 1,
                source: BusError::Timeout,
            })
        );
        assert_eq!(safety.retries, 0);

        let health_start = sched.bus().first_send(0x200).unwrap();
        assert_eq!(health_start, 30);
        assert!(health_start < deadline);
        assert!(report.domain(Domain::Health).unwrap().is_complete());
        assert!(report.domain(Domain::Driver).unwrap().is_complete());
        assert_eq!(sched.stats().overruns, 0);
    }

    #[test]
    fn test_two_stalled_domains_still_reach_driver_before_deadline() {
        let time = Cell::new(0);
        let bus = StallingBus::new(&time, &[0x100, 0x200], 30);
        let mut sched = TransmissionScheduler::new(provisioned(), bus, SharedClock(&time)).unwrap();

        let report = sched.run_cycle(&snapshot());

        // safety 0..30, health 30..60 (window ends at 65), driver from 60
        assert!(report.domain(Domain::Safety).unwrap().error.is_some());
        assert!(report.domain(Domain::Health).unwrap().error.is_some());
        assert_eq!(sched.bus().first_send(0x300), Some(60));
        assert!(report.domain(Domain::Driver).unwrap().is_complete());
        assert_eq!(time.get(), 66);
        assert_eq!(sched.stats().domains_dropped, 2);
        assert_eq!(sched.stats().overruns, 0);
    }

    #[test]
    fn test_short_stalls_are_retried_within_window() {
        let time = Cell::new(0);
        let bus = StallingBus::new(&time, &[0x100], 5);
        let mut sched = TransmissionScheduler::new(provisioned(), bus, SharedClock(&time)).unwrap();

        let report = sched.run_cycle(&snapshot());

        // 4 attempts x 5 ms stay inside Safety's 33 ms window
        let safety = report.domain(Domain::Safety).unwrap();
        assert_eq!(safety.retries, 3);
        assert!(matches!(
            safety.error,
            Some(DomainError::Transmit { attempts: 4, .. })
        ));
        assert_eq!(sched.bus().first_send(0x200), Some(20));
    }

    #[test]
    fn test_snapshot_is_stamped_with_clock() {
        struct Capture(Vec<u64>);
        impl SensorSource for Capture {
            fn snapshot(&mut self, timestamp_ms: u64) -> SensorSnapshot {
                self.0.push(timestamp_ms);
                SensorSnapshot::default()
            }
        }

        let mut sched = scheduler(TransmitConfig::default());
        let mut source = Capture(Vec::new());
        for _ in 0..3 {
            sched.tick(&mut source);
        }
        assert_eq!(source.0, vec![0, 100, 200]);
    }
}
