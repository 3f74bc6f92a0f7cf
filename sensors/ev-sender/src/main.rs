mod config;
mod simulator;
mod udp_bus;

use anyhow::{ensure, Context};
use config::SystemConfig;
use ev_telemetry::{SchedulerStats, SystemClock, TickReport, TransmissionScheduler};
use log::info;
use serde_json::json;
use simulator::{Scenario, SimulatedSensors};
use udp_bus::UdpCanBus;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SystemConfig::load().context("loading configuration")?;

    info!("=== EV Telemetry Sender ===");
    info!(
        "Gateway: {}, Rate: {}Hz, Retries: {}, Overflow: {:?}, Scenario: {}",
        config.network.bus_gateway,
        1000 / config.transmit.period_ms,
        config.transmit.max_retries,
        config.transmit.overflow_policy,
        config.simulation.scenario.as_str()
    );
    config.transmit.log_layout();

    let mut bus = UdpCanBus::new(&config.network.bus_gateway, config.network.send_timeout_ms);
    bus.init()
        .with_context(|| format!("opening CAN gateway {}", config.network.bus_gateway))?;
    ensure!(bus.is_ready(), "CAN gateway socket not ready");

    let mut sensors = SimulatedSensors::new(
        config.simulation.seed,
        config.simulation.scenario,
        config.simulation.rotate_every_ticks,
    );
    let mut scheduler =
        TransmissionScheduler::new(config.transmit.clone(), bus, SystemClock::new())
            .context("starting scheduler")?;

    info!("Entering transmit loop");

    loop {
        let report = scheduler.tick(&mut sensors);

        if config.status_interval_ticks > 0 && report.tick % config.status_interval_ticks == 0 {
            let status = status_line(&report, sensors.active_scenario(), scheduler.stats());
            info!("{}", status);
        }
    }
}

/// One-line JSON status, in the shape the dashboard tails
fn status_line(report: &TickReport, scenario: Scenario, stats: SchedulerStats) -> String {
    json!({
        "ts": report.started_ms,
        "tick": report.tick,
        "scenario": scenario.as_str(),
        "clean": report.is_clean(),
        "stats": stats,
    })
    .to_string()
}
