//! Hardware assembly and loop execution for the `run` and `self-check`
//! commands.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use eyre::WrapErr;
use gauge_config::{Config, PowerMode};
use gauge_core::telemetry::{self, TelemetryRx, TelemetryTx};
use gauge_core::{GaugeController, PowerLink, RampPhase, Snapshot};

use crate::rt;

pub struct RunOpts {
    pub ticks: Option<u64>,
    pub mode: PowerMode,
    pub telemetry_ms: u64,
    pub sim_enable: bool,
    pub json: bool,
    pub rt: bool,
    pub rt_prio: Option<i32>,
}

pub fn run_loop(cfg: &Config, opts: &RunOpts) -> eyre::Result<()> {
    rt::setup_rt_once(opts.rt, opts.rt_prio);

    let (tel_tx, tel_rx) = telemetry::channel();
    let mut gauge = build_controller(cfg, opts.mode, opts.sim_enable, tel_tx)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = shutdown.clone();
        ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
            .wrap_err("install ctrl-c handler")?;
    }

    let poller = spawn_poller(tel_rx, opts.telemetry_ms, opts.json, shutdown.clone());

    let result = gauge_core::runner::run(&mut gauge, &shutdown, opts.ticks);

    shutdown.store(true, Ordering::Relaxed);
    if let Some(handle) = poller {
        let _ = handle.join();
    }

    let last = result?;
    if opts.json
        && let Some(snap) = last
    {
        println!("{}", snapshot_json(&snap));
    }
    Ok(())
}

pub fn self_check(cfg: &Config) -> eyre::Result<()> {
    use gauge_traits::MonotonicClock;

    let sensor: gauge_core::SensorCfg = (&cfg.sensor).into();
    let mut adc = make_adc(cfg)?;
    let clock = MonotonicClock::new();
    let raw = gauge_core::sampler::read_averaged(&mut *adc, &sensor, &clock);
    let ohms = gauge_core::level::estimate_resistance(raw, &sensor);
    tracing::info!(raw, ohms, "adc self-check");
    println!("self-check: ok (raw={raw}, resistance={ohms:.1} ohm)");
    Ok(())
}

/// Per-tick state rendered for the external telemetry poller.
pub fn snapshot_json(snap: &Snapshot) -> String {
    let (pem_state, pem_value) = match snap.ramp {
        Some(r) => (phase_name(r.phase), Some(r.value)),
        None => (if snap.cutoff { "CutOff" } else { "PowerOn" }, None),
    };
    serde_json::json!({
        "resistance": snap.resistance_ohms,
        "targetDuty": snap.target_duty,
        "smoothedDuty": snap.smoothed_duty,
        "gaugeDuty": snap.gauge_duty,
        "indicator": snap.indicator_on,
        "cutoff": snap.cutoff,
        "pemStatus": pem_state,
        "pemValue": pem_value,
    })
    .to_string()
}

fn phase_name(phase: RampPhase) -> &'static str {
    match phase {
        RampPhase::Idle => "Idle",
        RampPhase::RampingUp => "RampingUp",
        RampPhase::Running => "Running",
        RampPhase::Stopped => "Stopped",
    }
}

fn spawn_poller(
    rx: TelemetryRx,
    period_ms: u64,
    json: bool,
    stop: Arc<AtomicBool>,
) -> Option<thread::JoinHandle<()>> {
    if period_ms == 0 {
        return None;
    }
    Some(thread::spawn(move || {
        // Sleep in short slices so shutdown stays responsive.
        let slice = Duration::from_millis(50);
        let mut elapsed: u64 = 0;
        loop {
            if stop.load(Ordering::Relaxed) {
                break;
            }
            thread::sleep(slice);
            elapsed += 50;
            if elapsed < period_ms {
                continue;
            }
            elapsed = 0;
            if let Some(snap) = rx.latest() {
                if json {
                    println!("{}", snapshot_json(&snap));
                } else {
                    tracing::info!(
                        resistance_ohms = snap.resistance_ohms,
                        target_duty = snap.target_duty,
                        smoothed_duty = snap.smoothed_duty,
                        cutoff = snap.cutoff,
                        "telemetry"
                    );
                }
            }
        }
    }))
}

#[cfg(not(feature = "hardware"))]
fn build_controller(
    cfg: &Config,
    mode: PowerMode,
    sim_enable: bool,
    tel: TelemetryTx,
) -> eyre::Result<GaugeController> {
    use gauge_hardware::{SimulatedEnable, SimulatedFloatSensor, SimulatedPin, SimulatedPwm};

    // Start at full tank and drain slowly so a simulated run eventually
    // walks through the blink and cutoff thresholds.
    let adc = SimulatedFloatSensor::new(
        cfg.sensor.min_resistance_ohms,
        cfg.sensor.known_resistor_ohms,
    )
    .with_drift(0.05);

    let power = match mode {
        PowerMode::Kill => PowerLink::kill_line(SimulatedPin::new("kill")),
        PowerMode::Ramp => PowerLink::ramp(
            SimulatedPwm::new("supply"),
            SimulatedEnable::new(sim_enable),
        ),
    };

    GaugeController::builder()
        .with_adc(adc)
        .with_outputs(SimulatedPwm::new("gauge"), SimulatedPin::new("indicator"), power)
        .with_sensor((&cfg.sensor).into())
        .with_gauge((&cfg.gauge).into())
        .with_safety((&cfg.safety).into())
        .with_ramp((&cfg.ramp).into())
        .with_telemetry(tel)
        .build()
}

#[cfg(feature = "hardware")]
fn build_controller(
    cfg: &Config,
    mode: PowerMode,
    _sim_enable: bool,
    tel: TelemetryTx,
) -> eyre::Result<GaugeController> {
    use gauge_hardware::mcp3208::Mcp3208;
    use gauge_hardware::pi::{PanelInputPin, PanelOutputPin, PanelPwm};
    use gauge_hardware::PWM_FREQUENCY_HZ;

    let adc = Mcp3208::new(cfg.pins.spi_bus, cfg.pins.spi_ce, cfg.pins.adc_channel)
        .map_err(eyre::Report::new)
        .wrap_err("open float sensor adc")?;
    let gauge_pwm = PanelPwm::new(cfg.pins.gauge_pwm, PWM_FREQUENCY_HZ)
        .map_err(eyre::Report::new)
        .wrap_err("open gauge pwm")?;
    let indicator = PanelOutputPin::new(cfg.pins.indicator)
        .map_err(eyre::Report::new)
        .wrap_err("open indicator pin")?;

    let power = match mode {
        PowerMode::Kill => PowerLink::kill_line(
            PanelOutputPin::new(cfg.pins.kill)
                .map_err(eyre::Report::new)
                .wrap_err("open kill pin")?,
        ),
        PowerMode::Ramp => PowerLink::ramp(
            PanelPwm::new(cfg.pins.supply_pwm, PWM_FREQUENCY_HZ)
                .map_err(eyre::Report::new)
                .wrap_err("open supply pwm")?,
            PanelInputPin::new(cfg.pins.enable_in)
                .map_err(eyre::Report::new)
                .wrap_err("open enable input")?,
        ),
    };

    GaugeController::builder()
        .with_adc(adc)
        .with_outputs(gauge_pwm, indicator, power)
        .with_sensor((&cfg.sensor).into())
        .with_gauge((&cfg.gauge).into())
        .with_safety((&cfg.safety).into())
        .with_ramp((&cfg.ramp).into())
        .with_telemetry(tel)
        .build()
}

#[cfg(not(feature = "hardware"))]
fn make_adc(cfg: &Config) -> eyre::Result<Box<dyn gauge_traits::AnalogIn>> {
    use gauge_hardware::SimulatedFloatSensor;
    Ok(Box::new(SimulatedFloatSensor::new(
        cfg.sensor.min_resistance_ohms,
        cfg.sensor.known_resistor_ohms,
    )))
}

#[cfg(feature = "hardware")]
fn make_adc(cfg: &Config) -> eyre::Result<Box<dyn gauge_traits::AnalogIn>> {
    use gauge_hardware::mcp3208::Mcp3208;
    let adc = Mcp3208::new(cfg.pins.spi_bus, cfg.pins.spi_ce, cfg.pins.adc_channel)
        .map_err(eyre::Report::new)
        .wrap_err("open float sensor adc")?;
    Ok(Box::new(adc))
}
