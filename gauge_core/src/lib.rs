#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core gauge control logic (hardware-agnostic).
//!
//! All hardware interactions go through the `gauge_traits` seams
//! (`AnalogIn`, `PwmOut`, `DigitalOut`, `DigitalIn`), and all timing goes
//! through `gauge_traits::Clock`, so the whole loop runs deterministically
//! under test with doubles and a virtual clock.
//!
//! ## Architecture
//!
//! - **Acquisition**: averaged ADC sampling (`sampler` module)
//! - **Estimation**: voltage-divider inversion with a fail-safe dropout
//!   policy (`level` module)
//! - **Mapping**: inverted linear resistance→duty map plus EMA needle
//!   smoothing (`mapping` module)
//! - **Safety**: blink and cutoff interlock (`safety` module)
//! - **Power**: discrete kill line, or a stepped supply ramp gated by an
//!   external enable signal (`ramp` module)
//! - **Telemetry**: single-producer snapshot hand-off (`telemetry` module)
//!
//! One `tick()` performs a full acquisition→actuation pass and then sleeps
//! the fixed tick period through the injected clock. Every tick is a fresh,
//! idempotent evaluation of current sensor state; there is no retry logic
//! anywhere in the loop.

pub mod config;
pub mod conversions;
pub mod error;
pub mod level;
pub mod mapping;
pub mod mocks;
pub mod ramp;
pub mod runner;
pub mod safety;
pub mod sampler;
pub mod status;
pub mod telemetry;

mod hw_error;

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};

use eyre::WrapErr;
use gauge_traits::clock::{Clock, MonotonicClock};
use gauge_traits::{AnalogIn, DigitalIn, DigitalOut, PwmOut};

pub use crate::config::{GaugeCfg, RampCfg, SafetyCfg, SensorCfg};
pub use crate::error::{BuildError, GaugeError};
use crate::error::{Report, Result};
use crate::hw_error::map_hw_error;
use crate::mapping::DutyFilter;
pub use crate::ramp::{RampCtl, RampPhase};
use crate::safety::SafetyCtl;
pub use crate::status::{RampSnapshot, Snapshot};
use crate::telemetry::TelemetryTx;

/// The power side of the panel: either a discrete kill output that is held
/// high while the level is healthy, or a PWM supply ramp gated by the
/// external enable input.
pub enum PowerLink {
    KillLine(Box<dyn DigitalOut>),
    Ramp {
        supply: Box<dyn PwmOut>,
        enable: Box<dyn DigitalIn>,
        ctl: RampCtl,
    },
}

impl PowerLink {
    pub fn kill_line(pin: impl DigitalOut + 'static) -> Self {
        Self::KillLine(Box::new(pin))
    }

    pub fn ramp(supply: impl PwmOut + 'static, enable: impl DigitalIn + 'static) -> Self {
        Self::Ramp {
            supply: Box::new(supply),
            enable: Box::new(enable),
            ctl: RampCtl::new(),
        }
    }
}

impl core::fmt::Debug for PowerLink {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::KillLine(_) => f.write_str("PowerLink::KillLine"),
            Self::Ramp { ctl, .. } => f
                .debug_struct("PowerLink::Ramp")
                .field("phase", &ctl.phase())
                .field("value", &ctl.value())
                .finish(),
        }
    }
}

/// Single-owner control loop state: the smoothing filter, the interlock,
/// the ramp (when present) and the output handles all live here and are
/// mutated exactly once per tick.
pub struct GaugeController {
    adc: Box<dyn AnalogIn>,
    gauge_out: Box<dyn PwmOut>,
    indicator: Box<dyn DigitalOut>,
    power: PowerLink,
    sensor: SensorCfg,
    gauge: GaugeCfg,
    safety_cfg: SafetyCfg,
    ramp_cfg: RampCfg,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    filter: DutyFilter,
    safety: SafetyCtl,
    last: Option<Snapshot>,
    telemetry: Option<TelemetryTx>,
}

impl core::fmt::Debug for GaugeController {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GaugeController")
            .field("smoothed_duty", &self.filter.smoothed())
            .field("cutoff", &self.safety.cutoff())
            .field("power", &self.power)
            .finish()
    }
}

impl GaugeController {
    /// Start building a controller.
    pub fn builder() -> GaugeBuilder<Missing, Missing> {
        GaugeBuilder::default()
    }

    /// Reset per-run state and drive every output to its power-on value:
    /// needle parked at `min_duty`, indicator off, power enabled (kill line
    /// high), supply at zero. Call before entering the loop.
    pub fn begin(&mut self) -> Result<()> {
        self.epoch = self.clock.now();
        self.filter = DutyFilter::new(self.gauge.min_duty);
        self.safety = SafetyCtl::new();
        self.last = None;

        self.gauge_out
            .set_duty(self.gauge.min_duty)
            .map_err(|e| Report::new(map_hw_error(&*e)))
            .wrap_err("park gauge needle")?;
        self.indicator
            .write(false)
            .map_err(|e| Report::new(map_hw_error(&*e)))
            .wrap_err("clear indicator")?;
        match &mut self.power {
            PowerLink::KillLine(pin) => {
                // Start with power ON
                pin.write(true)
                    .map_err(|e| Report::new(map_hw_error(&*e)))
                    .wrap_err("release kill line")?;
            }
            PowerLink::Ramp { supply, ctl, .. } => {
                *ctl = RampCtl::new();
                supply
                    .set_duty(0)
                    .map_err(|e| Report::new(map_hw_error(&*e)))
                    .wrap_err("zero supply ramp")?;
            }
        }
        Ok(())
    }

    /// One full control tick: sample, estimate, map, smooth, actuate,
    /// evaluate the interlock, then sleep the fixed tick period.
    pub fn tick(&mut self) -> Result<Snapshot> {
        let raw = sampler::read_averaged(&mut *self.adc, &self.sensor, &*self.clock);
        let snap = self.apply(raw)?;
        self.clock.sleep(Duration::from_millis(self.gauge.tick_ms));
        Ok(snap)
    }

    /// Process an externally produced raw sample. No acquisition delay and
    /// no end-of-tick sleep; timing still advances through the clock.
    pub fn tick_from_raw(&mut self, raw: u16) -> Result<Snapshot> {
        self.apply(raw)
    }

    fn apply(&mut self, raw: u16) -> Result<Snapshot> {
        let resistance = level::estimate_resistance(raw, &self.sensor);
        let target = mapping::target_duty(resistance, &self.sensor, &self.gauge);
        let smoothed = self.filter.update(target, self.gauge.ema_alpha);
        let duty = self.filter.output();

        self.gauge_out
            .set_duty(duty)
            .map_err(|e| Report::new(map_hw_error(&*e)))
            .wrap_err("gauge pwm write")?;

        let now = self.clock.ms_since(self.epoch);
        let decision = self.safety.evaluate(duty, now, &self.safety_cfg);
        self.indicator
            .write(decision.indicator_on)
            .map_err(|e| Report::new(map_hw_error(&*e)))
            .wrap_err("indicator write")?;

        let ramp = match &mut self.power {
            PowerLink::KillLine(pin) => {
                // Kill line is active-low: high keeps the power on.
                pin.write(!decision.cutoff)
                    .map_err(|e| Report::new(map_hw_error(&*e)))
                    .wrap_err("kill line write")?;
                None
            }
            PowerLink::Ramp { supply, enable, ctl } => {
                let en = enable
                    .is_high()
                    .map_err(|e| Report::new(map_hw_error(&*e)))
                    .wrap_err("enable input read")?;
                let value = ctl.tick(en, decision.cutoff, now, &self.ramp_cfg);
                supply
                    .set_duty(value.min(255) as u8)
                    .map_err(|e| Report::new(map_hw_error(&*e)))
                    .wrap_err("supply pwm write")?;
                Some(RampSnapshot {
                    phase: ctl.phase(),
                    value,
                })
            }
        };

        tracing::debug!(
            resistance_ohms = resistance,
            duty,
            cutoff = decision.cutoff,
            "tick"
        );

        let snap = Snapshot {
            resistance_ohms: resistance,
            target_duty: target,
            smoothed_duty: smoothed,
            gauge_duty: duty,
            indicator_on: decision.indicator_on,
            cutoff: decision.cutoff,
            ramp,
        };
        self.last = Some(snap);
        if let Some(tx) = &self.telemetry {
            tx.publish(snap);
        }
        Ok(snap)
    }

    /// Park every output in its de-energized state (best-effort; used on
    /// loop exit). The kill line is driven low: a stopped controller must
    /// not leave downstream power enabled unattended.
    pub fn park(&mut self) {
        if let Err(e) = self.gauge_out.set_duty(self.gauge.min_duty) {
            tracing::warn!(error = %e, "gauge park failed");
        }
        if let Err(e) = self.indicator.write(false) {
            tracing::warn!(error = %e, "indicator clear failed");
        }
        match &mut self.power {
            PowerLink::KillLine(pin) => {
                if let Err(e) = pin.write(false) {
                    tracing::warn!(error = %e, "kill line park failed");
                }
            }
            PowerLink::Ramp { supply, ctl, .. } => {
                *ctl = RampCtl::new();
                if let Err(e) = supply.set_duty(0) {
                    tracing::warn!(error = %e, "supply park failed");
                }
            }
        }
    }

    /// Last completed tick, if any.
    pub fn last_snapshot(&self) -> Option<Snapshot> {
        self.last
    }

    /// Current smoothed duty (floating filter state).
    pub fn smoothed_duty(&self) -> f32 {
        self.filter.smoothed()
    }

    /// Whether the cutoff axis asserted on the last evaluation.
    pub fn cutoff_active(&self) -> bool {
        self.safety.cutoff()
    }

    /// Configured tick period.
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.gauge.tick_ms)
    }
}

// Type-state markers for the builder
pub struct Missing;
pub struct Set;

/// Builder for `GaugeController`. The ADC and the output bundle are
/// required through the type-state; everything else defaults.
pub struct GaugeBuilder<A, O> {
    adc: Option<Box<dyn AnalogIn>>,
    gauge_out: Option<Box<dyn PwmOut>>,
    indicator: Option<Box<dyn DigitalOut>>,
    power: Option<PowerLink>,
    sensor: Option<SensorCfg>,
    gauge: Option<GaugeCfg>,
    safety: Option<SafetyCfg>,
    ramp: Option<RampCfg>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    telemetry: Option<TelemetryTx>,
    _a: PhantomData<A>,
    _o: PhantomData<O>,
}

impl Default for GaugeBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            adc: None,
            gauge_out: None,
            indicator: None,
            power: None,
            sensor: None,
            gauge: None,
            safety: None,
            ramp: None,
            clock: None,
            telemetry: None,
            _a: PhantomData,
            _o: PhantomData,
        }
    }
}

/// Chainable setters that do not affect type-state
impl<A, O> GaugeBuilder<A, O> {
    pub fn with_sensor(mut self, sensor: SensorCfg) -> Self {
        self.sensor = Some(sensor);
        self
    }
    pub fn with_gauge(mut self, gauge: GaugeCfg) -> Self {
        self.gauge = Some(gauge);
        self
    }
    pub fn with_safety(mut self, safety: SafetyCfg) -> Self {
        self.safety = Some(safety);
        self
    }
    pub fn with_ramp(mut self, ramp: RampCfg) -> Self {
        self.ramp = Some(ramp);
        self
    }
    /// Provide a custom clock implementation; defaults to MonotonicClock.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
    /// Publish a snapshot to this channel after every tick.
    pub fn with_telemetry(mut self, tx: TelemetryTx) -> Self {
        self.telemetry = Some(tx);
        self
    }

    /// Fallible build available in any type-state; returns a detailed
    /// BuildError for missing pieces.
    pub fn try_build(self) -> Result<GaugeController> {
        let GaugeBuilder {
            adc,
            gauge_out,
            indicator,
            power,
            sensor,
            gauge,
            safety,
            ramp,
            clock,
            telemetry,
            _a: _,
            _o: _,
        } = self;

        let adc = adc.ok_or_else(|| Report::new(BuildError::MissingAdc))?;
        let gauge_out = gauge_out.ok_or_else(|| Report::new(BuildError::MissingOutputs))?;
        let indicator = indicator.ok_or_else(|| Report::new(BuildError::MissingOutputs))?;
        let power = power.ok_or_else(|| Report::new(BuildError::MissingOutputs))?;

        let sensor = sensor.unwrap_or_default();
        let gauge = gauge.unwrap_or_default();
        let safety = safety.unwrap_or_default();
        let ramp = ramp.unwrap_or_default();
        let clock: Arc<dyn Clock + Send + Sync> = match clock {
            Some(b) => Arc::from(b),
            None => Arc::new(MonotonicClock::new()),
        };

        // Validate configs (non-panicking; return typed Config errors)
        if !sensor.max_resistance_ohms.is_finite() || sensor.max_resistance_ohms <= 0.0 {
            return Err(Report::new(BuildError::InvalidConfig(
                "max_resistance_ohms must be finite and > 0",
            )));
        }
        if !sensor.min_resistance_ohms.is_finite()
            || sensor.min_resistance_ohms < 0.0
            || sensor.min_resistance_ohms >= sensor.max_resistance_ohms
        {
            return Err(Report::new(BuildError::InvalidConfig(
                "min_resistance_ohms must be in [0, max_resistance_ohms)",
            )));
        }
        if !sensor.known_resistor_ohms.is_finite() || sensor.known_resistor_ohms <= 0.0 {
            return Err(Report::new(BuildError::InvalidConfig(
                "known_resistor_ohms must be finite and > 0",
            )));
        }
        if sensor.adc_full_scale == 0 {
            return Err(Report::new(BuildError::InvalidConfig(
                "adc_full_scale must be > 0",
            )));
        }
        if !(sensor.vref_volts.is_finite() && sensor.vref_volts > 0.0) {
            return Err(Report::new(BuildError::InvalidConfig(
                "vref_volts must be finite and > 0",
            )));
        }
        if sensor.adc_samples == 0 {
            return Err(Report::new(BuildError::InvalidConfig(
                "adc_samples must be >= 1",
            )));
        }
        if gauge.min_duty >= gauge.max_duty {
            return Err(Report::new(BuildError::InvalidConfig(
                "min_duty must be < max_duty",
            )));
        }
        if !(gauge.ema_alpha > 0.0 && gauge.ema_alpha <= 1.0) {
            return Err(Report::new(BuildError::InvalidConfig(
                "ema_alpha must be in (0.0, 1.0]",
            )));
        }
        if gauge.tick_ms == 0 {
            return Err(Report::new(BuildError::InvalidConfig(
                "tick_ms must be >= 1",
            )));
        }
        if safety.low_level_threshold > safety.blink_threshold {
            return Err(Report::new(BuildError::InvalidConfig(
                "low_level_threshold must be <= blink_threshold",
            )));
        }
        if safety.blink_threshold > gauge.max_duty {
            return Err(Report::new(BuildError::InvalidConfig(
                "blink_threshold must be <= max_duty",
            )));
        }
        if safety.blink_interval_ms == 0 {
            return Err(Report::new(BuildError::InvalidConfig(
                "blink_interval_ms must be >= 1",
            )));
        }
        if ramp.max_value == 0 || ramp.max_value > 255 {
            return Err(Report::new(BuildError::InvalidConfig(
                "ramp max_value must be in 1..=255",
            )));
        }
        if ramp.step_size == 0 {
            return Err(Report::new(BuildError::InvalidConfig(
                "ramp step_size must be >= 1",
            )));
        }
        if ramp.step_delay_ms == 0 {
            return Err(Report::new(BuildError::InvalidConfig(
                "ramp step_delay_ms must be >= 1",
            )));
        }

        let epoch = clock.now();
        let filter = DutyFilter::new(gauge.min_duty);

        Ok(GaugeController {
            adc,
            gauge_out,
            indicator,
            power,
            sensor,
            gauge,
            safety_cfg: safety,
            ramp_cfg: ramp,
            clock,
            epoch,
            filter,
            safety: SafetyCtl::new(),
            last: None,
            telemetry,
        })
    }
}

// Setters that advance type-state when providing mandatory components
impl<O> GaugeBuilder<Missing, O> {
    pub fn with_adc(self, adc: impl AnalogIn + 'static) -> GaugeBuilder<Set, O> {
        let GaugeBuilder {
            adc: _,
            gauge_out,
            indicator,
            power,
            sensor,
            gauge,
            safety,
            ramp,
            clock,
            telemetry,
            _a: _,
            _o: _,
        } = self;
        GaugeBuilder {
            adc: Some(Box::new(adc)),
            gauge_out,
            indicator,
            power,
            sensor,
            gauge,
            safety,
            ramp,
            clock,
            telemetry,
            _a: PhantomData,
            _o: PhantomData,
        }
    }
}

impl<A> GaugeBuilder<A, Missing> {
    /// Provide the full output bundle: gauge PWM, low-level indicator, and
    /// the power link (kill line or supply ramp).
    pub fn with_outputs(
        self,
        gauge_out: impl PwmOut + 'static,
        indicator: impl DigitalOut + 'static,
        power: PowerLink,
    ) -> GaugeBuilder<A, Set> {
        let GaugeBuilder {
            adc,
            gauge_out: _,
            indicator: _,
            power: _,
            sensor,
            gauge,
            safety,
            ramp,
            clock,
            telemetry,
            _a: _,
            _o: _,
        } = self;
        GaugeBuilder {
            adc,
            gauge_out: Some(Box::new(gauge_out)),
            indicator: Some(Box::new(indicator)),
            power: Some(power),
            sensor,
            gauge,
            safety,
            ramp,
            clock,
            telemetry,
            _a: PhantomData,
            _o: PhantomData,
        }
    }
}

impl GaugeBuilder<Set, Set> {
    /// Validate and build the controller. Only available once the ADC and
    /// the output bundle are set.
    pub fn build(self) -> Result<GaugeController> {
        self.try_build()
    }
}
