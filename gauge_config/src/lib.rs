#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas for the gauge controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - `ApiConfig` is the flat camelCase DTO exchanged with the external
//!   configuration endpoint (GET current / POST full replace / reset).
//!
//! Validation policy: out-of-range values are rejected, never clamped.
//! The control engine assumes the ordering invariants hold, so they are
//! enforced here before any value crosses into the core.
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Pins {
    /// MCP3208 channel wired to the float sensor divider
    pub adc_channel: u8,
    pub spi_bus: u8,
    pub spi_ce: u8,
    /// Hardware PWM channel for the gauge needle
    pub gauge_pwm: u8,
    /// Hardware PWM channel for the supply ramp (ramp mode only)
    pub supply_pwm: u8,
    pub indicator: u8,
    /// Discrete kill line (kill mode only)
    pub kill: u8,
    /// Active-high enable input (ramp mode only)
    pub enable_in: u8,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            adc_channel: 0,
            spi_bus: 0,
            spi_ce: 0,
            gauge_pwm: 0,
            supply_pwm: 1,
            indicator: 26,
            kill: 27,
            enable_in: 17,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SensorCfg {
    /// Sender resistance with the tank empty (Ω)
    pub max_resistance_ohms: f32,
    /// Sender resistance with the tank full (Ω)
    pub min_resistance_ohms: f32,
    /// Series resistor of the voltage divider (Ω)
    pub known_resistor_ohms: f32,
    /// Full-scale ADC count (4095 for a 12-bit converter)
    pub adc_full_scale: u16,
    pub vref_volts: f32,
    /// Readings averaged per sample
    pub adc_samples: u32,
    /// Spacing between consecutive readings (µs)
    pub sample_delay_us: u64,
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self {
            max_resistance_ohms: 240.0,
            min_resistance_ohms: 30.0,
            known_resistor_ohms: 10_000.0,
            adc_full_scale: 4095,
            vref_volts: 3.3,
            adc_samples: 10,
            sample_delay_us: 500,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GaugeCfg {
    /// Needle position for an empty tank
    pub min_duty: u8,
    /// Needle position for a full tank
    pub max_duty: u8,
    /// EMA weight for needle smoothing. Range: (0.0, 1.0].
    pub ema_alpha: f32,
    /// Control loop period (ms)
    pub tick_ms: u64,
}

impl Default for GaugeCfg {
    fn default() -> Self {
        Self {
            min_duty: 140,
            max_duty: 225,
            ema_alpha: 0.05,
            tick_ms: 50,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SafetyCfg {
    /// Blink the indicator below this smoothed duty
    pub blink_threshold: u8,
    /// Cut power / stop the ramp below this smoothed duty
    pub low_level_threshold: u8,
    pub blink_interval_ms: u64,
}

impl Default for SafetyCfg {
    fn default() -> Self {
        Self {
            blink_threshold: 150,
            low_level_threshold: 145,
            blink_interval_ms: 250,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PowerMode {
    /// Discrete kill output (variant 1)
    #[default]
    Kill,
    /// PWM supply ramp gated by the external enable input (variant 2)
    Ramp,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct PowerCfg {
    pub mode: PowerMode,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RampCfg {
    /// Supply duty held in the Running state (0..=255)
    pub max_value: u32,
    /// Duty added per ramp step
    pub step_size: u32,
    /// Minimum spacing between ramp steps (ms)
    pub step_delay_ms: u64,
}

impl Default for RampCfg {
    fn default() -> Self {
        Self {
            max_value: 255,
            step_size: 5,
            step_delay_ms: 20,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub pins: Pins,
    pub sensor: SensorCfg,
    pub gauge: GaugeCfg,
    pub safety: SafetyCfg,
    pub power: PowerCfg,
    pub ramp: RampCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Sensor
        if !self.sensor.max_resistance_ohms.is_finite() || self.sensor.max_resistance_ohms <= 0.0 {
            eyre::bail!("sensor.max_resistance_ohms must be finite and > 0");
        }
        if !self.sensor.min_resistance_ohms.is_finite() || self.sensor.min_resistance_ohms < 0.0 {
            eyre::bail!("sensor.min_resistance_ohms must be finite and >= 0");
        }
        if self.sensor.min_resistance_ohms >= self.sensor.max_resistance_ohms {
            eyre::bail!("sensor.min_resistance_ohms must be < sensor.max_resistance_ohms");
        }
        if !self.sensor.known_resistor_ohms.is_finite() || self.sensor.known_resistor_ohms <= 0.0 {
            eyre::bail!("sensor.known_resistor_ohms must be finite and > 0");
        }
        if self.sensor.adc_full_scale == 0 {
            eyre::bail!("sensor.adc_full_scale must be > 0");
        }
        if !(self.sensor.vref_volts.is_finite() && self.sensor.vref_volts > 0.0) {
            eyre::bail!("sensor.vref_volts must be finite and > 0");
        }
        if self.sensor.adc_samples == 0 {
            eyre::bail!("sensor.adc_samples must be >= 1");
        }

        // Gauge
        if self.gauge.min_duty >= self.gauge.max_duty {
            eyre::bail!("gauge.min_duty must be < gauge.max_duty");
        }
        if !(self.gauge.ema_alpha > 0.0 && self.gauge.ema_alpha <= 1.0) {
            eyre::bail!("gauge.ema_alpha must be in (0.0, 1.0]");
        }
        if self.gauge.tick_ms == 0 {
            eyre::bail!("gauge.tick_ms must be >= 1");
        }

        // Safety ordering: cutoff must never fire with the indicator dark
        if self.safety.low_level_threshold > self.safety.blink_threshold {
            eyre::bail!("safety.low_level_threshold must be <= safety.blink_threshold");
        }
        if self.safety.blink_threshold > self.gauge.max_duty {
            eyre::bail!("safety.blink_threshold must be <= gauge.max_duty");
        }
        if self.safety.blink_interval_ms == 0 {
            eyre::bail!("safety.blink_interval_ms must be >= 1");
        }

        // Ramp
        if self.ramp.max_value == 0 || self.ramp.max_value > 255 {
            eyre::bail!("ramp.max_value must be in 1..=255");
        }
        if self.ramp.step_size == 0 {
            eyre::bail!("ramp.step_size must be >= 1");
        }
        if self.ramp.step_delay_ms == 0 {
            eyre::bail!("ramp.step_delay_ms must be >= 1");
        }

        Ok(())
    }

    /// Full-replace semantics of the external POST endpoint: every field the
    /// DTO carries overwrites the current value; the result is validated as a
    /// whole before it is accepted.
    pub fn with_remote(&self, api: &ApiConfig) -> eyre::Result<Config> {
        let mut next = self.clone();
        next.sensor.max_resistance_ohms = api.max_resistance;
        next.sensor.min_resistance_ohms = api.min_resistance;
        next.sensor.known_resistor_ohms = api.known_resistor;
        next.sensor.adc_samples = api.num_samples;
        next.gauge.min_duty = api.min_duty;
        next.gauge.max_duty = api.max_duty;
        next.safety.blink_threshold = api.blink_threshold;
        next.safety.low_level_threshold = api.low_level_threshold;
        next.safety.blink_interval_ms = api.blink_interval;
        next.ramp.step_delay_ms = api.step_delay;
        next.ramp.max_value = api.pem_max_value;
        next.ramp.step_size = api.pem_step_size;
        next.validate()?;
        Ok(next)
    }
}

/// Flat DTO matching the configuration page payload. Unknown keys in an
/// incoming document (e.g. WiFi credentials, which never reach the core)
/// are ignored.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    pub max_resistance: f32,
    pub min_resistance: f32,
    pub known_resistor: f32,
    pub min_duty: u8,
    pub max_duty: u8,
    pub blink_threshold: u8,
    pub low_level_threshold: u8,
    pub blink_interval: u64,
    pub num_samples: u32,
    pub step_delay: u64,
    pub pem_max_value: u32,
    pub pem_step_size: u32,
}

impl From<&Config> for ApiConfig {
    fn from(c: &Config) -> Self {
        Self {
            max_resistance: c.sensor.max_resistance_ohms,
            min_resistance: c.sensor.min_resistance_ohms,
            known_resistor: c.sensor.known_resistor_ohms,
            min_duty: c.gauge.min_duty,
            max_duty: c.gauge.max_duty,
            blink_threshold: c.safety.blink_threshold,
            low_level_threshold: c.safety.low_level_threshold,
            blink_interval: c.safety.blink_interval_ms,
            num_samples: c.sensor.adc_samples,
            step_delay: c.ramp.step_delay_ms,
            pem_max_value: c.ramp.max_value,
            pem_step_size: c.ramp.step_size,
        }
    }
}

impl ApiConfig {
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
