//! Runtime configuration for the control engine.
//!
//! These are the structs consumed by `GaugeController`. They are separate
//! from the TOML-deserialized config in `gauge_config`; see `conversions`
//! for the bridging `From` impls.

/// Float sensor and ADC model.
#[derive(Debug, Clone)]
pub struct SensorCfg {
    /// Sender resistance with the tank empty (Ω).
    pub max_resistance_ohms: f32,
    /// Sender resistance with the tank full (Ω).
    pub min_resistance_ohms: f32,
    /// Series resistor of the voltage divider (Ω).
    pub known_resistor_ohms: f32,
    /// Full-scale ADC count (4095 for 12-bit).
    pub adc_full_scale: u16,
    pub vref_volts: f32,
    /// Readings averaged per sample.
    pub adc_samples: u32,
    /// Spacing between consecutive readings (µs).
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

/// Needle mapping and loop pacing.
#[derive(Debug, Clone)]
pub struct GaugeCfg {
    /// Duty written for an empty tank.
    pub min_duty: u8,
    /// Duty written for a full tank.
    pub max_duty: u8,
    /// EMA weight applied to the target duty each tick. Range: (0.0, 1.0].
    pub ema_alpha: f32,
    /// Control loop period (ms).
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

/// Low-level interlock thresholds, in smoothed-duty units.
///
/// Invariant (enforced at build and at the config boundary):
/// `low_level_threshold <= blink_threshold <= max_duty`, so the indicator is
/// always blinking before the cutoff fires.
#[derive(Debug, Clone)]
pub struct SafetyCfg {
    pub blink_threshold: u8,
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

/// Supply ramp shape (variant with the PWM power stage).
#[derive(Debug, Clone)]
pub struct RampCfg {
    /// Duty held in the Running state (0..=255).
    pub max_value: u32,
    /// Duty added per ramp step.
    pub step_size: u32,
    /// Minimum spacing between ramp steps (ms).
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
