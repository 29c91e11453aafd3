//! `From` implementations bridging `gauge_config` types to `gauge_core` types.
//!
//! These keep the CLI free of field-by-field mapping.

use crate::config::{GaugeCfg, RampCfg, SafetyCfg, SensorCfg};

impl From<&gauge_config::SensorCfg> for SensorCfg {
    fn from(c: &gauge_config::SensorCfg) -> Self {
        Self {
            max_resistance_ohms: c.max_resistance_ohms,
            min_resistance_ohms: c.min_resistance_ohms,
            known_resistor_ohms: c.known_resistor_ohms,
            adc_full_scale: c.adc_full_scale,
            vref_volts: c.vref_volts,
            adc_samples: c.adc_samples,
            sample_delay_us: c.sample_delay_us,
        }
    }
}

impl From<&gauge_config::GaugeCfg> for GaugeCfg {
    fn from(c: &gauge_config::GaugeCfg) -> Self {
        Self {
            min_duty: c.min_duty,
            max_duty: c.max_duty,
            ema_alpha: c.ema_alpha,
            tick_ms: c.tick_ms,
        }
    }
}

impl From<&gauge_config::SafetyCfg> for SafetyCfg {
    fn from(c: &gauge_config::SafetyCfg) -> Self {
        Self {
            blink_threshold: c.blink_threshold,
            low_level_threshold: c.low_level_threshold,
            blink_interval_ms: c.blink_interval_ms,
        }
    }
}

impl From<&gauge_config::RampCfg> for RampCfg {
    fn from(c: &gauge_config::RampCfg) -> Self {
        Self {
            max_value: c.max_value,
            step_size: c.step_size,
            step_delay_ms: c.step_delay_ms,
        }
    }
}
