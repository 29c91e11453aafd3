//! Resistance estimation from the voltage-divider reading.

use crate::config::SensorCfg;

/// Readings at or below this voltage are treated as a sensor dropout
/// (open circuit, broken wire, unreadable channel). The estimate then falls
/// back to `max_resistance_ohms`: a failed sensor must read as an empty
/// tank, never as a full one.
pub const DROPOUT_VOLTS: f32 = 0.1;

/// Convert averaged raw counts to volts using the ADC full-scale model.
pub fn raw_to_voltage(raw: u16, sensor: &SensorCfg) -> f32 {
    (f32::from(raw) / f32::from(sensor.adc_full_scale.max(1))) * sensor.vref_volts
}

/// Invert the divider: `r = v / (vref - v) * known_resistor`.
///
/// Fallback policy: dropout (see [`DROPOUT_VOLTS`]) and a rail-saturated
/// reading both return `max_resistance_ohms` so downstream stages see an
/// empty tank.
pub fn estimate_resistance(raw: u16, sensor: &SensorCfg) -> f32 {
    let v = raw_to_voltage(raw, sensor);
    if v <= DROPOUT_VOLTS {
        return sensor.max_resistance_ohms;
    }
    let denom = sensor.vref_volts - v;
    if denom <= 0.0 {
        return sensor.max_resistance_ohms;
    }
    v / denom * sensor.known_resistor_ohms
}
