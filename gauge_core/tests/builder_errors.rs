use std::cell::Cell;
use std::error::Error;
use std::rc::Rc;

use gauge_core::mocks::FixedAdc;
use gauge_core::{GaugeCfg, GaugeController, PowerLink, SafetyCfg, SensorCfg};
use gauge_traits::{DigitalOut, PwmOut};
use rstest::rstest;

#[derive(Clone)]
struct SpyPwm(Rc<Cell<u8>>);

impl PwmOut for SpyPwm {
    fn set_duty(&mut self, duty: u8) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.0.set(duty);
        Ok(())
    }
}

#[derive(Clone)]
struct SpyPin(Rc<Cell<bool>>);

impl DigitalOut for SpyPin {
    fn write(&mut self, high: bool) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.0.set(high);
        Ok(())
    }
}

fn outputs() -> (SpyPwm, SpyPin, PowerLink) {
    (
        SpyPwm(Rc::new(Cell::new(0))),
        SpyPin(Rc::new(Cell::new(false))),
        PowerLink::kill_line(SpyPin(Rc::new(Cell::new(false)))),
    )
}

#[test]
fn try_build_without_adc_reports_missing_adc() {
    let (pwm, pin, power) = outputs();
    let err = GaugeController::builder()
        .with_outputs(pwm, pin, power)
        .try_build()
        .expect_err("must fail without adc");
    assert!(format!("{err}").contains("missing adc"));
}

#[test]
fn try_build_without_outputs_reports_missing_outputs() {
    let err = GaugeController::builder()
        .with_adc(FixedAdc(0))
        .try_build()
        .expect_err("must fail without outputs");
    assert!(format!("{err}").contains("missing outputs"));
}

#[rstest]
#[case::inverted_resistance(SensorCfg { min_resistance_ohms: 300.0, ..SensorCfg::default() }, "min_resistance_ohms")]
#[case::zero_known_resistor(SensorCfg { known_resistor_ohms: 0.0, ..SensorCfg::default() }, "known_resistor_ohms")]
#[case::zero_samples(SensorCfg { adc_samples: 0, ..SensorCfg::default() }, "adc_samples")]
#[case::zero_vref(SensorCfg { vref_volts: 0.0, ..SensorCfg::default() }, "vref_volts")]
fn rejects_invalid_sensor_config(#[case] sensor: SensorCfg, #[case] needle: &str) {
    let (pwm, pin, power) = outputs();
    let err = GaugeController::builder()
        .with_adc(FixedAdc(0))
        .with_outputs(pwm, pin, power)
        .with_sensor(sensor)
        .build()
        .expect_err("invalid sensor config must be rejected");
    let msg = format!("{err}");
    assert!(msg.contains(needle), "unexpected error: {msg}");
}

#[rstest]
#[case::inverted_duty(GaugeCfg { min_duty: 225, max_duty: 140, ..GaugeCfg::default() }, "min_duty")]
#[case::zero_alpha(GaugeCfg { ema_alpha: 0.0, ..GaugeCfg::default() }, "ema_alpha")]
#[case::alpha_above_one(GaugeCfg { ema_alpha: 1.5, ..GaugeCfg::default() }, "ema_alpha")]
#[case::zero_tick(GaugeCfg { tick_ms: 0, ..GaugeCfg::default() }, "tick_ms")]
fn rejects_invalid_gauge_config(#[case] gauge: GaugeCfg, #[case] needle: &str) {
    let (pwm, pin, power) = outputs();
    let err = GaugeController::builder()
        .with_adc(FixedAdc(0))
        .with_outputs(pwm, pin, power)
        .with_gauge(gauge)
        .build()
        .expect_err("invalid gauge config must be rejected");
    let msg = format!("{err}");
    assert!(msg.contains(needle), "unexpected error: {msg}");
}

#[test]
fn rejects_threshold_ordering_violation() {
    // Cutoff above blink would let the power drop with the indicator dark.
    let (pwm, pin, power) = outputs();
    let err = GaugeController::builder()
        .with_adc(FixedAdc(0))
        .with_outputs(pwm, pin, power)
        .with_safety(SafetyCfg {
            blink_threshold: 150,
            low_level_threshold: 160,
            blink_interval_ms: 250,
        })
        .build()
        .expect_err("ordering violation must be rejected");
    assert!(format!("{err}").contains("low_level_threshold"));
}
