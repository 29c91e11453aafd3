use gauge_hardware::{SimulatedEnable, SimulatedFloatSensor, SimulatedPin, SimulatedPwm};
use gauge_traits::{AnalogIn, DigitalIn, DigitalOut, PwmOut};
use rstest::rstest;

#[rstest]
#[case(0.0, 100.0, 0)] // shorted sender reads the floor
#[case(100.0, 100.0, 2048)] // r == known -> half scale
#[case(300.0, 100.0, 3071)] // 3/4 of the rail
fn divider_counts_match_the_model(#[case] ohms: f32, #[case] known: f32, #[case] expect: u16) {
    let mut sensor = SimulatedFloatSensor::new(ohms, known);
    let raw = sensor.read().unwrap();
    assert!(
        (i32::from(raw) - i32::from(expect)).abs() <= 1,
        "ohms {ohms}: raw {raw}, expected about {expect}"
    );
}

#[rstest]
fn external_level_handle_moves_the_reading() {
    let mut sensor = SimulatedFloatSensor::new(30.0, 100.0);
    let level = sensor.handle();
    let full = sensor.read().unwrap();
    level.set_ohms(240.0);
    let empty = sensor.read().unwrap();
    assert!(empty > full, "draining must raise the divider reading");
}

#[rstest]
fn outputs_are_observable_through_handles() {
    let mut gauge = SimulatedPwm::new("gauge");
    let duty = gauge.handle();
    gauge.set_duty(199).unwrap();
    assert_eq!(duty.get(), 199);

    let mut kill = SimulatedPin::new("kill");
    let line = kill.handle();
    kill.write(true).unwrap();
    assert!(line.is_high());
    kill.write(false).unwrap();
    assert!(!line.is_high());

    let mut enable = SimulatedEnable::new(false);
    let switch = enable.handle();
    switch.set(true);
    assert!(enable.is_high().unwrap());
}
