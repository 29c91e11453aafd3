use criterion::{criterion_group, criterion_main, Criterion};

use std::cell::Cell;
use std::error::Error;
use std::rc::Rc;

use gauge_core::mocks::FixedAdc;
use gauge_core::{GaugeController, PowerLink, SensorCfg};
use gauge_traits::{DigitalOut, PwmOut};

#[derive(Clone)]
struct SinkPwm(Rc<Cell<u8>>);

impl PwmOut for SinkPwm {
    fn set_duty(&mut self, duty: u8) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.0.set(duty);
        Ok(())
    }
}

#[derive(Clone)]
struct SinkPin(Rc<Cell<bool>>);

impl DigitalOut for SinkPin {
    fn write(&mut self, high: bool) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.0.set(high);
        Ok(())
    }
}

fn bench_tick(c: &mut Criterion) {
    let mut gauge = GaugeController::builder()
        .with_adc(FixedAdc(2000))
        .with_outputs(
            SinkPwm(Rc::new(Cell::new(0))),
            SinkPin(Rc::new(Cell::new(false))),
            PowerLink::kill_line(SinkPin(Rc::new(Cell::new(false)))),
        )
        .with_sensor(SensorCfg {
            known_resistor_ohms: 100.0,
            ..SensorCfg::default()
        })
        .build()
        .expect("build controller");
    gauge.begin().expect("begin");

    let mut raw = 500u16;
    c.bench_function("tick_from_raw", |b| {
        b.iter(|| {
            raw = if raw >= 3500 { 500 } else { raw + 7 };
            gauge.tick_from_raw(std::hint::black_box(raw)).expect("tick")
        })
    });
}

criterion_group!(benches, bench_tick);
criterion_main!(benches);
