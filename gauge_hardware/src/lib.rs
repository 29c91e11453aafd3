//! Device backends for the gauge controller.
//!
//! The simulated backend is always available and is the default for
//! development and tests. The Raspberry Pi backend (MCP3208 ADC over SPI,
//! hardware PWM, GPIO) lives behind the `hardware` feature.

pub mod error;

#[cfg(feature = "hardware")]
pub mod mcp3208;
#[cfg(feature = "hardware")]
pub mod pi;

use std::cell::Cell;
use std::rc::Rc;

use gauge_traits::{AnalogIn, DigitalIn, DigitalOut, PwmOut};

/// Gauge PWM carrier frequency used by the Pi backend (Hz).
pub const PWM_FREQUENCY_HZ: f64 = 5_000.0;

/// Simulated float sensor behind a voltage divider.
///
/// Produces the raw counts a 12-bit ADC would read for the current sender
/// resistance: `raw = full_scale * r / (r + known_resistor)`. The resistance
/// can drift by a fixed amount per read to emulate a tank slowly emptying,
/// and can be moved externally through [`SimulatedFloatSensor::handle`].
pub struct SimulatedFloatSensor {
    resistance: Rc<Cell<f32>>,
    drift_ohms_per_read: f32,
    known_resistor_ohms: f32,
    vref_volts: f32,
    adc_full_scale: u16,
}

/// Shared handle that moves the simulated sender resistance.
#[derive(Clone)]
pub struct SimulatedLevel(Rc<Cell<f32>>);

impl SimulatedLevel {
    pub fn set_ohms(&self, ohms: f32) {
        self.0.set(ohms);
    }

    pub fn ohms(&self) -> f32 {
        self.0.get()
    }
}

impl SimulatedFloatSensor {
    pub fn new(initial_ohms: f32, known_resistor_ohms: f32) -> Self {
        Self {
            resistance: Rc::new(Cell::new(initial_ohms)),
            drift_ohms_per_read: 0.0,
            known_resistor_ohms,
            vref_volts: 3.3,
            adc_full_scale: 4095,
        }
    }

    /// Emulate a draining tank: sender resistance grows by this many ohms
    /// on every read.
    pub fn with_drift(mut self, ohms_per_read: f32) -> Self {
        self.drift_ohms_per_read = ohms_per_read;
        self
    }

    pub fn handle(&self) -> SimulatedLevel {
        SimulatedLevel(self.resistance.clone())
    }
}

impl AnalogIn for SimulatedFloatSensor {
    fn read(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        let r = self.resistance.get().max(0.0);
        self.resistance.set(r + self.drift_ohms_per_read);
        let ratio = r / (r + self.known_resistor_ohms);
        let raw = (ratio * f32::from(self.adc_full_scale)).round() as u16;
        tracing::trace!(ohms = r, raw, "simulated float sensor read");
        Ok(raw.min(self.adc_full_scale))
    }
}

/// Simulated PWM channel; remembers the last written duty.
pub struct SimulatedPwm {
    label: &'static str,
    duty: Rc<Cell<u8>>,
}

/// Read side of a [`SimulatedPwm`], for assertions and monitoring.
#[derive(Clone)]
pub struct SimulatedDuty(Rc<Cell<u8>>);

impl SimulatedDuty {
    pub fn get(&self) -> u8 {
        self.0.get()
    }
}

impl SimulatedPwm {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            duty: Rc::new(Cell::new(0)),
        }
    }

    pub fn handle(&self) -> SimulatedDuty {
        SimulatedDuty(self.duty.clone())
    }
}

impl PwmOut for SimulatedPwm {
    fn set_duty(&mut self, duty: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.duty.set(duty);
        tracing::trace!(channel = self.label, duty, "simulated pwm write");
        Ok(())
    }
}

/// Simulated digital output; remembers the last written level.
pub struct SimulatedPin {
    label: &'static str,
    state: Rc<Cell<bool>>,
}

/// Read side of a [`SimulatedPin`].
#[derive(Clone)]
pub struct SimulatedLevelOut(Rc<Cell<bool>>);

impl SimulatedLevelOut {
    pub fn is_high(&self) -> bool {
        self.0.get()
    }
}

impl SimulatedPin {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            state: Rc::new(Cell::new(false)),
        }
    }

    pub fn handle(&self) -> SimulatedLevelOut {
        SimulatedLevelOut(self.state.clone())
    }
}

impl DigitalOut for SimulatedPin {
    fn write(&mut self, high: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.state.set(high);
        tracing::trace!(pin = self.label, high, "simulated pin write");
        Ok(())
    }
}

/// Simulated active-high input (the external enable signal).
pub struct SimulatedEnable {
    state: Rc<Cell<bool>>,
}

/// Write side of a [`SimulatedEnable`].
#[derive(Clone)]
pub struct SimulatedSwitch(Rc<Cell<bool>>);

impl SimulatedSwitch {
    pub fn set(&self, high: bool) {
        self.0.set(high);
    }
}

impl SimulatedEnable {
    pub fn new(initial: bool) -> Self {
        Self {
            state: Rc::new(Cell::new(initial)),
        }
    }

    pub fn handle(&self) -> SimulatedSwitch {
        SimulatedSwitch(self.state.clone())
    }
}

impl DigitalIn for SimulatedEnable {
    fn is_high(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.state.get())
    }
}
