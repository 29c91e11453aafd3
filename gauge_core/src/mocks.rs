//! Test and helper doubles for gauge_core.

use gauge_traits::AnalogIn;

/// An ADC that always errors on read; useful when driving the control loop
/// with externally produced raw values via `tick_from_raw`.
pub struct NoopAdc;

impl AnalogIn for NoopAdc {
    fn read(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("noop adc")))
    }
}

/// An ADC that returns the same raw counts forever.
pub struct FixedAdc(pub u16);

impl AnalogIn for FixedAdc {
    fn read(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.0)
    }
}
