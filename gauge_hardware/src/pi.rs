//! Raspberry Pi PWM and GPIO wrappers for the panel outputs.

use crate::error::{HwError, Result};

/// Hardware PWM channel driving the gauge needle or the supply ramp.
pub struct PanelPwm {
    pwm: rppal::pwm::Pwm,
}

impl PanelPwm {
    pub fn new(channel: u8, freq_hz: f64) -> Result<Self> {
        use rppal::pwm::{Channel, Polarity, Pwm};

        let ch = match channel {
            0 => Channel::Pwm0,
            1 => Channel::Pwm1,
            other => return Err(HwError::Pwm(format!("unsupported PWM channel {other}"))),
        };
        let pwm = Pwm::with_frequency(ch, freq_hz, 0.0, Polarity::Normal, true)
            .map_err(|e| HwError::Pwm(e.to_string()))?;
        Ok(Self { pwm })
    }
}

impl gauge_traits::PwmOut for PanelPwm {
    fn set_duty(&mut self, duty: u8) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.pwm
            .set_duty_cycle(f64::from(duty) / 255.0)
            .map_err(|e| HwError::Pwm(e.to_string()))?;
        Ok(())
    }
}

/// Push-pull GPIO output (indicator, kill line).
pub struct PanelOutputPin {
    pin: rppal::gpio::OutputPin,
}

impl PanelOutputPin {
    pub fn new(gpio: u8) -> Result<Self> {
        let pin = rppal::gpio::Gpio::new()
            .map_err(|e| HwError::Gpio(e.to_string()))?
            .get(gpio)
            .map_err(|e| HwError::Gpio(e.to_string()))?
            .into_output();
        Ok(Self { pin })
    }
}

impl gauge_traits::DigitalOut for PanelOutputPin {
    fn write(&mut self, high: bool) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if high {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
        Ok(())
    }
}

/// Pulled-down GPIO input (the external enable signal, active-high).
pub struct PanelInputPin {
    pin: rppal::gpio::InputPin,
}

impl PanelInputPin {
    pub fn new(gpio: u8) -> Result<Self> {
        let pin = rppal::gpio::Gpio::new()
            .map_err(|e| HwError::Gpio(e.to_string()))?
            .get(gpio)
            .map_err(|e| HwError::Gpio(e.to_string()))?
            .into_input_pulldown();
        Ok(Self { pin })
    }
}

impl gauge_traits::DigitalIn for PanelInputPin {
    fn is_high(&mut self) -> std::result::Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.pin.is_high())
    }
}
