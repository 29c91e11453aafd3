//! MCP3208 12-bit SPI ADC, the float-sensor front end on the Pi backend.

use tracing::trace;

use crate::error::{HwError, Result};

pub struct Mcp3208 {
    spi: rppal::spi::Spi,
    channel: u8,
}

impl Mcp3208 {
    pub fn new(bus: u8, ce: u8, channel: u8) -> Result<Self> {
        use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

        if channel > 7 {
            return Err(HwError::Spi(format!("channel {channel} out of range 0..=7")));
        }
        let bus = match bus {
            0 => Bus::Spi0,
            1 => Bus::Spi1,
            other => return Err(HwError::Spi(format!("unsupported SPI bus {other}"))),
        };
        let ss = match ce {
            0 => SlaveSelect::Ss0,
            1 => SlaveSelect::Ss1,
            2 => SlaveSelect::Ss2,
            other => return Err(HwError::Spi(format!("unsupported chip enable {other}"))),
        };
        // 1 MHz is well inside the MCP3208 limit at 3.3 V
        let spi = Spi::new(bus, ss, 1_000_000, Mode::Mode0)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        Ok(Self { spi, channel })
    }

    /// One single-ended conversion on the configured channel.
    pub fn read_channel(&mut self) -> Result<u16> {
        // Start bit + single-ended flag, then the channel select bits,
        // per the MCP3208 datasheet framing.
        let tx = [
            0x06 | (self.channel >> 2),
            (self.channel & 0x03) << 6,
            0x00,
        ];
        let mut rx = [0u8; 3];
        self.spi
            .transfer(&mut rx, &tx)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        let raw = (u16::from(rx[1] & 0x0F) << 8) | u16::from(rx[2]);
        trace!(raw, channel = self.channel, "mcp3208 conversion");
        Ok(raw)
    }
}

impl gauge_traits::AnalogIn for Mcp3208 {
    fn read(&mut self) -> std::result::Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.read_channel()?)
    }
}
