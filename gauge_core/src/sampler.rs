//! Averaged analog acquisition.

use std::time::Duration;

use gauge_traits::{AnalogIn, Clock};

use crate::config::SensorCfg;

/// Arithmetic mean of `adc_samples` consecutive readings, spaced by
/// `sample_delay_us` to decorrelate converter noise. Blocks for roughly
/// `adc_samples * sample_delay_us`.
///
/// There is no error return: a failed read contributes the hardware floor
/// value (0 counts) to the mean, which downstream stages interpret through
/// the dropout rule in `level` (an empty tank, the fail-safe reading).
pub fn read_averaged<A>(adc: &mut A, sensor: &SensorCfg, clock: &dyn Clock) -> u16
where
    A: AnalogIn + ?Sized,
{
    let n = sensor.adc_samples.max(1);
    let mut total: u64 = 0;
    for _ in 0..n {
        match adc.read() {
            Ok(v) => total += u64::from(v),
            Err(e) => {
                tracing::debug!(error = %e, "adc read failed; counting floor sample");
            }
        }
        clock.sleep(Duration::from_micros(sensor.sample_delay_us));
    }
    (total / u64::from(n)) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use gauge_traits::MonotonicClock;

    struct SeqAdc {
        seq: Vec<u16>,
        idx: usize,
    }

    impl AnalogIn for SeqAdc {
        fn read(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
            let v = self.seq.get(self.idx).copied().unwrap_or(0);
            self.idx += 1;
            Ok(v)
        }
    }

    fn sensor(samples: u32) -> SensorCfg {
        SensorCfg {
            adc_samples: samples,
            sample_delay_us: 0,
            ..SensorCfg::default()
        }
    }

    #[test]
    fn averages_n_readings() {
        let mut adc = SeqAdc {
            seq: vec![100, 200, 300, 400],
            idx: 0,
        };
        let mean = read_averaged(&mut adc, &sensor(4), &MonotonicClock::new());
        assert_eq!(mean, 250);
    }

    #[test]
    fn failed_reads_count_as_floor() {
        struct FlakyAdc(u32);
        impl AnalogIn for FlakyAdc {
            fn read(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
                self.0 += 1;
                if self.0 % 2 == 0 {
                    Err("adc offline".into())
                } else {
                    Ok(1000)
                }
            }
        }
        let mean = read_averaged(&mut FlakyAdc(0), &sensor(4), &MonotonicClock::new());
        // Two good reads of 1000, two floor samples
        assert_eq!(mean, 500);
    }
}
