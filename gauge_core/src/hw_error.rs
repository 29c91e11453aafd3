//! Mapping from boxed hardware errors to typed `GaugeError`s.

use crate::error::GaugeError;

/// Map any error to a typed GaugeError, with precise handling for hardware
/// errors when the `hardware-errors` feature is enabled.
pub(crate) fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> GaugeError {
    #[cfg(feature = "hardware-errors")]
    if let Some(hw) = e.downcast_ref::<gauge_hardware::error::HwError>() {
        return GaugeError::HardwareFault(hw.to_string());
    }
    GaugeError::Hardware(e.to_string())
}
