//! Per-tick outcome exposed to callers and to the telemetry boundary.

use crate::ramp::RampPhase;

/// State of the supply ramp after a tick (PWM power stage only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RampSnapshot {
    pub phase: RampPhase,
    pub value: u32,
}

/// Everything an external poller needs: last resistance estimate, last
/// target and smoothed duty, and the interlock / ramp running state.
/// Copied out of the loop once per tick; pollers never touch loop state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub resistance_ohms: f32,
    pub target_duty: u8,
    pub smoothed_duty: f32,
    /// Truncated duty actually written to the gauge channel.
    pub gauge_duty: u8,
    pub indicator_on: bool,
    pub cutoff: bool,
    pub ramp: Option<RampSnapshot>,
}
