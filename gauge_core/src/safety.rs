//! Low-level safety interlock: indicator blink and power cutoff.

use crate::config::SafetyCfg;

/// Pin commands produced by one interlock evaluation. The control loop
/// performs the actual writes so this state machine stays hardware-free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetyDecision {
    pub indicator_on: bool,
    pub cutoff: bool,
}

/// Two independent axes, evaluated every tick against the smoothed duty:
///
/// - Blink axis: below `blink_threshold` the indicator toggles once per
///   `blink_interval_ms` (edge-triggered toggle, not a fixed duty cycle);
///   at or above the threshold it is forced off and the blink timestamp is
///   left untouched.
/// - Cutoff axis: below `low_level_threshold` the cutoff asserts.
#[derive(Debug, Clone, Copy)]
pub struct SafetyCtl {
    blink_on: bool,
    last_blink_ms: u64,
    cutoff: bool,
}

impl Default for SafetyCtl {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyCtl {
    pub fn new() -> Self {
        Self {
            blink_on: false,
            last_blink_ms: 0,
            cutoff: false,
        }
    }

    pub fn evaluate(&mut self, duty: u8, now_ms: u64, cfg: &SafetyCfg) -> SafetyDecision {
        if duty < cfg.blink_threshold {
            if now_ms.saturating_sub(self.last_blink_ms) >= cfg.blink_interval_ms {
                self.last_blink_ms = now_ms;
                self.blink_on = !self.blink_on;
            }
        } else {
            self.blink_on = false;
        }

        self.cutoff = duty < cfg.low_level_threshold;

        SafetyDecision {
            indicator_on: self.blink_on,
            cutoff: self.cutoff,
        }
    }

    pub fn cutoff(&self) -> bool {
        self.cutoff
    }
}
