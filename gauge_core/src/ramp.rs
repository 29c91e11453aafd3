//! Supply ramp state machine (PWM power stage variant).
//!
//! Ramp-up is gradual to avoid inrush stress on the downstream supply;
//! ramp-down is instantaneous because a disable or low-level condition
//! demands the fastest possible de-energization. The asymmetry is a
//! required property, not an accident of the implementation.
//!
//! Stepping happens at most once per control tick. The controller never
//! blocks for the ramp duration: a blocking ramp would starve the safety
//! interlock and the enable-signal re-check for seconds at a time.

use crate::config::RampCfg;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampPhase {
    /// Output 0; no enable edge seen yet.
    Idle,
    /// Output climbing toward `max_value`, one step per tick at most.
    RampingUp,
    /// Output held at `max_value`.
    Running,
    /// Output forced to 0; decays to `Idle` on the next tick.
    Stopped,
}

#[derive(Debug, Clone, Copy)]
pub struct RampCtl {
    phase: RampPhase,
    value: u32,
    last_step_ms: u64,
    prev_enable: bool,
}

impl Default for RampCtl {
    fn default() -> Self {
        Self::new()
    }
}

impl RampCtl {
    pub fn new() -> Self {
        Self {
            phase: RampPhase::Idle,
            value: 0,
            last_step_ms: 0,
            prev_enable: false,
        }
    }

    pub fn phase(&self) -> RampPhase {
        self.phase
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    /// Advance the state machine by one control tick and return the supply
    /// duty to write. `cutoff` overrides `enable`: while asserted, the ramp
    /// is stopped within this tick and a later restart needs a fresh rising
    /// edge on `enable`.
    pub fn tick(&mut self, enable: bool, cutoff: bool, now_ms: u64, cfg: &RampCfg) -> u32 {
        // Stopped is transient: it is observable for exactly one tick, then
        // decays so a fresh rising edge can re-arm the ramp.
        if self.phase == RampPhase::Stopped {
            self.phase = RampPhase::Idle;
        }

        let rising = enable && !self.prev_enable;
        self.prev_enable = enable;

        if cutoff {
            if self.phase != RampPhase::Idle {
                self.phase = RampPhase::Stopped;
            }
            self.value = 0;
            return 0;
        }

        match self.phase {
            RampPhase::Idle => {
                if rising {
                    self.phase = RampPhase::RampingUp;
                    self.step(now_ms, cfg);
                }
            }
            RampPhase::RampingUp => {
                if !enable {
                    self.stop();
                } else if now_ms.saturating_sub(self.last_step_ms) >= cfg.step_delay_ms {
                    self.step(now_ms, cfg);
                }
            }
            RampPhase::Running => {
                if !enable {
                    self.stop();
                } else {
                    self.value = cfg.max_value;
                }
            }
            RampPhase::Stopped => unreachable!("Stopped decays at tick entry"),
        }

        self.value
    }

    fn step(&mut self, now_ms: u64, cfg: &RampCfg) {
        self.last_step_ms = now_ms;
        self.value = self.value.saturating_add(cfg.step_size);
        if self.value >= cfg.max_value {
            self.value = cfg.max_value;
            self.phase = RampPhase::Running;
        }
    }

    fn stop(&mut self) {
        self.phase = RampPhase::Stopped;
        self.value = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> RampCfg {
        RampCfg {
            max_value: 20,
            step_size: 5,
            step_delay_ms: 10,
        }
    }

    #[test]
    fn rises_one_step_per_tick_until_running() {
        let cfg = cfg();
        let mut ctl = RampCtl::new();
        // Enable rises at t=0; ticks every 10ms.
        assert_eq!(ctl.tick(true, false, 0, &cfg), 5);
        assert_eq!(ctl.phase(), RampPhase::RampingUp);
        assert_eq!(ctl.tick(true, false, 10, &cfg), 10);
        assert_eq!(ctl.tick(true, false, 20, &cfg), 15);
        assert_eq!(ctl.tick(true, false, 30, &cfg), 20);
        assert_eq!(ctl.phase(), RampPhase::Running);
        // Holds at max afterwards
        assert_eq!(ctl.tick(true, false, 40, &cfg), 20);
        assert_eq!(ctl.phase(), RampPhase::Running);
    }

    #[test]
    fn disable_drops_to_zero_immediately() {
        let cfg = cfg();
        let mut ctl = RampCtl::new();
        ctl.tick(true, false, 0, &cfg);
        ctl.tick(true, false, 10, &cfg);
        assert_eq!(ctl.tick(false, false, 20, &cfg), 0);
        assert_eq!(ctl.phase(), RampPhase::Stopped);
        // Next tick decays to Idle without any input change
        ctl.tick(false, false, 30, &cfg);
        assert_eq!(ctl.phase(), RampPhase::Idle);
    }

    #[test]
    fn cutoff_overrides_enable_within_one_tick() {
        let cfg = cfg();
        let mut ctl = RampCtl::new();
        ctl.tick(true, false, 0, &cfg);
        ctl.tick(true, false, 10, &cfg);
        // Enable still high, but cutoff asserts
        assert_eq!(ctl.tick(true, true, 20, &cfg), 0);
        assert_eq!(ctl.phase(), RampPhase::Stopped);
        assert_eq!(ctl.value(), 0);
    }

    #[test]
    fn restart_needs_fresh_rising_edge() {
        let cfg = cfg();
        let mut ctl = RampCtl::new();
        ctl.tick(true, false, 0, &cfg);
        ctl.tick(true, true, 10, &cfg); // stopped by cutoff
        // Cutoff cleared but enable never dropped: stays parked
        for t in [20u64, 30, 40] {
            assert_eq!(ctl.tick(true, false, t, &cfg), 0);
            assert_eq!(ctl.phase(), RampPhase::Idle);
        }
        // Drop and re-raise the enable: ramp re-arms
        ctl.tick(false, false, 50, &cfg);
        assert_eq!(ctl.tick(true, false, 60, &cfg), 5);
        assert_eq!(ctl.phase(), RampPhase::RampingUp);
    }

    #[test]
    fn step_delay_paces_steps_between_ticks() {
        let cfg = RampCfg {
            max_value: 20,
            step_size: 5,
            step_delay_ms: 25,
        };
        let mut ctl = RampCtl::new();
        // Ticks every 10ms; a step may only land every 25ms.
        assert_eq!(ctl.tick(true, false, 0, &cfg), 5);
        assert_eq!(ctl.tick(true, false, 10, &cfg), 5);
        assert_eq!(ctl.tick(true, false, 20, &cfg), 5);
        assert_eq!(ctl.tick(true, false, 30, &cfg), 10);
        assert_eq!(ctl.tick(true, false, 40, &cfg), 10);
    }

    #[test]
    fn running_tracks_lowered_max_value() {
        let mut cfg = cfg();
        let mut ctl = RampCtl::new();
        for t in 0..5u64 {
            ctl.tick(true, false, t * 10, &cfg);
        }
        assert_eq!(ctl.phase(), RampPhase::Running);
        cfg.max_value = 12;
        assert_eq!(ctl.tick(true, false, 60, &cfg), 12);
    }
}
