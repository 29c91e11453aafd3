//! Blocking control-loop runner.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::Result;
use crate::status::Snapshot;
use crate::GaugeController;

/// Drive the controller until the shutdown flag is raised or the optional
/// tick budget runs out. Outputs are initialized via `begin()` on entry and
/// parked (de-energized) on every exit path, including errors.
///
/// Returns the last completed snapshot, if any tick ran.
pub fn run(
    gauge: &mut GaugeController,
    shutdown: &AtomicBool,
    max_ticks: Option<u64>,
) -> Result<Option<Snapshot>> {
    gauge.begin()?;
    tracing::info!(period_ms = gauge.tick_period().as_millis() as u64, "control loop start");

    let mut last = None;
    let mut ticks: u64 = 0;
    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!(ticks, "shutdown requested");
            break;
        }
        if let Some(max) = max_ticks
            && ticks >= max
        {
            tracing::info!(ticks, "tick budget reached");
            break;
        }
        match gauge.tick() {
            Ok(snap) => last = Some(snap),
            Err(e) => {
                gauge.park();
                tracing::error!(error = %e, "control loop aborted");
                return Err(e);
            }
        }
        ticks = ticks.saturating_add(1);
    }

    gauge.park();
    tracing::info!(ticks, "control loop stop");
    Ok(last)
}
