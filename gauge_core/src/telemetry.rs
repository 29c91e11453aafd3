//! Snapshot hand-off between the control loop and external pollers.
//!
//! The loop publishes every tick; pollers sample at their own cadence
//! (~2 s in the reference deployment) and always take the newest buffered
//! snapshot. Publishing never blocks the control loop: when the buffer is
//! full the new snapshot is dropped and the poller still finds a recent
//! one on its next drain.

use crossbeam_channel as xch;

use crate::status::Snapshot;

/// Buffer depth. At the default 50 ms tick this covers a bit over three
/// seconds of snapshots, comfortably more than one polling interval.
const DEPTH: usize = 64;

pub fn channel() -> (TelemetryTx, TelemetryRx) {
    let (tx, rx) = xch::bounded(DEPTH);
    (TelemetryTx { tx }, TelemetryRx { rx })
}

#[derive(Clone)]
pub struct TelemetryTx {
    tx: xch::Sender<Snapshot>,
}

impl TelemetryTx {
    /// Non-blocking publish; silently drops when the poller lags far behind.
    pub fn publish(&self, snap: Snapshot) {
        let _ = self.tx.try_send(snap);
    }
}

pub struct TelemetryRx {
    rx: xch::Receiver<Snapshot>,
}

impl TelemetryRx {
    /// Drain the buffer and return the newest snapshot, if any arrived
    /// since the last poll.
    pub fn latest(&self) -> Option<Snapshot> {
        self.rx.try_iter().last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(duty: u8) -> Snapshot {
        Snapshot {
            resistance_ohms: 120.0,
            target_duty: duty,
            smoothed_duty: f32::from(duty),
            gauge_duty: duty,
            indicator_on: false,
            cutoff: false,
            ramp: None,
        }
    }

    #[test]
    fn latest_wins_over_backlog() {
        let (tx, rx) = channel();
        for d in 0..10u8 {
            tx.publish(snap(d));
        }
        assert_eq!(rx.latest().map(|s| s.target_duty), Some(9));
        // Drained: nothing newer yet
        assert!(rx.latest().is_none());
    }

    #[test]
    fn overflow_drops_new_but_keeps_poller_alive() {
        let (tx, rx) = channel();
        for d in 0..200u16 {
            tx.publish(snap((d % 250) as u8));
        }
        // The buffer kept the first DEPTH entries; the poller still gets one.
        let got = rx.latest().expect("snapshot available");
        assert_eq!(got.target_duty, (DEPTH - 1) as u8);
    }
}
