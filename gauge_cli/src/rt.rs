//! Real-time scheduling helpers (Linux SCHED_FIFO / mlockall).

#[cfg(target_os = "linux")]
pub fn setup_rt_once(rt: bool, prio: Option<i32>) {
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    if !rt {
        return;
    }
    RT_ONCE.get_or_init(|| {
        // Lock current and future pages to avoid page-fault jitter in the loop.
        let rc = unsafe { libc::mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) };
        if rc != 0 {
            let err = std::io::Error::last_os_error();
            tracing::warn!(error = %err, "mlockall failed; hint: needs CAP_IPC_LOCK or a larger 'ulimit -l'");
        } else {
            tracing::info!("RT: memory locked (current|future)");
        }

        let (min, max) = unsafe {
            let min = libc::sched_get_priority_min(libc::SCHED_FIFO);
            let max = libc::sched_get_priority_max(libc::SCHED_FIFO);
            if min < 0 || max < 0 { (1, 99) } else { (min, max) }
        };
        let wanted = prio.unwrap_or(max).clamp(min, max);
        let param = libc::sched_param {
            sched_priority: wanted,
        };
        let rc = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
        if rc != 0 {
            let err = std::io::Error::last_os_error();
            tracing::warn!(error = %err, prio = wanted, "SCHED_FIFO not applied; hint: needs CAP_SYS_NICE or root");
        } else {
            tracing::info!(prio = wanted, "RT: SCHED_FIFO applied");
        }
    });
}

#[cfg(not(target_os = "linux"))]
pub fn setup_rt_once(rt: bool, _prio: Option<i32>) {
    if rt {
        tracing::warn!("real-time mode is only supported on Linux; running best-effort");
    }
}
