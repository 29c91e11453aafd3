//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "gauge", version, about = "Fuel gauge controller CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/gauge_config.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the control loop
    Run {
        /// Stop after this many ticks (default: run until Ctrl-C)
        #[arg(long, value_name = "N")]
        ticks: Option<u64>,

        /// Force the PWM supply-ramp power stage regardless of config
        #[arg(long, action = ArgAction::SetTrue)]
        ramp: bool,

        /// Force the discrete kill-line power stage regardless of config
        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "ramp")]
        kill: bool,

        /// Telemetry polling period in ms (0 disables the poller)
        #[arg(long, value_name = "MS", default_value_t = 2000)]
        telemetry_ms: u64,

        /// Hold the simulated enable signal high (simulation backend only)
        #[arg(long, action = ArgAction::SetTrue)]
        sim_enable: bool,

        /// Enable real-time mode (SCHED_FIFO + mlockall; Linux only)
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Enable real-time mode on Linux: SCHED_FIFO priority and \
mlockall(MCL_CURRENT|MCL_FUTURE). Reduces tick jitter but may require elevated \
privileges (CAP_SYS_NICE, memlock ulimit). Use with care on shared systems."
        )]
        rt: bool,

        /// SCHED_FIFO priority when --rt is enabled (Linux, usually 1..=99)
        #[arg(long, value_name = "PRIO")]
        rt_prio: Option<i32>,
    },
    /// Quick health check (hardware presence / sim ok)
    SelfCheck,
    /// Print the effective configuration as the boundary JSON document
    ShowConfig,
}
