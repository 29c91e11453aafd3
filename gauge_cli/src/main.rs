mod cli;
mod error_fmt;
mod run;
mod rt;

use std::fs;
use std::path::Path;

use clap::Parser;
use eyre::WrapErr;
use gauge_config::{ApiConfig, Config, PowerMode};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, FILE_GUARD};

fn main() {
    let _ = color_eyre::install();
    let args = Cli::parse();

    let cfg = match load_config(&args.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            report_and_exit(&args, &err);
        }
    };

    init_logging(args.json, &args.log_level, &cfg.logging);

    if let Err(err) = dispatch(&args, &cfg) {
        report_and_exit(&args, &err);
    }
}

fn report_and_exit(args: &Cli, err: &eyre::Report) -> ! {
    if args.json {
        eprintln!("{}", error_fmt::to_json(err));
    } else {
        eprintln!("{}", error_fmt::humanize(err));
    }
    std::process::exit(1);
}

fn dispatch(args: &Cli, cfg: &Config) -> eyre::Result<()> {
    match &args.cmd {
        Commands::Run {
            ticks,
            ramp,
            kill,
            telemetry_ms,
            sim_enable,
            rt,
            rt_prio,
        } => {
            let mode = if *ramp {
                PowerMode::Ramp
            } else if *kill {
                PowerMode::Kill
            } else {
                cfg.power.mode
            };
            run::run_loop(
                cfg,
                &run::RunOpts {
                    ticks: *ticks,
                    mode,
                    telemetry_ms: *telemetry_ms,
                    sim_enable: *sim_enable,
                    json: args.json,
                    rt: *rt,
                    rt_prio: *rt_prio,
                },
            )
        }
        Commands::SelfCheck => run::self_check(cfg),
        Commands::ShowConfig => {
            let api = ApiConfig::from(cfg);
            println!("{}", api.to_json().wrap_err("encode config")?);
            Ok(())
        }
    }
}

/// Load and validate the TOML config; a missing file yields the defaults so
/// the simulated backend runs out of the box.
fn load_config(path: &Path) -> eyre::Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("read config file {}", path.display()))?;
    let cfg = gauge_config::load_toml(&content)
        .wrap_err_with(|| format!("parse config file {}", path.display()))?;
    cfg.validate()
        .wrap_err_with(|| format!("validate config file {}", path.display()))?;
    Ok(cfg)
}

fn init_logging(json: bool, level: &str, logging: &gauge_config::Logging) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_deref().unwrap_or(level)));

    if let Some(file) = logging.file.as_deref() {
        let path = Path::new(file);
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "gauge.log".to_string());
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        if json {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_writer(writer)
                .init();
        } else {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
        }
        return;
    }

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
