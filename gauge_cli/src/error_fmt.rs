//! Human-readable error descriptions and structured JSON error formatting.

use gauge_core::{BuildError, GaugeError};

/// Map an eyre::Report to a human-readable explanation with likely causes
/// and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingAdc => {
                "What happened: No ADC was provided to the control engine.\nLikely causes: The float sensor front end failed to initialize or was not wired into the builder.\nHow to fix: Ensure the ADC is created successfully and passed via with_adc(...).".to_string()
            }
            BuildError::MissingOutputs => {
                "What happened: The output bundle (gauge PWM, indicator, power link) is incomplete.\nLikely causes: A PWM or GPIO channel failed to initialize or was not wired into the builder.\nHow to fix: Ensure every output opens successfully and is passed via with_outputs(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See README for a sample."
            ),
        };
    }

    if let Some(ge) = err.downcast_ref::<GaugeError>() {
        return match ge {
            GaugeError::HardwareFault(msg) | GaugeError::Hardware(msg) => format!(
                "What happened: A hardware access failed ({msg}).\nLikely causes: Wrong pin/channel numbers, missing SPI/PWM overlays, or insufficient GPIO permissions.\nHow to fix: Check the [pins] section, verify the overlays are enabled, and ensure the process may access the devices."
            ),
            GaugeError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values delivered through the config boundary.\nHow to fix: Correct the values; the controller rejects rather than clamps them."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config.
    // The alternate format renders the whole context chain.
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("spi") || lower.contains("pwm") || lower.contains("gpio") {
        return format!(
            "What happened: {msg}.\nLikely causes: Device tree overlays disabled or wrong bus/channel in [pins].\nHow to fix: Enable SPI/PWM on the host and match [pins] to the wiring."
        );
    }

    format!(
        "What happened: {msg}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
    )
}

/// Structured error document for --json consumers.
pub fn to_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "ok": false,
        "error": format!("{err:#}"),
        "detail": humanize(err),
    })
    .to_string()
}
