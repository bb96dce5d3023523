//! Human-readable error descriptions and structured JSON error formatting.

use dro_core::error::{BuildError, DroError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(be) = find::<BuildError>(err) {
        return match be {
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/dro_config.toml for a sample."
            ),
        };
    }

    if let Some(de) = find::<DroError>(err) {
        return match de {
            DroError::InvalidCalibration(msg) => format!(
                "What happened: The write was refused ({msg}).\nLikely causes: Numerator and denominator must be 1..=65535; values must fit the attribute width.\nHow to fix: Send a value in range; the stored calibration is unchanged."
            ),
            DroError::InvalidValue { attribute, reason } => format!(
                "What happened: The {attribute} value was not understood ({reason}).\nLikely causes: Wrong number format or a value outside the attribute's width.\nHow to fix: Check the width column of `dro attributes` and send a value that fits."
            ),
            DroError::ReadOnly(name) => format!(
                "What happened: The {name} attribute cannot be written.\nLikely causes: Position is derived from the counter.\nHow to fix: Use set_position to re-anchor the readout."
            ),
            DroError::UnknownAttribute(h) => format!(
                "What happened: No attribute has handle {h}.\nLikely causes: Mismatched client table.\nHow to fix: Run `dro attributes` to list valid handles."
            ),
            DroError::Decode { .. } => format!(
                "What happened: {de}.\nLikely causes: Client sent the wrong payload width.\nHow to fix: Check the width column of `dro attributes`."
            ),
            DroError::Store(_) => format!(
                "What happened: {de}.\nLikely causes: NVM image unreadable, wrong size, or directory not writable.\nHow to fix: Check store.path and store.size in the config."
            ),
            DroError::Timeout | DroError::Counter(_) => format!(
                "What happened: {de}.\nLikely causes: LS7366R not wired, no power, or wrong SPI bus/chip-select.\nHow to fix: Verify [hardware] in the config and the SPI wiring."
            ),
            DroError::Transport(_) => format!(
                "What happened: {de}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("open nvm image") {
        return format!(
            "What happened: The calibration store could not be opened ({}).\nLikely causes: The image has a different size than store.size, or the path is not readable.\nHow to fix: Fix store.size or remove the stale image so it is recreated.",
            root_cause(err)
        );
    }

    if lower.contains("open ls7366") || lower.contains("requires building with --features hardware")
    {
        return "What happened: Failed to initialize the counter.\nLikely causes: SPI disabled, wrong bus/chip-select, or a build without the hardware feature.\nHow to fix: Enable SPI, check [hardware] in the config, or set counter.kind = \"simulated\".".to_string();
    }

    if lower.contains("read config") || lower.contains("parse config") || lower.contains("must be")
    {
        return format!(
            "What happened: Configuration is invalid or incomplete ({}).\nLikely causes: Missing [store] section or out-of-range values.\nHow to fix: Edit the TOML config and try again.",
            root_cause(err)
        );
    }

    if lower.contains("write script csv must have headers") {
        return "Invalid headers in write script CSV. Expected 'tick,attribute,value'.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Typed error anywhere in the report's chain (context wrappers hide the root).
fn find<E: std::error::Error + 'static>(err: &eyre::Report) -> Option<&E> {
    err.chain().find_map(|e| e.downcast_ref::<E>())
}

fn root_cause(err: &eyre::Report) -> String {
    err.root_cause().to_string()
}

/// Stable exit codes: 3 refused write, 4 store, 5 counter, 1 anything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match find::<DroError>(err) {
        Some(
            DroError::InvalidCalibration(_)
            | DroError::InvalidValue { .. }
            | DroError::ReadOnly(_)
            | DroError::UnknownAttribute(_)
            | DroError::Decode { .. },
        ) => 3,
        Some(DroError::Store(_)) => 4,
        Some(DroError::Timeout | DroError::Counter(_)) => 5,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if find::<BuildError>(err).is_some() {
        return "InvalidConfig";
    }
    match find::<DroError>(err) {
        Some(DroError::InvalidCalibration(_)) => "InvalidCalibration",
        Some(DroError::InvalidValue { .. }) => "InvalidValue",
        Some(DroError::ReadOnly(_)) => "ReadOnly",
        Some(DroError::UnknownAttribute(_)) => "UnknownAttribute",
        Some(DroError::Decode { .. }) => "Decode",
        Some(DroError::Store(_)) => "Store",
        Some(DroError::Timeout) => "Timeout",
        Some(DroError::Counter(_)) => "Counter",
        Some(DroError::Transport(_)) => "Transport",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
