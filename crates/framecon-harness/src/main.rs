#![forbid(unsafe_code)]

//! Headless framecon session runner.
//!
//! Configured entirely through `FRAMECON_*` environment variables; prints a
//! JSON [`FrameReport`](framecon_harness::FrameReport) to stdout or to
//! `FRAMECON_REPORT_PATH`.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `FRAMECON_WIDTH` / `FRAMECON_HEIGHT` | surface size in pixels | 1024 / 600 |
//! | `FRAMECON_FONT_PATH` | raw 256-glyph font file | procedural |
//! | `FRAMECON_FONT_WIDTH` / `FRAMECON_FONT_HEIGHT` | glyph cell size | 8 / 16 |
//! | `FRAMECON_SCRIPT` | text typed into the console | empty |
//! | `FRAMECON_QUIT_AFTER_SCRIPT` | queue a quit after the script | off |
//! | `FRAMECON_FRAMES` | frames to run | 60 |
//! | `FRAMECON_BLINK_FRAMES` | frames per blink flip, 0 = steady | 30 |
//! | `FRAMECON_CYCLE_ATTR` | cycle the attribute per key | on |
//! | `FRAMECON_TRACE_DISPATCH` | per-notification trace hook | off |
//! | `FRAMECON_LOG_JSON` | JSON log lines on stderr | off |

use std::io::{self, Write};

use framecon_harness::{HarnessOptions, render_config, run_session};
use framecon_runtime::PumpConfig;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let enabled = matches!(
        trimmed,
        "1" | "true" | "TRUE" | "True" | "yes" | "YES" | "on" | "ON"
    );
    Some(enabled)
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
}

fn env_u32(name: &str) -> Option<u32> {
    env_u64(name).and_then(|value| u32::try_from(value).ok())
}

fn env_u16(name: &str) -> Option<u16> {
    env_u64(name).and_then(|value| u16::try_from(value).ok())
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    let result = if env_flag("FRAMECON_LOG_JSON").unwrap_or(false) {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .try_init()
    };
    if let Err(err) = result {
        eprintln!("tracing init failed: {err}");
    }
}

fn options_from_env() -> HarnessOptions {
    let defaults = PumpConfig::default();
    let pump = defaults
        .with_size(
            env_u32("FRAMECON_WIDTH").unwrap_or(defaults.width),
            env_u32("FRAMECON_HEIGHT").unwrap_or(defaults.height),
        )
        .with_blink_interval_frames(
            env_u32("FRAMECON_BLINK_FRAMES").unwrap_or(defaults.blink_interval_frames),
        )
        .with_cycle_attribute(env_flag("FRAMECON_CYCLE_ATTR").unwrap_or(defaults.cycle_attribute))
        .with_render_config(render_config(
            env_flag("FRAMECON_TRACE_DISPATCH").unwrap_or(false),
        ));

    let base = HarnessOptions::default();
    let mut options = base
        .clone()
        .with_pump(pump)
        .with_font_size(
            env_u16("FRAMECON_FONT_WIDTH").unwrap_or(base.char_width),
            env_u16("FRAMECON_FONT_HEIGHT").unwrap_or(base.char_height),
        )
        .with_quit_after_script(env_flag("FRAMECON_QUIT_AFTER_SCRIPT").unwrap_or(false))
        .with_frames(env_u64("FRAMECON_FRAMES").unwrap_or(base.frames));
    if let Some(path) = env_string("FRAMECON_FONT_PATH") {
        options = options.with_font_path(path);
    }
    if let Ok(script) = std::env::var("FRAMECON_SCRIPT") {
        // Not trimmed: trailing newlines are Enter presses.
        options = options.with_script(script);
    }
    options
}

fn main() {
    init_tracing();
    let options = options_from_env();
    tracing::debug!(?options, "harness options");

    let report = match run_session(&options) {
        Ok(report) => report,
        Err(err) => {
            tracing::error!(%err, "session failed");
            eprintln!("framecon-harness: {err}");
            std::process::exit(1);
        }
    };

    let json = match serde_json::to_string_pretty(&report) {
        Ok(json) => json,
        Err(err) => {
            eprintln!("framecon-harness: report serialization failed: {err}");
            std::process::exit(1);
        }
    };

    let written = match env_string("FRAMECON_REPORT_PATH") {
        Some(path) => std::fs::write(&path, json.as_bytes()),
        None => writeln!(io::stdout(), "{json}"),
    };
    if let Err(err) = written {
        eprintln!("framecon-harness: failed to write report: {err}");
        std::process::exit(1);
    }
}
