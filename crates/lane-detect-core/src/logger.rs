//! Stderr logging for the CLI and tests.
//!
//! Lines look like `[   1.234s  INFO pipeline] message`. Records from the
//! `lane_detect*` crates pass at the configured level. Dependencies are
//! capped at `Info` so `--log-level trace` stays readable.

use std::fmt;
use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::EnvFilter;

const OWN_TARGET_PREFIX: &str = "lane_detect";
const DEPENDENCY_CAP: LevelFilter = LevelFilter::Info;

struct StreamLogger {
    level: LevelFilter,
    started: Instant,
}

impl StreamLogger {
    fn limit_for(&self, target: &str) -> LevelFilter {
        if target.starts_with(OWN_TARGET_PREFIX) {
            self.level
        } else {
            self.level.min(DEPENDENCY_CAP)
        }
    }
}

impl Log for StreamLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.limit_for(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(
            self.started.elapsed().as_secs_f64(),
            record.level(),
            record.target(),
            record.args(),
        );
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// `[elapsed LEVEL module] message`, with the module taken from the last
/// path component of the target.
fn format_line(elapsed_s: f64, level: Level, target: &str, args: &fmt::Arguments<'_>) -> String {
    let module = target.rsplit("::").next().unwrap_or(target);
    format!("[{elapsed_s:8.3}s {level:>5} {module}] {args}")
}

static LOGGER: OnceLock<StreamLogger> = OnceLock::new();

/// Install the stderr logger with the provided level filter.
///
/// Only the first call installs anything; later calls return `Ok(())`.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| StreamLogger {
        level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// Install a `tracing` subscriber for span timings of the pipeline stages.
///
/// The filter comes from `RUST_LOG`, defaulting to `info` with the
/// `lane_detect*` crates at `debug`. `json` switches to flattened JSON
/// events; otherwise lines carry the process uptime. A subscriber that is
/// already installed is left in place.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,lane_detect=debug,lane_detect_core=debug"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true);
    if json {
        let _ = builder.json().flatten_event(true).finish().try_init();
    } else {
        let _ = builder
            .with_timer(tracing_subscriber::fmt::time::Uptime::default())
            .finish()
            .try_init();
    }
}
