//! A minimal stderr logger for the `log` facade.
//!
//! Lines look like `12:04:59.031[INFO](klondike_robot::robot:144): win, ...`.
//! Timestamps are UTC wall clock, not local time.

use std::io::{Write, stderr};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_record(SystemTime::now(), record);
        let _ = writeln!(stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = stderr().flush();
    }
}

/// Installs the logger. Fails if another logger is already set.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

/// Level for `verbose`/`quiet` counts, relative to `base`.
pub fn level_from_flags(base: LevelFilter, verbose: u8, quiet: u8) -> LevelFilter {
    let levels = [
        LevelFilter::Off,
        LevelFilter::Error,
        LevelFilter::Warn,
        LevelFilter::Info,
        LevelFilter::Debug,
        LevelFilter::Trace,
    ];
    let index = (base as usize + verbose as usize).saturating_sub(quiet as usize);
    levels[index.min(levels.len() - 1)]
}

fn format_record(now: SystemTime, record: &Record) -> String {
    format!(
        "{}[{}]({}:{}): {}",
        format_clock(now),
        record.level(),
        record.module_path().unwrap_or("?"),
        record.line().unwrap_or(0),
        record.args()
    )
}

/// UTC wall clock as `HH:MM:SS.mmm`.
fn format_clock(now: SystemTime) -> String {
    let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or_default();
    let secs = since_epoch.as_secs() % 86_400;
    let millis = since_epoch.subsec_millis();
    format!(
        "{:02}:{:02}:{:02}.{millis:03}",
        secs / 3600,
        secs / 60 % 60,
        secs % 60
    )
}
