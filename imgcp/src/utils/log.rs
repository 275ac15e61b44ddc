// SPDX-License-Identifier: MIT

//! Console output for the CLI and a `log` backend for library records.

use std::sync::atomic::{AtomicU8, Ordering};

use colored::Colorize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum LogLevel {
    Quiet,
    Normal,
    Verbose,
}

static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Normal as u8);

pub fn set_log_level(level: LogLevel) {
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn log_level() -> LogLevel {
    match LOG_LEVEL.load(Ordering::Relaxed) {
        0 => LogLevel::Quiet,
        2 => LogLevel::Verbose,
        _ => LogLevel::Normal,
    }
}

/// Forwards `log` records from the library crates to stderr.
struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl ::log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &::log::Metadata) -> bool {
        metadata.level() <= ::log::max_level()
    }

    fn log(&self, record: &::log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = match record.level() {
            ::log::Level::Error => "error".red().bold(),
            ::log::Level::Warn => "warn".yellow().bold(),
            ::log::Level::Info => "info".green(),
            ::log::Level::Debug => "debug".blue(),
            ::log::Level::Trace => "trace".dimmed(),
        };
        eprintln!("[imgcp] {level} {}: {}", record.target(), record.args());
    }

    fn flush(&self) {}
}

/// Sets the console level and installs the record backend. Library records
/// are only shown at [`LogLevel::Verbose`], errors and warnings excepted.
pub fn init(level: LogLevel) {
    set_log_level(level);
    let filter = match level {
        LogLevel::Quiet => ::log::LevelFilter::Error,
        LogLevel::Normal => ::log::LevelFilter::Warn,
        LogLevel::Verbose => ::log::LevelFilter::Debug,
    };
    // Already installed when called twice (tests).
    if ::log::set_logger(&LOGGER).is_ok() {
        ::log::set_max_level(filter);
    }
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if $crate::utils::log_level() != $crate::utils::LogLevel::Quiet {
            println!("[imgcp] {}", format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_verbose {
    ($($arg:tt)*) => {
        if $crate::utils::log_level() == $crate::utils::LogLevel::Verbose {
            println!("[imgcp] {}", format_args!($($arg)*));
        }
    };
}
