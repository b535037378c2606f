//! Process-wide logger with text and JSON output and an optional in-memory capture.

mod capture;
mod level;
mod render;

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

pub use capture::CapturedLog;
pub use level::{Format, Level, LogParseError};
pub use render::{render, Record};

use capture::CaptureBuffer;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LogConfig {
    pub level: Level,
    pub format: Format,
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            format: Format::Text,
            timestamps: true,
        }
    }
}

static LOG_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);
static LOG_FORMAT: AtomicU8 = AtomicU8::new(Format::Text as u8);
static LOG_TIMESTAMPS: AtomicBool = AtomicBool::new(true);
static LOG_STDERR_ENABLED: AtomicBool = AtomicBool::new(true);
static LOG_CAPTURE_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_CAPTURE: OnceLock<Mutex<CaptureBuffer>> = OnceLock::new();

pub fn init(config: LogConfig) {
    LOG_LEVEL.store(config.level as u8, Ordering::Relaxed);
    LOG_FORMAT.store(config.format as u8, Ordering::Relaxed);
    LOG_TIMESTAMPS.store(config.timestamps, Ordering::Relaxed);
}

pub fn current_config() -> LogConfig {
    LogConfig {
        level: Level::from_u8(LOG_LEVEL.load(Ordering::Relaxed)),
        format: Format::from_u8(LOG_FORMAT.load(Ordering::Relaxed)),
        timestamps: LOG_TIMESTAMPS.load(Ordering::Relaxed),
    }
}

pub fn set_stderr_enabled(enabled: bool) {
    LOG_STDERR_ENABLED.store(enabled, Ordering::Relaxed);
}

/// Keeps the newest `capacity` records in memory. Zero turns capture off.
pub fn enable_capture(capacity: usize) {
    if capacity == 0 {
        disable_capture();
        return;
    }
    let buf = LOG_CAPTURE.get_or_init(|| Mutex::new(CaptureBuffer::new(capacity)));
    if let Ok(mut guard) = buf.lock() {
        guard.set_capacity(capacity);
    }
    LOG_CAPTURE_ENABLED.store(true, Ordering::Relaxed);
}

pub fn disable_capture() {
    LOG_CAPTURE_ENABLED.store(false, Ordering::Relaxed);
}

pub fn clear_captured_logs() {
    let Some(buf) = LOG_CAPTURE.get() else {
        return;
    };
    if let Ok(mut guard) = buf.lock() {
        guard.clear();
    }
}

pub fn capture_snapshot(limit: usize) -> Vec<CapturedLog> {
    let Some(buf) = LOG_CAPTURE.get() else {
        return Vec::new();
    };
    match buf.lock() {
        Ok(guard) => guard.tail(limit),
        Err(_) => Vec::new(),
    }
}

pub fn enabled(level: Level) -> bool {
    level as u8 <= LOG_LEVEL.load(Ordering::Relaxed)
}

pub fn log(
    level: Level,
    target: &'static str,
    file: &'static str,
    line: u32,
    args: fmt::Arguments<'_>,
) {
    if !enabled(level) {
        return;
    }

    let ts_ms: u64 = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX);
    let msg = args.to_string();

    if LOG_STDERR_ENABLED.load(Ordering::Relaxed) {
        let config = current_config();
        let record = Record {
            ts_ms,
            level,
            target,
            file,
            line,
            msg: &msg,
        };
        let rendered = render(&record, config.format, config.timestamps);
        let _ = writeln!(io::stderr().lock(), "{rendered}");
    }

    if LOG_CAPTURE_ENABLED.load(Ordering::Relaxed) {
        let Some(buf) = LOG_CAPTURE.get() else {
            return;
        };
        if let Ok(mut guard) = buf.lock() {
            guard.push(CapturedLog {
                ts_ms,
                level,
                target,
                file,
                line,
                msg,
            });
        }
    }
}

#[macro_export]
macro_rules! log_at {
    ($level:expr, $($arg:tt)*) => {{
        if $crate::enabled($level) {
            $crate::log($level, module_path!(), file!(), line!(), format_args!($($arg)*));
        }
    }};
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        $crate::log_at!($crate::Level::Error, $($arg)*);
    }};
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        $crate::log_at!($crate::Level::Warn, $($arg)*);
    }};
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        $crate::log_at!($crate::Level::Info, $($arg)*);
    }};
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        $crate::log_at!($crate::Level::Debug, $($arg)*);
    }};
}

#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {{
        $crate::log_at!($crate::Level::Trace, $($arg)*);
    }};
}
