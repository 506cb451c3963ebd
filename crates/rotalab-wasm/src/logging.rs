//! Browser console logger for the `log` facade.
//!
//! The core logs through `log`; this forwards records to `console.debug`,
//! `console.info`, `console.warn` or `console.error` depending on level.

use log::{Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::prelude::*;

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => web_sys::console::error_1(&line),
            Level::Warn => web_sys::console::warn_1(&line),
            Level::Info => web_sys::console::info_1(&line),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

/// Map a level name to a filter. Unknown names mean `info`.
pub(crate) fn parse_level(level: &str) -> LevelFilter {
    match level.to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Route engine logs to the browser console.
///
/// * `level` - "off", "error", "warn", "info", "debug" or "trace"
///
/// Safe to call more than once; later calls only change the level.
#[wasm_bindgen]
pub fn init_logging(level: &str) {
    // Fails only if a logger is already installed, which is fine
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(parse_level(level));
}
