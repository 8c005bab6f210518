use log::{Level, LevelFilter, Log, Metadata, Record};

/// `log` backend writing to the browser console (stderr on native builds).
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
        let line = format!("[{}] {}", record.target(), record.args());
        write_line(record.level(), &line);
    }

    fn flush(&self) {}
}

#[cfg(target_arch = "wasm32")]
fn write_line(level: Level, line: &str) {
    use wasm_bindgen::JsValue;
    use web_sys::console;
    let value = JsValue::from_str(line);
    match level {
        Level::Error => console::error_1(&value),
        Level::Warn => console::warn_1(&value),
        Level::Info => console::info_1(&value),
        Level::Debug => console::log_1(&value),
        Level::Trace => console::debug_1(&value),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn write_line(level: Level, line: &str) {
    eprintln!("{:<5} {}", level, line);
}

/// Installs the panic hook and the console logger. Safe to call more than once; only
/// the level changes on later calls.
pub fn init(level: LevelFilter) {
    console_error_panic_hook::set_once();
    if log::set_logger(&LOGGER).is_err() {
        log::trace!("logger already installed");
    }
    log::set_max_level(level);
}
