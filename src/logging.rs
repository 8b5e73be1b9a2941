// this_file: src/logging.rs
//! Logging configuration.

use env_logger::Builder;
use log::{Level, LevelFilter};
use std::io::Write;

/// Initialize structured logging with the teacher's colorized-level format.
///
/// Log output always goes to stderr so it can never interleave with frame
/// bytes written to stdout in stream mode (§5 shared-resource policy).
pub fn init_logging(debug: bool) {
    let level_filter = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = Builder::new();
    builder.filter_level(level_filter);
    builder.target(env_logger::Target::Stderr);

    builder.format(move |buf, record| {
        let level_style = match record.level() {
            Level::Error => "\x1b[31m",
            Level::Warn => "\x1b[33m",
            Level::Info => "\x1b[32m",
            Level::Debug => "\x1b[34m",
            Level::Trace => "\x1b[35m",
        };
        let reset = "\x1b[0m";
        writeln!(
            buf,
            "{}{:5}{} [{}] {}",
            level_style,
            record.level(),
            reset,
            record.target(),
            record.args()
        )
    });

    if let Ok(rust_log) = std::env::var("RUST_LOG") {
        builder.parse_filters(&rust_log);
    }

    builder.init();
}

/// Times an operation and logs its elapsed duration on drop.
pub struct Timer {
    name: String,
    start: std::time::Instant,
}

impl Timer {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        log::debug!("starting: {}", name);
        Self {
            name,
            start: std::time::Instant::now(),
        }
    }

    pub fn log_elapsed(&self, level: Level) {
        let elapsed = self.start.elapsed();
        log::log!(
            level,
            "{} completed in {:.3}ms",
            self.name,
            elapsed.as_secs_f64() * 1000.0
        );
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.log_elapsed(Level::Debug);
    }
}
