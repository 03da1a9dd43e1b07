//! Logger setup for macrule
//!
//! Levels are used as follows:
//!
//! - `warn!` - dropped rule definitions, skipped directives
//! - `debug!` - rule registration, hook firing
//! - `trace!` - per-token protection and unrolling
//!
//! `RUST_LOG` filters by module as usual:
//!
//! ```bash
//! RUST_LOG=rules::loop_expander=trace macrule expand demo.c
//! ```

use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Warn level; later calls are no-ops
pub fn init() {
    init_with_level(LevelFilter::Warn);
}

/// Initialize once with a fixed level and a `[LEVEL] file:line - msg` format
pub fn init_with_level(level: LevelFilter) {
    INIT.call_once(|| {
        Builder::new()
            .filter_level(level)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{:5}] {}:{} - {}",
                    record.level(),
                    record.file().unwrap_or("unknown"),
                    record.line().unwrap_or(0),
                    record.args()
                )
            })
            .init();
    });
}

/// Initialize once from `RUST_LOG`, defaulting to warn
pub fn init_from_env() {
    INIT.call_once(|| {
        Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    });
}

/// Level to use for `-v` repeated `count` times
pub fn level_for_verbosity(count: u8) -> LevelFilter {
    match count {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Test logger; safe to call from every test
pub fn init_test() {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Warn)
        .is_test(true)
        .try_init();
}
