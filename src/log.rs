//! Engine logging.
//!
//! All engine messages go through the `pd_*` macros, which respect a process wide switch
//! (`--quiet` turns it off) and default to the [`ENGINE_TARGET`] target.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

/// Default log target for the debugging engine.
pub const ENGINE_TARGET: &str = "debugger";
/// Log target for the reference host VM.
pub const HOST_TARGET: &str = "host";

static ENABLED: AtomicBool = AtomicBool::new(true);
static LOGGER_ONCE: Once = Once::new();

#[inline(always)]
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::SeqCst)
}

pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::SeqCst)
}

/// Install `env_logger` as a log backend. `RUST_LOG` is used unless a level is given.
/// Repeated calls are no-ops.
pub fn init(level: Option<log::LevelFilter>) {
    LOGGER_ONCE.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        if let Some(level) = level {
            builder.filter_level(level);
        }
        builder.format_timestamp(None);
        _ = builder.try_init();
    });
}

#[macro_export]
macro_rules! pd_log {
    ($lvl: ident, target: $target: expr, $($arg: tt)+) => {
        if $crate::log::is_enabled() {
            log::$lvl!(target: $target, $($arg)+)
        }
    };
    ($lvl: ident, $($arg: tt)+) => {
        if $crate::log::is_enabled() {
            log::$lvl!(target: $crate::log::ENGINE_TARGET, $($arg)+)
        }
    };
}

#[macro_export]
macro_rules! pd_info {
    ($($arg: tt)+) => { $crate::pd_log!(info, $($arg)+) };
}

#[macro_export]
macro_rules! pd_warn {
    ($($arg: tt)+) => { $crate::pd_log!(warn, $($arg)+) };
}

#[macro_export]
macro_rules! pd_error {
    ($($arg: tt)+) => { $crate::pd_log!(error, $($arg)+) };
}

#[macro_export]
macro_rules! pd_debug {
    ($($arg: tt)+) => { $crate::pd_log!(debug, $($arg)+) };
}
