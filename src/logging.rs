//! Process-wide logger setup.
//!
//! The library only logs through the `log` facade; binaries call
//! [`init_logging`] once at startup to send records to stderr.

use flexi_logger::{Logger, LoggerHandle};
use log::debug;
use once_cell::sync::OnceCell;

static LOGGER: OnceCell<LoggerHandle> = OnceCell::new();

/// Start logging to stderr at `level` (a `RUST_LOG`-style spec such as
/// `"info"` or `"commonplace=debug"`). `RUST_LOG` overrides `level` when set.
/// Later calls keep the first logger and succeed.
pub fn init_logging(level: &str) -> Result<(), String> {
    LOGGER
        .get_or_try_init(|| {
            let handle = Logger::try_with_env_or_str(level)
                .map_err(|err| format!("invalid log level `{level}`: {err}"))?
                .log_to_stderr()
                .format(flexi_logger::colored_default_format)
                .start()
                .map_err(|err| format!("failed to start logger: {err}"))?;
            debug!("logging initialized at `{}`", level);
            Ok(handle)
        })
        .map(|_| ())
}

pub fn is_initialized() -> bool {
    LOGGER.get().is_some()
}
