//! Observability hooks for the codecs.
//!
//! The adaptive parts of the toolkit (the Golomb divisor search and the
//! centroid-splitting quantizer) report their decisions through the `log`
//! facade. `log_metric!` formats a structured key/value line at debug level, and
//! `enable_verbose_logging` installs an `env_logger` backend for callers that do
//! not bring their own.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Once;

use log::LevelFilter;

use crate::error::SqueezeError;

/// Logs a structured key-value metric line at `debug` level.
///
/// # Example
/// ```
/// use squeeze::log_metric;
/// let m = 4;
/// log_metric!("event"="golomb_search", "best_m"=&m);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        if log::log_enabled!(log::Level::Debug) {
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+
            log::debug!("SQUEEZE_METRIC: {{ {} }}", parts.join(", "));
        }
    };
}

static INIT_LOGGER: Once = Once::new();

/// Turns on info-level logging with a `[LEVEL] message` format.
///
/// Only the first call has an effect. When `log_file` is given, records are
/// appended to that file instead of stderr.
pub fn enable_verbose_logging(log_file: Option<&Path>) -> Result<(), SqueezeError> {
    let file = match log_file {
        Some(path) => Some(OpenOptions::new().append(true).create(true).open(path)?),
        None => None,
    };

    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(LevelFilter::Info);

        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(file) = file {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        let _ = builder.try_init();
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enable_verbose_logging_is_idempotent() {
        enable_verbose_logging(None).unwrap();
        enable_verbose_logging(None).unwrap();
        log::info!("logging enabled twice without panicking");
        log_metric!("event" = "test", "value" = 1);
    }
}
