//! Structured telemetry initialisation for the daemon.
//!
//! Connection workers log inside a `connection` span carrying the peer
//! address. JSON output attaches that span to every line so acknowledgment
//! and dispatch events can be traced back to the sending system.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, MakeWriter};

use mllp_config::{Config, LogFormat};

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

type BoxedSubscriber = Box<dyn Subscriber + Send + Sync>;

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured log filter expression does not parse.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Another global subscriber is already installed.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global stderr subscriber on first use; the first
/// configuration wins and later calls only hand out a new handle.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an unparsable filter and
/// [`TelemetryError::Subscriber`] when another subscriber is already global.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| {
            let subscriber = build_subscriber(config, io::stderr, io::stderr().is_terminal())?;
            tracing::subscriber::set_global_default(subscriber)
                .map_err(TelemetryError::Subscriber)
        })
        .map(|_| TelemetryHandle)
}

fn build_subscriber<W>(
    config: &Config,
    writer: W,
    ansi: bool,
) -> Result<BoxedSubscriber, TelemetryError>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    Ok(match config.log_format() {
        LogFormat::Json => Box::new(
            builder
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(false)
                .finish(),
        ),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rstest::rstest;
    use tracing::{info, info_span};

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            let bytes = self.0.lock().expect("capture lock").clone();
            String::from_utf8(bytes).expect("utf-8 log output")
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("capture lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn config(log_filter: &str, log_format: LogFormat) -> Config {
        Config {
            log_filter: log_filter.to_owned(),
            log_format,
            ..Config::default()
        }
    }

    fn log_inside_connection(format: LogFormat) -> String {
        let captured = Captured::default();
        let sink = captured.clone();
        let subscriber = build_subscriber(&config("info", format), move || sink.clone(), false)
            .expect("subscriber builds");
        tracing::subscriber::with_default(subscriber, || {
            let span = info_span!("connection", peer = %"127.0.0.1:4000");
            let _entered = span.enter();
            info!(control_id = "MSG1", "acknowledgment sent");
        });
        captured.text()
    }

    #[rstest]
    #[case(LogFormat::Json)]
    #[case(LogFormat::Compact)]
    fn events_carry_the_connection_peer(#[case] format: LogFormat) {
        let text = log_inside_connection(format);
        assert!(text.contains("acknowledgment sent"), "{text}");
        assert!(text.contains("127.0.0.1:4000"), "{text}");
    }

    #[test]
    fn json_lines_embed_the_current_span() {
        let text = log_inside_connection(LogFormat::Json);
        assert!(text.contains(r#""peer":"127.0.0.1:4000""#), "{text}");
        assert!(text.contains(r#""name":"connection""#), "{text}");
        assert!(text.contains(r#""control_id":"MSG1""#), "{text}");
    }

    #[test]
    fn filtered_levels_are_not_written() {
        let captured = Captured::default();
        let sink = captured.clone();
        let subscriber = build_subscriber(&config("warn", LogFormat::Json), move || sink.clone(), false)
            .expect("subscriber builds");
        tracing::subscriber::with_default(subscriber, || info!("quiet"));
        assert!(captured.text().is_empty());
    }

    #[test]
    fn invalid_filters_are_reported() {
        let result = build_subscriber(&config("mllpd=notalevel", LogFormat::Json), io::sink, false);
        assert!(matches!(result, Err(TelemetryError::Filter(_))));
    }
}
