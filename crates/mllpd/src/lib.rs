//! MLLP listener that acknowledges HL7 v2 messages.
//!
//! `mllpd` accepts TCP connections, extracts MLLP-framed messages from each
//! byte stream, and answers every decodable message with a framed `ACK`. The
//! acknowledgment code follows two checks made by the [`dispatch`] module:
//! the message structure must carry the configured prefix and its version
//! must be one of the registered versions. Anything else is answered `AE`
//! with a short explanation in `ERR-7`.
//!
//! Startup follows a fixed sequence. Configuration is layered from defaults,
//! an optional file, `MLLP_*` environment variables and command-line flags,
//! then structured telemetry is installed, the version registry is built and
//! the listener binds. The process runs until a termination signal arrives,
//! after which workers finish the frame they are reading and exit.

pub mod ack;
mod bootstrap;
mod cli;
pub mod dispatch;
pub mod framing;
mod health;
mod process;
mod service;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use cli::{CommandLine, PortArgument};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_daemon};
pub use service::{AckService, ResponseError};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{ConnectionError, ListenerError, ShutdownToken};

#[cfg(test)]
mod tests;
