//! Built-in configuration defaults.

use crate::logging::LogFormat;
use crate::versions::VersionSet;

/// Interface the listener binds when none is configured.
pub const DEFAULT_LISTEN_HOST: &str = "0.0.0.0";

/// TCP port the listener binds when none is configured.
pub const DEFAULT_LISTEN_PORT: u16 = 1250;

/// Sending application written into `MSH-3` of every acknowledgment.
pub const DEFAULT_APPLICATION_ID: &str = "HL7Client";

/// Sending facility written into `MSH-4` of every acknowledgment.
pub const DEFAULT_FACILITY_ID: &str = "EnvironmentIdentifier";

/// HL7 versions accepted out of the box.
pub const DEFAULT_SUPPORTED_VERSIONS: &[&str] = &["2.3", "2.4"];

/// Message structure prefix accepted by the dispatcher.
pub const DEFAULT_MESSAGE_STRUCTURE_PREFIX: &str = "ADT_";

/// Largest partial frame a connection may accumulate (1 MiB).
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Owned listen host used where allocation is required (e.g. serde).
#[must_use]
pub fn default_listen_host() -> String {
    DEFAULT_LISTEN_HOST.to_owned()
}

/// Default listener port.
#[must_use]
pub const fn default_listen_port() -> u16 {
    DEFAULT_LISTEN_PORT
}

/// Owned application identifier.
#[must_use]
pub fn default_application_id() -> String {
    DEFAULT_APPLICATION_ID.to_owned()
}

/// Owned facility identifier.
#[must_use]
pub fn default_facility_id() -> String {
    DEFAULT_FACILITY_ID.to_owned()
}

/// Versions enabled when the configuration does not name any.
#[must_use]
pub fn default_supported_versions() -> VersionSet {
    DEFAULT_SUPPORTED_VERSIONS.iter().copied().collect()
}

/// Owned message structure prefix.
#[must_use]
pub fn default_message_structure_prefix() -> String {
    DEFAULT_MESSAGE_STRUCTURE_PREFIX.to_owned()
}

/// Default partial-frame limit in bytes.
#[must_use]
pub const fn default_max_frame_bytes() -> usize {
    DEFAULT_MAX_FRAME_BYTES
}

/// Default log filter expression used by the daemon.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the daemon.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
