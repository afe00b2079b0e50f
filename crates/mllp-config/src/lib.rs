//! Shared configuration for the MLLP acknowledgment daemon.
//!
//! Values are layered by `ortho_config` in ascending precedence: built-in
//! defaults, a TOML file named by `--config-path` or `MLLP_CONFIG_PATH`,
//! `MLLP_*` environment variables, and finally command-line flags.

mod defaults;
mod logging;
mod versions;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_APPLICATION_ID, DEFAULT_FACILITY_ID, DEFAULT_LISTEN_HOST, DEFAULT_LISTEN_PORT,
    DEFAULT_LOG_FILTER, DEFAULT_MAX_FRAME_BYTES, DEFAULT_MESSAGE_STRUCTURE_PREFIX,
    DEFAULT_SUPPORTED_VERSIONS, default_application_id, default_facility_id,
    default_listen_host, default_listen_port, default_log_filter, default_log_filter_string,
    default_log_format, default_max_frame_bytes, default_message_structure_prefix,
    default_supported_versions,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use versions::{VersionSet, VersionSetError};

/// Runtime configuration for `mllpd`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "MLLP")]
pub struct Config {
    /// Interface the listener binds.
    #[ortho_config(default = defaults::default_listen_host())]
    pub listen_host: String,
    /// TCP port the listener binds.
    #[ortho_config(default = defaults::DEFAULT_LISTEN_PORT)]
    pub listen_port: u16,
    /// Local application identifier written into `MSH-3` of acknowledgments.
    #[ortho_config(default = defaults::default_application_id())]
    pub application_id: String,
    /// Local facility identifier written into `MSH-4` of acknowledgments.
    #[ortho_config(default = defaults::default_facility_id())]
    pub facility_id: String,
    /// HL7 versions the dispatcher accepts.
    #[ortho_config(default = defaults::default_supported_versions())]
    pub supported_versions: VersionSet,
    /// Prefix a message structure must carry to be accepted, e.g. `ADT_`.
    #[ortho_config(default = defaults::default_message_structure_prefix())]
    pub message_structure_prefix: String,
    /// Largest partial frame a connection may accumulate before it is dropped.
    #[ortho_config(default = defaults::DEFAULT_MAX_FRAME_BYTES)]
    pub max_frame_bytes: usize,
    /// `tracing` filter expression.
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_host: default_listen_host(),
            listen_port: default_listen_port(),
            application_id: default_application_id(),
            facility_id: default_facility_id(),
            supported_versions: default_supported_versions(),
            message_structure_prefix: default_message_structure_prefix(),
            max_frame_bytes: default_max_frame_bytes(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Interface the listener binds.
    #[must_use]
    pub fn listen_host(&self) -> &str {
        &self.listen_host
    }

    /// TCP port the listener binds.
    #[must_use]
    pub const fn listen_port(&self) -> u16 {
        self.listen_port
    }

    /// `host:port` pair suitable for socket address resolution.
    #[must_use]
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.listen_host, self.listen_port)
    }

    /// Returns the configuration with the listen port replaced.
    #[must_use]
    pub fn with_listen_port(mut self, port: u16) -> Self {
        self.listen_port = port;
        self
    }

    /// Local application identifier.
    #[must_use]
    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    /// Local facility identifier.
    #[must_use]
    pub fn facility_id(&self) -> &str {
        &self.facility_id
    }

    /// Configured HL7 versions.
    #[must_use]
    pub const fn supported_versions(&self) -> &VersionSet {
        &self.supported_versions
    }

    /// Accepted message structure prefix.
    #[must_use]
    pub fn message_structure_prefix(&self) -> &str {
        &self.message_structure_prefix
    }

    /// Partial-frame limit in bytes.
    #[must_use]
    pub const fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
    }

    /// `tracing` filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
