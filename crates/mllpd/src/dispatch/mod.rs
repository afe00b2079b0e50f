//! Message dispatch: decides how an inbound message is acknowledged.
//!
//! The dispatcher accepts a message when its structure name starts with the
//! configured prefix (`ADT_` by default) and its version is registered.
//! Accepted messages are inspected: the version's identifying `PID` field is
//! logged. Inspection never changes the outcome.

pub mod registry;

use hl7_model::Message;
use tracing::{debug, info};

use crate::ack::Outcome;

pub use self::registry::{RegistryError, VersionProfile, VersionRegistry};

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// `ERR-7` text for messages whose structure is not accepted.
pub const STRUCTURE_NOT_SUPPORTED: &str = "This message structure is not supported.";
/// `ERR-7` text for messages whose version is not registered.
pub const VERSION_NOT_SUPPORTED: &str = "This message version is not supported.";

/// Validates inbound messages and runs the per-version inspection.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    structure_prefix: String,
    registry: VersionRegistry,
}

impl Dispatcher {
    /// Creates a dispatcher accepting structures that start with
    /// `structure_prefix` in any version held by `registry`.
    #[must_use]
    pub fn new(structure_prefix: impl Into<String>, registry: VersionRegistry) -> Self {
        Self {
            structure_prefix: structure_prefix.into(),
            registry,
        }
    }

    /// Registered version profiles.
    #[must_use]
    pub const fn registry(&self) -> &VersionRegistry {
        &self.registry
    }

    /// Accepted structure prefix.
    #[must_use]
    pub fn structure_prefix(&self) -> &str {
        &self.structure_prefix
    }

    /// Decides the acknowledgment outcome for `message`.
    #[must_use]
    pub fn process(&self, message: &Message) -> Outcome {
        let structure = message.structure_name();
        let version = message.version().unwrap_or_default();
        info!(
            target: DISPATCH_TARGET,
            structure = %structure,
            version,
            "HL7 message received"
        );

        if !structure.starts_with(&self.structure_prefix) {
            return Outcome::error(STRUCTURE_NOT_SUPPORTED);
        }
        let Some(profile) = self.registry.get(version) else {
            return Outcome::error(VERSION_NOT_SUPPORTED);
        };

        let Some(patient) = message.segment("PID") else {
            debug!(target: DISPATCH_TARGET, version, "no PID segment to inspect");
            return Outcome::accepted();
        };
        info!(
            target: DISPATCH_TARGET,
            version,
            field = profile.patient_field(),
            patient_id = patient.value(profile.patient_field(), 0, 1, 1),
            "patient identified"
        );
        Outcome::accepted()
    }
}
