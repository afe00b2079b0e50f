//! Version registry for the dispatcher.
//!
//! Each registered HL7 version maps to a [`VersionProfile`] holding the
//! `PID` field the dispatcher logs as the patient identifier and the constructor
//! for that version's `ACK` skeleton.

use std::collections::BTreeMap;

use hl7_model::{Message, ModelError, is_supported_version};
use mllp_config::VersionSet;
use thiserror::Error;
use tracing::warn;

use super::DISPATCH_TARGET;

/// Errors raised while registering version profiles.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The message model has no acknowledgment skeleton for the version.
    #[error("HL7 version '{version}' is not known to the message model")]
    UnknownVersion {
        /// Rejected version.
        version: String,
    },
    /// A profile for the version already exists.
    #[error("HL7 version '{version}' is already registered")]
    Duplicate {
        /// Rejected version.
        version: String,
    },
}

/// Per-version behaviour looked up by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionProfile {
    version: String,
    patient_field: usize,
}

impl VersionProfile {
    /// Builds the profile for `version`.
    ///
    /// The patient identifier is read from `PID-4` (alternate patient id)
    /// for 2.3, `PID-2` (patient id) for 2.4, and `PID-3` (patient
    /// identifier list) for every other version.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownVersion`] when the message model has
    /// no skeleton for `version`.
    pub fn new(version: &str) -> Result<Self, RegistryError> {
        if !is_supported_version(version) {
            return Err(RegistryError::UnknownVersion {
                version: version.to_owned(),
            });
        }
        let patient_field = match version {
            "2.3" => 4,
            "2.4" => 2,
            _ => 3,
        };
        Ok(Self {
            version: version.to_owned(),
            patient_field,
        })
    }

    /// Version identifier, e.g. `2.4`.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// `PID` field position logged as the patient identifier.
    #[must_use]
    pub const fn patient_field(&self) -> usize {
        self.patient_field
    }

    /// Builds an empty `ACK` for this version.
    ///
    /// # Errors
    ///
    /// Propagates [`ModelError::UnsupportedVersion`] from the model.
    pub fn acknowledgment(&self) -> Result<Message, ModelError> {
        Message::acknowledgment(&self.version)
    }
}

/// Registered version profiles keyed by version identifier.
#[derive(Debug, Clone, Default)]
pub struct VersionRegistry {
    profiles: BTreeMap<String, VersionProfile>,
}

impl VersionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the configured versions the message model understands.
    ///
    /// Versions without a model skeleton are logged and skipped.
    #[must_use]
    pub fn from_versions(versions: &VersionSet) -> Self {
        let mut registry = Self::new();
        for version in versions.iter() {
            if let Err(error) = VersionProfile::new(version).and_then(|p| registry.register(p)) {
                warn!(
                    target: DISPATCH_TARGET,
                    version,
                    error = %error,
                    "skipping configured HL7 version"
                );
            }
        }
        registry
    }

    /// Adds a profile.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] when the version is already
    /// registered.
    pub fn register(&mut self, profile: VersionProfile) -> Result<(), RegistryError> {
        if self.profiles.contains_key(profile.version()) {
            return Err(RegistryError::Duplicate {
                version: profile.version,
            });
        }
        self.profiles.insert(profile.version.clone(), profile);
        Ok(())
    }

    /// Looks up the profile for `version`.
    #[must_use]
    pub fn get(&self, version: &str) -> Option<&VersionProfile> {
        self.profiles.get(version)
    }

    /// Registered versions in ascending order.
    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    /// Number of registered versions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Returns `true` when no version is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
