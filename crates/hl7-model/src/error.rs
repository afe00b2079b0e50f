//! Error types for the message model.

use thiserror::Error;

/// Errors raised while decoding messages or addressing their fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The payload is not a well-formed pipe-delimited message.
    #[error("malformed message: {reason}")]
    Decode {
        /// Human-readable description of the defect.
        reason: String,
    },
    /// A locator string could not be parsed.
    #[error("invalid locator '{locator}': {reason}")]
    Locator {
        /// Locator text as supplied.
        locator: String,
        /// Which part of the locator was rejected.
        reason: &'static str,
    },
    /// The addressed segment does not exist in the message.
    #[error("segment {segment} not found")]
    SegmentNotFound {
        /// Segment identifier, for example `MSH`.
        segment: String,
    },
    /// No acknowledgment skeleton exists for the requested version.
    #[error("HL7 version '{version}' is not supported")]
    UnsupportedVersion {
        /// Version identifier read from the inbound header.
        version: String,
    },
}

impl ModelError {
    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }

    pub(crate) fn locator(locator: &str, reason: &'static str) -> Self {
        Self::Locator {
            locator: locator.to_owned(),
            reason,
        }
    }
}
