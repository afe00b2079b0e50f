//! Acknowledgment header construction.
//!
//! [`AckBuilder::build`] fills an outbound `ACK` skeleton from the inbound
//! message header:
//!
//! | outbound | value                                   |
//! |----------|-----------------------------------------|
//! | MSH-*    | copied from the inbound MSH             |
//! | MSH-3    | local application id                    |
//! | MSH-4    | local facility id                       |
//! | MSH-5    | MSH-3 as copied from the inbound header |
//! | MSH-6    | MSH-4 as copied from the inbound header |
//! | MSH-7    | current time as `yyyyMMddmmhh`          |
//! | MSH-9-1  | `ACK`                                   |
//! | MSH-12   | inbound version                         |
//! | MSA-1    | acknowledgment code                     |
//! | MSA-2    | inbound MSH-10                          |
//! | ERR-7    | error text, when present                |
//!
//! MSH-7 deliberately keeps the minute-before-hour layout that existing
//! receivers of these acknowledgments expect.

use hl7_model::{Locator, Message, ModelError};
use mllp_config::Config;
use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;
use time::OffsetDateTime;
use time::macros::format_description;

/// Acknowledgment codes carried in `MSA-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum AckCode {
    /// Application accept.
    #[strum(serialize = "AA")]
    Accept,
    /// Application error.
    #[strum(serialize = "AE")]
    Error,
    /// Application reject.
    #[strum(serialize = "AR")]
    Reject,
}

impl AckCode {
    /// Wire representation, e.g. `AA`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Result of dispatching one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    code: AckCode,
    error_text: Option<String>,
}

impl Outcome {
    /// Message accepted.
    #[must_use]
    pub const fn accepted() -> Self {
        Self {
            code: AckCode::Accept,
            error_text: None,
        }
    }

    /// Message processed with an application error.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            code: AckCode::Error,
            error_text: Some(text.into()),
        }
    }

    /// Message rejected.
    #[must_use]
    pub fn rejected(text: impl Into<String>) -> Self {
        Self {
            code: AckCode::Reject,
            error_text: Some(text.into()),
        }
    }

    /// Code written to `MSA-1`.
    #[must_use]
    pub const fn code(&self) -> AckCode {
        self.code
    }

    /// Text written to `ERR-7`, if any.
    #[must_use]
    pub fn error_text(&self) -> Option<&str> {
        self.error_text.as_deref()
    }
}

/// Identity this daemon announces in outbound headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalIdentity {
    application_id: String,
    facility_id: String,
}

impl LocalIdentity {
    /// Builds an identity from explicit values.
    #[must_use]
    pub fn new(application_id: impl Into<String>, facility_id: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            facility_id: facility_id.into(),
        }
    }

    /// Reads the identity from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.application_id(), config.facility_id())
    }

    /// Value written to `MSH-3`.
    #[must_use]
    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    /// Value written to `MSH-4`.
    #[must_use]
    pub fn facility_id(&self) -> &str {
        &self.facility_id
    }
}

/// Errors that prevent an acknowledgment from being built.
#[derive(Debug, Error)]
pub enum AckError {
    /// The inbound message has no `MSH` segment.
    #[error("need an MSH segment to create a response ACK")]
    MissingHeader,
    /// `MSH-12-1` of the inbound message is empty.
    #[error("failed to get valid HL7 version from inbound MSH-12-1")]
    UnknownVersion,
    /// `MSH-7` could not be formatted.
    #[error("failed to format acknowledgment timestamp: {source}")]
    Timestamp {
        /// Underlying formatting error.
        #[source]
        source: time::error::Format,
    },
    /// A header field could not be addressed.
    #[error("failed to address acknowledgment field: {source}")]
    Field {
        /// Underlying model error.
        #[source]
        source: ModelError,
    },
}

impl From<ModelError> for AckError {
    fn from(source: ModelError) -> Self {
        Self::Field { source }
    }
}

/// Builds acknowledgment headers on behalf of a [`LocalIdentity`].
#[derive(Debug, Clone)]
pub struct AckBuilder {
    identity: LocalIdentity,
}

impl AckBuilder {
    /// Creates a builder announcing `identity`.
    #[must_use]
    pub const fn new(identity: LocalIdentity) -> Self {
        Self { identity }
    }

    /// Identity written into outbound headers.
    #[must_use]
    pub const fn identity(&self) -> &LocalIdentity {
        &self.identity
    }

    /// Populates `outbound` as the acknowledgment of `inbound`, stamped with
    /// the current local time (UTC when the offset is unavailable).
    ///
    /// # Errors
    ///
    /// See [`AckBuilder::build_at`].
    pub fn build(
        &self,
        inbound: &Message,
        outcome: &Outcome,
        outbound: &mut Message,
    ) -> Result<(), AckError> {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        self.build_at(inbound, outcome, outbound, now)
    }

    /// Populates `outbound` as the acknowledgment of `inbound`, stamped with
    /// `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AckError::MissingHeader`] when `inbound` has no `MSH`,
    /// [`AckError::UnknownVersion`] when its `MSH-12-1` is empty, and
    /// [`AckError::Timestamp`] when `now` cannot be formatted. `outbound` is
    /// left untouched by all three.
    pub fn build_at(
        &self,
        inbound: &Message,
        outcome: &Outcome,
        outbound: &mut Message,
        now: OffsetDateTime,
    ) -> Result<(), AckError> {
        let header = inbound.header().ok_or(AckError::MissingHeader)?;
        let version = header.value(12, 0, 1, 1).to_owned();
        if version.is_empty() {
            return Err(AckError::UnknownVersion);
        }
        let control_id = header.value(10, 0, 1, 1).to_owned();
        let timestamp = now
            .format(format_description!("[year][month][day][minute][hour]"))
            .map_err(|source| AckError::Timestamp { source })?;

        outbound.copy_segment_from(header);

        let sending_application = outbound.get(&msh(3)?)?.to_owned();
        let sending_facility = outbound.get(&msh(4)?)?.to_owned();

        outbound.set(&msh(3)?, self.identity.application_id());
        outbound.set(&msh(4)?, self.identity.facility_id());
        outbound.set(&msh(5)?, sending_application);
        outbound.set(&msh(6)?, sending_facility);
        outbound.set(&msh(7)?, timestamp);
        outbound.set(&msh(9)?, "ACK");
        outbound.set(&msh(12)?, version);
        outbound.set(&Locator::field("MSA", 1)?, outcome.code().as_str());
        outbound.set(&Locator::field("MSA", 2)?, control_id);

        if let Some(text) = outcome.error_text().filter(|text| !text.is_empty()) {
            outbound.set(&Locator::field("ERR", 7)?, text);
        }
        Ok(())
    }
}

fn msh(field: usize) -> Result<Locator, ModelError> {
    Locator::field("MSH", field)
}
