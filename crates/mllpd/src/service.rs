//! The request/response step shared by every connection.

use hl7_model::{Message, ModelError};
use mllp_config::Config;
use thiserror::Error;

use crate::ack::{AckBuilder, AckError, LocalIdentity};
use crate::dispatch::{Dispatcher, VersionRegistry};

/// Reasons a decoded frame gets no acknowledgment.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// The payload is not a parsable message.
    #[error("failed to decode inbound message: {source}")]
    Decode {
        /// Underlying model error.
        #[source]
        source: ModelError,
    },
    /// The acknowledgment header could not be built.
    #[error("failed to build acknowledgment: {source}")]
    Acknowledge {
        /// Underlying builder error.
        #[source]
        source: AckError,
    },
    /// The acknowledgment could not be encoded.
    #[error("failed to encode acknowledgment: {source}")]
    Encode {
        /// Underlying model error.
        #[source]
        source: ModelError,
    },
}

/// Turns one inbound payload into one encoded acknowledgment.
///
/// Immutable once built and shared by all connection workers.
#[derive(Debug, Clone)]
pub struct AckService {
    dispatcher: Dispatcher,
    builder: AckBuilder,
}

impl AckService {
    /// Assembles a service from its parts.
    #[must_use]
    pub const fn new(dispatcher: Dispatcher, builder: AckBuilder) -> Self {
        Self {
            dispatcher,
            builder,
        }
    }

    /// Builds the service described by `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let registry = VersionRegistry::from_versions(config.supported_versions());
        Self::new(
            Dispatcher::new(config.message_structure_prefix(), registry),
            AckBuilder::new(LocalIdentity::from_config(config)),
        )
    }

    /// Dispatcher deciding outcomes.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Parses `payload`, dispatches it, and returns the encoded
    /// acknowledgment.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseError`] when the payload cannot be decoded, the
    /// inbound header lacks what the acknowledgment needs, or the result
    /// cannot be encoded. Unsupported structures and versions are not errors;
    /// they produce an `AE` acknowledgment.
    pub fn respond(&self, payload: &[u8]) -> Result<String, ResponseError> {
        let inbound = Message::parse(payload).map_err(|source| ResponseError::Decode { source })?;
        let outcome = self.dispatcher.process(&inbound);
        let mut outbound = self.skeleton(inbound.version());
        self.builder
            .build(&inbound, &outcome, &mut outbound)
            .map_err(|source| ResponseError::Acknowledge { source })?;
        outbound
            .encode()
            .map_err(|source| ResponseError::Encode { source })
    }

    /// Registered profile skeleton, else the model's skeleton for the
    /// version, else the version-neutral skeleton.
    fn skeleton(&self, version: Option<&str>) -> Message {
        version
            .and_then(|text| {
                self.dispatcher.registry().get(text).map_or_else(
                    || Message::acknowledgment(text).ok(),
                    |profile| profile.acknowledgment().ok(),
                )
            })
            .unwrap_or_else(Message::acknowledgment_skeleton)
    }
}
