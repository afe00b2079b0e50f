//! HL7 versions understood by the model and their acknowledgment skeletons.

use crate::delimiters::Delimiters;
use crate::error::ModelError;
use crate::message::{Message, Segment};

/// HL7 v2 versions for which [`Message::acknowledgment`] builds a skeleton.
pub const SUPPORTED_VERSIONS: &[&str] = &[
    "2.1", "2.2", "2.3", "2.3.1", "2.4", "2.5", "2.5.1", "2.6", "2.7", "2.7.1", "2.8", "2.8.1",
];

/// Returns `true` when `version` is listed in [`SUPPORTED_VERSIONS`].
#[must_use]
pub fn is_supported_version(version: &str) -> bool {
    SUPPORTED_VERSIONS.contains(&version)
}

impl Message {
    /// Builds an empty `ACK` message for `version`: an `MSH` declaring the
    /// default delimiters, `MSH-9 = ACK`, `MSH-12 = version`, and an empty
    /// `MSA` segment.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnsupportedVersion`] when `version` is not in
    /// [`SUPPORTED_VERSIONS`].
    pub fn acknowledgment(version: &str) -> Result<Self, ModelError> {
        if !is_supported_version(version) {
            return Err(ModelError::UnsupportedVersion {
                version: version.to_owned(),
            });
        }
        let mut message = Self::acknowledgment_skeleton();
        if let Some(header) = message.header_mut() {
            header.set_value(12, 0, 1, 1, version);
        }
        Ok(message)
    }

    /// Version-neutral `ACK` skeleton; `MSH-12` is left empty.
    #[must_use]
    pub fn acknowledgment_skeleton() -> Self {
        let mut header = Segment::header(Delimiters::default());
        header.set_value(9, 0, 1, 1, "ACK");
        Self::from_segments(vec![header, Segment::new("MSA")])
    }
}
