//! HL7 v2 message model for the MLLP acknowledgment daemon.
//!
//! The crate parses the pipe-delimited ("ER7") wire syntax into an ordered
//! list of [`Segment`]s and encodes it back. Individual values are addressed
//! with Terser-style [`Locator`]s such as `/MSH-9-1` or `PID-3(1)-1`, which is
//! the only view the daemon has of a message:
//!
//! ```text
//! MSH|^~\&|LAB|HOSP|||20240101120000||ADT^A01^ADT_A01|MSG0001|P|2.4
//! PID|1|12345^^^HOSP||DOE^JOHN
//! ```
//!
//! - `MSH-9-1` reads `ADT`
//! - `PID-2-1` reads `12345`
//!
//! Values are stored unescaped. Escape sequences (`\F\`, `\S\`, `\T\`, `\R\`,
//! `\E\`) are resolved on [`Message::parse`] and re-applied on
//! [`Message::encode`].
//!
//! Acknowledgment skeletons for the versions the model understands are built
//! with [`Message::acknowledgment`]; see [`SUPPORTED_VERSIONS`].

mod delimiters;
mod error;
mod locator;
mod message;
mod version;

pub use delimiters::Delimiters;
pub use error::ModelError;
pub use locator::Locator;
pub use message::{Field, Message, Segment};
pub use version::{SUPPORTED_VERSIONS, is_supported_version};
