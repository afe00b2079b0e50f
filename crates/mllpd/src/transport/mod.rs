//! TCP transport for MLLP connections.
//!
//! The listener accepts connections on a background thread and hands each to
//! its own worker thread running a [`ConnectionHandler`]. Every worker shares
//! the listener's [`ShutdownToken`].

mod errors;
mod handler;
mod listener;
#[cfg(test)]
mod listener_tests;
mod shutdown;
#[cfg(test)]
mod test_utils;

pub use self::errors::{ConnectionError, ListenerError};
pub(crate) use self::handler::{ConnectionHandler, MllpConnectionHandler};
pub(crate) use self::listener::MllpListener;
pub use self::shutdown::ShutdownToken;
#[cfg(test)]
pub(crate) use self::test_utils::CountingHandler;

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
