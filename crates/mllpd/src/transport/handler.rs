//! Per-connection MLLP session handling.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, info_span, warn};

use super::{ConnectionError, LISTENER_TARGET, ShutdownToken};
use crate::framing::{self, Framer};
use crate::service::AckService;

/// How long a blocking read or write waits before the worker rechecks shutdown.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(200);
/// How long a worker with unfinished traffic may keep going after shutdown.
pub(crate) const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);
const READ_CHUNK_BYTES: usize = 4096;

/// Handles accepted connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Serves one connection until it closes. Implementations should avoid
    /// panicking and return promptly once `shutdown` triggers.
    fn handle(&self, stream: TcpStream, shutdown: &ShutdownToken);
}

/// Why a connection ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closed {
    PeerClosed,
    Shutdown,
    DrainTimeout,
}

/// Drain clock for one connection. It starts the first time it is consulted
/// after shutdown triggers and then bounds both partial frames and stalled
/// acknowledgment writes.
struct Drain<'a> {
    shutdown: &'a ShutdownToken,
    timeout: Duration,
    deadline: Option<Instant>,
}

impl<'a> Drain<'a> {
    const fn new(shutdown: &'a ShutdownToken, timeout: Duration) -> Self {
        Self {
            shutdown,
            timeout,
            deadline: None,
        }
    }

    fn expired(&mut self) -> bool {
        if !self.shutdown.is_triggered() {
            return false;
        }
        let timeout = self.timeout;
        let deadline = *self.deadline.get_or_insert_with(|| Instant::now() + timeout);
        Instant::now() >= deadline
    }
}

/// Frames inbound bytes and answers each message with an acknowledgment.
pub(crate) struct MllpConnectionHandler {
    service: Arc<AckService>,
    max_frame_bytes: usize,
    drain_timeout: Duration,
}

impl MllpConnectionHandler {
    pub(crate) const fn new(service: Arc<AckService>, max_frame_bytes: usize) -> Self {
        Self {
            service,
            max_frame_bytes,
            drain_timeout: DRAIN_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub(crate) const fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    fn serve<S: Read + Write>(
        &self,
        stream: &mut S,
        shutdown: &ShutdownToken,
    ) -> Result<Closed, ConnectionError> {
        let mut framer = Framer::new(self.max_frame_bytes);
        let mut chunk = [0_u8; READ_CHUNK_BYTES];
        let mut drain = Drain::new(shutdown, self.drain_timeout);

        loop {
            if shutdown.is_triggered() && framer.is_idle() {
                return Ok(Closed::Shutdown);
            }
            if drain.expired() {
                return Ok(Closed::DrainTimeout);
            }

            let read = match stream.read(&mut chunk) {
                Ok(0) => return Ok(Closed::PeerClosed),
                Ok(read) => read,
                Err(error) if is_poll_timeout(&error) => continue,
                Err(source) => return Err(ConnectionError::Read { source }),
            };

            for &byte in chunk.iter().take(read) {
                match framer.feed(byte) {
                    Ok(Some(frame)) => {
                        if let Some(closed) = self.respond(stream, &frame, &mut drain)? {
                            return Ok(closed);
                        }
                    }
                    Ok(None) => {}
                    Err(error) => warn!(
                        target: LISTENER_TARGET,
                        error = %error,
                        "discarding oversized frame"
                    ),
                }
            }
        }
    }

    fn respond<S: Write>(
        &self,
        stream: &mut S,
        frame: &[u8],
        drain: &mut Drain<'_>,
    ) -> Result<Option<Closed>, ConnectionError> {
        let acknowledgment = match self.service.respond(frame) {
            Ok(acknowledgment) => acknowledgment,
            Err(error) => {
                warn!(
                    target: LISTENER_TARGET,
                    error = %error,
                    frame_bytes = frame.len(),
                    "message not acknowledged"
                );
                return Ok(None);
            }
        };
        write_block(stream, &framing::wrap(acknowledgment.as_bytes()), drain)
    }
}

/// Writes one wrapped acknowledgment, retrying timed-out writes until the
/// peer accepts the bytes or the drain clock runs out.
fn write_block<S: Write>(
    stream: &mut S,
    block: &[u8],
    drain: &mut Drain<'_>,
) -> Result<Option<Closed>, ConnectionError> {
    let mut remaining = block;
    while !remaining.is_empty() {
        match stream.write(remaining) {
            Ok(0) => {
                return Err(ConnectionError::Write {
                    source: io::ErrorKind::WriteZero.into(),
                });
            }
            Ok(written) => remaining = remaining.get(written..).unwrap_or_default(),
            Err(error) if is_poll_timeout(&error) => {
                if drain.expired() {
                    return Ok(Some(Closed::DrainTimeout));
                }
            }
            Err(source) => return Err(ConnectionError::Write { source }),
        }
    }
    stream
        .flush()
        .map(|()| None)
        .map_err(|source| ConnectionError::Write { source })
}

impl ConnectionHandler for MllpConnectionHandler {
    fn handle(&self, mut stream: TcpStream, shutdown: &ShutdownToken) {
        let peer = stream
            .peer_addr()
            .map_or_else(|_| "unknown".to_owned(), |addr| addr.to_string());
        let span = info_span!(target: LISTENER_TARGET, "connection", peer = %peer);
        let _entered = span.enter();
        info!(target: LISTENER_TARGET, "connection received");

        let configured = stream
            .set_read_timeout(Some(POLL_INTERVAL))
            .and_then(|()| stream.set_write_timeout(Some(POLL_INTERVAL)));
        if let Err(source) = configured {
            let error = ConnectionError::Configure { source };
            warn!(target: LISTENER_TARGET, error = %error, "connection error");
            return;
        }

        match self.serve(&mut stream, shutdown) {
            Ok(Closed::DrainTimeout) => warn!(
                target: LISTENER_TARGET,
                "abandoning connection after shutdown drain timeout"
            ),
            Ok(reason) => debug!(target: LISTENER_TARGET, ?reason, "closing"),
            Err(error) => {
                warn!(target: LISTENER_TARGET, error = %error, "connection error");
            }
        }
        info!(target: LISTENER_TARGET, "connection closed");
    }
}

fn is_poll_timeout(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}
