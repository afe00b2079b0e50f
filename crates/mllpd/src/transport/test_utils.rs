//! Test helpers for the transport module.

use std::net::TcpStream;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use super::{ConnectionHandler, ShutdownToken};

/// Counts connections and then holds each open until shutdown.
pub(crate) struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CountingHandler {
    pub(crate) fn new() -> (Arc<AtomicUsize>, Arc<Self>) {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(Self {
            count: Arc::clone(&count),
        });
        (count, handler)
    }
}

impl ConnectionHandler for CountingHandler {
    fn handle(&self, _stream: TcpStream, shutdown: &ShutdownToken) {
        self.count.fetch_add(1, Ordering::SeqCst);
        while !shutdown.is_triggered() {
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
    }
}
