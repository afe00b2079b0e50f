//! TCP accept loop.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use super::{ConnectionHandler, LISTENER_TARGET, ListenerError, ShutdownToken};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Bound, not yet accepting, MLLP listener.
#[derive(Debug)]
pub(crate) struct MllpListener {
    address: SocketAddr,
    listener: TcpListener,
}

impl MllpListener {
    pub(crate) fn bind(host: &str, port: u16) -> Result<Self, ListenerError> {
        let listener = bind_tcp(host, port)?;
        let address = listener
            .local_addr()
            .map_err(|source| ListenerError::LocalAddress { source })?;
        Ok(Self { address, listener })
    }

    /// Address actually bound; differs from the request when port 0 was used.
    pub(crate) const fn local_addr(&self) -> SocketAddr {
        self.address
    }

    pub(crate) fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<ListenerHandle, ListenerError> {
        self.listener
            .set_nonblocking(true)
            .map_err(|source| ListenerError::NonBlocking { source })?;
        let shutdown = ShutdownToken::new();
        let token = shutdown.clone();
        let address = self.address;
        let handle = thread::Builder::new()
            .name("mllp-accept".to_owned())
            .spawn(move || run_accept_loop(&self, &token, &handler))
            .map_err(|source| ListenerError::Spawn { source })?;
        Ok(ListenerHandle {
            address,
            shutdown,
            handle: Some(handle),
        })
    }
}

/// Handle to the background accept thread.
pub(crate) struct ListenerHandle {
    address: SocketAddr,
    shutdown: ShutdownToken,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    pub(crate) const fn local_addr(&self) -> SocketAddr {
        self.address
    }

    /// Stops accepting and tells every worker to finish.
    pub(crate) fn shutdown(&self) {
        self.shutdown.trigger();
    }

    /// Waits for the accept thread and, through it, every worker.
    pub(crate) fn join(mut self) -> Result<(), ListenerError> {
        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(()) => Ok(()),
                Err(_) => Err(ListenerError::ThreadPanic),
            }
        } else {
            Ok(())
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

fn run_accept_loop(
    listener: &MllpListener,
    shutdown: &ShutdownToken,
    handler: &Arc<dyn ConnectionHandler>,
) {
    info!(
        target: LISTENER_TARGET,
        address = %listener.address,
        "MLLP listener active"
    );
    let mut workers = Vec::<thread::JoinHandle<()>>::new();
    let mut last_error = None::<io::ErrorKind>;
    while !shutdown.is_triggered() {
        workers.retain(|worker| !worker.is_finished());
        match accept_connection(&listener.listener) {
            Ok(Some(stream)) => {
                last_error = None;
                let handler = Arc::clone(handler);
                let token = shutdown.clone();
                match thread::Builder::new()
                    .name("mllp-connection".to_owned())
                    .spawn(move || handler.handle(stream, &token))
                {
                    Ok(worker) => workers.push(worker),
                    Err(error) => warn!(
                        target: LISTENER_TARGET,
                        error = %error,
                        "failed to spawn connection worker"
                    ),
                }
            }
            Ok(None) => thread::sleep(ACCEPT_BACKOFF),
            Err(error) => {
                let kind = error.kind();
                if last_error != Some(kind) {
                    warn!(
                        target: LISTENER_TARGET,
                        error = %error,
                        "socket accept error"
                    );
                }
                last_error = Some(kind);
                thread::sleep(ERROR_BACKOFF);
            }
        }
    }

    info!(
        target: LISTENER_TARGET,
        workers = workers.len(),
        "MLLP listener stopping"
    );
    for worker in workers {
        if worker.join().is_err() {
            warn!(target: LISTENER_TARGET, "connection worker panicked");
        }
    }
}

fn accept_connection(listener: &TcpListener) -> Result<Option<TcpStream>, io::Error> {
    match listener.accept() {
        Ok((stream, _)) => {
            stream.set_nonblocking(false)?;
            Ok(Some(stream))
        }
        Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
        Err(error) => Err(error),
    }
}

fn bind_tcp(host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?;
    let addr = addrs.next().ok_or_else(|| ListenerError::ResolveEmpty {
        host: host.to_owned(),
        port,
    })?;
    TcpListener::bind(addr).map_err(|source| ListenerError::BindTcp { addr, source })
}
