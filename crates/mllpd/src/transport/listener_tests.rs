//! Tests for the TCP listener.

use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use mllp_config::Config;
use rstest::{fixture, rstest};

use super::listener::MllpListener;
use super::{ConnectionHandler, CountingHandler, ListenerError, MllpConnectionHandler};
use crate::framing;
use crate::service::AckService;

const ADMIT: &[u8] = b"MSH|^~\\&|LAB|HOSP|||20240101||ADT^A01^ADT_A01|MSG1|P|2.4\rPID|1|42\r";

#[derive(Clone)]
struct CountingFixture {
    count: Arc<AtomicUsize>,
    handler: Arc<CountingHandler>,
}

#[fixture]
fn counting_fixture() -> CountingFixture {
    let (count, handler) = CountingHandler::new();
    CountingFixture { count, handler }
}

fn wait_for_count(count: &AtomicUsize, expected: usize) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if count.load(Ordering::SeqCst) >= expected {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}

#[rstest]
fn accepts_concurrent_connections(counting_fixture: CountingFixture) {
    let listener = MllpListener::bind("127.0.0.1", 0).expect("bind tcp listener");
    let addr = listener.local_addr();
    let CountingFixture { count, handler } = counting_fixture;
    let handler: Arc<dyn ConnectionHandler> = handler;
    let handle = listener.start(handler).expect("start listener");
    assert_eq!(handle.local_addr(), addr);

    let _first = TcpStream::connect(addr).expect("connect first client");
    let _second = TcpStream::connect(addr).expect("connect second client");

    // Both workers block until shutdown, so the count proves concurrency.
    assert!(wait_for_count(&count, 2), "expected two connections");
    handle.shutdown();
    handle.join().expect("join listener");
}

#[rstest]
fn join_waits_for_workers(counting_fixture: CountingFixture) {
    let listener = MllpListener::bind("127.0.0.1", 0).expect("bind tcp listener");
    let addr = listener.local_addr();
    let CountingFixture { count, handler } = counting_fixture;
    let handle = listener.start(handler).expect("start listener");

    let _client = TcpStream::connect(addr).expect("connect client");
    assert!(wait_for_count(&count, 1), "expected one connection");

    handle.shutdown();
    handle.join().expect("join listener");
    assert!(
        TcpStream::connect_timeout(&addr, Duration::from_millis(200)).is_err(),
        "listener socket should be closed after join"
    );
}

#[test]
fn shutdown_completes_while_a_peer_ignores_acknowledgments() {
    let listener = MllpListener::bind("127.0.0.1", 0).expect("bind tcp listener");
    let addr = listener.local_addr();
    let service = Arc::new(AckService::from_config(&Config::default()));
    let handler = Arc::new(
        MllpConnectionHandler::new(service, 1 << 20).with_drain_timeout(Duration::from_millis(500)),
    );
    let handle = listener.start(handler).expect("start listener");

    // Send without reading until both socket buffers are full and the
    // worker is stuck writing an acknowledgment.
    let mut client = TcpStream::connect(addr).expect("connect client");
    client
        .set_write_timeout(Some(Duration::from_millis(200)))
        .expect("client write timeout");
    let block = framing::wrap(ADMIT);
    let deadline = Instant::now() + Duration::from_secs(30);
    while client.write_all(&block).is_ok() {
        assert!(Instant::now() < deadline, "client writes never blocked");
    }

    handle.shutdown();
    let (joined_tx, joined_rx) = mpsc::channel();
    thread::spawn(move || {
        joined_tx.send(handle.join().is_ok()).ok();
    });
    let joined = joined_rx.recv_timeout(Duration::from_secs(5));
    drop(client);

    assert_eq!(joined, Ok(true), "listener join should finish after the drain timeout");
}

#[test]
fn rejects_ports_in_use() {
    let reserved = TcpListener::bind(("127.0.0.1", 0)).expect("reserve port");
    let port = reserved.local_addr().expect("local addr").port();

    let error = MllpListener::bind("127.0.0.1", port).expect_err("port in use");

    assert!(matches!(error, ListenerError::BindTcp { .. }), "{error}");
}
