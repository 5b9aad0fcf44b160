//! Shared fixtures for the server integration tests: a recording serial
//! sink, a recording interpreter, and a server started on an ephemeral port.

#![allow(dead_code)]

use climux_core::{ConnRegistry, Interpreter, OutputRouter, SerialSink};
use climux_server::config::Config;
use climux_server::listener::{CliServer, ServerHandle};
use climux_server::state::ServerState;
use climux_types::{JsonCommand, Target};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

/// One interpreter invocation, as seen through the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    Plain(String, Target),
    Json(String, Target),
}

#[derive(Default)]
pub struct RecordingSerial {
    bytes: Mutex<Vec<u8>>,
}

impl SerialSink for RecordingSerial {
    fn write_byte(&self, byte: u8) {
        self.bytes.lock().unwrap().push(byte);
    }
}

impl RecordingSerial {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock().unwrap()).into_owned()
    }
}

/// Interpreter that records every dispatch and optionally answers
/// `ok: <command>` through the router.
pub struct RecordingInterpreter {
    log: Arc<Mutex<Vec<Dispatched>>>,
    reply: bool,
}

impl Interpreter for RecordingInterpreter {
    fn execute_line(&mut self, line: &str, target: Target, out: &OutputRouter) {
        self.log
            .lock()
            .unwrap()
            .push(Dispatched::Plain(line.to_string(), target));
        if self.reply {
            out.write_line(&format!("ok: {line}"));
        }
    }

    fn execute_json(&mut self, cmd: &JsonCommand, target: Target, out: &OutputRouter) {
        self.log
            .lock()
            .unwrap()
            .push(Dispatched::Json(cmd.cmd.clone(), target));
        if self.reply {
            out.write_line(&format!("ok: {}", cmd.cmd));
        }
    }
}

pub struct TestServer {
    pub state: Arc<ServerState>,
    pub handle: ServerHandle,
    pub log: Arc<Mutex<Vec<Dispatched>>>,
    pub serial: Arc<RecordingSerial>,
}

impl TestServer {
    pub fn dispatches(&self) -> Vec<Dispatched> {
        self.log.lock().unwrap().clone()
    }

    pub async fn connect(&self) -> TcpStream {
        TcpStream::connect(self.handle.local_addr())
            .await
            .expect("connect to test server")
    }
}

pub struct TestServerOptions {
    pub max_connections: usize,
    pub idle_timeout_secs: u64,
    pub serial_echo: bool,
    pub reply: bool,
}

impl Default for TestServerOptions {
    fn default() -> Self {
        Self {
            max_connections: 5,
            idle_timeout_secs: 600,
            serial_echo: false,
            reply: false,
        }
    }
}

pub async fn start_server(opts: TestServerOptions) -> TestServer {
    let config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        max_connections: opts.max_connections,
        idle_timeout_secs: opts.idle_timeout_secs,
        enabled: true,
        serial_echo: opts.serial_echo,
    };

    let log = Arc::new(Mutex::new(Vec::new()));
    let serial = Arc::new(RecordingSerial::default());
    let registry = Arc::new(ConnRegistry::new(config.max_connections));
    let interpreter = RecordingInterpreter {
        log: log.clone(),
        reply: opts.reply,
    };
    let state = ServerState::new(config, registry, Box::new(interpreter), serial.clone());
    let handle = CliServer::start(state.clone())
        .await
        .expect("start test server");

    TestServer {
        state,
        handle,
        log,
        serial,
    }
}

/// Poll a condition until it holds or two seconds elapse.
pub async fn wait_for<F>(mut cond: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Read from the stream until the accumulated bytes contain `needle`.
/// Panics after two seconds without a match.
pub async fn read_until(stream: &mut TcpStream, needle: &[u8]) -> Vec<u8> {
    let mut collected = Vec::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    let mut buf = [0u8; 256];

    loop {
        let remaining = deadline
            .checked_duration_since(tokio::time::Instant::now())
            .unwrap_or_else(|| panic!("timed out waiting for {:?}", String::from_utf8_lossy(needle)));
        let n = tokio::time::timeout(remaining, stream.read(&mut buf))
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {:?}", String::from_utf8_lossy(needle)))
            .expect("read from test server");
        assert!(n > 0, "stream closed before {:?}", String::from_utf8_lossy(needle));
        collected.extend_from_slice(&buf[..n]);
        if collected
            .windows(needle.len())
            .any(|window| window == needle)
        {
            return collected;
        }
    }
}

/// Expect the server side to close the stream: the next read yields either
/// a clean EOF or a reset.
pub async fn expect_eof(stream: &mut TcpStream) {
    let mut buf = [0u8; 16];
    match tokio::time::timeout(Duration::from_secs(5), stream.read(&mut buf)).await {
        Ok(Ok(0)) | Ok(Err(_)) => {}
        Ok(Ok(n)) => panic!("expected EOF, read {n} bytes"),
        Err(_) => panic!("expected EOF, read timed out"),
    }
}

/// Run a future with an overall test deadline.
pub async fn within<F: Future>(secs: u64, fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(secs), fut)
        .await
        .expect("test step timed out")
}
