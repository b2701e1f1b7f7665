mod plain_tcp_client;
mod tls_tcp_client;

use crate::conn::{ConnectParams, ConnectionConfiguration};
use crate::HdbResult;
use plain_tcp_client::PlainTcpClient;
use std::net::TcpStream;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};
use std::time::{Duration, Instant};
use tls_tcp_client::TlsTcpClient;

// A buffered tcp connection, with or without TLS.
#[derive(Debug)]
pub(crate) enum TcpClient {
    // A buffered blocking tcp connection without TLS.
    Plain(PlainTcpClient),
    // A buffered blocking tcp connection with TLS.
    Tls(TlsTcpClient),
}
impl TcpClient {
    // Constructs a buffered tcp connection, depending on the given connect
    // parameters, and applies deadlines and keepalive from the configuration.
    pub fn try_new(
        params: ConnectParams,
        config: &ConnectionConfiguration,
        io_monitor: Arc<IoMonitor>,
    ) -> HdbResult<Self> {
        let start = Instant::now();
        trace!("TcpClient: connecting to {:?}", params.addr());

        let tcp_client = if params.is_tls() {
            Self::Tls(TlsTcpClient::try_new(params, config, io_monitor)?)
        } else {
            Self::Plain(PlainTcpClient::try_new(params, config, io_monitor)?)
        };

        trace!(
            "connection of type {} is initialized ({} µs)",
            tcp_client.s_type(),
            Instant::now().duration_since(start).as_micros(),
        );
        Ok(tcp_client)
    }

    // Returns a descriptor of the chosen type.
    pub fn s_type(&self) -> &'static str {
        match self {
            Self::Plain(_) => "Plain TCP",
            Self::Tls(_) => "TLS TCP",
        }
    }

    pub fn connect_params(&self) -> &ConnectParams {
        match self {
            Self::Plain(client) => client.connect_params(),
            Self::Tls(client) => client.connect_params(),
        }
    }

    pub fn writer(&mut self) -> &mut dyn std::io::Write {
        match self {
            Self::Plain(client) => client.writer(),
            Self::Tls(client) => client.writer(),
        }
    }

    pub fn reader(&mut self) -> &mut dyn std::io::Read {
        match self {
            Self::Plain(client) => client.reader(),
            Self::Tls(client) => client.reader(),
        }
    }

    pub fn set_read_timeout(&mut self, o_duration: Option<Duration>) -> std::io::Result<()> {
        match self {
            Self::Plain(client) => client.set_read_timeout(o_duration),
            Self::Tls(client) => client.set_read_timeout(o_duration),
        }
    }

    // A clone of the raw socket, usable to interrupt a blocked operation.
    pub fn try_clone_socket(&self) -> std::io::Result<TcpStream> {
        match self {
            Self::Plain(client) => client.try_clone_socket(),
            Self::Tls(client) => client.try_clone_socket(),
        }
    }
}
impl Drop for TcpClient {
    fn drop(&mut self) {
        trace!("Drop of TcpClient");
    }
}

// Resolves the address, connects (with the configured deadline), and applies
// the socket options that every variant needs.
pub(crate) fn connect_tcp(
    params: &ConnectParams,
    config: &ConnectionConfiguration,
) -> std::io::Result<TcpStream> {
    use std::net::ToSocketAddrs;

    let stream = match config.timeout() {
        Some(timeout) => {
            let addr = params
                .addr()
                .to_socket_addrs()?
                .next()
                .ok_or_else(|| crate::protocol::util::io_error("address resolution failed"))?;
            TcpStream::connect_timeout(&addr, timeout)?
        }
        None => TcpStream::connect(params.addr())?,
    };

    stream.set_read_timeout(config.timeout())?;
    stream.set_write_timeout(config.timeout())?;

    if let Some(keepalive_time) = config.tcp_keepalive() {
        let keepalive = socket2::TcpKeepalive::new().with_time(keepalive_time);
        socket2::SockRef::from(&stream).set_tcp_keepalive(&keepalive)?;
    }
    Ok(stream)
}

// Observable transfer state of a connection: byte counters and the instants
// of the last successful read and write. Fed by the `Monitored` stream
// wrapper; consulted by the statistics and the ping policy.
#[derive(Debug)]
pub(crate) struct IoMonitor {
    bytes_read: AtomicU64,
    bytes_written: AtomicU64,
    last_read: Mutex<Instant>,
    last_write: Mutex<Instant>,
}

impl Default for IoMonitor {
    fn default() -> Self {
        let now = Instant::now();
        Self {
            bytes_read: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            last_read: Mutex::new(now),
            last_write: Mutex::new(now),
        }
    }
}

impl IoMonitor {
    fn note_read(&self, n: usize) {
        self.bytes_read.fetch_add(n as u64, Ordering::Relaxed);
        *self
            .last_read
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Instant::now();
    }
    fn note_write(&self, n: usize) {
        self.bytes_written.fetch_add(n as u64, Ordering::Relaxed);
        *self
            .last_write
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Instant::now();
    }

    pub(crate) fn bytes_read(&self) -> u64 {
        self.bytes_read.load(Ordering::Relaxed)
    }
    pub(crate) fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }
    pub(crate) fn elapsed_since_last_read(&self) -> Duration {
        self.last_read
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .elapsed()
    }
}

// A stream wrapper that reports successful transfers to the `IoMonitor`.
#[derive(Debug)]
pub(crate) struct Monitored<T> {
    inner: T,
    io_monitor: Arc<IoMonitor>,
}

impl<T> Monitored<T> {
    pub(crate) fn new(inner: T, io_monitor: Arc<IoMonitor>) -> Self {
        Self { inner, io_monitor }
    }
}

impl<T: std::io::Read> std::io::Read for Monitored<T> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.io_monitor.note_read(n);
        Ok(n)
    }
}

impl<T: std::io::Write> std::io::Write for Monitored<T> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.io_monitor.note_write(n);
        Ok(n)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
