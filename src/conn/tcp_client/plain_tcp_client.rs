use crate::conn::tcp_client::{connect_tcp, IoMonitor, Monitored};
use crate::conn::{ConnectParams, ConnectionConfiguration};
use crate::HdbResult;
use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

// A buffered plain tcp connection. Reader and writer work on clones of the
// same socket; an additional clone is kept for deadline changes and for the
// shutdown that implements cancellation.
pub(crate) struct PlainTcpClient {
    params: ConnectParams,
    stream: TcpStream,
    reader: BufReader<Monitored<TcpStream>>,
    writer: BufWriter<Monitored<TcpStream>>,
}

impl std::fmt::Debug for PlainTcpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "PlainTcpClient {{params: {:?}, ...}}", &self.params)
    }
}

impl PlainTcpClient {
    pub fn try_new(
        params: ConnectParams,
        config: &ConnectionConfiguration,
        io_monitor: Arc<IoMonitor>,
    ) -> HdbResult<Self> {
        let stream = connect_tcp(&params, config)?;
        let reader = BufReader::with_capacity(
            config.buffer_size(),
            Monitored::new(stream.try_clone()?, Arc::clone(&io_monitor)),
        );
        let writer = BufWriter::with_capacity(
            config.buffer_size(),
            Monitored::new(stream.try_clone()?, io_monitor),
        );
        Ok(Self {
            params,
            stream,
            reader,
            writer,
        })
    }

    pub fn connect_params(&self) -> &ConnectParams {
        &self.params
    }

    pub fn set_read_timeout(&mut self, o_duration: Option<Duration>) -> std::io::Result<()> {
        self.stream.set_read_timeout(o_duration)
    }

    pub fn try_clone_socket(&self) -> std::io::Result<TcpStream> {
        self.stream.try_clone()
    }

    pub fn writer(&mut self) -> &mut dyn std::io::Write {
        &mut self.writer
    }

    pub fn reader(&mut self) -> &mut dyn std::io::Read {
        &mut self.reader
    }
}
