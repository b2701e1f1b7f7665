use crate::conn::tcp_client::{connect_tcp, IoMonitor, Monitored};
use crate::conn::{ConnectParams, ConnectionConfiguration};
use crate::HdbResult;
use rustls::{ClientConnection, ServerName, StreamOwned};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

// A blocking tcp connection with TLS. rustls maintains its own record
// buffers, so no additional buffering layer is put around the stream.
pub(crate) struct TlsTcpClient {
    params: ConnectParams,
    stream: TcpStream,
    tls_stream: StreamOwned<ClientConnection, Monitored<TcpStream>>,
}
impl std::fmt::Debug for TlsTcpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "TlsTcpClient {{params: {:?}, ...}}", &self.params)
    }
}
impl TlsTcpClient {
    pub fn try_new(
        params: ConnectParams,
        config: &ConnectionConfiguration,
        io_monitor: Arc<IoMonitor>,
    ) -> HdbResult<Self> {
        let a_client_config = Arc::new(params.rustls_clientconfig()?);
        let server_name = ServerName::try_from(params.host())?;
        let client_connection = ClientConnection::new(a_client_config, server_name)?;
        trace!("ClientConnection: {client_connection:?}");

        let stream = connect_tcp(&params, config)?;
        let tls_stream = StreamOwned::new(
            client_connection,
            Monitored::new(stream.try_clone()?, io_monitor),
        );
        Ok(Self {
            params,
            stream,
            tls_stream,
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
        &mut self.tls_stream
    }

    pub fn reader(&mut self) -> &mut dyn std::io::Read {
        &mut self.tls_stream
    }
}
