// The database connection, the parameters for creating one, and authentication.

mod am_conn_core;
mod authentication;
mod command_options;
mod connection_configuration;
mod connection_core;
mod connection_statistics;
mod hdb_version;
mod initial_request;
mod liveness;
mod params;
mod session_state;
mod tcp_client;

pub(crate) use {
    am_conn_core::AmConnCore, authentication::AuthCredentials, command_options::CommandOptions,
    connection_core::ConnectionCore, liveness::Liveness, tcp_client::TcpClient,
};

pub use {
    command_options::CursorHoldability,
    connection_configuration::ConnectionConfiguration,
    connection_statistics::ConnectionStatistics,
    hdb_version::HdbVersion,
    liveness::CancelHandle,
    params::{
        client_identity::ClientIdentity,
        connect_params::{ConnectParams, ServerCerts, Tls},
        connect_params_builder::ConnectParamsBuilder,
    },
};

pub use crate::protocol::util::Cesu8DecodePolicy;

use session_state::SessionState;
