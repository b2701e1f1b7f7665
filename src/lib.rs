//! Synchronous wire-protocol client for the SAP HANA in-memory database.
//!
//! The crate implements the framed message protocol of HANA's SQL port:
//! the segment/part codec, the typed field codecs (parameterized by the
//! negotiated data format version), the multi-round authentication
//! negotiation, the prepared-statement and result-set lifecycle, and the
//! chunked LOB transfer protocol with its CESU-8 character accounting.
//!
//! Entry point is [`Connection`]; see [`ConnectParamsBuilder`] for how to
//! describe the target database and the credentials.

#![deny(missing_debug_implementations)]
#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

mod base;
mod conn;
mod connection;
mod hdb_error;
mod hdb_response;
mod hdb_return_value;
mod prepared_statement;
mod protocol;
mod result_set;
mod types_impl;

pub use crate::conn::{
    CancelHandle, Cesu8DecodePolicy, ClientIdentity, ConnectParams, ConnectParamsBuilder,
    ConnectionConfiguration, ConnectionStatistics, CursorHoldability, HdbVersion, ServerCerts, Tls,
};
pub use crate::connection::Connection;
pub use crate::hdb_error::{HdbError, HdbResult};
pub(crate) use crate::hdb_error::{impl_err, usage_err};
pub use crate::hdb_response::HdbResponse;
pub use crate::hdb_return_value::HdbReturnValue;
pub use crate::prepared_statement::PreparedStatement;
pub use crate::protocol::parts::{
    DbConnectInfo, ExecutionResult, ExecutionResults, FieldMetadata, HdbValue, OutputParameters,
    ParameterBinding, ParameterDescriptor, ParameterDescriptors, ParameterDirection,
    ResultSetMetadata, ServerError, Severity, TypeId,
};
pub use crate::protocol::ServerUsage;
pub use crate::result_set::ResultSet;
pub use crate::{base::Row, base::Rows};

/// Non-standard types that appear within the [`HdbValue`]s of a [`ResultSet`].
pub mod types {
    pub use crate::types_impl::{
        daydate::DayDate,
        lob::{BLob, CLob, CharLobSlice, NCLob},
        longdate::LongDate,
        seconddate::SecondDate,
        secondtime::SecondTime,
    };
}
