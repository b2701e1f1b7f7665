mod internal_returnvalue;
mod prepared_statement_core;
mod row;
mod rows;
mod rs_core;
mod rs_state;

pub(crate) use self::{
    internal_returnvalue::InternalReturnValue, prepared_statement_core::PreparedStatementCore,
    rs_core::RsCore, rs_state::RsState,
};
pub use self::{row::Row, rows::Rows};

use std::sync::{Arc, Mutex};

// Shared mutable handles; the mutexes serialize all accesses.
pub(crate) type AM<T> = Arc<Mutex<T>>;
pub(crate) type OAM<T> = Option<AM<T>>;

pub(crate) fn new_am<T>(t: T) -> AM<T> {
    Arc::new(Mutex::new(t))
}
