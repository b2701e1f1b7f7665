use crate::{
    base::{Row, Rows, RsState},
    HdbResult, ResultSetMetadata, ServerUsage,
};
use std::sync::Arc;

/// The result of a database query: a set of rows, fetched in chunks.
///
/// The rows of the first chunk arrive with the reply to the query; the
/// remaining rows are fetched on demand, in chunks of the connection's fetch
/// size, as long as the result set is iterated. The server-side cursor is
/// closed automatically when the last row was transferred, or - with an
/// explicit round trip - when the result set is dropped earlier.
///
/// ```rust, no_run
/// # use hdbclient::{Connection, ConnectParams, HdbResult};
/// # fn main() -> HdbResult<()> {
/// # let mut connection = Connection::new(ConnectParams::builder().build()?)?;
/// let mut result_set = connection.query("select * from MY_TABLE")?;
/// while let Some(row) = result_set.next_row()? {
///     // ...
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ResultSet {
    metadata: Arc<ResultSetMetadata>,
    state: RsState,
}

impl ResultSet {
    pub(crate) fn new(state: RsState, metadata: Arc<ResultSetMetadata>) -> Self {
        Self { metadata, state }
    }

    /// Returns the metadata of the result set (the field descriptors).
    pub fn metadata(&self) -> &ResultSetMetadata {
        &self.metadata
    }

    /// Returns the next row, fetching from the server if necessary.
    pub fn next_row(&mut self) -> HdbResult<Option<Row>> {
        self.state.next_row(&self.metadata)
    }

    /// Fetches all not-yet-transferred rows from the server.
    pub fn fetch_all(&mut self) -> HdbResult<()> {
        self.state.fetch_all(&self.metadata)
    }

    /// The total number of rows; drives the result set to its end.
    pub fn total_number_of_rows(&mut self) -> HdbResult<usize> {
        self.state.total_number_of_rows(&self.metadata)
    }

    /// Converts the result set into a fully materialized set of rows.
    pub fn into_rows(mut self) -> HdbResult<Rows> {
        self.state.into_rows(Arc::clone(&self.metadata))
    }

    /// Converts the result set into its single row.
    ///
    /// # Errors
    ///
    /// `HdbError::Usage` if the result set is empty or has more than one row.
    pub fn into_single_row(mut self) -> HdbResult<Row> {
        self.state.single_row()
    }

    /// True if no more rows can be fetched.
    pub fn is_complete(&self) -> HdbResult<bool> {
        self.state.is_complete()
    }

    /// Closes the result set; the server-side cursor is freed if it is still
    /// open.
    pub fn close(self) -> HdbResult<()> {
        drop(self);
        Ok(())
    }

    /// Information about the server-side resource consumption that is
    /// related to this result set.
    pub fn server_usage(&self) -> ServerUsage {
        *self.state.server_usage()
    }
}

impl Iterator for ResultSet {
    type Item = HdbResult<Row>;
    fn next(&mut self) -> Option<HdbResult<Row>> {
        self.next_row().transpose()
    }
}

impl std::fmt::Display for ResultSet {
    // Writes a header and then the data.
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(fmt, "{}", &self.metadata)?;
        write!(fmt, "{}", &self.state)?;
        Ok(())
    }
}
