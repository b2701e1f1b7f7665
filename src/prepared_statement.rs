use crate::{
    base::{new_am, InternalReturnValue, PreparedStatementCore, AM},
    conn::AmConnCore,
    hdb_response::HdbResponse,
    impl_err,
    protocol::{
        parts::{
            ExecutionResults, HdbValue, LobFlags, ParameterDescriptors, ParameterRow,
            ParameterRows, ResultSetMetadata, RowBatch, TypeId,
        },
        MessageType, Part, PartKind, Request, ServerUsage,
    },
    types_impl::lob::LobWriter,
    usage_err, HdbError, HdbResult,
};
use std::{io::Write, sync::Arc};

/// Allows injection-safe SQL execution and repeated calls of the same
/// statement with different parameters, with as few roundtrips as possible.
///
/// A `PreparedStatement` is created with
/// [`Connection::prepare`](crate::Connection::prepare); the server describes
/// the statement's input and output parameters as part of the preparation,
/// and these descriptors drive the wire encoding of the provided values.
///
/// # Single execution
///
/// Provide one row of values and execute:
///
/// ```rust,no_run
/// # use hdbclient::{Connection, ConnectParams, HdbValue, HdbResult};
/// # fn main() -> HdbResult<()> {
/// # let mut connection = Connection::new(ConnectParams::builder().build()?)?;
/// let mut stmt = connection.prepare("insert into T values(?, ?)")?;
/// stmt.execute_row(vec![HdbValue::INT(42), HdbValue::STRING("Hello 世界".to_string())])?;
/// # Ok(())
/// # }
/// ```
///
/// # Bulk execution
///
/// Add any number of rows to the statement's batch, then execute the batch.
/// The rows are transferred in portions of the connection's bulk size, one
/// server roundtrip per portion. A bulk is *not* atomic: when rows fail, the
/// other rows are still applied, and the error carries the detailed
/// [`ExecutionResults`](crate::ExecutionResults).
///
/// # Streaming LOBs
///
/// A value of kind [`HdbValue::LOBSTREAM`] transfers its data to the
/// database in chunks, in additional roundtrips after the execution request.
/// The server accepts streamed LOB data only for the last row of an
/// execution, so rows with LOB streams are executed as single-row portions.
#[derive(Debug)]
pub struct PreparedStatement {
    am_ps_core: AM<PreparedStatementCore>,
    server_usage: ServerUsage,
    a_descriptors: Arc<ParameterDescriptors>,
    o_a_rsmd: Option<Arc<ResultSetMetadata>>,
    batch: ParameterRows<'static>,
}

impl PreparedStatement {
    // Prepare a statement.
    pub(crate) fn try_new(am_conn_core: AmConnCore, stmt: &str) -> HdbResult<Self> {
        let command_options = am_conn_core.lock()?.configuration().command_options();
        let mut request = Request::new(MessageType::Prepare, command_options);
        request.push(Part::Command(stmt));

        let reply = am_conn_core.send(request)?;

        let mut o_stmt_id: Option<u64> = None;
        let mut a_descriptors: Arc<ParameterDescriptors> =
            Arc::new(ParameterDescriptors::default());
        let mut o_a_rsmd: Option<Arc<ResultSetMetadata>> = None;
        let mut server_usage = ServerUsage::default();

        for part in reply.parts {
            match part {
                Part::ParameterMetadata(descriptors) => {
                    a_descriptors = Arc::new(descriptors);
                }
                Part::StatementId(id) => {
                    o_stmt_id = Some(id);
                }
                Part::TransactionFlags(ta_flags) => {
                    am_conn_core.lock()?.evaluate_ta_flags(&ta_flags)?;
                }
                Part::TableLocation(_) => {}
                Part::ResultSetMetadata(rs_md) => {
                    o_a_rsmd = Some(Arc::new(rs_md));
                }
                Part::StatementContext(ref stmt_ctx) => {
                    am_conn_core.lock()?.evaluate_statement_context(stmt_ctx);
                    server_usage.update(
                        stmt_ctx.server_processing_time(),
                        stmt_ctx.server_cpu_time(),
                        stmt_ctx.server_memory_usage(),
                    );
                }
                x => warn!("prepare: unexpected reply part found {:?}", x.kind()),
            }
        }

        let statement_id = o_stmt_id.ok_or_else(|| impl_err!("no statement id received"))?;
        let am_ps_core = new_am(PreparedStatementCore {
            am_conn_core,
            statement_id,
        });
        debug!("PreparedStatement created with parameter descriptors = {a_descriptors:?}");
        Ok(Self {
            am_ps_core,
            server_usage,
            batch: ParameterRows::new(),
            a_descriptors,
            o_a_rsmd,
        })
    }

    /// Descriptors of all parameters of the prepared statement (in, out,
    /// inout).
    #[must_use]
    pub fn parameter_descriptors(&self) -> Arc<ParameterDescriptors> {
        Arc::clone(&self.a_descriptors)
    }

    /// Number of input parameters of the statement.
    #[must_use]
    pub fn num_input_parameters(&self) -> usize {
        self.a_descriptors.count_in()
    }

    /// Executes the statement with no input values.
    pub fn execute(&mut self) -> HdbResult<HdbResponse> {
        if self.a_descriptors.has_in() {
            return Err(usage_err!(
                "the statement has {} input parameter(s), use execute_row()",
                self.a_descriptors.count_in()
            ));
        }
        self.execute_plain_rows(None)
    }

    /// Consumes the given values as a row of parameters for immediate
    /// execution.
    ///
    /// The row must contain exactly one value per input parameter of the
    /// statement. For a procedure call with output parameters the returned
    /// [`HdbResponse`] carries, next to the row counts, the output
    /// parameters and zero or more result sets.
    ///
    /// [`HdbValue::LOBSTREAM`] values are transferred to the database in
    /// chunks after the execution request; the statement is really executed
    /// with the arrival of the last chunk.
    pub fn execute_row(&mut self, hdb_values: Vec<HdbValue<'_>>) -> HdbResult<HdbResponse> {
        trace!("PreparedStatement::execute_row()");
        if !self.a_descriptors.has_in() {
            if hdb_values.is_empty() {
                return self.execute_plain_rows(None);
            }
            return Err(usage_err!(
                "the statement has no input parameters, but {} values were provided",
                hdb_values.len()
            ));
        }
        let row = ParameterRow::new(hdb_values, &self.a_descriptors)?;
        if row.has_lob_stream() {
            self.execute_streaming_row(row)
        } else {
            let mut rows = ParameterRows::new();
            rows.push_row(row);
            self.execute_plain_rows(Some(rows))
        }
    }

    /// Like [`execute_row`](PreparedStatement::execute_row), but with named
    /// instead of positional values.
    ///
    /// The values are brought into the declared parameter order by matching
    /// the names against the parameter metadata. An unknown name produces a
    /// usage error that suggests the closest declared name - helpful with
    /// typos and wrong casing.
    pub fn execute_named_row<S: AsRef<str>>(
        &mut self,
        named_values: Vec<(S, HdbValue<'_>)>,
    ) -> HdbResult<HdbResponse> {
        let named_values: Vec<(String, HdbValue)> = named_values
            .into_iter()
            .map(|(name, value)| (name.as_ref().to_string(), value))
            .collect();
        let sorted_values = self.a_descriptors.sort_in_by_name(named_values)?;
        self.execute_row(sorted_values)
    }

    /// Adds a row of parameter values to the statement's batch, if it is
    /// consistent with the metadata.
    pub fn add_row_to_batch(&mut self, hdb_values: Vec<HdbValue<'static>>) -> HdbResult<()> {
        trace!("PreparedStatement::add_row_to_batch()");
        if self.a_descriptors.has_in() {
            self.batch.push_hdb_values(hdb_values, &self.a_descriptors)?;
            return Ok(());
        }
        Err(HdbError::Usage(
            "batch not possible, the statement has no input parameters",
        ))
    }

    /// Returns the number of parameter rows that were already added to the
    /// batch.
    #[must_use]
    pub fn current_batch_size(&self) -> usize {
        self.batch.count()
    }

    /// Executes the statement with the collected batch, and clears the
    /// batch.
    ///
    /// The rows go to the server in portions of at most the connection's
    /// bulk size, one roundtrip per portion; a row that carries a LOB
    /// stream is transferred as a portion of its own. Bulk execution is
    /// *not* atomic: a failure in one portion does not undo the other
    /// portions, and the error carries the execution outcomes that were
    /// accumulated so far.
    pub fn execute_batch(&mut self) -> HdbResult<HdbResponse> {
        if self.batch.is_empty() {
            if self.a_descriptors.has_in() {
                return Err(HdbError::Usage("empty batch cannot be executed"));
            }
            return self.execute_plain_rows(None);
        }
        let mut rows = ParameterRows::new();
        std::mem::swap(&mut self.batch, &mut rows);

        let bulk_size = {
            let ps_core_guard = self.am_ps_core.lock()?;
            let guard = ps_core_guard.am_conn_core.lock()?;
            guard.configuration().bulk_size()
        };
        trace!(
            "PreparedStatement::execute_batch() with {} rows, bulk_size {bulk_size}",
            rows.count()
        );

        let mut batches = rows.into_batches(bulk_size);
        if batches.len() == 1 {
            return match batches.remove(0) {
                RowBatch::Plain(rows) => self.execute_plain_rows(Some(rows)),
                RowBatch::Streaming(row) => self.execute_streaming_row(row),
            };
        }

        let mut accumulated = ExecutionResults::default();
        for batch in batches {
            let response = match batch {
                RowBatch::Plain(rows) => self.execute_plain_rows(Some(rows)),
                RowBatch::Streaming(row) => self.execute_streaming_row(row),
            };
            match response.and_then(HdbResponse::into_execution_results) {
                Ok(execution_results) => accumulated.append(execution_results),
                Err(HdbError::ExecutionResults(execution_results)) => {
                    // not atomic: surface the partial outcomes together with
                    // the failure
                    accumulated.append(execution_results);
                    return Err(HdbError::ExecutionResults(accumulated));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(HdbResponse::from_execution_results(accumulated))
    }

    /// Executes the statement with rows that are pulled on demand from the
    /// given source, until the source reports end-of-rows with `Ok(None)`.
    ///
    /// The same batching applies as for
    /// [`execute_batch`](PreparedStatement::execute_batch).
    pub fn execute_batch_from<F>(&mut self, mut next_row: F) -> HdbResult<HdbResponse>
    where
        F: FnMut() -> HdbResult<Option<Vec<HdbValue<'static>>>>,
    {
        if !self.batch.is_empty() {
            return Err(HdbError::Usage(
                "execute_batch_from cannot be mixed with a non-empty batch",
            ));
        }
        while let Some(hdb_values) = next_row()? {
            self.add_row_to_batch(hdb_values)?;
        }
        self.execute_batch()
    }

    /// Provides information about the server-side resource consumption that
    /// is related to this statement.
    #[must_use]
    pub fn server_usage(&self) -> ServerUsage {
        self.server_usage
    }

    // One roundtrip with zero or more complete rows.
    fn execute_plain_rows(&mut self, o_rows: Option<ParameterRows>) -> HdbResult<HdbResponse> {
        trace!("PreparedStatement::execute_plain_rows()");
        let ps_core_guard = self.am_ps_core.lock()?;
        let command_options = {
            let guard = ps_core_guard.am_conn_core.lock()?;
            guard.configuration().command_options()
        };
        let mut request = Request::new(MessageType::Execute, command_options);
        request.push(Part::StatementId(ps_core_guard.statement_id));
        if let Some(rows) = o_rows {
            request.push(Part::ParameterRows(rows));
        }

        let reply = ps_core_guard.am_conn_core.full_send(
            request,
            self.o_a_rsmd.as_ref(),
            Some(&self.a_descriptors),
            &mut None,
        )?;
        let replytype = reply.replytype;
        let mut internal_return_values = reply
            .parts
            .into_internal_return_values(&ps_core_guard.am_conn_core, None)?;

        // keep the statement alive as long as one of its result sets is
        self.inject_ps_core(&mut internal_return_values)?;
        HdbResponse::try_new(internal_return_values, replytype)
    }

    // One row whose LOB values stream to the server in chunks. The reply to
    // the execution request carries a locator id per incomplete LOB; the
    // results of the statement itself arrive with the reply to the last
    // chunk transfer.
    fn execute_streaming_row(&mut self, row: ParameterRow<'_>) -> HdbResult<HdbResponse> {
        trace!("PreparedStatement::execute_streaming_row()");
        let ps_core_guard = self.am_ps_core.lock()?;
        let (command_options, implicit_lob_streaming) = {
            let guard = ps_core_guard.am_conn_core.lock()?;
            (
                guard.configuration().command_options(),
                guard.connect_options().implicit_lob_streaming(),
            )
        };

        // detach the readers; placeholders go into the parameter row
        let mut readers: Vec<(HdbValue, TypeId)> = Vec::new();
        let hdb_values: Vec<HdbValue> = row
            .into_values()
            .into_iter()
            .zip(self.a_descriptors.iter_in())
            .map(|(value, descriptor)| {
                if let HdbValue::LOBSTREAM(Some(_)) = value {
                    readers.push((value, descriptor.type_id()));
                    HdbValue::LOBSTREAM(None)
                } else {
                    value
                }
            })
            .collect();

        let mut request = Request::new(MessageType::Execute, command_options);
        request.push(Part::StatementId(ps_core_guard.statement_id));
        let mut rows = ParameterRows::new();
        rows.push_hdb_values(hdb_values, &self.a_descriptors)?;
        request.push(Part::ParameterRows(rows));
        if implicit_lob_streaming {
            request.push(Part::LobFlags(LobFlags::for_implicit_streaming()));
        }

        let mut main_reply = ps_core_guard.am_conn_core.full_send(
            request,
            self.o_a_rsmd.as_ref(),
            Some(&self.a_descriptors),
            &mut None,
        )?;

        // if the input was not transferred completely in the same roundtrip,
        // the execution roundtrip cannot bring any of the expected results;
        // they arrive with the response to the last chunk transfer
        let o_write_lob_reply = main_reply.parts.remove_first_of_kind(PartKind::WriteLobReply);

        let replytype = main_reply.replytype;
        let mut internal_return_values = main_reply
            .parts
            .into_internal_return_values(&ps_core_guard.am_conn_core, None)?;

        if let Some(Part::WriteLobReply(write_lob_reply)) = o_write_lob_reply {
            let locator_ids = write_lob_reply.into_locator_ids();
            if locator_ids.len() != readers.len() {
                return Err(impl_err!(
                    "the number of provided readers ({}) does not match \
                     the number of returned locators ({})",
                    readers.len(),
                    locator_ids.len()
                ));
            }
            // the locator ids arrive in field order, matching the readers
            for (locator_id, (reader, type_id)) in locator_ids.into_iter().zip(readers) {
                debug!("writing content to locator with id {locator_id}");
                if let HdbValue::LOBSTREAM(Some(reader)) = reader {
                    let mut reader = reader.lock()?;
                    let mut writer = LobWriter::new(
                        locator_id,
                        type_id,
                        ps_core_guard.am_conn_core.clone(),
                        self.o_a_rsmd.as_ref(),
                        Some(&self.a_descriptors),
                    )?;
                    std::io::copy(&mut *reader, &mut writer)?;
                    writer.flush()?;
                    if let Some(mut irvs) = writer.into_internal_return_values() {
                        internal_return_values.append(&mut irvs);
                    }
                }
            }
        }

        self.inject_ps_core(&mut internal_return_values)?;
        HdbResponse::try_new(internal_return_values, replytype)
    }

    fn inject_ps_core(
        &self,
        internal_return_values: &mut [InternalReturnValue],
    ) -> HdbResult<()> {
        for rv in internal_return_values.iter_mut() {
            if let InternalReturnValue::RsState((rs_state, _a_rsmd)) = rv {
                rs_state.inject_ps_core(Arc::clone(&self.am_ps_core))?;
            }
        }
        Ok(())
    }
}
