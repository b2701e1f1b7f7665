use crate::{
    base::{new_am, PreparedStatementCore, Row, Rows, RsCore, AM, OAM},
    conn::{AmConnCore, CommandOptions},
    protocol::{
        parts::{Parts, StatementContext},
        FieldTypeContext, MessageType, Part, PartAttributes, PartKind, ReplyType, Request,
    },
    HdbError, HdbResult, ResultSetMetadata, ServerUsage,
};
use std::sync::Arc;

// The client-side state of a server-side cursor: the rows of the current
// fetch chunk plus the handle to the cursor (which is dropped as soon as the
// server reports the last packet).
//
// The handle keeps the connection (and, for prepared statements, the
// statement) alive, so that everything that is needed for fetching the
// missing rows stays reachable.
#[derive(Debug)]
pub(crate) struct RsState {
    next_rows: Vec<Row>,
    row_iter: <Vec<Row> as IntoIterator>::IntoIter,
    server_usage: ServerUsage,
    o_am_rscore: OAM<RsCore>,
}

impl RsState {
    fn new(
        o_stmt_ctx: Option<StatementContext>,
        am_conn_core: &AmConnCore,
        attrs: PartAttributes,
        rs_id: u64,
    ) -> Self {
        let mut new_instance = Self {
            next_rows: Vec::<Row>::new(),
            row_iter: Vec::<Row>::new().into_iter(),
            server_usage: ServerUsage::default(),
            o_am_rscore: Some(new_am(RsCore::new(am_conn_core, attrs, rs_id))),
        };
        if let Some(stmt_ctx) = o_stmt_ctx {
            new_instance.update_server_usage(&stmt_ctx);
        }
        new_instance
    }

    // For cursors that arrive without row data (procedure replies); the
    // attributes mark the begin of the fetch sequence.
    pub(crate) fn new_for_row_free_cursor(am_conn_core: &AmConnCore, rs_id: u64) -> Self {
        Self::new(None, am_conn_core, PartAttributes::new(0b_0000_0100), rs_id)
    }

    fn rs_core(&self) -> HdbResult<std::sync::MutexGuard<'_, RsCore>> {
        match self.o_am_rscore {
            Some(ref am_rs_core) => Ok(am_rs_core.lock()?),
            None => Err(HdbError::Impl("RsCore is already dropped")),
        }
    }

    fn set_attributes(&mut self, attributes: PartAttributes) -> HdbResult<()> {
        self.rs_core()?.set_attributes(attributes);
        Ok(())
    }

    pub(crate) fn update_server_usage(&mut self, stmt_ctx: &StatementContext) {
        self.server_usage.update(
            stmt_ctx.server_processing_time(),
            stmt_ctx.server_cpu_time(),
            stmt_ctx.server_memory_usage(),
        );
    }

    pub(crate) fn server_usage(&self) -> &ServerUsage {
        &self.server_usage
    }

    pub(crate) fn inject_ps_core(&mut self, am_ps_core: AM<PreparedStatementCore>) -> HdbResult<()> {
        if let Some(ref am_rs_core) = self.o_am_rscore {
            am_rs_core.lock()?.inject_ps_core(am_ps_core);
        }
        Ok(())
    }

    #[allow(clippy::wrong_self_convention)]
    pub(crate) fn into_rows(&mut self, a_rsmd: Arc<ResultSetMetadata>) -> HdbResult<Rows> {
        let mut rows = Vec::<Row>::new();
        while let Some(row) = self.next_row(&a_rsmd)? {
            rows.push(row);
        }
        Ok(Rows::new(a_rsmd, rows))
    }

    pub(crate) fn fetch_all(&mut self, a_rsmd: &Arc<ResultSetMetadata>) -> HdbResult<()> {
        while !self.is_complete()? {
            self.fetch_next(a_rsmd)?;
        }
        Ok(())
    }

    #[allow(clippy::len_without_is_empty)]
    pub(crate) fn len(&self) -> usize {
        self.next_rows.len() + self.row_iter.len()
    }

    pub(crate) fn total_number_of_rows(
        &mut self,
        a_rsmd: &Arc<ResultSetMetadata>,
    ) -> HdbResult<usize> {
        self.fetch_all(a_rsmd)?;
        Ok(self.len())
    }

    pub(crate) fn next_row(
        &mut self,
        a_rsmd: &Arc<ResultSetMetadata>,
    ) -> HdbResult<Option<Row>> {
        if let Some(r) = self.row_iter.next() {
            Ok(Some(r))
        } else {
            if self.next_rows.is_empty() {
                if self.is_complete()? {
                    return Ok(None);
                }
                self.fetch_next(a_rsmd)?;
            }
            let mut tmp_vec = Vec::<Row>::new();
            std::mem::swap(&mut tmp_vec, &mut self.next_rows);
            self.row_iter = tmp_vec.into_iter();
            Ok(self.row_iter.next())
        }
    }

    fn next_row_no_fetch(&mut self) -> Option<Row> {
        if let Some(r) = self.row_iter.next() {
            Some(r)
        } else {
            if self.next_rows.is_empty() {
                return None;
            }
            let mut tmp_vec = Vec::<Row>::new();
            std::mem::swap(&mut tmp_vec, &mut self.next_rows);
            self.row_iter = tmp_vec.into_iter();
            self.row_iter.next()
        }
    }

    pub(crate) fn single_row(&mut self) -> HdbResult<Row> {
        if self.has_multiple_rows() {
            Err(HdbError::Usage("result set has more than one row"))
        } else {
            self.next_row_no_fetch()
                .ok_or_else(|| HdbError::Usage("result set is empty"))
        }
    }

    // Returns true if the result set contains more than one row.
    pub(crate) fn has_multiple_rows(&self) -> bool {
        let is_complete = self.is_complete().unwrap_or(false);
        !is_complete || (self.next_rows.len() + self.row_iter.len() > 1)
    }

    fn fetch_next(&mut self, a_rsmd: &Arc<ResultSetMetadata>) -> HdbResult<()> {
        trace!("RsState::fetch_next()");
        let (am_conn_core, result_set_id) = {
            let rs_core = self.rs_core()?;
            let am_conn_core = rs_core.am_conn_core().clone();
            (am_conn_core, rs_core.result_set_id())
        };
        let fetch_size = am_conn_core.lock()?.configuration().fetch_size();

        // build the request, provide result-set-id and fetch-size
        debug!("RsState::fetch_next() with fetch_size = {fetch_size}");
        let mut request = Request::new(MessageType::FetchNext, CommandOptions::EMPTY);
        request.push(Part::ResultSetId(result_set_id));
        request.push(Part::FetchSize(fetch_size));

        let mut reply = am_conn_core.full_send(request, Some(a_rsmd), None, &mut Some(self))?;
        reply.assert_expected_reply_type(ReplyType::Fetch)?;
        reply.parts.pop_if_kind(PartKind::ResultSet);

        let mut drop_rs_core = false;
        if let Some(ref am_rscore) = self.o_am_rscore {
            drop_rs_core = am_rscore.lock()?.attributes().is_last_packet();
        }
        if drop_rs_core {
            self.o_am_rscore = None;
        }
        Ok(())
    }

    pub(crate) fn is_complete(&self) -> HdbResult<bool> {
        if let Some(ref am_rscore) = self.o_am_rscore {
            let rs_core = am_rscore.lock()?;
            let attributes = rs_core.attributes();
            if (!attributes.is_last_packet())
                && (attributes.row_not_found() || attributes.result_set_is_closed())
            {
                Err(HdbError::Impl(
                    "result set attributes inconsistent: incomplete, but already closed on server",
                ))
            } else {
                Ok(attributes.is_last_packet())
            }
        } else {
            Ok(true)
        }
    }

    // Result sets appear in a reply in three cases which differ in their
    // metadata handling:
    //
    // a) a response to a plain "execute" carries the metadata in one of the
    //    previous parts; o_a_rsmd is None
    //
    // b) a response to an "execute prepared" contains only data; the
    //    metadata were returned with the "prepare" and come in via o_a_rsmd
    //
    // c) a response to a "fetch more lines" is triggered from an existing
    //    result set, which is passed in via o_rs
    //
    // For a first result set packet (a, b), a new RsState is built and
    // returned; the preceding parts must then be a matching
    // ResultSetMetadata, a ResultSetId, and a StatementContext.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn parse(
        no_of_rows: usize,
        attributes: PartAttributes,
        parts: &mut Parts,
        am_conn_core: &AmConnCore,
        o_a_rsmd: Option<&Arc<ResultSetMetadata>>,
        o_rs: &mut Option<&mut RsState>,
        ctx: FieldTypeContext,
        rdr: &mut dyn std::io::Read,
    ) -> HdbResult<Option<(Self, Arc<ResultSetMetadata>)>> {
        match o_rs {
            None => {
                // case a) or b)
                let o_stmt_ctx = match parts.pop_if_kind(PartKind::StatementContext) {
                    Some(Part::StatementContext(stmt_ctx)) => Some(stmt_ctx),
                    None => None,
                    Some(_) => return Err(HdbError::Impl("inconsistent StatementContext")),
                };

                let Some(Part::ResultSetId(rs_id)) = parts.pop() else {
                    return Err(HdbError::Impl("ResultSetId missing"));
                };

                let a_rsmd = match parts.pop_if_kind(PartKind::ResultSetMetadata) {
                    Some(Part::ResultSetMetadata(rsmd)) => Arc::new(rsmd),
                    None => match o_a_rsmd {
                        Some(a_rsmd) => Arc::clone(a_rsmd),
                        None => return Err(HdbError::Impl("no metadata provided for ResultSet")),
                    },
                    Some(_) => {
                        return Err(HdbError::Impl(
                            "inconsistent metadata part found for ResultSet",
                        ));
                    }
                };

                let mut rs_state = Self::new(o_stmt_ctx, am_conn_core, attributes, rs_id);
                rs_state.parse_rows(no_of_rows, &a_rsmd, am_conn_core, ctx, rdr)?;
                Ok(Some((rs_state, a_rsmd)))
            }

            Some(fetching_state) => {
                // case c)
                match parts.pop_if_kind(PartKind::StatementContext) {
                    Some(Part::StatementContext(stmt_ctx)) => {
                        fetching_state.update_server_usage(&stmt_ctx);
                    }
                    None => {}
                    Some(_) => {
                        return Err(HdbError::Impl(
                            "inconsistent StatementContext part found for ResultSet",
                        ));
                    }
                }

                fetching_state.set_attributes(attributes).ok();

                let a_rsmd = if let Some(a_rsmd) = o_a_rsmd {
                    Arc::clone(a_rsmd)
                } else {
                    return Err(HdbError::Impl("RsState provided without metadata"));
                };
                fetching_state.parse_rows(no_of_rows, &a_rsmd, am_conn_core, ctx, rdr)?;
                Ok(None)
            }
        }
    }

    fn parse_rows(
        &mut self,
        no_of_rows: usize,
        metadata: &Arc<ResultSetMetadata>,
        am_conn_core: &AmConnCore,
        ctx: FieldTypeContext,
        rdr: &mut dyn std::io::Read,
    ) -> HdbResult<()> {
        self.next_rows.reserve(no_of_rows);
        debug!(
            "parse_rows(): {} rows, {} columns",
            no_of_rows,
            metadata.len()
        );

        if self.o_am_rscore.is_some() {
            let o_am_rscore = self.o_am_rscore.clone();
            for i in 0..no_of_rows {
                let row = Row::parse(Arc::clone(metadata), &o_am_rscore, am_conn_core, ctx, rdr)?;
                trace!("parse_rows(): row #{i}: {row}");
                self.next_rows.push(row);
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for RsState {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        for row in self.row_iter.as_slice() {
            writeln!(fmt, "{}\n", &row)?;
        }
        for row in &self.next_rows {
            writeln!(fmt, "{}\n", &row)?;
        }
        Ok(())
    }
}
