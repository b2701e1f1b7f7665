use crate::{
    conn::{
        AmConnCore, CancelHandle, ConnectParams, ConnectionConfiguration, ConnectionStatistics,
        CursorHoldability, HdbVersion,
    },
    prepared_statement::PreparedStatement,
    protocol::{
        parts::{DbConnectInfo, ServerError},
        MessageType, Part, Request, ReplyType, ServerUsage,
    },
    result_set::ResultSet,
    usage_err, HdbError, HdbResponse, HdbResult,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

// Gauge of currently open connections of this process.
static OPEN_CONNECTIONS: AtomicU32 = AtomicU32::new(0);

/// A synchronous connection to the database.
///
/// Operations on different connections run in parallel; within one
/// connection, strictly one request/reply pair is in flight at any instant.
/// An operation that fails with
/// [`HdbError::ConnectionBroken`](crate::HdbError::ConnectionBroken) renders
/// the connection unusable; every subsequent operation fails immediately.
#[derive(Debug)]
pub struct Connection {
    am_conn_core: AmConnCore,
}

impl Connection {
    /// Factory method for authenticated connections with default
    /// configuration.
    ///
    /// ```rust,no_run
    /// use hdbclient::{Connection, ConnectParams};
    /// let params = ConnectParams::builder()
    ///     .hostname("the_host")
    ///     .port(2222)
    ///     .dbuser("my_user")
    ///     .password("my_passwd")
    ///     .build()
    ///     .unwrap();
    /// let mut connection = Connection::new(params).unwrap();
    /// ```
    pub fn new(params: ConnectParams) -> HdbResult<Self> {
        Self::with_configuration(params, &ConnectionConfiguration::default())
    }

    /// Factory method for authenticated connections with the given
    /// configuration.
    pub fn with_configuration(
        params: ConnectParams,
        config: &ConnectionConfiguration,
    ) -> HdbResult<Self> {
        let am_conn_core = AmConnCore::try_new(params, config)?;
        OPEN_CONNECTIONS.fetch_add(1, Ordering::Relaxed);
        Ok(Self { am_conn_core })
    }

    /// The number of currently open connections of this process.
    pub fn open_connection_count() -> u32 {
        OPEN_CONNECTIONS.load(Ordering::Relaxed)
    }

    /// Executes a statement on the database.
    ///
    /// This generic method can handle every kind of statement and thus has
    /// the most generic return type; in many cases one of the dedicated
    /// methods [`query`](Connection::query), [`dml`](Connection::dml), and
    /// [`exec`](Connection::exec) is more convenient.
    pub fn statement<S: AsRef<str>>(&mut self, stmt: S) -> HdbResult<HdbResponse> {
        self.execute_direct(stmt.as_ref())
    }

    /// Executes a statement and expects a single result set.
    ///
    /// Should be used for query statements (like "SELECT ...").
    pub fn query<S: AsRef<str>>(&mut self, stmt: S) -> HdbResult<ResultSet> {
        self.statement(stmt)?.into_result_set()
    }

    /// Executes a statement and expects a single number of affected rows.
    ///
    /// Should be used for DML statements (INSERT, UPDATE, DELETE, UPSERT).
    pub fn dml<S: AsRef<str>>(&mut self, stmt: S) -> HdbResult<usize> {
        let vec = self.statement(stmt)?.into_affected_rows()?;
        match vec.len() {
            1 => Ok(vec[0]),
            _ => Err(usage_err!(
                "number of affected-rows-counts is {} instead of 1",
                vec.len()
            )),
        }
    }

    /// Executes a statement and expects a plain success.
    ///
    /// Should be used for DDL and similar statements.
    pub fn exec<S: AsRef<str>>(&mut self, stmt: S) -> HdbResult<()> {
        self.statement(stmt)?.into_success()
    }

    /// Prepares a statement and returns a handle to it.
    ///
    /// The returned `PreparedStatement` keeps using this connection.
    pub fn prepare<S: AsRef<str>>(&mut self, stmt: S) -> HdbResult<PreparedStatement> {
        PreparedStatement::try_new(self.am_conn_core.clone(), stmt.as_ref())
    }

    /// Commits the current transaction.
    pub fn commit(&mut self) -> HdbResult<()> {
        self.end_transaction(MessageType::Commit, ReplyType::Commit)
    }

    /// Rolls back the current transaction.
    pub fn rollback(&mut self) -> HdbResult<()> {
        self.end_transaction(MessageType::Rollback, ReplyType::Rollback)
    }

    // The reply carries no payload beyond the transaction flags, which must
    // be digested so that the in-transaction state is released in any case.
    fn end_transaction(
        &mut self,
        message_type: MessageType,
        expected_reply_type: ReplyType,
    ) -> HdbResult<()> {
        let request = Request::new(
            message_type,
            self.am_conn_core.lock()?.configuration().command_options(),
        );
        let reply = self.am_conn_core.send(request)?;
        reply.assert_expected_reply_type(expected_reply_type)?;
        reply
            .parts
            .into_internal_return_values(&self.am_conn_core, None)?;
        Ok(())
    }

    /// True if the connection is inside a transaction.
    pub fn is_in_transaction(&self) -> HdbResult<bool> {
        Ok(self.am_conn_core.lock()?.in_transaction())
    }

    /// Creates a new connection with the same settings and authentication.
    pub fn spawn(&self) -> HdbResult<Self> {
        let (params, config) = {
            let guard = self.am_conn_core.lock()?;
            (guard.connect_params().clone(), guard.configuration().clone())
        };
        Self::with_configuration(params, &config)
    }

    /// Utility method to fire a couple of statements, ignoring errors and
    /// return values.
    pub fn multiple_statements_ignore_err<S: AsRef<str>>(&mut self, stmts: Vec<S>) {
        for s in stmts {
            trace!("multiple_statements_ignore_err: firing \"{}\"", s.as_ref());
            match self.statement(s) {
                Ok(_) => {}
                Err(e) => debug!("error intentionally ignored: {e:?}"),
            }
        }
    }

    /// Utility method to fire a couple of statements, ignoring their return
    /// values; returns with the first error, or with `()`.
    pub fn multiple_statements<S: AsRef<str>>(&mut self, stmts: Vec<S>) -> HdbResult<()> {
        for s in stmts {
            self.statement(s)?;
        }
        Ok(())
    }

    /// Returns the warnings that the server sent since the last call to this
    /// method.
    ///
    /// Replies whose error vector contains only warnings count as success;
    /// the warnings are logged and retained here.
    pub fn pop_warnings(&mut self) -> HdbResult<Option<Vec<ServerError>>> {
        Ok(self.am_conn_core.lock()?.pop_warnings())
    }

    /// Sets the connection's auto-commit behavior.
    pub fn set_auto_commit(&mut self, ac: bool) -> HdbResult<()> {
        self.am_conn_core
            .lock()?
            .configuration_mut()
            .set_auto_commit(ac);
        Ok(())
    }
    /// Returns the connection's auto-commit behavior.
    pub fn is_auto_commit(&self) -> HdbResult<bool> {
        Ok(self.am_conn_core.lock()?.configuration().is_auto_commit())
    }

    /// Sets the connection's cursor holdability.
    pub fn set_cursor_holdability(&mut self, holdability: CursorHoldability) -> HdbResult<()> {
        self.am_conn_core
            .lock()?
            .configuration_mut()
            .set_cursor_holdability(holdability);
        Ok(())
    }
    /// Returns the connection's cursor holdability.
    pub fn cursor_holdability(&self) -> HdbResult<CursorHoldability> {
        Ok(self.am_conn_core.lock()?.configuration().cursor_holdability())
    }

    /// Returns the connection's fetch size.
    pub fn fetch_size(&self) -> HdbResult<u32> {
        Ok(self.am_conn_core.lock()?.configuration().fetch_size())
    }
    /// Sets the connection's fetch size.
    pub fn set_fetch_size(&mut self, fetch_size: u32) -> HdbResult<()> {
        self.am_conn_core
            .lock()?
            .configuration_mut()
            .set_fetch_size(fetch_size);
        Ok(())
    }

    /// Returns the connection's bulk size.
    pub fn bulk_size(&self) -> HdbResult<usize> {
        Ok(self.am_conn_core.lock()?.configuration().bulk_size())
    }
    /// Sets the connection's bulk size.
    pub fn set_bulk_size(&mut self, bulk_size: usize) -> HdbResult<()> {
        self.am_conn_core
            .lock()?
            .configuration_mut()
            .set_bulk_size(bulk_size);
        Ok(())
    }

    /// Returns the connection's LOB chunk size.
    pub fn lob_chunk_size(&self) -> HdbResult<u32> {
        Ok(self.am_conn_core.lock()?.configuration().lob_chunk_size())
    }
    /// Sets the connection's LOB chunk size.
    pub fn set_lob_chunk_size(&mut self, lob_chunk_size: u32) -> HdbResult<()> {
        self.am_conn_core
            .lock()?
            .configuration_mut()
            .set_lob_chunk_size(lob_chunk_size);
        Ok(())
    }

    /// Returns the connection's socket read/write timeout.
    pub fn timeout(&self) -> HdbResult<Option<Duration>> {
        Ok(self.am_conn_core.lock()?.configuration().timeout())
    }
    /// Sets the connection's socket read/write timeout.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> HdbResult<()> {
        let mut guard = self.am_conn_core.lock()?;
        guard.configuration_mut().set_timeout(timeout);
        let timeout = guard.configuration().timeout();
        guard.set_read_timeout(timeout)?;
        Ok(())
    }

    /// Returns a handle with which the connection's in-flight operation can
    /// be cancelled from another thread.
    ///
    /// Cancelling closes the underlying socket and renders the connection
    /// unusable; the already-sent request is *not* rolled back server-side.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.am_conn_core.cancel_handle()
    }

    /// True if the connection must be discarded: a transport or protocol
    /// failure occurred, or the connection was cancelled.
    pub fn is_broken(&self) -> bool {
        self.am_conn_core.is_broken()
    }

    /// Verifies the connection with a probe query.
    ///
    /// Any failure flips the connection to broken, so that a pool discards
    /// it.
    pub fn ping(&mut self) -> HdbResult<()> {
        self.query("SELECT 1 FROM DUMMY").map(|_| ()).map_err(|e| {
            warn!("ping failed: {e}");
            e
        })
    }

    /// Prepares the connection for being handed back to a connection pool.
    ///
    /// Pops the retained warnings, and probes the connection with a cheap
    /// query if the configured ping interval has elapsed since the last
    /// read. Returns an error exactly if the connection must be discarded.
    pub fn reset_session(&mut self) -> HdbResult<()> {
        if self.is_broken() {
            return Err(HdbError::ConnectionBroken { source: None });
        }
        let o_due = {
            let guard = self.am_conn_core.lock()?;
            guard
                .configuration()
                .ping_interval()
                .map(|interval| guard.elapsed_since_last_read() >= interval)
        };
        self.am_conn_core.lock()?.pop_warnings();
        if o_due == Some(true) {
            self.ping()?;
        }
        Ok(())
    }

    /// Asks the server where the given database is reachable, and whether
    /// this connection already points to it.
    pub fn db_connect_info(&mut self, dbname: &str) -> HdbResult<DbConnectInfo> {
        let mut request = Request::new(
            MessageType::DbConnectInfo,
            crate::conn::CommandOptions::EMPTY,
        );
        request.push(Part::DbConnectInfo(DbConnectInfo::new(
            dbname.to_string(),
            String::new(),
        )));
        let reply = self.am_conn_core.send(request)?;
        reply.assert_expected_reply_type(ReplyType::Nil)?;
        match reply.parts.into_iter().next() {
            Some(Part::DbConnectInfo(db_connect_info)) => Ok(db_connect_info),
            o_part => Err(crate::impl_err!(
                "no DbConnectInfo received, got {o_part:?}"
            )),
        }
    }

    /// The version of the connected HANA server.
    pub fn hdb_version(&self) -> HdbResult<HdbVersion> {
        Ok(HdbVersion::parse(
            self.am_conn_core
                .lock()?
                .connect_options()
                .full_version_string(),
        ))
    }

    /// The full version string of the connected HANA server.
    pub fn full_version_string(&self) -> HdbResult<String> {
        Ok(self
            .am_conn_core
            .lock()?
            .connect_options()
            .full_version_string()
            .to_string())
    }

    /// The name of the connected database.
    pub fn database_name(&self) -> HdbResult<String> {
        Ok(self
            .am_conn_core
            .lock()?
            .connect_options()
            .database_name()
            .to_string())
    }

    /// The SAPSYSTEMNAME of the connected instance.
    pub fn system_id(&self) -> HdbResult<String> {
        Ok(self
            .am_conn_core
            .lock()?
            .connect_options()
            .system_id()
            .to_string())
    }

    /// The connection id that the server assigned to this connection.
    pub fn connection_id(&self) -> HdbResult<u32> {
        Ok(self.am_conn_core.lock()?.connect_options().connection_id())
    }

    /// The negotiated data format version.
    pub fn data_format_version(&self) -> HdbResult<u8> {
        Ok(self
            .am_conn_core
            .lock()?
            .connect_options()
            .dataformat_version())
    }

    /// A descriptor of the peer ("user@host:port").
    pub fn connect_string(&self) -> HdbResult<String> {
        Ok(self.am_conn_core.lock()?.connect_string())
    }

    /// Statistics of this connection (roundtrips, wait time, bytes).
    pub fn statistics(&self) -> HdbResult<ConnectionStatistics> {
        Ok(self.am_conn_core.lock()?.statistics())
    }

    /// Resets the statistics of this connection.
    pub fn reset_statistics(&mut self) -> HdbResult<()> {
        self.am_conn_core.lock()?.reset_statistics();
        Ok(())
    }

    /// Information about the server-side resource consumption of this
    /// connection.
    pub fn server_usage(&self) -> HdbResult<ServerUsage> {
        Ok(self.am_conn_core.lock()?.server_usage())
    }

    /// Sets client information into a session variable on the server that
    /// is evaluated by the monitoring views.
    pub fn set_application<S: AsRef<str>>(&mut self, application: S) -> HdbResult<()> {
        self.am_conn_core.lock()?.set_application(application);
        Ok(())
    }

    /// Sets client information into a session variable on the server.
    pub fn set_application_version(&mut self, version: &str) -> HdbResult<()> {
        self.am_conn_core.lock()?.set_application_version(version);
        Ok(())
    }

    /// Sets client information into a session variable on the server.
    pub fn set_application_source(&mut self, source: &str) -> HdbResult<()> {
        self.am_conn_core.lock()?.set_application_source(source);
        Ok(())
    }

    /// Sets client information into a session variable on the server.
    pub fn set_application_user(&mut self, application_user: &str) -> HdbResult<()> {
        self.am_conn_core.lock()?.set_application_user(application_user);
        Ok(())
    }

    /// Returns the client info that is sent to the server.
    pub fn dump_client_info(&self) -> HdbResult<String> {
        Ok(self.am_conn_core.lock()?.dump_client_info())
    }

    /// Closes the connection.
    ///
    /// On a non-broken connection a `DISCONNECT` is sent on a best-effort
    /// basis (its reply is not read); the socket is closed unconditionally.
    /// Dropping the connection has the same effect.
    pub fn close(self) -> HdbResult<()> {
        drop(self);
        Ok(())
    }

    fn execute_direct(&mut self, stmt: &str) -> HdbResult<HdbResponse> {
        debug!("connection.execute_direct(\"{stmt}\")");
        let command_options = self.am_conn_core.lock()?.configuration().command_options();
        let mut request = Request::new(MessageType::ExecuteDirect, command_options);
        request.push(Part::Command(stmt));

        let reply = self.am_conn_core.send(request)?;
        let replytype = reply.replytype;
        let internal_return_values = reply
            .parts
            .into_internal_return_values(&self.am_conn_core, None)?;
        HdbResponse::try_new(internal_return_values, replytype)
    }
}

impl Drop for Connection {
    // The disconnect and the socket close happen when the last user of the
    // shared core (open result sets included) goes away.
    fn drop(&mut self) {
        OPEN_CONNECTIONS.fetch_sub(1, Ordering::Relaxed);
    }
}
