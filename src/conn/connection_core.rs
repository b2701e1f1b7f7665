use crate::{
    conn::{
        authentication::{self, AuthenticationResult},
        initial_request,
        liveness::Liveness,
        tcp_client::IoMonitor,
        AmConnCore, ConnectParams, ConnectionConfiguration, ConnectionStatistics, TcpClient,
    },
    base::RsState,
    protocol::{
        parts::{
            ClientInfo, ConnectOptions, DbConnectInfo, ParameterDescriptors, ResultSetMetadata,
            ServerError, StatementContext, Topology, TransactionFlags,
        },
        FieldTypeContext, MessageType, Part, Reply, ReplyType, Request, ServerUsage,
    },
    HdbResult,
};
use std::sync::Arc;
use std::time::Instant;

// The per-connection state: socket, session identity, negotiated options,
// sequence counters, and the digested session context. All of it is owned
// exclusively; shared access goes through `AmConnCore`.
#[derive(Debug)]
pub(crate) struct ConnectionCore {
    authenticated: bool,
    session_id: i64,
    seq_number: i32,
    client_info: ClientInfo,
    client_info_touched: bool,
    configuration: ConnectionConfiguration,
    statistics: ConnectionStatistics,
    server_usage: ServerUsage,
    session_state: super::SessionState,
    statement_sequence: Option<i64>, // statement sequence within the transaction
    connect_options: ConnectOptions,
    o_topology: Option<Topology>,
    pub(crate) warnings: Vec<ServerError>,
    liveness: Arc<Liveness>,
    io_monitor: Arc<IoMonitor>,
    tcp_client: TcpClient,
}

impl ConnectionCore {
    pub(crate) fn try_new(
        params: ConnectParams,
        config: &ConnectionConfiguration,
    ) -> HdbResult<Self> {
        let o_dbname = params.dbname().map(ToString::to_string);
        let network_group = params.network_group().unwrap_or_default().to_string();
        let mut conn_core = Self::try_new_initialized(params, config)?;

        if let Some(dbname) = o_dbname {
            // a dbname is specified, so we ask explicitly for a redirect
            trace!("redirect to {dbname} initiated by client");
            let mut request = Request::new(
                MessageType::DbConnectInfo,
                crate::conn::CommandOptions::EMPTY,
            );
            request.push(Part::DbConnectInfo(DbConnectInfo::new(
                dbname,
                network_group,
            )));
            let reply = conn_core.roundtrip(&request, None, None, None, &mut None)?;
            reply.assert_expected_reply_type(ReplyType::Nil)?;

            match reply.parts.into_iter().next() {
                Some(Part::DbConnectInfo(db_connect_info)) => {
                    trace!("received DbConnectInfo");
                    if db_connect_info.on_correct_database()? {
                        trace!("already connected to the right database");
                    } else {
                        let redirect_params = conn_core
                            .connect_params()
                            .redirect(db_connect_info.host()?, db_connect_info.port()?);
                        debug!("redirected (1) to {redirect_params}");
                        conn_core = Self::try_new_initialized(redirect_params, config)?;
                    }
                }
                o_part => {
                    warn!("did not find a DbConnectInfo; got {o_part:?}");
                }
            }
        }

        // authenticate; handle implicit redirects from HANA, the fallback
        // from a rejected session cookie, and a single credential-refresh
        // retry
        let credentials = Arc::clone(conn_core.connect_params().credentials());
        let mut refresh_attempted = false;
        loop {
            match authentication::authenticate(&mut conn_core, false) {
                Ok(AuthenticationResult::Ok) => break,
                Ok(AuthenticationResult::Redirect(db_connect_info)) => {
                    trace!("redirect initiated by HANA");
                    let redirect_params = conn_core
                        .connect_params()
                        .redirect(db_connect_info.host()?, db_connect_info.port()?);
                    debug!("redirected (2) to {redirect_params}");
                    conn_core = Self::try_new_initialized(redirect_params, config)?;
                }
                Err(e) if e.is_authentication_failure() => {
                    if credentials.clear_session_cookie() {
                        debug!("session cookie was rejected, retrying with regular credentials");
                    } else if !refresh_attempted && credentials.refresh()? {
                        debug!("credentials were refreshed, retrying once");
                        refresh_attempted = true;
                    } else {
                        return Err(e);
                    }
                    let params = conn_core.connect_params().clone();
                    conn_core = Self::try_new_initialized(params, config)?;
                }
                Err(e) => return Err(e),
            }
        }

        conn_core.apply_post_connect_settings()?;
        Ok(conn_core)
    }

    fn try_new_initialized(
        params: ConnectParams,
        config: &ConnectionConfiguration,
    ) -> HdbResult<Self> {
        let connect_options = ConnectOptions::new(
            params.clientlocale(),
            &get_os_user(),
            config.data_format_version(),
        );
        let io_monitor = Arc::new(IoMonitor::default());
        let mut tcp_client = TcpClient::try_new(params, config, Arc::clone(&io_monitor))?;
        let liveness = Liveness::new();
        liveness.attach_socket(tcp_client.try_clone_socket().ok());
        initial_request::send_and_receive(&mut tcp_client)?;
        Ok(Self {
            authenticated: false,
            session_id: 0,
            seq_number: 0,
            client_info: ClientInfo::default(),
            client_info_touched: true,
            configuration: config.clone(),
            statistics: ConnectionStatistics::new(),
            server_usage: ServerUsage::default(),
            session_state: super::SessionState::default(),
            statement_sequence: None,
            connect_options,
            o_topology: None,
            warnings: Vec::<ServerError>::new(),
            liveness,
            io_monitor,
            tcp_client,
        })
    }

    // Session variables and the application name ride in the client-info
    // part of the next request; the default schema is activated with an
    // explicit statement.
    fn apply_post_connect_settings(&mut self) -> HdbResult<()> {
        let o_application = self.connect_params().application().map(ToString::to_string);
        if let Some(application) = o_application {
            self.client_info.set_application(application);
        }
        let session_variables = self.connect_params().session_variables().to_vec();
        for (key, value) in session_variables {
            self.client_info.set_session_variable(&key, &value);
        }
        self.client_info_touched = true;

        if let Some(schema) = self.connect_params().schema().map(ToString::to_string) {
            let stmt = format!("SET SCHEMA \"{schema}\"");
            let command_options = self.configuration.command_options();
            let mut request = Request::new(MessageType::ExecuteDirect, command_options);
            request.push(Part::Command(&stmt));
            self.roundtrip(&request, None, None, None, &mut None)?;
            debug!("default schema {schema} is set");
        }
        Ok(())
    }

    pub(crate) fn reconnect(&mut self) -> HdbResult<()> {
        debug!("trying to reconnect");
        let mut conn_params = self.tcp_client.connect_params().clone();
        loop {
            let mut tcp_client =
                TcpClient::try_new(conn_params.clone(), &self.configuration, Arc::clone(&self.io_monitor))?;
            self.liveness.attach_socket(tcp_client.try_clone_socket().ok());
            initial_request::send_and_receive(&mut tcp_client)?;
            self.tcp_client = tcp_client;
            self.authenticated = false;
            self.session_id = 0;

            debug!("reconnected, not yet authenticated");
            match authentication::authenticate(self, true)? {
                AuthenticationResult::Ok => {
                    debug!("re-authenticated");
                    return Ok(());
                }
                AuthenticationResult::Redirect(db_connect_info) => {
                    debug!("redirected");
                    conn_params = self
                        .tcp_client
                        .connect_params()
                        .redirect(db_connect_info.host()?, db_connect_info.port()?);
                }
            }
        }
    }

    pub(crate) fn connect_params(&self) -> &ConnectParams {
        self.tcp_client.connect_params()
    }

    pub(crate) fn connect_string(&self) -> String {
        format!("{}", self.connect_params())
    }

    pub(crate) fn liveness(&self) -> &Arc<Liveness> {
        &self.liveness
    }

    pub(crate) fn configuration(&self) -> &ConnectionConfiguration {
        &self.configuration
    }
    pub(crate) fn configuration_mut(&mut self) -> &mut ConnectionConfiguration {
        &mut self.configuration
    }

    pub(crate) fn set_read_timeout(
        &mut self,
        o_duration: Option<std::time::Duration>,
    ) -> std::io::Result<()> {
        self.tcp_client.set_read_timeout(o_duration)
    }

    // Statistics snapshot with the transfer counters of the monitor.
    pub(crate) fn statistics(&mut self) -> ConnectionStatistics {
        self.statistics
            .set_transfer_bytes(self.io_monitor.bytes_read(), self.io_monitor.bytes_written());
        self.statistics.clone()
    }
    pub(crate) fn reset_statistics(&mut self) {
        self.statistics.reset();
    }

    pub(crate) fn elapsed_since_last_read(&self) -> std::time::Duration {
        self.io_monitor.elapsed_since_last_read()
    }

    pub(crate) fn set_application<S: AsRef<str>>(&mut self, application: S) {
        self.client_info.set_application(application);
        self.client_info_touched = true;
    }

    pub(crate) fn set_application_version(&mut self, version: &str) {
        self.client_info.set_application_version(version);
        self.client_info_touched = true;
    }

    pub(crate) fn set_application_source(&mut self, source: &str) {
        self.client_info.set_application_source(source);
        self.client_info_touched = true;
    }

    pub(crate) fn set_application_user(&mut self, application_user: &str) {
        self.client_info.set_application_user(application_user);
        self.client_info_touched = true;
    }

    fn is_client_info_touched(&self) -> bool {
        self.client_info_touched
    }
    fn get_client_info_for_sending(&mut self) -> ClientInfo {
        debug!("cloning client info for sending");
        self.client_info_touched = false;
        self.client_info.clone()
    }

    pub(crate) fn evaluate_statement_context(&mut self, stmt_ctx: &StatementContext) {
        trace!(
            "received StatementContext with sequence_info = {:?}",
            stmt_ctx.statement_sequence_info()
        );
        self.set_statement_sequence(stmt_ctx.statement_sequence_info());
        self.server_usage.update(
            stmt_ctx.server_processing_time(),
            stmt_ctx.server_cpu_time(),
            stmt_ctx.server_memory_usage(),
        );
    }

    pub(crate) fn server_usage(&self) -> ServerUsage {
        self.server_usage
    }

    pub(crate) fn set_session_id(&mut self, session_id: i64) {
        if session_id != self.session_id {
            debug!(
                "ConnectionCore: setting session_id from {} to {session_id}",
                self.session_id
            );
            self.session_id = session_id;
        }
    }

    pub(crate) fn set_topology(&mut self, topology: Topology) {
        self.o_topology = Some(topology);
    }

    pub(crate) fn dump_client_info(&self) -> String {
        self.client_info.to_string()
    }

    pub(crate) fn set_authenticated(&mut self) {
        self.authenticated = true;
    }

    fn statement_sequence(&self) -> &Option<i64> {
        &self.statement_sequence
    }

    fn set_statement_sequence(&mut self, statement_sequence: Option<i64>) {
        self.statement_sequence = statement_sequence;
    }

    pub(crate) fn session_id(&self) -> i64 {
        self.session_id
    }

    pub(crate) fn in_transaction(&self) -> bool {
        self.session_state.in_transaction()
    }

    fn next_seq_number(&mut self) -> i32 {
        self.seq_number += 1;
        self.seq_number
    }

    pub(crate) fn evaluate_ta_flags(&mut self, ta_flags: &TransactionFlags) -> HdbResult<()> {
        self.session_state.update(ta_flags);
        if self.session_state.dead {
            Err(crate::HdbError::SessionClosingTransactionError)
        } else {
            Ok(())
        }
    }

    pub(crate) fn pop_warnings(&mut self) -> Option<Vec<ServerError>> {
        if self.warnings.is_empty() {
            None
        } else {
            let mut warnings = Vec::<ServerError>::new();
            std::mem::swap(&mut warnings, &mut self.warnings);
            Some(warnings)
        }
    }

    pub(crate) fn connect_options(&self) -> &ConnectOptions {
        &self.connect_options
    }

    pub(crate) fn connect_options_mut(&mut self) -> &mut ConnectOptions {
        &mut self.connect_options
    }

    // The tuple that parameterizes every field codec invocation.
    pub(crate) fn field_type_context(&self) -> FieldTypeContext {
        FieldTypeContext {
            dataformat_version: self.connect_options.dataformat_version(),
            emptydate_as_null: self.configuration.is_emptydate_as_null(),
            cesu8_policy: self.configuration.cesu8_decode_policy(),
        }
    }

    pub(crate) fn augment_request(&mut self, request: &mut Request) {
        if self.authenticated {
            if let Some(ssi_value) = *self.statement_sequence() {
                request.add_statement_context(ssi_value);
            }
            if self.is_client_info_touched() {
                request.push(Part::ClientInfo(self.get_client_info_for_sending()));
            }
        }
    }

    pub(crate) fn roundtrip(
        &mut self,
        request: &Request,
        o_am_conn_core: Option<&AmConnCore>,
        o_a_rsmd: Option<&Arc<ResultSetMetadata>>,
        o_a_descriptors: Option<&Arc<ParameterDescriptors>>,
        o_rs: &mut Option<&mut RsState>,
    ) -> HdbResult<Reply> {
        let (session_id, nsn, default_error_handling) =
            if let MessageType::Authenticate = request.message_type() {
                (0, 1, false)
            } else {
                (self.session_id(), self.next_seq_number(), true)
            };
        let auto_commit = self.configuration.is_auto_commit();
        let ctx = self.field_type_context();

        let start = Instant::now();
        request.emit(
            session_id,
            nsn,
            auto_commit,
            o_a_descriptors,
            ctx,
            self.tcp_client.writer(),
        )?;

        let mut reply = Reply::parse(
            o_a_rsmd,
            o_a_descriptors,
            o_rs,
            o_am_conn_core,
            ctx,
            self.tcp_client.reader(),
        )?;
        self.statistics.add_wait_time(start.elapsed());

        if default_error_handling {
            reply.handle_db_error(self)?;
        }
        Ok(reply)
    }
}

impl Drop for ConnectionCore {
    // Try to send a disconnect to the database, ignore all errors.
    // The reply is intentionally not read.
    fn drop(&mut self) {
        debug!("Drop of ConnectionCore, session_id = {}", self.session_id);
        if self.authenticated && !self.liveness.is_broken() {
            let request = Request::new_for_disconnect();
            let session_id = self.session_id();
            let nsn = self.next_seq_number();
            request
                .emit(
                    session_id,
                    nsn,
                    false,
                    None,
                    self.field_type_context(),
                    self.tcp_client.writer(),
                )
                .map_err(|e| {
                    warn!("disconnect request failed with {e:?}");
                    e
                })
                .ok();
        }
    }
}

fn get_os_user() -> String {
    let os_user = username::get_user_name().unwrap_or_default();
    trace!("OS user: {os_user}");
    os_user
}
