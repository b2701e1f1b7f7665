use crate::{
    base::{RsState, AM},
    conn::{liveness::Liveness, CancelHandle, ConnectParams, ConnectionConfiguration, ConnectionCore},
    protocol::{
        parts::{ParameterDescriptors, ResultSetMetadata},
        Reply, Request,
    },
    HdbError, HdbResult, Severity,
};
use std::sync::{Arc, Mutex};
use std::time::Instant;

// The shared handle to a connection.
//
// The mutex around the core enforces the single-in-flight discipline: one
// request/reply pair per connection at any instant, and a fetch of a result
// set can never interleave with another statement. The liveness state lives
// outside the mutex, so the broken flag can be checked and set, and the
// socket can be shut down, while an operation is in flight.
#[derive(Clone, Debug)]
pub(crate) struct AmConnCore {
    am_conn_core: AM<ConnectionCore>,
    liveness: Arc<Liveness>,
}

impl AmConnCore {
    pub(crate) fn try_new(
        conn_params: ConnectParams,
        config: &ConnectionConfiguration,
    ) -> HdbResult<Self> {
        trace!("trying to connect to {conn_params}");
        let start = Instant::now();
        let conn_core = ConnectionCore::try_new(conn_params, config)?;
        debug!(
            "user \"{}\" successfully logged on ({} µs) to {:?} of {:?} (HANA version: {:?})",
            conn_core.connect_params().dbuser(),
            Instant::now().duration_since(start).as_micros(),
            conn_core.connect_options().database_name(),
            conn_core.connect_options().system_id(),
            conn_core.connect_options().full_version_string()
        );
        let liveness = Arc::clone(conn_core.liveness());
        Ok(Self {
            am_conn_core: Arc::new(Mutex::new(conn_core)),
            liveness,
        })
    }

    pub(crate) fn lock(&self) -> HdbResult<std::sync::MutexGuard<'_, ConnectionCore>> {
        Ok(self.am_conn_core.lock()?)
    }

    pub(crate) fn is_broken(&self) -> bool {
        self.liveness.is_broken()
    }

    pub(crate) fn cancel_handle(&self) -> CancelHandle {
        CancelHandle::new(Arc::clone(&self.liveness))
    }

    pub(crate) fn send(&self, request: Request) -> HdbResult<Reply> {
        self.full_send(request, None, None, &mut None)
    }

    // Used from Drop implementations: never blocks on the connection mutex
    // (the dropping thread may already hold it), and swallows contention.
    pub(crate) fn best_effort_send(&self, request: Request) -> HdbResult<Reply> {
        if self.liveness.is_broken() {
            return Err(HdbError::ConnectionBroken { source: None });
        }
        match self.am_conn_core.try_lock() {
            Ok(mut conn_core) => {
                let mut request = request;
                conn_core.augment_request(&mut request);
                conn_core.roundtrip(&request, Some(self), None, None, &mut None)
            }
            Err(_) => {
                debug!("best_effort_send: connection is busy, giving up");
                Err(HdbError::Poison)
            }
        }
    }

    pub(crate) fn full_send(
        &self,
        mut request: Request,
        o_a_rsmd: Option<&Arc<ResultSetMetadata>>,
        o_a_descriptors: Option<&Arc<ParameterDescriptors>>,
        o_rs: &mut Option<&mut RsState>,
    ) -> HdbResult<Reply> {
        trace!(
            "AmConnCore::full_send() with request type = {:?}",
            request.message_type()
        );
        if self.liveness.is_broken() {
            return Err(HdbError::ConnectionBroken { source: None });
        }

        let mut conn_core = self.lock()?;
        conn_core.augment_request(&mut request);

        let reply = conn_core.roundtrip(&request, Some(self), o_a_rsmd, o_a_descriptors, o_rs);
        match reply {
            Ok(reply) => Ok(reply),

            Err(HdbError::Io { source })
                if std::io::ErrorKind::ConnectionReset == source.kind()
                    && request.message_type().is_repeatable() =>
            {
                debug!("full_send(): reconnecting after connection reset ...");
                conn_core.reconnect()?;
                debug!("full_send(): repeating the request after the reconnect ...");
                conn_core
                    .roundtrip(&request, Some(self), o_a_rsmd, o_a_descriptors, o_rs)
                    .map_err(|e| self.evaluate_error(e))
            }

            Err(e) => Err(self.evaluate_error(e)),
        }
    }

    // Transport and protocol-consistency failures (and fatal server errors)
    // render the connection unusable; well-formed server errors and usage
    // errors do not.
    fn evaluate_error(&self, e: HdbError) -> HdbError {
        let broken = match &e {
            HdbError::DbError { source } => matches!(source.severity(), Severity::Fatal),
            HdbError::SessionClosingTransactionError => true,
            HdbError::ExecutionResults(_)
            | HdbError::Usage(_)
            | HdbError::UsageDetailed(_)
            | HdbError::Authentication { .. } => false,
            _ => true,
        };
        if broken {
            self.liveness.set_broken();
            e.break_connection()
        } else {
            e
        }
    }
}
