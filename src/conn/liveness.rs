use std::net::TcpStream;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

// The shared liveness state of a connection: the broken flag, and a clone of
// the raw socket through which an in-flight operation can be interrupted.
//
// The flag is checked before every roundtrip and set after every transport
// or protocol failure; it is deliberately kept outside the connection mutex
// so that cancellation works while an operation holds the lock.
#[derive(Debug, Default)]
pub(crate) struct Liveness {
    broken: AtomicBool,
    socket: Mutex<Option<TcpStream>>,
}

impl Liveness {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn is_broken(&self) -> bool {
        self.broken.load(Ordering::Acquire)
    }

    pub(crate) fn set_broken(&self) {
        self.broken.store(true, Ordering::Release);
    }

    // Called at connect (and reconnect) time with a clone of the fresh
    // socket; resets the broken flag.
    pub(crate) fn attach_socket(&self, socket: Option<TcpStream>) {
        *self.socket.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = socket;
        self.broken.store(false, Ordering::Release);
    }

    pub(crate) fn shutdown_socket(&self) {
        if let Some(ref socket) =
            *self.socket.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
        {
            socket.shutdown(std::net::Shutdown::Both).ok();
        }
    }
}

/// A handle with which an in-flight operation of a connection can be
/// cancelled from another thread.
///
/// Cancelling closes the underlying socket: the blocked operation returns
/// with a transport error, and the connection is flagged as broken - every
/// further operation on it fails immediately. The request that was already
/// sent is *not* rolled back server-side; the caller must assume that it may
/// have been executed.
#[derive(Clone, Debug)]
pub struct CancelHandle(Arc<Liveness>);

impl CancelHandle {
    pub(crate) fn new(liveness: Arc<Liveness>) -> Self {
        Self(liveness)
    }

    /// Cancels the connection's in-flight operation and renders the
    /// connection unusable.
    pub fn cancel(&self) {
        warn!("connection gets cancelled");
        self.0.set_broken();
        self.0.shutdown_socket();
    }
}

#[cfg(test)]
mod test {
    use super::Liveness;

    #[test]
    fn test_broken_flag() {
        let liveness = Liveness::new();
        assert!(!liveness.is_broken());
        liveness.set_broken();
        assert!(liveness.is_broken());
        // a fresh socket resurrects the connection state
        liveness.attach_socket(None);
        assert!(!liveness.is_broken());
    }

    #[test]
    fn test_cancel_marks_broken() {
        let liveness = Liveness::new();
        let handle = super::CancelHandle::new(std::sync::Arc::clone(&liveness));
        handle.cancel();
        assert!(liveness.is_broken());
    }
}
