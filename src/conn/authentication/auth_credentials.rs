use crate::conn::ClientIdentity;
use crate::HdbResult;
use secstr::SecUtf8;
use std::sync::{Mutex, RwLock};

pub(crate) type RefreshFn<T> = Box<dyn Fn() -> Option<T> + Send + Sync>;

// The credential store of a connection.
//
// Two locks are involved: the credential fields sit behind a RwLock, the
// refresh callbacks behind a separate Mutex. A refresh acquires the callback
// lock first and releases the field lock while a callback runs, so that a
// callback can itself read the current credentials without deadlocking.
// Lock order is strictly callback lock -> field lock, never the reverse.
//
// The version counter is bumped whenever a credential actually changes;
// the retry logic compares it to avoid tight refresh loops on persistently
// wrong credentials.
pub(crate) struct AuthCredentials {
    state: RwLock<CredentialState>,
    refreshers: Mutex<Refreshers>,
}

#[derive(Default)]
struct CredentialState {
    password: Option<SecUtf8>,
    token: Option<SecUtf8>,
    saml_assertion: Option<SecUtf8>,
    client_identity: Option<ClientIdentity>,
    session_cookie: Option<SessionCookie>,
    version: u64,
}

// The opaque bytes issued by the server after a successful JWT or SAML
// authentication, plus the logon name that must accompany them on replay.
#[derive(Clone)]
pub(crate) struct SessionCookie {
    pub cookie: Vec<u8>,
    pub logon_name: String,
}

#[derive(Default)]
struct Refreshers {
    password: Option<RefreshFn<SecUtf8>>,
    token: Option<RefreshFn<SecUtf8>>,
    client_identity: Option<RefreshFn<ClientIdentity>>,
}

impl AuthCredentials {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        password: Option<SecUtf8>,
        token: Option<SecUtf8>,
        saml_assertion: Option<SecUtf8>,
        client_identity: Option<ClientIdentity>,
        password_refresher: Option<RefreshFn<SecUtf8>>,
        token_refresher: Option<RefreshFn<SecUtf8>>,
        client_identity_refresher: Option<RefreshFn<ClientIdentity>>,
    ) -> Self {
        Self {
            state: RwLock::new(CredentialState {
                password,
                token,
                saml_assertion,
                client_identity,
                session_cookie: None,
                version: 0,
            }),
            refreshers: Mutex::new(Refreshers {
                password: password_refresher,
                token: token_refresher,
                client_identity: client_identity_refresher,
            }),
        }
    }

    pub(crate) fn password(&self) -> Option<SecUtf8> {
        self.state.read().unwrap_or_else(std::sync::PoisonError::into_inner).password.clone()
    }
    pub(crate) fn token(&self) -> Option<SecUtf8> {
        self.state.read().unwrap_or_else(std::sync::PoisonError::into_inner).token.clone()
    }
    pub(crate) fn saml_assertion(&self) -> Option<SecUtf8> {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .saml_assertion
            .clone()
    }
    pub(crate) fn client_identity(&self) -> Option<ClientIdentity> {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .client_identity
            .clone()
    }
    pub(crate) fn session_cookie(&self) -> Option<SessionCookie> {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .session_cookie
            .clone()
    }

    pub(crate) fn store_session_cookie(&self, cookie: Vec<u8>, logon_name: String) {
        debug!("caching session cookie for {logon_name}");
        self.state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .session_cookie = Some(SessionCookie { cookie, logon_name });
    }

    // Forgets a cached session cookie; returns true if one was present.
    pub(crate) fn clear_session_cookie(&self) -> bool {
        let mut guard = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let had_cookie = guard.session_cookie.is_some();
        guard.session_cookie = None;
        had_cookie
    }

    // Runs the registered refresh callbacks; returns true if any credential
    // actually changed (a callback that hands back the same value does not
    // count, so a subsequent retry is skipped).
    pub(crate) fn refresh(&self) -> HdbResult<bool> {
        // outer lock: the callbacks; the field lock is NOT held while a
        // callback runs
        let refreshers = self
            .refreshers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let version_before = self.version();

        if let Some(ref refresh_password) = refreshers.password {
            let current = self.password();
            if let Some(new_password) = refresh_password() {
                if current.as_ref() != Some(&new_password) {
                    debug!("password was refreshed");
                    let mut state = self
                        .state
                        .write()
                        .unwrap_or_else(std::sync::PoisonError::into_inner);
                    state.password = Some(new_password);
                    state.version += 1;
                }
            }
        }

        if let Some(ref refresh_token) = refreshers.token {
            let current = self.token();
            if let Some(new_token) = refresh_token() {
                if current.as_ref() != Some(&new_token) {
                    debug!("token was refreshed");
                    let mut state = self
                        .state
                        .write()
                        .unwrap_or_else(std::sync::PoisonError::into_inner);
                    state.token = Some(new_token);
                    state.version += 1;
                }
            }
        }

        if let Some(ref refresh_client_identity) = refreshers.client_identity {
            let current = self.client_identity();
            if let Some(new_client_identity) = refresh_client_identity() {
                if current.as_ref() != Some(&new_client_identity) {
                    debug!("client identity was refreshed");
                    let mut state = self
                        .state
                        .write()
                        .unwrap_or_else(std::sync::PoisonError::into_inner);
                    state.client_identity = Some(new_client_identity);
                    state.version += 1;
                }
            }
        }

        Ok(self.version() != version_before)
    }

    pub(crate) fn version(&self) -> u64 {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .version
    }
}

impl std::fmt::Debug for AuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let state = self
            .state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        write!(
            f,
            "AuthCredentials {{password: {}, token: {}, saml_assertion: {}, \
             client_identity: {}, session_cookie: {}, version: {}}}",
            option_set(state.password.is_some()),
            option_set(state.token.is_some()),
            option_set(state.saml_assertion.is_some()),
            option_set(state.client_identity.is_some()),
            option_set(state.session_cookie.is_some()),
            state.version,
        )
    }
}

fn option_set(is_set: bool) -> &'static str {
    if is_set {
        "<set>"
    } else {
        "-"
    }
}

#[cfg(test)]
mod test {
    use super::AuthCredentials;
    use secstr::SecUtf8;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn credentials_with_password_refresher(
        password: &str,
        refreshed: Option<&'static str>,
    ) -> (AuthCredentials, Arc<AtomicU32>) {
        let call_count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&call_count);
        (
            AuthCredentials::new(
                Some(SecUtf8::from(password)),
                None,
                None,
                None,
                Some(Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    refreshed.map(SecUtf8::from)
                })),
                None,
                None,
            ),
            call_count,
        )
    }

    #[test]
    fn test_refresh_with_changed_password() {
        let (credentials, call_count) =
            credentials_with_password_refresher("old", Some("new"));
        assert!(credentials.refresh().unwrap());
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert_eq!(
            credentials.password().unwrap().unsecure(),
            "new"
        );
        assert_eq!(credentials.version(), 1);
    }

    #[test]
    fn test_refresh_with_unchanged_password() {
        let (credentials, _) = credentials_with_password_refresher("same", Some("same"));
        // the callback returns the identical value: no retry is justified
        assert!(!credentials.refresh().unwrap());
        assert_eq!(credentials.version(), 0);
    }

    #[test]
    fn test_session_cookie_lifecycle() {
        let (credentials, _) = credentials_with_password_refresher("pw", None);
        assert!(!credentials.clear_session_cookie());
        credentials.store_session_cookie(vec![1, 2, 3], "USER1".to_string());
        let session_cookie = credentials.session_cookie().unwrap();
        assert_eq!(session_cookie.cookie, vec![1, 2, 3]);
        assert_eq!(session_cookie.logon_name, "USER1");
        assert!(credentials.clear_session_cookie());
        assert!(credentials.session_cookie().is_none());
    }
}
