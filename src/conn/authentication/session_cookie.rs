use crate::{conn::authentication::Authenticator, HdbResult};

// Fast path on reconnect: replays the cookie that a preceding JWT or SAML
// authentication earned, together with the logon name from that
// authentication. The proof of the second round is empty.
//
// On failure the caller invalidates the cookie and falls back to a normal
// authentication round.
#[derive(Debug)]
pub(crate) struct SessionCookieAuthenticator {
    cookie: Vec<u8>,
}
impl SessionCookieAuthenticator {
    pub fn boxed(cookie: Vec<u8>) -> Box<dyn Authenticator + Send + Sync> {
        Box::new(Self { cookie })
    }
}
impl Authenticator for SessionCookieAuthenticator {
    fn name(&self) -> &'static str {
        "SessionCookie"
    }

    fn initial_data(&self) -> Vec<u8> {
        self.cookie.clone()
    }

    fn final_data(&mut self, _server_challenge_data: &[u8]) -> HdbResult<Vec<u8>> {
        Ok(Vec::new())
    }
}
