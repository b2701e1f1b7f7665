use crate::{
    conn::authentication::Authenticator,
    impl_err,
    protocol::util,
    HdbResult,
};
use secstr::SecUtf8;

// Token-based method. The token is written as-is with the first request; the
// server's challenge is the logon name it mapped the token to. The final
// reply carries a session cookie that can be cached for fast reconnects.
pub(crate) struct JwtAuthenticator {
    token: SecUtf8,
    logon_name: Option<String>,
    session_cookie: Option<Vec<u8>>,
}
impl JwtAuthenticator {
    pub fn boxed(token: SecUtf8) -> Box<dyn Authenticator + Send + Sync> {
        Box::new(Self {
            token,
            logon_name: None,
            session_cookie: None,
        })
    }
}
impl std::fmt::Debug for JwtAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "JwtAuthenticator {{token: <secret>, logon_name: {:?}}}",
            self.logon_name
        )
    }
}
impl Authenticator for JwtAuthenticator {
    fn name(&self) -> &'static str {
        "JWT"
    }

    fn initial_data(&self) -> Vec<u8> {
        self.token.unsecure().as_bytes().to_vec()
    }

    fn final_data(&mut self, server_challenge_data: &[u8]) -> HdbResult<Vec<u8>> {
        // the challenge is the recognized logon name
        let logon_name = util::string_from_cesu8(server_challenge_data.to_vec())
            .map_err(|_| impl_err!("JWT: server sent a non-textual logon name"))?;
        debug!("JWT: server recognized logon name {logon_name}");
        self.logon_name = Some(logon_name);
        Ok(Vec::new())
    }

    fn evaluate_final_reply(&mut self, method: &[u8], server_data: &[u8]) -> HdbResult<()> {
        if method != self.name().as_bytes() {
            return Err(impl_err!(
                "wrong method name detected: {}",
                String::from_utf8_lossy(method)
            ));
        }
        if server_data.is_empty() {
            warn!("JWT: no session cookie received");
        } else {
            self.session_cookie = Some(server_data.to_vec());
        }
        Ok(())
    }

    fn logon_name(&self) -> Option<&str> {
        self.logon_name.as_deref()
    }

    fn take_session_cookie(&mut self) -> Option<Vec<u8>> {
        self.session_cookie.take()
    }
}
