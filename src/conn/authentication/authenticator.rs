use crate::{impl_err, HdbResult};

// One authentication method that the client can offer to the server.
//
// The negotiation is two-round: the first request carries, per offered
// method, the method name and its initial data; the server picks one method
// and answers with that method's challenge. The second request carries the
// method's proof; the final reply is handed back for verification and for
// harvesting a session cookie where the method supports one.
pub(crate) trait Authenticator: std::fmt::Debug {
    fn name(&self) -> &'static str;

    fn name_as_bytes(&self) -> Vec<u8> {
        self.name().as_bytes().to_vec()
    }

    // The data that are offered with the first request (a nonce, a token, a
    // cookie - method-specific).
    fn initial_data(&self) -> Vec<u8>;

    // Produces the proof for the server's challenge.
    fn final_data(&mut self, server_challenge_data: &[u8]) -> HdbResult<Vec<u8>>;

    // Evaluates the authentication payload of the server's final reply.
    fn evaluate_final_reply(&mut self, method: &[u8], server_data: &[u8]) -> HdbResult<()> {
        if method == self.name().as_bytes() {
            let _ = server_data;
            Ok(())
        } else {
            Err(impl_err!(
                "wrong method name detected: {}",
                String::from_utf8_lossy(method)
            ))
        }
    }

    // The logon name the server recognized (JWT/SAML), if any.
    fn logon_name(&self) -> Option<&str> {
        None
    }

    // The session cookie issued by the server (JWT/SAML), if any.
    fn take_session_cookie(&mut self) -> Option<Vec<u8>> {
        None
    }
}
