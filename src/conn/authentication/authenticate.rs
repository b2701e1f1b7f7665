use crate::conn::authentication::{
    first_auth_request, jwt::JwtAuthenticator, saml::SamlAuthenticator,
    scram_pbkdf2_sha256::ScramPbkdf2Sha256, scram_sha256::ScramSha256, second_auth_request,
    session_cookie::SessionCookieAuthenticator, x509::X509Authenticator, Authenticator,
    FirstAuthResponse,
};
use crate::conn::ConnectionCore;
use crate::protocol::parts::DbConnectInfo;
use crate::{usage_err, HdbError, HdbResult};

#[must_use]
pub(crate) enum AuthenticationResult {
    Ok,
    Redirect(DbConnectInfo),
}

// Runs the two-round authentication negotiation.
//
// All methods for which credentials are configured are offered with the
// first request, in the fixed preference order
// X509 > SAML > SessionCookie > JWT > SCRAMPBKDF2SHA256 > SCRAMSHA256;
// the server picks exactly one of them.
pub(crate) fn authenticate(
    conn_core: &mut ConnectionCore,
    reconnect: bool,
) -> HdbResult<AuthenticationResult> {
    trace!("authenticate()");
    let credentials = std::sync::Arc::clone(conn_core.connect_params().credentials());

    let mut authenticators: Vec<Box<dyn Authenticator + Send + Sync>> = Vec::with_capacity(6);
    let mut user = conn_core.connect_params().dbuser().to_string();

    if let Some(client_identity) = credentials.client_identity() {
        authenticators.push(X509Authenticator::boxed(client_identity));
    }
    if let Some(assertion) = credentials.saml_assertion() {
        authenticators.push(SamlAuthenticator::boxed(assertion));
    }
    if let Some(session_cookie) = credentials.session_cookie() {
        // the fast path needs the logon name of the preceding authentication
        user = session_cookie.logon_name;
        authenticators.push(SessionCookieAuthenticator::boxed(session_cookie.cookie));
    }
    if let Some(token) = credentials.token() {
        authenticators.push(JwtAuthenticator::boxed(token));
    }
    if let Some(password) = credentials.password() {
        authenticators.push(ScramPbkdf2Sha256::boxed(password.clone()));
        authenticators.push(ScramSha256::boxed(password));
    }
    if authenticators.is_empty() {
        return Err(usage_err!("no credentials are configured"));
    }

    match first_auth_request(conn_core, &user, &authenticators)? {
        FirstAuthResponse::AuthenticatorAndChallenge(selected, server_challenge) => {
            // find the selected authenticator ...
            let mut authenticator: Box<dyn Authenticator + Send + Sync> = authenticators
                .into_iter()
                .find(|authenticator| authenticator.name() == selected)
                .ok_or_else(|| {
                    HdbError::Impl("none of the offered authentication methods was accepted")
                })?;
            // ... and use it for the second request
            second_auth_request(conn_core, &user, &mut *authenticator, &server_challenge, reconnect)?;

            // cookie-capable methods hand out a cookie for fast reconnects
            if let Some(cookie) = authenticator.take_session_cookie() {
                let logon_name = authenticator.logon_name().unwrap_or(&user).to_string();
                credentials.store_session_cookie(cookie, logon_name);
            }

            conn_core.set_authenticated();
            trace!("session_id: {}", conn_core.session_id());
            Ok(AuthenticationResult::Ok)
        }
        FirstAuthResponse::RedirectInfo(db_connect_info) => {
            Ok(AuthenticationResult::Redirect(db_connect_info))
        }
    }
}
