mod auth_credentials;
mod auth_requests;
mod authenticate;
mod authenticator;
mod crypto_util;
mod jwt;
mod saml;
mod scram_pbkdf2_sha256;
mod scram_sha256;
mod session_cookie;
mod x509;

pub(crate) use self::auth_credentials::{AuthCredentials, RefreshFn};
pub(super) use self::{
    auth_requests::{first_auth_request, second_auth_request, FirstAuthResponse},
    authenticate::{authenticate, AuthenticationResult},
    authenticator::Authenticator,
};
