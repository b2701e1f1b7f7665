use crate::conn::authentication::RefreshFn;
use crate::conn::{AuthCredentials, ClientIdentity, ConnectParams, ServerCerts, Tls};
use crate::{usage_err, HdbResult};
use secstr::SecUtf8;
use std::sync::Arc;

/// A builder for [`ConnectParams`].
///
/// At least the host, the port, and one kind of credential must be provided:
/// a password, a JWT token, a SAML assertion, or an X.509 client identity.
///
/// ```rust
/// use hdbclient::ConnectParams;
/// let connect_params = ConnectParams::builder()
///     .hostname("abcd123")
///     .port(2222)
///     .dbuser("MEIER")
///     .password("schLau")
///     .build()
///     .unwrap();
/// ```
#[derive(Default)]
pub struct ConnectParamsBuilder {
    hostname: Option<String>,
    port: Option<u16>,
    dbuser: Option<String>,
    password: Option<SecUtf8>,
    token: Option<SecUtf8>,
    saml_assertion: Option<SecUtf8>,
    client_identity: Option<ClientIdentity>,
    dbname: Option<String>,
    network_group: Option<String>,
    clientlocale: Option<String>,
    application: Option<String>,
    schema: Option<String>,
    session_variables: Vec<(String, String)>,
    tls: Tls,
    password_refresher: Option<RefreshFn<SecUtf8>>,
    token_refresher: Option<RefreshFn<SecUtf8>>,
    client_identity_refresher: Option<RefreshFn<ClientIdentity>>,
}

impl ConnectParamsBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hostname.
    pub fn hostname<H: AsRef<str>>(mut self, hostname: H) -> Self {
        self.hostname = Some(hostname.as_ref().to_owned());
        self
    }

    /// Sets the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the database user.
    pub fn dbuser<D: AsRef<str>>(mut self, dbuser: D) -> Self {
        self.dbuser = Some(dbuser.as_ref().to_owned());
        self
    }

    /// Sets the password.
    pub fn password<P: AsRef<str>>(mut self, pw: P) -> Self {
        self.password = Some(SecUtf8::from(pw.as_ref()));
        self
    }

    /// Sets a JWT token for token-based authentication.
    pub fn token<T: AsRef<str>>(mut self, token: T) -> Self {
        self.token = Some(SecUtf8::from(token.as_ref()));
        self
    }

    /// Sets a SAML assertion for SAML-based authentication.
    pub fn saml_assertion<A: AsRef<str>>(mut self, assertion: A) -> Self {
        self.saml_assertion = Some(SecUtf8::from(assertion.as_ref()));
        self
    }

    /// Sets an X.509 client identity for certificate-based authentication.
    pub fn client_identity(mut self, client_identity: ClientIdentity) -> Self {
        self.client_identity = Some(client_identity);
        self
    }

    /// Registers a callback that produces a fresh password after the server
    /// has rejected the current one.
    ///
    /// The callback is invoked at most once per failed authentication; the
    /// logon is only retried if the callback hands back a value that differs
    /// from the rejected one.
    pub fn password_refresher<F>(mut self, refresher: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        self.password_refresher = Some(Box::new(move || refresher().map(SecUtf8::from)));
        self
    }

    /// Registers a callback that produces a fresh JWT token after the server
    /// has rejected the current one.
    pub fn token_refresher<F>(mut self, refresher: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        self.token_refresher = Some(Box::new(move || refresher().map(SecUtf8::from)));
        self
    }

    /// Registers a callback that produces a fresh client identity after the
    /// server has rejected the current one.
    pub fn client_identity_refresher<F>(mut self, refresher: F) -> Self
    where
        F: Fn() -> Option<ClientIdentity> + Send + Sync + 'static,
    {
        self.client_identity_refresher = Some(Box::new(refresher));
        self
    }

    /// Sets the (MDC) database name; the driver will follow the redirect to
    /// the host and port where that database is reachable.
    pub fn dbname<D: AsRef<str>>(mut self, dbname: D) -> Self {
        self.dbname = Some(dbname.as_ref().to_owned());
        self
    }

    /// Sets the network group.
    pub fn network_group<D: AsRef<str>>(mut self, network_group: D) -> Self {
        self.network_group = Some(network_group.as_ref().to_owned());
        self
    }

    /// Sets the client locale; without it the server's locale applies.
    pub fn clientlocale<L: AsRef<str>>(mut self, clientlocale: L) -> Self {
        self.clientlocale = Some(clientlocale.as_ref().to_owned());
        self
    }

    /// Sets the application name; defaults to the name of the running
    /// executable.
    pub fn application<A: AsRef<str>>(mut self, application: A) -> Self {
        self.application = Some(application.as_ref().to_owned());
        self
    }

    /// Sets the schema that is activated with `SET SCHEMA` directly after
    /// the connect.
    pub fn schema<S: AsRef<str>>(mut self, schema: S) -> Self {
        self.schema = Some(schema.as_ref().to_owned());
        self
    }

    /// Adds a session variable that is sent to the server at connect time.
    pub fn session_variable<K: AsRef<str>, V: AsRef<str>>(mut self, key: K, value: V) -> Self {
        self.session_variables
            .push((key.as_ref().to_owned(), value.as_ref().to_owned()));
        self
    }

    /// Activates TLS with server validation based on the given certificates.
    ///
    /// Can be called multiple times to provide multiple certificate sources.
    pub fn tls_with(mut self, server_certs: ServerCerts) -> Self {
        match self.tls {
            Tls::Off | Tls::Insecure => {
                self.tls = Tls::Secure(vec![server_certs]);
            }
            Tls::Secure(ref mut certs) => {
                certs.push(server_certs);
            }
        }
        self
    }

    /// Activates TLS without server validation - dangerous!
    pub fn tls_without_server_verification(mut self) -> Self {
        self.tls = Tls::Insecure;
        self
    }

    /// Constructs the `ConnectParams`.
    ///
    /// # Errors
    ///
    /// `HdbError::Usage` if a mandatory element is missing.
    pub fn build(self) -> HdbResult<ConnectParams> {
        let host = self
            .hostname
            .ok_or_else(|| usage_err!("hostname is missing"))?;
        let port = self.port.ok_or_else(|| usage_err!("port is missing"))?;

        if self.password.is_none()
            && self.token.is_none()
            && self.saml_assertion.is_none()
            && self.client_identity.is_none()
        {
            return Err(usage_err!(
                "no credentials: provide a password, a token, a SAML assertion, \
                 or a client identity"
            ));
        }
        if self.password.is_some() && self.dbuser.is_none() {
            return Err(usage_err!("dbuser is missing"));
        }

        let credentials = Arc::new(AuthCredentials::new(
            self.password,
            self.token,
            self.saml_assertion,
            self.client_identity,
            self.password_refresher,
            self.token_refresher,
            self.client_identity_refresher,
        ));

        Ok(ConnectParams::new(
            host,
            port,
            self.dbuser,
            self.dbname,
            self.network_group,
            self.clientlocale,
            self.application,
            self.schema,
            self.session_variables,
            self.tls,
            credentials,
        ))
    }
}

impl std::fmt::Debug for ConnectParamsBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ConnectParamsBuilder {{hostname: {:?}, port: {:?}, dbuser: {:?}, dbname: {:?}}}",
            self.hostname, self.port, self.dbuser, self.dbname
        )
    }
}

#[cfg(test)]
mod test {
    use super::ConnectParamsBuilder;

    #[test]
    fn test_build() {
        let params = ConnectParamsBuilder::new()
            .hostname("abcd123")
            .port(2222)
            .dbuser("MEIER")
            .password("schLau")
            .clientlocale("de_DE")
            .schema("MY_SCHEMA")
            .session_variable("APPLICATIONUSER", "KARL")
            .build()
            .unwrap();

        assert_eq!(params.host(), "abcd123");
        assert_eq!(params.addr(), "abcd123:2222");
        assert_eq!(params.dbuser(), "MEIER");
        assert_eq!(params.clientlocale(), Some("de_DE"));
        assert_eq!(params.schema(), Some("MY_SCHEMA"));
        assert!(!params.is_tls());
    }

    #[test]
    fn test_missing_credentials() {
        assert!(ConnectParamsBuilder::new()
            .hostname("abcd123")
            .port(2222)
            .dbuser("MEIER")
            .build()
            .is_err());
    }

    #[test]
    fn test_redirect() {
        let params = ConnectParamsBuilder::new()
            .hostname("systemdb")
            .port(30013)
            .dbuser("MEIER")
            .password("schLau")
            .dbname("TENANT1")
            .build()
            .unwrap();
        let redirected = params.redirect("tenant-host", 30041);
        assert_eq!(redirected.addr(), "tenant-host:30041");
        assert!(redirected.dbname().is_none());
    }
}
