//! Connection parameters.
use crate::conn::{AuthCredentials, ConnectParamsBuilder};
use crate::protocol::util;
use rustls::{ClientConfig, OwnedTrustAnchor, RootCertStore};
use std::path::PathBuf;
use std::sync::Arc;

/// An immutable struct with all information necessary to open a new
/// connection to a HANA database.
///
/// An instance is built with the [`ConnectParamsBuilder`]:
///
/// ```rust,no_run
/// use hdbclient::{ConnectParams, ServerCerts};
/// # fn read_certificate() -> String {String::from("can't do that")};
/// let certificate: String = read_certificate();
/// let connect_params = ConnectParams::builder()
///    .hostname("the_host")
///    .port(2222)
///    .dbuser("my_user")
///    .password("my_passwd")
///    .tls_with(ServerCerts::Direct(certificate))
///    .build()
///    .unwrap();
/// ```
///
/// # Redirects
///
/// To connect to an MDC tenant database, specify the host and port of the
/// system database plus the name of the tenant database
/// ([`ConnectParamsBuilder::dbname`]); the driver follows the server's
/// redirect.
#[derive(Clone, Debug)]
pub struct ConnectParams {
    host: String,
    addr: String,
    dbuser: Option<String>,
    dbname: Option<String>,
    network_group: Option<String>,
    clientlocale: Option<String>,
    application: Option<String>,
    schema: Option<String>,
    session_variables: Vec<(String, String)>,
    tls: Tls,
    credentials: Arc<AuthCredentials>,
}

/// Describes whether and how TLS is to be used.
#[derive(Clone, Debug, Default)]
pub enum Tls {
    /// Plain TCP connection.
    #[default]
    Off,
    /// TLS without server validation - dangerous!
    Insecure,
    /// TLS with server validation.
    Secure(Vec<ServerCerts>),
}

/// Expresses where the server certificates for TLS validation come from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ServerCerts {
    /// The trusted root certificates of the webpki roots.
    RootCertificates,
    /// A directory with PEM files.
    Directory(String),
    /// The name of an environment variable that contains the certificate(s)
    /// in PEM format.
    Environment(String),
    /// The certificate(s) in PEM format.
    Direct(String),
}

impl ConnectParams {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        host: String,
        port: u16,
        dbuser: Option<String>,
        dbname: Option<String>,
        network_group: Option<String>,
        clientlocale: Option<String>,
        application: Option<String>,
        schema: Option<String>,
        session_variables: Vec<(String, String)>,
        tls: Tls,
        credentials: Arc<AuthCredentials>,
    ) -> Self {
        Self {
            addr: format!("{host}:{port}"),
            host,
            dbuser,
            dbname,
            network_group,
            clientlocale,
            application,
            schema,
            session_variables,
            tls,
            credentials,
        }
    }

    /// Returns a new builder for `ConnectParams`.
    pub fn builder() -> ConnectParamsBuilder {
        ConnectParamsBuilder::new()
    }

    pub(crate) fn redirect(&self, host: &str, port: u16) -> ConnectParams {
        let mut new_params = self.clone();
        new_params.dbname = None;
        new_params.host = host.to_string();
        new_params.addr = format!("{host}:{port}");
        new_params
    }

    /// The host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The socket address.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Whether TLS or a plain TCP connection is to be used.
    pub fn is_tls(&self) -> bool {
        !matches!(self.tls, Tls::Off)
    }

    /// The database user.
    pub fn dbuser(&self) -> &str {
        self.dbuser.as_deref().unwrap_or("")
    }

    /// The name of the (MDC) database.
    pub fn dbname(&self) -> Option<&str> {
        self.dbname.as_deref()
    }

    /// The name of a network group.
    pub fn network_group(&self) -> Option<&str> {
        self.network_group.as_deref()
    }

    /// The client locale.
    pub fn clientlocale(&self) -> Option<&str> {
        self.clientlocale.as_deref()
    }

    /// The application name; defaults to the name of the running executable.
    pub fn application(&self) -> Option<&str> {
        self.application.as_deref()
    }

    /// The schema that is activated directly after the connect.
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub(crate) fn session_variables(&self) -> &[(String, String)] {
        &self.session_variables
    }

    pub(crate) fn credentials(&self) -> &Arc<AuthCredentials> {
        &self.credentials
    }

    pub(crate) fn rustls_clientconfig(&self) -> std::io::Result<ClientConfig> {
        match self.tls {
            Tls::Off => Err(util::io_error(
                "rustls_clientconfig called with Tls::Off - \
                 this should have been prevented earlier",
            )),
            Tls::Insecure => {
                let config = ClientConfig::builder()
                    .with_safe_defaults()
                    .with_custom_certificate_verifier(Arc::new(NoCertificateVerification))
                    .with_no_client_auth();
                Ok(config)
            }
            Tls::Secure(ref server_certs) => {
                let mut root_store = RootCertStore::empty();
                for server_cert in server_certs {
                    match server_cert {
                        ServerCerts::RootCertificates => {
                            root_store.add_trust_anchors(
                                webpki_roots::TLS_SERVER_ROOTS.iter().map(|ta| {
                                    OwnedTrustAnchor::from_subject_spki_name_constraints(
                                        ta.subject,
                                        ta.spki,
                                        ta.name_constraints,
                                    )
                                }),
                            );
                        }
                        ServerCerts::Direct(pem) => {
                            add_pem_to_root_store(&mut root_store, pem.as_bytes())?;
                        }
                        ServerCerts::Environment(env_var) => match std::env::var(env_var) {
                            Ok(value) => {
                                add_pem_to_root_store(&mut root_store, value.as_bytes())?;
                            }
                            Err(e) => {
                                return Err(util::io_error(format!(
                                    "environment variable {env_var} not found, reason: {e}"
                                )));
                            }
                        },
                        ServerCerts::Directory(trust_anchor_dir) => {
                            let trust_anchor_files: Vec<PathBuf> =
                                std::fs::read_dir(trust_anchor_dir)?
                                    .filter_map(Result::ok)
                                    .filter(|dir_entry| {
                                        dir_entry.file_type().is_ok_and(|t| t.is_file())
                                    })
                                    .filter(|dir_entry| {
                                        dir_entry.path().extension()
                                            == Some(std::ffi::OsStr::new("pem"))
                                    })
                                    .map(|dir_entry| dir_entry.path())
                                    .collect();
                            for path in trust_anchor_files {
                                let pem = std::fs::read(&path)?;
                                add_pem_to_root_store(&mut root_store, &pem)?;
                            }
                        }
                    }
                }
                let config = ClientConfig::builder()
                    .with_safe_defaults()
                    .with_root_certificates(root_store)
                    .with_no_client_auth();
                Ok(config)
            }
        }
    }
}

fn add_pem_to_root_store(root_store: &mut RootCertStore, pem: &[u8]) -> std::io::Result<()> {
    let certs: Vec<Vec<u8>> = pem::parse_many(pem)
        .map_err(|e| util::io_error(format!("cannot parse PEM certificates: {e}")))?
        .into_iter()
        .filter(|p| p.tag() == "CERTIFICATE")
        .map(|p| p.into_contents())
        .collect();
    let (n_ok, n_err) = root_store.add_parsable_certificates(&certs);
    if n_ok == 0 {
        info!("none of the provided server certificates was accepted");
    } else if n_err > 0 {
        info!("not all provided server certificates were accepted");
    }
    Ok(())
}

// Used with Tls::Insecure.
struct NoCertificateVerification;
impl rustls::client::ServerCertVerifier for NoCertificateVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::Certificate,
        _intermediates: &[rustls::Certificate],
        _server_name: &rustls::ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: std::time::SystemTime,
    ) -> Result<rustls::client::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::ServerCertVerified::assertion())
    }
}

impl std::fmt::Display for ConnectParams {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}@{}", self.dbuser(), self.addr)
    }
}
