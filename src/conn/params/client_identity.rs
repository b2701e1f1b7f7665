use secstr::SecUtf8;

/// The X.509 client identity for certificate-based authentication: a PEM
/// encoded certificate chain and the matching private key.
///
/// The chain must begin with the client certificate; the key can be given in
/// PKCS#8 (`PRIVATE KEY`) or PKCS#1 (`RSA PRIVATE KEY`) PEM encoding.
#[derive(Clone, Eq, PartialEq)]
pub struct ClientIdentity {
    certificates_pem: String,
    key_pem: SecUtf8,
}

impl ClientIdentity {
    /// Creates a new `ClientIdentity` from PEM strings.
    pub fn new<C: Into<String>, K: Into<String>>(certificates_pem: C, key_pem: K) -> Self {
        Self {
            certificates_pem: certificates_pem.into(),
            key_pem: SecUtf8::from(key_pem.into()),
        }
    }

    pub(crate) fn certificates_pem(&self) -> &str {
        &self.certificates_pem
    }

    pub(crate) fn key_pem(&self) -> &str {
        self.key_pem.unsecure()
    }
}

impl std::fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ClientIdentity {{certificates_pem: <{} bytes>, key_pem: <secret>}}",
            self.certificates_pem.len()
        )
    }
}
