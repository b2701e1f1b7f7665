use crate::{
    conn::{authentication::Authenticator, ClientIdentity},
    impl_err,
    protocol::parts::AuthFields,
    HdbError, HdbResult,
};
use ring::{rand::SystemRandom, signature};

// Certificate-based method. The first round offers the method with empty
// data; the server's challenge is a nonce. The proof consists of the DER
// certificate chain plus a signature over (chain bytes || nonce), produced
// with the client's private key; the algorithm follows the key type.
//
// The certificate expiry is checked locally before the proof is sent, so
// that an outdated certificate does not burn the server-side failed-logon
// counter.
pub(crate) struct X509Authenticator {
    client_identity: ClientIdentity,
}
impl X509Authenticator {
    pub fn boxed(client_identity: ClientIdentity) -> Box<dyn Authenticator + Send + Sync> {
        Box::new(Self { client_identity })
    }

    fn chain_der(&self) -> HdbResult<Vec<Vec<u8>>> {
        let pems = pem::parse_many(self.client_identity.certificates_pem())
            .map_err(|e| HdbError::CertValidation(format!("cannot parse certificate PEM: {e}")))?;
        let chain: Vec<Vec<u8>> = pems
            .into_iter()
            .filter(|p| p.tag() == "CERTIFICATE")
            .map(pem::Pem::into_contents)
            .collect();
        if chain.is_empty() {
            return Err(HdbError::CertValidation(
                "no CERTIFICATE entry found in the client identity".to_string(),
            ));
        }
        Ok(chain)
    }

    fn sign(&self, message: &[u8]) -> HdbResult<Vec<u8>> {
        let key_pem = pem::parse(self.client_identity.key_pem())
            .map_err(|e| HdbError::CertValidation(format!("cannot parse key PEM: {e}")))?;
        let key_der = key_pem.contents();
        let rng = SystemRandom::new();

        match key_pem.tag() {
            "RSA PRIVATE KEY" => {
                let key_pair = signature::RsaKeyPair::from_der(key_der)
                    .map_err(|e| HdbError::CertValidation(format!("unusable RSA key: {e}")))?;
                let mut sig = vec![0_u8; key_pair.public().modulus_len()];
                key_pair
                    .sign(&signature::RSA_PKCS1_SHA256, &rng, message, &mut sig)
                    .map_err(|e| impl_err!("RSA signing failed: {e}"))?;
                Ok(sig)
            }
            "PRIVATE KEY" => {
                // PKCS#8 can hold any key type; probe in order of likelihood
                if let Ok(key_pair) = signature::RsaKeyPair::from_pkcs8(key_der) {
                    let mut sig = vec![0_u8; key_pair.public().modulus_len()];
                    key_pair
                        .sign(&signature::RSA_PKCS1_SHA256, &rng, message, &mut sig)
                        .map_err(|e| impl_err!("RSA signing failed: {e}"))?;
                    return Ok(sig);
                }
                // EC: the curve size picks the hash
                if let Ok(key_pair) = signature::EcdsaKeyPair::from_pkcs8(
                    &signature::ECDSA_P256_SHA256_ASN1_SIGNING,
                    key_der,
                    &rng,
                ) {
                    let sig = key_pair
                        .sign(&rng, message)
                        .map_err(|e| impl_err!("ECDSA signing failed: {e}"))?;
                    return Ok(sig.as_ref().to_vec());
                }
                if let Ok(key_pair) = signature::EcdsaKeyPair::from_pkcs8(
                    &signature::ECDSA_P384_SHA384_ASN1_SIGNING,
                    key_der,
                    &rng,
                ) {
                    let sig = key_pair
                        .sign(&rng, message)
                        .map_err(|e| impl_err!("ECDSA signing failed: {e}"))?;
                    return Ok(sig.as_ref().to_vec());
                }
                // Ed25519 signs without a separate hash step
                if let Ok(key_pair) = signature::Ed25519KeyPair::from_pkcs8_maybe_unchecked(key_der)
                {
                    return Ok(key_pair.sign(message).as_ref().to_vec());
                }
                Err(HdbError::CertValidation(
                    "unsupported private key type in PKCS#8 blob".to_string(),
                ))
            }
            tag => Err(HdbError::CertValidation(format!(
                "unsupported key PEM tag \"{tag}\""
            ))),
        }
    }
}

impl std::fmt::Debug for X509Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "X509Authenticator {{{:?}}}", self.client_identity)
    }
}

impl Authenticator for X509Authenticator {
    fn name(&self) -> &'static str {
        "X509"
    }

    fn initial_data(&self) -> Vec<u8> {
        Vec::new()
    }

    fn final_data(&mut self, server_challenge_data: &[u8]) -> HdbResult<Vec<u8>> {
        let chain = self.chain_der()?;

        // fail locally on an expired certificate
        let (not_before, not_after) = certificate_validity(&chain[0])?;
        let now = time::OffsetDateTime::now_utc();
        if now < not_before {
            return Err(HdbError::CertValidation(format!(
                "client certificate is not valid before {not_before}"
            )));
        }
        if now > not_after {
            return Err(HdbError::CertValidation(format!(
                "client certificate expired at {not_after}"
            )));
        }
        if log_enabled!(log::Level::Debug) {
            debug!(
                "X509: presenting certificate with fingerprint {}",
                hex::encode(ring::digest::digest(&ring::digest::SHA256, &chain[0]))
            );
        }

        // signature over (chain bytes || server nonce)
        let mut message = Vec::<u8>::new();
        for cert in &chain {
            message.extend_from_slice(cert);
        }
        message.extend_from_slice(server_challenge_data);
        let sig = self.sign(&message)?;

        let mut fields = AuthFields::with_capacity(chain.len() + 1);
        for cert in chain {
            fields.push(cert);
        }
        fields.push(sig);
        fields.into_bytes()
    }
}

// Extracts (notBefore, notAfter) from a DER encoded certificate.
//
// Walks the outer SEQUENCE into the tbsCertificate SEQUENCE, skips the
// optional version tag, serial number, signature algorithm, and issuer, and
// lands on the validity SEQUENCE with its two Time values.
fn certificate_validity(der: &[u8]) -> HdbResult<(time::OffsetDateTime, time::OffsetDateTime)> {
    let mut outer = DerReader::new(der);
    let mut cert = outer.enter_sequence()?;
    let mut tbs = cert.enter_sequence()?;

    if tbs.peek_tag()? == 0xA0 {
        tbs.skip_element()?; // [0] version
    }
    tbs.skip_element()?; // serialNumber
    tbs.skip_element()?; // signature algorithm
    tbs.skip_element()?; // issuer
    let mut validity = tbs.enter_sequence()?;
    let not_before = validity.read_time()?;
    let not_after = validity.read_time()?;
    Ok((not_before, not_after))
}

// A minimal DER walker, just enough for the validity lookup.
struct DerReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> DerReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn peek_tag(&self) -> HdbResult<u8> {
        self.bytes
            .get(self.pos)
            .copied()
            .ok_or_else(|| cert_err("unexpected end of DER data"))
    }

    fn read_header(&mut self) -> HdbResult<(u8, usize)> {
        let tag = self.peek_tag()?;
        self.pos += 1;
        let first = *self
            .bytes
            .get(self.pos)
            .ok_or_else(|| cert_err("unexpected end of DER data"))?;
        self.pos += 1;
        let len = if first & 0x80 == 0 {
            usize::from(first)
        } else {
            let n_bytes = usize::from(first & 0x7F);
            if n_bytes == 0 || n_bytes > 4 {
                return Err(cert_err("unsupported DER length encoding"));
            }
            let mut len = 0_usize;
            for _ in 0..n_bytes {
                let b = *self
                    .bytes
                    .get(self.pos)
                    .ok_or_else(|| cert_err("unexpected end of DER data"))?;
                self.pos += 1;
                len = (len << 8) | usize::from(b);
            }
            len
        };
        if self.pos + len > self.bytes.len() {
            return Err(cert_err("DER length exceeds the available data"));
        }
        Ok((tag, len))
    }

    fn enter_sequence(&mut self) -> HdbResult<DerReader<'a>> {
        let (tag, len) = self.read_header()?;
        if tag != 0x30 {
            return Err(cert_err("expected a DER SEQUENCE"));
        }
        let inner = DerReader::new(&self.bytes[self.pos..self.pos + len]);
        self.pos += len;
        Ok(inner)
    }

    fn skip_element(&mut self) -> HdbResult<()> {
        let (_tag, len) = self.read_header()?;
        self.pos += len;
        Ok(())
    }

    // UTCTime ("YYMMDDHHMMSSZ") or GeneralizedTime ("YYYYMMDDHHMMSSZ")
    fn read_time(&mut self) -> HdbResult<time::OffsetDateTime> {
        let (tag, len) = self.read_header()?;
        let content = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        let s = std::str::from_utf8(content).map_err(|_| cert_err("non-ascii time value"))?;
        let (year, rest) = match tag {
            0x17 => {
                // two-digit year: 00-49 means 20xx, 50-99 means 19xx
                let yy: i32 = parse_number(&s[0..2])?;
                (if yy < 50 { 2000 + yy } else { 1900 + yy }, &s[2..])
            }
            0x18 => (parse_number(&s[0..4])?, &s[4..]),
            _ => return Err(cert_err("expected a DER time value")),
        };
        let month: u8 = parse_number(&rest[0..2])?;
        let day: u8 = parse_number(&rest[2..4])?;
        let hour: u8 = parse_number(&rest[4..6])?;
        let minute: u8 = parse_number(&rest[6..8])?;
        let second: u8 = parse_number(&rest[8..10])?;

        let date = time::Date::from_calendar_date(
            year,
            time::Month::try_from(month).map_err(|_| cert_err("invalid month"))?,
            day,
        )
        .map_err(|_| cert_err("invalid date"))?;
        let tod = time::Time::from_hms(hour, minute, second)
            .map_err(|_| cert_err("invalid time of day"))?;
        Ok(time::PrimitiveDateTime::new(date, tod).assume_utc())
    }
}

fn parse_number<T: std::str::FromStr>(s: &str) -> HdbResult<T> {
    s.parse().map_err(|_| cert_err("invalid number in time value"))
}

fn cert_err(msg: &str) -> HdbError {
    HdbError::CertValidation(msg.to_string())
}

#[cfg(test)]
mod test {
    use super::certificate_validity;

    // Hand-assembles the DER skeleton of a certificate, down to the
    // validity element.
    fn synthetic_cert_der(not_before: &[u8], not_after: &[u8]) -> Vec<u8> {
        let mut validity = vec![0x30, (not_before.len() + not_after.len() + 4) as u8];
        validity.push(0x17);
        validity.push(not_before.len() as u8);
        validity.extend_from_slice(not_before);
        validity.push(0x17);
        validity.push(not_after.len() as u8);
        validity.extend_from_slice(not_after);

        let mut tbs_content = Vec::new();
        tbs_content.extend_from_slice(&[0x02, 0x01, 0x01]); // serial INTEGER 1
        tbs_content.extend_from_slice(&[0x30, 0x00]); // empty signature alg
        tbs_content.extend_from_slice(&[0x30, 0x00]); // empty issuer
        tbs_content.extend_from_slice(&validity);

        let mut tbs = vec![0x30, tbs_content.len() as u8];
        tbs.extend_from_slice(&tbs_content);

        let mut cert = vec![0x30, tbs.len() as u8];
        cert.extend_from_slice(&tbs);
        cert
    }

    #[test]
    fn test_validity_extraction() {
        let der = synthetic_cert_der(b"200101000000Z", b"400101000000Z");
        let (not_before, not_after) = certificate_validity(&der).unwrap();
        assert_eq!(not_before.year(), 2020);
        assert_eq!(not_after.year(), 2040);
        assert!(not_before < not_after);
    }

    #[test]
    fn test_generalized_time() {
        let mut der = synthetic_cert_der(b"19980101000000Z", b"20500101000000Z");
        // patch the two UTCTime tags into GeneralizedTime
        let positions: Vec<usize> = der
            .iter()
            .enumerate()
            .filter(|(_, b)| **b == 0x17)
            .map(|(i, _)| i)
            .collect();
        for i in positions {
            der[i] = 0x18;
        }
        let (not_before, not_after) = certificate_validity(&der).unwrap();
        assert_eq!(not_before.year(), 1998);
        assert_eq!(not_after.year(), 2050);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(certificate_validity(&[0x02, 0x01, 0x01]).is_err());
        assert!(certificate_validity(&[]).is_err());
    }
}
