use crate::{
    conn::authentication::{crypto_util, Authenticator},
    impl_err,
    protocol::parts::AuthFields,
    HdbError, HdbResult,
};
use byteorder::{LittleEndian, WriteBytesExt};
use rand::{thread_rng, RngCore};
use secstr::SecUtf8;
use std::io::Write;

const CLIENT_PROOF_SIZE: u8 = 32;

// Password-based method: key = HMAC-SHA256(password, salt).
#[derive(Debug)]
pub(crate) struct ScramSha256 {
    client_challenge: Vec<u8>,
    server_proof: Option<Vec<u8>>,
    password: SecUtf8,
}
impl ScramSha256 {
    pub fn boxed(password: SecUtf8) -> Box<dyn Authenticator + Send + Sync> {
        let mut client_challenge = [0_u8; 64];
        thread_rng().fill_bytes(&mut client_challenge);
        Box::new(Self {
            client_challenge: client_challenge.to_vec(),
            server_proof: None,
            password,
        })
    }
}
impl Authenticator for ScramSha256 {
    fn name(&self) -> &'static str {
        "SCRAMSHA256"
    }

    fn initial_data(&self) -> Vec<u8> {
        self.client_challenge.clone()
    }

    fn final_data(&mut self, server_challenge_data: &[u8]) -> HdbResult<Vec<u8>> {
        let (salt, server_nonce) = parse_first_server_data(server_challenge_data)?;

        let (client_proof, server_proof) = crypto_util::scram_sha256(
            &salt,
            &server_nonce,
            &self.client_challenge,
            &self.password,
        )
        .map_err(|_| HdbError::Impl("crypto_common::InvalidLength"))?;

        self.client_challenge.clear();
        self.server_proof = Some(server_proof);

        let mut buf = Vec::<u8>::with_capacity(3 + (CLIENT_PROOF_SIZE as usize));
        buf.write_u16::<LittleEndian>(1_u16)?;
        buf.write_u8(CLIENT_PROOF_SIZE)?;
        buf.write_all(&client_proof)?;
        Ok(buf)
    }

    fn evaluate_final_reply(&mut self, method: &[u8], server_data: &[u8]) -> HdbResult<()> {
        if method != self.name().as_bytes() {
            return Err(impl_err!(
                "wrong method name detected: {}",
                String::from_utf8_lossy(method)
            ));
        }
        let server_proof = AuthFields::parse(&mut std::io::Cursor::new(server_data))?
            .pop()
            .ok_or_else(|| HdbError::Impl("expected non-empty list of auth fields"))?;

        if let Some(ref expected) = self.server_proof {
            if expected as &[u8] == &server_proof as &[u8] {
                return Ok(());
            }
        }
        let msg = "SCRAMSHA256: server proof failed - \
                   this indicates a severe security issue with the server's identity!";
        warn!("{msg}");
        Err(HdbError::Usage(msg))
    }
}

// server_data is again an AuthFields, contains salt and server nonce
fn parse_first_server_data(server_data: &[u8]) -> HdbResult<(Vec<u8>, Vec<u8>)> {
    let mut af = AuthFields::parse(&mut std::io::Cursor::new(server_data))?;

    match (af.pop(), af.pop(), af.pop()) {
        (Some(server_nonce), Some(salt), None) => Ok((salt, server_nonce)),
        (_, _, _) => Err(HdbError::Impl("expected 2 auth fields")),
    }
}
