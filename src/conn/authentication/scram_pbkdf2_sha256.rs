use crate::{
    conn::authentication::{crypto_util, Authenticator},
    impl_err,
    protocol::parts::AuthFields,
    HdbError, HdbResult,
};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use rand::{thread_rng, RngCore};
use secstr::SecUtf8;
use std::{io::Write, time::Instant};

const CLIENT_PROOF_SIZE: u8 = 32;

// Password-based method like SCRAMSHA256, but the key derivation is PBKDF2
// with a server-supplied round count.
#[derive(Debug)]
pub(crate) struct ScramPbkdf2Sha256 {
    client_challenge: Vec<u8>,
    server_proof: Option<Vec<u8>>,
    password: SecUtf8,
}
impl ScramPbkdf2Sha256 {
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
impl Authenticator for ScramPbkdf2Sha256 {
    fn name(&self) -> &'static str {
        "SCRAMPBKDF2SHA256"
    }

    fn initial_data(&self) -> Vec<u8> {
        self.client_challenge.clone()
    }

    fn final_data(&mut self, server_challenge_data: &[u8]) -> HdbResult<Vec<u8>> {
        let (salt, server_nonce, iterations) = parse_first_server_data(server_challenge_data)?;

        let start = Instant::now();
        let (client_proof, server_proof) = crypto_util::scram_pbkdf2_sha256(
            &salt,
            &server_nonce,
            &self.client_challenge,
            &self.password,
            iterations,
        )
        .map_err(|_| HdbError::Impl("crypto_common::InvalidLength"))?;
        debug!(
            "pbkdf2 took {} µs",
            Instant::now().duration_since(start).as_micros(),
        );

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
        let msg = "PBKDF2: server proof failed - \
                   this indicates a severe security issue with the server's identity!";
        warn!("{msg}");
        Err(HdbError::Usage(msg))
    }
}

// server_data is again an AuthFields, contains salt, server nonce, iterations
fn parse_first_server_data(server_data: &[u8]) -> HdbResult<(Vec<u8>, Vec<u8>, u32)> {
    let mut af = AuthFields::parse(&mut std::io::Cursor::new(server_data))?;

    match (af.pop(), af.pop(), af.pop(), af.pop()) {
        (Some(it_bytes), Some(server_nonce), Some(salt), None) => {
            let iterations = std::io::Cursor::new(it_bytes).read_u32::<BigEndian>()?;
            if iterations < 15_000 {
                Err(impl_err!("not enough iterations: {iterations}"))
            } else if salt.len() < 16 {
                Err(impl_err!("too little salt: {}", salt.len()))
            } else {
                Ok((salt, server_nonce, iterations))
            }
        }
        (_, _, _, _) => Err(HdbError::Impl("expected 3 auth fields")),
    }
}
