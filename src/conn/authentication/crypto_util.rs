use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2;
use secstr::SecUtf8;
use sha2::{Digest, Sha256};

// key = HMAC-SHA256(password, salt); the proofs are built by XORing the key
// with HMACs over concatenations of salt, server nonce, and client nonce.
pub(crate) fn scram_sha256(
    salt: &[u8],
    server_nonce: &[u8],
    client_challenge: &[u8],
    password: &SecUtf8,
) -> Result<(Vec<u8>, Vec<u8>), crypto_common::InvalidLength> {
    let salted_password = hmac(password.unsecure().as_ref(), salt)?;

    let mut content = Vec::with_capacity(salt.len() + server_nonce.len() + client_challenge.len());
    content.extend_from_slice(salt);
    content.extend_from_slice(server_nonce);
    content.extend_from_slice(client_challenge);

    let client_key: Vec<u8> = sha256(&salted_password);
    let sig: Vec<u8> = hmac(&sha256(&client_key), &content)?;
    let client_proof = xor(&sig, &client_key);

    // calculate the server proof for the verification of the final reply
    let mut content2 = Vec::with_capacity(client_key.len() + salt.len() + server_nonce.len());
    content2.extend_from_slice(&client_key);
    content2.extend_from_slice(salt);
    content2.extend_from_slice(server_nonce);

    let server_verifier = hmac(&salted_password, salt)?;
    let server_proof = hmac(&server_verifier, &content2)?;

    Ok((client_proof, server_proof))
}

// Identical schema, but the key derivation is PBKDF2 with the server-supplied
// round count.
pub(crate) fn scram_pbkdf2_sha256(
    salt: &[u8],
    server_nonce: &[u8],
    client_nonce: &[u8],
    password: &SecUtf8,
    iterations: u32,
) -> Result<(Vec<u8>, Vec<u8>), crypto_common::InvalidLength> {
    let salted_password = run_pbkdf2(password.unsecure().as_ref(), salt, iterations)?;

    let server_verifier = hmac(&salted_password, salt)?;

    let client_key = sha256(&salted_password);
    let client_verifier = sha256(&client_key);

    let mut s_sn_cn = Vec::with_capacity(salt.len() + server_nonce.len() + client_nonce.len());
    s_sn_cn.extend_from_slice(salt);
    s_sn_cn.extend_from_slice(server_nonce);
    s_sn_cn.extend_from_slice(client_nonce);
    let shared_key: Vec<u8> = hmac(&client_verifier, &s_sn_cn)?;
    let client_proof = xor(&shared_key, &client_key);

    let mut cn_s_sn = Vec::with_capacity(client_nonce.len() + salt.len() + server_nonce.len());
    cn_s_sn.extend_from_slice(client_nonce);
    cn_s_sn.extend_from_slice(salt);
    cn_s_sn.extend_from_slice(server_nonce);
    let server_proof = hmac(&server_verifier, &cn_s_sn)?;

    Ok((client_proof, server_proof))
}

fn run_pbkdf2(
    key: &[u8],
    salt: &[u8],
    iterations: u32,
) -> Result<Vec<u8>, crypto_common::InvalidLength> {
    let mut output = [0_u8; 32];
    pbkdf2::<Hmac<Sha256>>(key, salt, iterations, &mut output)?;
    Ok(output.to_vec())
}

fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>, crypto_common::InvalidLength> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256(input: &[u8]) -> Vec<u8> {
    let mut sha = Sha256::new();
    sha.update(input);
    sha.finalize().to_vec()
}

fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    assert_eq!(a.len(), b.len(), "xor needs two equally long parameters");
    a.iter().zip(b.iter()).map(|(x, y)| x ^ y).collect()
}

#[cfg(test)]
mod test {
    use secstr::SecUtf8;

    #[test]
    fn test_scram_sha256_shape() {
        let password = SecUtf8::from("top secret");
        let salt = [1_u8; 16];
        let server_nonce = [2_u8; 48];
        let client_challenge = [3_u8; 64];

        let (client_proof, server_proof) =
            super::scram_sha256(&salt, &server_nonce, &client_challenge, &password).unwrap();
        assert_eq!(client_proof.len(), 32);
        assert_eq!(server_proof.len(), 32);

        // deterministic for identical input
        let (client_proof2, _) =
            super::scram_sha256(&salt, &server_nonce, &client_challenge, &password).unwrap();
        assert_eq!(client_proof, client_proof2);

        // a different password changes the proof
        let (client_proof3, _) = super::scram_sha256(
            &salt,
            &server_nonce,
            &client_challenge,
            &SecUtf8::from("wrong"),
        )
        .unwrap();
        assert_ne!(client_proof, client_proof3);
    }

    #[test]
    fn test_scram_pbkdf2_sha256_shape() {
        let password = SecUtf8::from("top secret");
        let salt = [1_u8; 16];
        let server_nonce = [2_u8; 48];
        let client_nonce = [3_u8; 64];

        let (client_proof, server_proof) = super::scram_pbkdf2_sha256(
            &salt,
            &server_nonce,
            &client_nonce,
            &password,
            15_000,
        )
        .unwrap();
        assert_eq!(client_proof.len(), 32);
        assert_eq!(server_proof.len(), 32);

        // the iteration count goes into the derivation
        let (client_proof2, _) = super::scram_pbkdf2_sha256(
            &salt,
            &server_nonce,
            &client_nonce,
            &password,
            15_001,
        )
        .unwrap();
        assert_ne!(client_proof, client_proof2);
    }
}
