use std::path::Path;

use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::EncodePublicKey;
use rsa::rand_core::OsRng;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};

use super::signer::DigestSigner;
use crate::error::{KeylessError, KeylessResult};
use crate::hash::HashAlgorithm;

/// PKCS#1 v1.5 padding for a digest produced by `hash`.
///
/// MD5SHA1 digests are signed without a DigestInfo prefix, as TLS 1.0 and
/// 1.1 require.
pub fn pkcs1v15_scheme(hash: HashAlgorithm) -> Pkcs1v15Sign {
    match hash {
        HashAlgorithm::Md5Sha1 => Pkcs1v15Sign::new_unprefixed(),
        HashAlgorithm::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
        HashAlgorithm::Sha224 => Pkcs1v15Sign::new::<Sha224>(),
        HashAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        HashAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
        HashAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
    }
}

/// RSA PKCS#1 v1.5 signer over precomputed digests.
///
/// Loaded from a PKCS#1 PEM file; the key never leaves this process.
pub struct RsaSigner {
    private_key: RsaPrivateKey,
    public_key_der: Vec<u8>,
}

impl RsaSigner {
    pub fn new(private_key: RsaPrivateKey) -> KeylessResult<Self> {
        let public_key_der = private_key
            .to_public_key()
            .to_public_key_der()
            .map_err(|e| KeylessError::KeyParse(format!("encoding RSA public key: {e}")))?
            .into_vec();
        Ok(Self {
            private_key,
            public_key_der,
        })
    }

    pub fn from_pkcs1_pem_file(path: impl AsRef<Path>) -> KeylessResult<Self> {
        let pem_bytes = std::fs::read(path.as_ref())?;
        Self::from_pkcs1_pem(&pem_bytes)
    }

    /// Parses the first PEM block, which must be an `RSA PRIVATE KEY`.
    ///
    /// Any other label in first position is refused, even when an RSA key
    /// follows it.
    pub fn from_pkcs1_pem(pem_bytes: &[u8]) -> KeylessResult<Self> {
        let text = std::str::from_utf8(pem_bytes)
            .map_err(|e| KeylessError::KeyParse(e.to_string()))?;
        let Some((label, block)) = first_pem_block(text)? else {
            return Err(KeylessError::KeyParse("no key found".to_string()));
        };
        if label != PKCS1_LABEL {
            return Err(KeylessError::UnsupportedKeyFormat(label.to_string()));
        }

        let private_key = RsaPrivateKey::from_pkcs1_pem(block)
            .map_err(|e| KeylessError::KeyParse(e.to_string()))?;
        Self::new(private_key)
    }

    pub fn public_key(&self) -> RsaPublicKey {
        self.private_key.to_public_key()
    }
}

const PKCS1_LABEL: &str = "RSA PRIVATE KEY";

/// Finds the first `-----BEGIN <label>-----` line and returns its label
/// together with the text up to the matching `END` line.
fn first_pem_block(text: &str) -> KeylessResult<Option<(&str, &str)>> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let label = line
            .trim_end()
            .strip_prefix("-----BEGIN ")
            .and_then(|rest| rest.strip_suffix("-----"));
        if let Some(label) = label {
            let rest = &text[offset..];
            let end_marker = format!("-----END {label}-----");
            let Some(end) = rest.find(&end_marker) else {
                return Err(KeylessError::KeyParse(format!("unterminated {label} block")));
            };
            return Ok(Some((label, &rest[..end + end_marker.len()])));
        }
        offset += line.len();
    }
    Ok(None)
}

impl DigestSigner for RsaSigner {
    fn sign_digest(&self, hash: HashAlgorithm, digest: &[u8]) -> KeylessResult<Vec<u8>> {
        if digest.len() != hash.digest_size() {
            return Err(KeylessError::SignOperation(format!(
                "{hash} digest must be {} bytes, got {}",
                hash.digest_size(),
                digest.len()
            )));
        }
        self.private_key
            .sign_with_rng(&mut OsRng, pkcs1v15_scheme(hash), digest)
            .map_err(|e| KeylessError::SignOperation(e.to_string()))
    }

    fn public_key_bytes(&self) -> Vec<u8> {
        self.public_key_der.clone()
    }

    fn algorithm(&self) -> &str {
        "rsa-pkcs1v15"
    }
}
