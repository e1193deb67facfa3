use std::future::Future;

use tracing::{debug, warn};

use super::certificate::BoundPublicKey;
use crate::config::ClientConfig;
use crate::error::{KeylessError, KeylessResult};
use crate::hash::{HashAlgorithm, HashRegistry};
use crate::protocol::SigningRequest;

/// Signing half of a private key, as a TLS stack consumes it.
pub trait HandshakeSigner: Send + Sync {
    /// Public half of the key the signature will verify against.
    fn public_key(&self) -> &BoundPublicKey;

    /// Sign a digest. When `hash` is given, `digest` must be exactly that
    /// hash's output length.
    fn sign(
        &self,
        digest: &[u8],
        hash: Option<HashAlgorithm>,
    ) -> impl Future<Output = KeylessResult<Vec<u8>>> + Send;
}

/// Decryption half of a private key.
pub trait HandshakeDecrypter: Send + Sync {
    fn decrypt(&self, ciphertext: &[u8]) -> impl Future<Output = KeylessResult<Vec<u8>>> + Send;
}

/// What to do with a non-2xx answer from the signing service.
///
/// The service reports failures as a status code with a text body, and
/// that body is indistinguishable from signature bytes. `Trust` hands the
/// body back regardless, so the failure surfaces later as a handshake
/// that does not verify. `Enforce` fails the call instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseStatusPolicy {
    #[default]
    Trust,
    Enforce,
}

/// Signs digests by POSTing them to a remote signing service.
///
/// Stateless between calls apart from the pooled HTTP client, so one
/// instance serves every handshake of a listener concurrently.
#[derive(Debug, Clone)]
pub struct RemoteSigner {
    sign_endpoint: String,
    public_key: BoundPublicKey,
    registry: HashRegistry,
    status_policy: ResponseStatusPolicy,
    client: reqwest::Client,
}

impl RemoteSigner {
    pub fn new(config: &ClientConfig, public_key: BoundPublicKey) -> KeylessResult<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(config.max_idle_per_host)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            sign_endpoint: config.sign_endpoint.clone(),
            public_key,
            registry: HashRegistry::standard(),
            status_policy: config.status_policy,
            client,
        })
    }

    pub fn sign_endpoint(&self) -> &str {
        &self.sign_endpoint
    }

    pub fn registry(&self) -> &HashRegistry {
        &self.registry
    }

    /// Wire code for `hash`, provided the bound key can be signed for
    /// remotely at all.
    fn hash_code(&self, hash: Option<HashAlgorithm>) -> KeylessResult<u8> {
        match &self.public_key {
            BoundPublicKey::Rsa(_) => self.registry.encode_opt(hash),
            BoundPublicKey::EllipticCurve(_) => Err(KeylessError::UnsupportedKeyType(
                self.public_key.kind().to_string(),
            )),
            BoundPublicKey::Unrecognized(spki) => Err(KeylessError::UnsupportedKeyType(format!(
                "{} ({})",
                self.public_key.kind(),
                spki.algorithm.oid
            ))),
        }
    }
}

impl HandshakeSigner for RemoteSigner {
    fn public_key(&self) -> &BoundPublicKey {
        &self.public_key
    }

    async fn sign(&self, digest: &[u8], hash: Option<HashAlgorithm>) -> KeylessResult<Vec<u8>> {
        if let Some(hash) = hash {
            if digest.len() != hash.digest_size() {
                return Err(KeylessError::InvalidInput {
                    expected: hash.digest_size(),
                    actual: digest.len(),
                });
            }
        }
        let code = self.hash_code(hash)?;
        let request = SigningRequest::new(code, digest);

        debug!(endpoint = %self.sign_endpoint, hash = code, "requesting remote signature");
        let response = self
            .client
            .post(&self.sign_endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            match self.status_policy {
                ResponseStatusPolicy::Enforce => {
                    let body = response.text().await?;
                    return Err(KeylessError::RemoteRejected {
                        status: status.as_u16(),
                        body,
                    });
                }
                ResponseStatusPolicy::Trust => {
                    warn!(
                        endpoint = %self.sign_endpoint,
                        %status,
                        "signing service returned an error status; using body as signature"
                    );
                }
            }
        }

        let signature = response.bytes().await?;
        Ok(signature.to_vec())
    }
}

/// Decryption is not offered by the signing service.
///
/// Every call fails; no padding scheme has been agreed with the server.
#[derive(Debug, Clone)]
pub struct RemoteDecrypter {
    decrypt_endpoint: String,
}

impl RemoteDecrypter {
    pub fn new(decrypt_endpoint: impl Into<String>) -> Self {
        Self {
            decrypt_endpoint: decrypt_endpoint.into(),
        }
    }

    pub fn decrypt_endpoint(&self) -> &str {
        &self.decrypt_endpoint
    }
}

impl HandshakeDecrypter for RemoteDecrypter {
    async fn decrypt(&self, _ciphertext: &[u8]) -> KeylessResult<Vec<u8>> {
        debug!(endpoint = %self.decrypt_endpoint, "remote decrypt requested");
        Err(KeylessError::NotImplemented("remote decrypt"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CertificateBundle;

    const CHAIN: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/chain.pem");
    const EC_LEAF: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/ec-leaf.pem");

    // Nothing listens on the discard port; reaching it would surface as a
    // transport error rather than the error under test.
    const UNREACHABLE: &str = "http://127.0.0.1:9/sign";

    fn bundle(path: &str) -> CertificateBundle {
        CertificateBundle::load(path, UNREACHABLE, "http://127.0.0.1:9/decrypt").unwrap()
    }

    #[tokio::test]
    async fn wrong_digest_length_is_invalid_input_for_every_hash() {
        let bundle = bundle(CHAIN);
        for hash in HashAlgorithm::ALL {
            for len in [0, hash.digest_size() - 1, hash.digest_size() + 1] {
                let result = bundle.signer().sign(&vec![7u8; len], Some(hash)).await;
                assert!(
                    matches!(
                        result,
                        Err(KeylessError::InvalidInput { expected, actual })
                            if expected == hash.digest_size() && actual == len
                    ),
                    "{hash} with {len} bytes: {result:?}"
                );
            }
        }
    }

    #[tokio::test]
    async fn undeclared_hash_is_unsupported() {
        let bundle = bundle(CHAIN);
        let result = bundle.signer().sign(&[1u8; 32], None).await;
        assert!(matches!(result, Err(KeylessError::UnsupportedHash(_))));
    }

    #[tokio::test]
    async fn elliptic_curve_leaf_is_unsupported() {
        let bundle = bundle(EC_LEAF);
        let result = bundle
            .signer()
            .sign(&[1u8; 32], Some(HashAlgorithm::Sha256))
            .await;
        assert!(matches!(result, Err(KeylessError::UnsupportedKeyType(kind)) if kind == "ecdsa"));
    }

    #[tokio::test]
    async fn decrypt_is_not_implemented() {
        let bundle = bundle(CHAIN);
        let result = bundle.decrypter().decrypt(b"ciphertext").await;
        assert!(matches!(result, Err(KeylessError::NotImplemented(_))));
    }

    #[test]
    fn signer_uses_standard_registry() {
        let bundle = bundle(CHAIN);
        assert_eq!(*bundle.signer().registry(), HashRegistry::standard());
        assert_eq!(bundle.signer().sign_endpoint(), UNREACHABLE);
    }
}
