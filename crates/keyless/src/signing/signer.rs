use crate::error::KeylessResult;
use crate::hash::HashAlgorithm;

/// Private-key operation behind the sign endpoint.
///
/// Implementations are sync, signing is CPU-bound. One instance is shared
/// by every in-flight request, so it must be usable concurrently without
/// external locking.
pub trait DigestSigner: Send + Sync {
    /// Sign a precomputed digest. Returns raw signature bytes.
    fn sign_digest(&self, hash: HashAlgorithm, digest: &[u8]) -> KeylessResult<Vec<u8>>;

    /// DER-encoded SubjectPublicKeyInfo of the signing key.
    fn public_key_bytes(&self) -> Vec<u8>;

    /// Algorithm identifier string (e.g. "rsa-pkcs1v15").
    fn algorithm(&self) -> &str;
}
