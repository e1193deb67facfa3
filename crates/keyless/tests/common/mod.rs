#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use keyless::{DigestSigner, HashAlgorithm, KeylessResult, RsaSigner, SigningEndpoint};

pub const SIGNING_KEY: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/signing-key.pem");
pub const PKCS8_KEY: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/pkcs8-key.pem");
pub const LEAF: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/leaf.pem");
pub const CHAIN: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/chain.pem");
pub const EC_LEAF: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/ec-leaf.pem");

pub const SIGN_PATH: &str = "/keyless/sign";
pub const DECRYPT_PATH: &str = "/keyless/decrypt";

/// Wraps the fixture key and counts how often the private key is used.
pub struct CountingSigner {
    inner: RsaSigner,
    calls: AtomicUsize,
}

impl CountingSigner {
    pub fn new() -> Self {
        Self {
            inner: RsaSigner::from_pkcs1_pem_file(SIGNING_KEY).unwrap(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn public_key(&self) -> rsa::RsaPublicKey {
        self.inner.public_key()
    }
}

impl DigestSigner for CountingSigner {
    fn sign_digest(&self, hash: HashAlgorithm, digest: &[u8]) -> KeylessResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.sign_digest(hash, digest)
    }

    fn public_key_bytes(&self) -> Vec<u8> {
        self.inner.public_key_bytes()
    }

    fn algorithm(&self) -> &str {
        self.inner.algorithm()
    }
}

pub fn endpoint(signer: Arc<CountingSigner>) -> SigningEndpoint {
    SigningEndpoint::new(SIGN_PATH, DECRYPT_PATH, signer)
}

/// Serves `router` on an ephemeral local port.
pub async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}
