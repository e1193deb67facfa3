pub mod client;
pub mod config;
pub mod error;
pub mod hash;
pub mod protocol;
pub mod server;
pub mod signing;

pub use client::{CertificateBundle, HandshakeDecrypter, HandshakeSigner, RemoteSigner};
pub use config::{ClientConfig, ServerConfig};
pub use error::{KeylessError, KeylessResult};
pub use hash::{HashAlgorithm, HashRegistry};
pub use server::{SigningEndpoint, router, run};
pub use signing::{DigestSigner, RsaSigner};
