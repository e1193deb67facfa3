//! TLS-terminator side: a certificate bundle whose private key lives in
//! another process.

mod certificate;
mod remote;

pub use certificate::{BoundPublicKey, CertificateBundle};
pub use remote::{
    HandshakeDecrypter, HandshakeSigner, RemoteDecrypter, RemoteSigner, ResponseStatusPolicy,
};
