mod signer;
mod rsa;

pub use signer::DigestSigner;
pub use self::rsa::{RsaSigner, pkcs1v15_scheme};
