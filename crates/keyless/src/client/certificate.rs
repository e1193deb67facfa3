use std::path::Path;

use rsa::RsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rustls_pki_types::CertificateDer;
use rustls_pki_types::pem::PemObject;
use tracing::info;
use x509_cert::Certificate;
use x509_cert::der::{Decode, Encode};
use x509_cert::spki::{ObjectIdentifier, SubjectPublicKeyInfoOwned};

use super::remote::{HandshakeSigner, RemoteDecrypter, RemoteSigner};
use crate::config::ClientConfig;
use crate::error::{KeylessError, KeylessResult};

const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const ID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

/// Public key of the leaf certificate, by key kind.
///
/// Only `Rsa` can currently be signed for remotely; the other arms carry
/// the raw SubjectPublicKeyInfo so callers can report what they got.
#[derive(Debug, Clone)]
pub enum BoundPublicKey {
    Rsa(RsaPublicKey),
    EllipticCurve(SubjectPublicKeyInfoOwned),
    Unrecognized(SubjectPublicKeyInfoOwned),
}

impl BoundPublicKey {
    pub fn from_spki(spki: &SubjectPublicKeyInfoOwned) -> KeylessResult<Self> {
        let oid = spki.algorithm.oid;
        if oid == RSA_ENCRYPTION {
            let der = spki
                .to_der()
                .map_err(|e| KeylessError::KeyParse(format!("encoding leaf public key: {e}")))?;
            let key = RsaPublicKey::from_public_key_der(&der)
                .map_err(|e| KeylessError::KeyParse(format!("leaf RSA public key: {e}")))?;
            Ok(BoundPublicKey::Rsa(key))
        } else if oid == ID_EC_PUBLIC_KEY {
            Ok(BoundPublicKey::EllipticCurve(spki.clone()))
        } else {
            Ok(BoundPublicKey::Unrecognized(spki.clone()))
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BoundPublicKey::Rsa(_) => "rsa",
            BoundPublicKey::EllipticCurve(_) => "ecdsa",
            BoundPublicKey::Unrecognized(_) => "unrecognized",
        }
    }
}

/// A certificate chain whose private key is a network-backed signer.
///
/// A TLS stack uses it exactly like a chain with a local key, but every
/// signature is produced by the remote signing service. Never mutated
/// after loading.
#[derive(Debug, Clone)]
pub struct CertificateBundle {
    chain: Vec<CertificateDer<'static>>,
    leaf: Certificate,
    signer: RemoteSigner,
    decrypter: RemoteDecrypter,
}

impl CertificateBundle {
    /// Loads `path` with default client settings.
    pub fn load(
        path: impl AsRef<Path>,
        sign_endpoint: &str,
        decrypt_endpoint: &str,
    ) -> KeylessResult<Self> {
        let config = ClientConfig::new(sign_endpoint, decrypt_endpoint, path.as_ref());
        Self::load_with(&config)
    }

    pub fn load_with(config: &ClientConfig) -> KeylessResult<Self> {
        let pem = std::fs::read(&config.certificate)?;
        let bundle = Self::from_pem(&pem, config).map_err(|e| match e {
            KeylessError::NoCertificateFound(_) => {
                KeylessError::NoCertificateFound(config.certificate.display().to_string())
            }
            other => other,
        })?;
        info!(
            certificate = %config.certificate.display(),
            chain_len = bundle.chain.len(),
            key = bundle.signer.public_key().kind(),
            "loaded keyless certificate bundle"
        );
        Ok(bundle)
    }

    /// Builds a bundle from PEM text. Sections other than `CERTIFICATE`
    /// are skipped; the first certificate is the leaf.
    pub fn from_pem(pem: &[u8], config: &ClientConfig) -> KeylessResult<Self> {
        let chain = CertificateDer::pem_slice_iter(pem).collect::<Result<Vec<_>, _>>()?;
        let Some(leaf_der) = chain.first() else {
            return Err(KeylessError::NoCertificateFound("PEM input".to_string()));
        };

        let leaf = Certificate::from_der(leaf_der.as_ref())
            .map_err(|e| KeylessError::KeyParse(format!("leaf certificate: {e}")))?;
        let public_key = BoundPublicKey::from_spki(&leaf.tbs_certificate.subject_public_key_info)?;

        Ok(Self {
            chain,
            leaf,
            signer: RemoteSigner::new(config, public_key)?,
            decrypter: RemoteDecrypter::new(config.decrypt_endpoint.clone()),
        })
    }

    /// DER certificates in file order, leaf first.
    pub fn chain(&self) -> &[CertificateDer<'static>] {
        &self.chain
    }

    pub fn leaf(&self) -> &Certificate {
        &self.leaf
    }

    /// Stands in for the private key when signing.
    pub fn signer(&self) -> &RemoteSigner {
        &self.signer
    }

    pub fn decrypter(&self) -> &RemoteDecrypter {
        &self.decrypter
    }
}
