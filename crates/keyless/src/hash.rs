//! Hash algorithms accepted by the signing protocol and their wire codes.
//!
//! The code table is part of the protocol: a client and a server only
//! interoperate when both build the same [`HashRegistry`].

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{KeylessError, KeylessResult};

/// Digest algorithm that produced the bytes handed to a signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HashAlgorithm {
    /// Concatenated MD5 and SHA-1 digests, as used by TLS 1.0 and 1.1.
    Md5Sha1,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 6] = [
        HashAlgorithm::Md5Sha1,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha224,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
    ];

    /// Length in bytes of a digest produced by this algorithm.
    pub const fn digest_size(self) -> usize {
        match self {
            HashAlgorithm::Md5Sha1 => 36,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha224 => 28,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Md5Sha1 => "MD5SHA1",
            HashAlgorithm::Sha1 => "SHA1",
            HashAlgorithm::Sha224 => "SHA224",
            HashAlgorithm::Sha256 => "SHA256",
            HashAlgorithm::Sha384 => "SHA384",
            HashAlgorithm::Sha512 => "SHA512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = KeylessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_uppercase();
        HashAlgorithm::ALL
            .into_iter()
            .find(|hash| hash.name() == normalized)
            .ok_or_else(|| KeylessError::UnsupportedHash(s.to_string()))
    }
}

/// Bidirectional table between [`HashAlgorithm`] and its wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HashRegistry {
    entries: [(HashAlgorithm, u8); 6],
}

impl HashRegistry {
    /// The table every client and server speaks.
    pub const fn standard() -> Self {
        Self {
            entries: [
                (HashAlgorithm::Md5Sha1, 1),
                (HashAlgorithm::Sha1, 2),
                (HashAlgorithm::Sha224, 3),
                (HashAlgorithm::Sha256, 4),
                (HashAlgorithm::Sha384, 5),
                (HashAlgorithm::Sha512, 6),
            ],
        }
    }

    pub fn encode(&self, hash: HashAlgorithm) -> KeylessResult<u8> {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == hash)
            .map(|(_, code)| *code)
            .ok_or_else(|| KeylessError::UnsupportedHash(hash.to_string()))
    }

    /// Encodes a caller-declared hash; an undeclared hash has no code.
    pub fn encode_opt(&self, hash: Option<HashAlgorithm>) -> KeylessResult<u8> {
        match hash {
            Some(hash) => self.encode(hash),
            None => Err(KeylessError::UnsupportedHash("none".to_string())),
        }
    }

    pub fn decode(&self, code: u64) -> KeylessResult<HashAlgorithm> {
        self.entries
            .iter()
            .find(|(_, candidate)| u64::from(*candidate) == code)
            .map(|(hash, _)| *hash)
            .ok_or(KeylessError::UnknownHashCode(code))
    }
}

impl Default for HashRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_inverts_encode() {
        let registry = HashRegistry::standard();
        for hash in HashAlgorithm::ALL {
            let code = registry.encode(hash).unwrap();
            assert_eq!(registry.decode(u64::from(code)).unwrap(), hash);
        }
    }

    #[test]
    fn wire_codes_are_fixed() {
        let registry = HashRegistry::standard();
        let codes: Vec<u8> = HashAlgorithm::ALL
            .into_iter()
            .map(|hash| registry.encode(hash).unwrap())
            .collect();
        assert_eq!(codes, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn independently_built_tables_serialize_identically() {
        let client_side = serde_json::to_string(&HashRegistry::standard()).unwrap();
        let server_side = serde_json::to_string(&HashRegistry::default()).unwrap();
        assert_eq!(client_side, server_side);
        assert!(client_side.contains(r#"["SHA256",4]"#));
    }

    #[test]
    fn unknown_codes_are_rejected() {
        let registry = HashRegistry::standard();
        for code in [0, 7, 99, u64::MAX] {
            assert!(matches!(
                registry.decode(code),
                Err(KeylessError::UnknownHashCode(c)) if c == code
            ));
        }
    }

    #[test]
    fn undeclared_hash_is_unsupported() {
        let registry = HashRegistry::standard();
        assert!(matches!(
            registry.encode_opt(None),
            Err(KeylessError::UnsupportedHash(_))
        ));
    }

    #[test]
    fn digest_sizes() {
        let sizes: Vec<usize> = HashAlgorithm::ALL
            .into_iter()
            .map(HashAlgorithm::digest_size)
            .collect();
        assert_eq!(sizes, vec![36, 20, 28, 32, 48, 64]);
    }

    #[test]
    fn parses_names_loosely() {
        assert_eq!("sha256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("SHA-384".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha384);
        assert_eq!("md5_sha1".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Md5Sha1);
        assert!("whirlpool".parse::<HashAlgorithm>().is_err());
    }
}
