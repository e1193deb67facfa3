use serde::{Deserialize, Serialize};

/// Body of a POST to the sign endpoint, sent as `application/json`.
///
/// The success response carries no envelope: its body is the raw
/// signature. Failures are a status code with a free-text body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningRequest {
    /// Wire code of the hash that produced `msg`.
    #[serde(default)]
    pub hash: u64,
    /// Hex-encoded digest.
    #[serde(default)]
    pub msg: String,
}

impl SigningRequest {
    pub fn new(hash: u8, digest: &[u8]) -> Self {
        Self {
            hash: u64::from(hash),
            msg: hex::encode(digest),
        }
    }

    pub fn decode_digest(&self) -> Result<Vec<u8>, hex::FromHexError> {
        hex::decode(&self.msg)
    }
}
