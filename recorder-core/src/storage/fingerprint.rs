use sha2::{Digest, Sha256};

/// SHA-256 hex digest of an asset payload.
pub fn fingerprint(bytes: &[u8]) -> String {
    hex_encode(&Sha256::digest(bytes))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
