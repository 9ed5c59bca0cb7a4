use sha2::{Digest, Sha256};

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

pub fn short_digest(bytes: &[u8]) -> String {
    sha256_hex(bytes).chars().take(12).collect()
}
