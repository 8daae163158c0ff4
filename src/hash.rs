//! Content digests for deduplication and audit.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::Result;

/// Read size for streaming digests.
const CHUNK_SIZE: usize = 8192;

/// Compute the hex SHA-256 digest of a file, streaming it in fixed-size chunks.
pub fn compute_hash<P: AsRef<Path>>(path: P) -> Result<String> {
    let file = File::open(path)?;
    hash_reader(BufReader::new(file))
}

/// Compute the hex SHA-256 digest of everything a reader yields.
pub fn hash_reader<R: Read>(mut reader: R) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compute the hex SHA-256 digest of an in-memory buffer.
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
