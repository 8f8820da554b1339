//! Provider-compatible content hash
//!
//! The mirror's sync provider hashes files in 4 MiB blocks: each block is
//! hashed with SHA-256, the block digests are concatenated and hashed again
//! with SHA-256. The result is rendered as lowercase hex. Matching this lets
//! the engine confirm "same content" without trusting timestamps.

use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, instrument};
use vaultsync_core::domain::ContentHash;

use crate::SyncError;

/// Block size used by the provider
pub const BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Read buffer used when hashing files
const READ_BUFFER: usize = 64 * 1024;

/// Streaming block hasher
pub struct ContentHasher {
    overall: Sha256,
    block: Sha256,
    block_pos: usize,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self {
            overall: Sha256::new(),
            block: Sha256::new(),
            block_pos: 0,
        }
    }

    pub fn update(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            if self.block_pos == BLOCK_SIZE {
                self.overall.update(self.block.finalize_reset());
                self.block_pos = 0;
            }
            let take = (BLOCK_SIZE - self.block_pos).min(data.len());
            self.block.update(&data[..take]);
            self.block_pos += take;
            data = &data[take..];
        }
    }

    pub fn finalize(mut self) -> ContentHash {
        if self.block_pos > 0 {
            self.overall.update(self.block.finalize());
        }
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&self.overall.finalize());
        ContentHash::from_digest(&digest)
    }

    /// Hash an in-memory buffer
    pub fn digest(data: &[u8]) -> ContentHash {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }

    /// Hash a file on a blocking worker thread.
    ///
    /// # Errors
    /// Returns `SyncError::Io` if the file cannot be read.
    #[instrument(level = "debug", fields(path = %path.display()))]
    pub async fn hash_file(path: &Path) -> Result<ContentHash, SyncError> {
        let owned = path.to_path_buf();
        let hash = tokio::task::spawn_blocking(move || Self::hash_file_blocking(&owned)).await??;
        debug!(hash = %hash, "content hash computed");
        Ok(hash)
    }

    fn hash_file_blocking(path: &Path) -> Result<ContentHash, SyncError> {
        let mut file = std::fs::File::open(path).map_err(|e| SyncError::io(path, e))?;
        let mut hasher = Self::new();
        let mut buf = vec![0u8; READ_BUFFER];
        loop {
            let n = file.read(&mut buf).map_err(|e| SyncError::io(path, e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(hasher.finalize())
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sha256(data: &[u8]) -> Vec<u8> {
        Sha256::digest(data).to_vec()
    }

    fn hex_of(data: &[u8]) -> String {
        data.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(
            ContentHasher::digest(b"").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_single_block_is_hash_of_block_hash() {
        let data = b"hello vault";
        let expected = hex_of(&sha256(&sha256(data)));
        assert_eq!(ContentHasher::digest(data).as_str(), expected);
    }

    #[test]
    fn test_multi_block_boundaries() {
        let data: Vec<u8> = (0..(BLOCK_SIZE * 2 + 10)).map(|i| (i % 251) as u8).collect();

        let mut concat = Vec::new();
        for chunk in data.chunks(BLOCK_SIZE) {
            concat.extend(sha256(chunk));
        }
        let expected = hex_of(&sha256(&concat));

        assert_eq!(ContentHasher::digest(&data).as_str(), expected);

        // Feeding in uneven pieces gives the same answer.
        let mut hasher = ContentHasher::new();
        for piece in data.chunks(1_000_003) {
            hasher.update(piece);
        }
        assert_eq!(hasher.finalize().as_str(), expected);
    }

    #[test]
    fn test_exact_block_has_no_empty_trailer() {
        let data = vec![7u8; BLOCK_SIZE];
        let expected = hex_of(&sha256(&sha256(&data)));
        assert_eq!(ContentHasher::digest(&data).as_str(), expected);
    }

    #[tokio::test]
    async fn test_hash_file_matches_buffer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("note.md");
        tokio::fs::write(&path, b"# Plan\n- ship it\n").await.unwrap();

        let from_file = ContentHasher::hash_file(&path).await.unwrap();
        assert_eq!(from_file, ContentHasher::digest(b"# Plan\n- ship it\n"));
    }

    #[tokio::test]
    async fn test_hash_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = ContentHasher::hash_file(&dir.path().join("nope.md")).await;
        assert!(matches!(result, Err(SyncError::Io { .. })));
    }
}
