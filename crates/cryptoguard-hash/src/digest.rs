//! Streaming content digests.
//!
//! Files are read in fixed-size chunks and fed to an incremental hasher.
//! Only file content contributes to the digest; metadata such as mtime or
//! permissions never does.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use blake3::Hasher;
use sha2::{Digest, Sha256};

use cryptoguard_core::{ContentDigest, DigestAlgorithm};

use crate::error::DigestError;

/// Read buffer size.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Digest and size of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDigest {
    pub digest: ContentDigest,
    pub size: u64,
}

enum StreamHasher {
    Blake3(Box<Hasher>),
    Sha256(Sha256),
}

impl StreamHasher {
    fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Blake3 => StreamHasher::Blake3(Box::new(Hasher::new())),
            DigestAlgorithm::Sha256 => StreamHasher::Sha256(Sha256::new()),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            StreamHasher::Blake3(hasher) => {
                hasher.update(bytes);
            }
            StreamHasher::Sha256(hasher) => hasher.update(bytes),
        }
    }

    fn finalize(self) -> ContentDigest {
        match self {
            StreamHasher::Blake3(hasher) => ContentDigest::new(*hasher.finalize().as_bytes()),
            StreamHasher::Sha256(hasher) => ContentDigest::new(hasher.finalize().into()),
        }
    }
}

/// Hash everything a reader yields.
pub fn digest_reader<R: Read>(
    mut reader: R,
    algorithm: DigestAlgorithm,
) -> std::io::Result<FileDigest> {
    let mut hasher = StreamHasher::new(algorithm);
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut size = 0u64;

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
        size += bytes_read as u64;
    }

    Ok(FileDigest {
        digest: hasher.finalize(),
        size,
    })
}

/// Hash a file's content.
pub fn digest_file(path: &Path, algorithm: DigestAlgorithm) -> Result<FileDigest, DigestError> {
    let file = File::open(path).map_err(|e| DigestError::io(path, e))?;
    digest_reader(file, algorithm).map_err(|e| DigestError::io(path, e))
}
