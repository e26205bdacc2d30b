//! Streaming content digests.
//!
//! # Design
//! - Files are read through a fixed-size buffer; memory use does not grow with file size.
//! - The digest family is a closed enum; the SHA-2 width follows the requested
//!   encoded length so the encoder always has enough bits.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use arkive_config::HashAlgorithm;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

use crate::encode::{BITS_PER_CHAR, encode_hash};
use crate::error::{FsOpsError, FsOpsResult};

/// Read buffer size used when streaming files into a digest.
pub const HASH_BUFFER_SIZE: usize = 4096;

/// SHA-2 widths tried in order before falling back to SHA-512.
const SHA2_CANDIDATE_BITS: [usize; 3] = [224, 256, 384];

/// Concrete digest function applied to file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestKind {
    /// MD5, 16 bytes.
    Md5,
    /// SHA-1, 20 bytes.
    Sha1,
    /// SHA-224, 28 bytes.
    Sha224,
    /// SHA-256, 32 bytes.
    Sha256,
    /// SHA-384, 48 bytes.
    Sha384,
    /// SHA-512, 64 bytes.
    Sha512,
}

impl DigestKind {
    /// Pick the digest for an algorithm family and desired encoded length.
    ///
    /// For SHA-2 this is the first of SHA-224, SHA-256, SHA-384 whose width
    /// covers `length * 5` bits, otherwise SHA-512.
    #[must_use]
    pub fn select(algorithm: HashAlgorithm, length: usize) -> Self {
        match algorithm {
            HashAlgorithm::Md5 => Self::Md5,
            HashAlgorithm::Sha1 => Self::Sha1,
            HashAlgorithm::Sha2 => {
                let length_bits = length * BITS_PER_CHAR;
                SHA2_CANDIDATE_BITS
                    .into_iter()
                    .find(|bits| *bits >= length_bits)
                    .map_or(Self::Sha512, |bits| match bits {
                        224 => Self::Sha224,
                        256 => Self::Sha256,
                        _ => Self::Sha384,
                    })
            }
        }
    }

    /// Width of the raw digest in bits.
    #[must_use]
    pub const fn output_bits(self) -> usize {
        match self {
            Self::Md5 => 128,
            Self::Sha1 => 160,
            Self::Sha224 => 224,
            Self::Sha256 => 256,
            Self::Sha384 => 384,
            Self::Sha512 => 512,
        }
    }

    /// Conventional lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }

    fn start(self) -> DigestState {
        match self {
            Self::Md5 => DigestState::Md5(md5::Context::new()),
            Self::Sha1 => DigestState::Sha1(Sha1::new()),
            Self::Sha224 => DigestState::Sha224(Sha224::new()),
            Self::Sha256 => DigestState::Sha256(Sha256::new()),
            Self::Sha384 => DigestState::Sha384(Sha384::new()),
            Self::Sha512 => DigestState::Sha512(Sha512::new()),
        }
    }
}

enum DigestState {
    Md5(md5::Context),
    Sha1(Sha1),
    Sha224(Sha224),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl DigestState {
    fn update(&mut self, chunk: &[u8]) {
        match self {
            Self::Md5(context) => context.consume(chunk),
            Self::Sha1(hasher) => hasher.update(chunk),
            Self::Sha224(hasher) => hasher.update(chunk),
            Self::Sha256(hasher) => hasher.update(chunk),
            Self::Sha384(hasher) => hasher.update(chunk),
            Self::Sha512(hasher) => hasher.update(chunk),
        }
    }

    fn finish(self) -> Vec<u8> {
        match self {
            Self::Md5(context) => context.compute().0.to_vec(),
            Self::Sha1(hasher) => hasher.finalize().to_vec(),
            Self::Sha224(hasher) => hasher.finalize().to_vec(),
            Self::Sha256(hasher) => hasher.finalize().to_vec(),
            Self::Sha384(hasher) => hasher.finalize().to_vec(),
            Self::Sha512(hasher) => hasher.finalize().to_vec(),
        }
    }
}

/// Digest everything `reader` yields, reading at most `buffer_size` bytes at a time.
///
/// # Errors
///
/// Propagates read errors other than `Interrupted`.
pub fn hash_reader<R: Read>(
    kind: DigestKind,
    reader: &mut R,
    buffer_size: usize,
) -> io::Result<Vec<u8>> {
    let mut state = kind.start();
    let mut buffer = vec![0_u8; buffer_size.max(1)];
    loop {
        match reader.read(&mut buffer) {
            Ok(0) => return Ok(state.finish()),
            Ok(read) => state.update(&buffer[..read]),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
}

/// Digest the file at `path` with [`HASH_BUFFER_SIZE`] reads.
///
/// # Errors
///
/// Returns `FsOpsError::Io` when the file cannot be opened or read.
pub fn hash_file(kind: DigestKind, path: &Path) -> FsOpsResult<Vec<u8>> {
    let mut file = File::open(path).map_err(|source| FsOpsError::io("hash.open", path, source))?;
    hash_reader(kind, &mut file, HASH_BUFFER_SIZE)
        .map_err(|source| FsOpsError::io("hash.read", path, source))
}

/// Hash a file for a profile and encode the digest to `length` characters.
///
/// # Errors
///
/// Returns `FsOpsError::Io` when the file cannot be read, or
/// `FsOpsError::InvalidInput` when `length` exceeds what the digest supplies.
pub fn hash_path(algorithm: HashAlgorithm, length: usize, path: &Path) -> FsOpsResult<String> {
    let kind = DigestKind::select(algorithm, length);
    let digest = hash_file(kind, path)?;
    encode_hash(&digest, length)
}
