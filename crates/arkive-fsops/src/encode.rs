//! Short, filesystem-safe encodings of digest bytes.

use base32::Alphabet;

use crate::error::{FsOpsError, FsOpsResult};

/// Lowercase RFC 4648 base-32 without padding.
const ALPHABET: Alphabet = Alphabet::Rfc4648Lower { padding: false };

/// Bits carried by one encoded character.
pub const BITS_PER_CHAR: usize = 5;

/// Number of leading digest bytes needed to produce `length` characters.
#[must_use]
pub const fn bytes_for_length(length: usize) -> usize {
    (length * BITS_PER_CHAR).div_ceil(8)
}

/// Encode the leading bytes of `hashed` as exactly `length` base-32 characters.
///
/// Only the first `ceil(length * 5 / 8)` bytes are consumed; the output is the
/// lowercased base-32 text of those bytes, cut to `length` characters.
///
/// # Errors
///
/// Returns `FsOpsError::InvalidInput` when `hashed` is too short to supply
/// `length * 5` bits.
pub fn encode_hash(hashed: &[u8], length: usize) -> FsOpsResult<String> {
    let needed = bytes_for_length(length);
    if hashed.len() < needed {
        return Err(FsOpsError::InvalidInput {
            field: "hashed",
            reason: "has fewer bytes than the requested length needs",
            value: Some(format!("{} < {needed}", hashed.len())),
        });
    }

    let mut encoded = base32::encode(ALPHABET, &hashed[..needed]);
    encoded.truncate(length);
    Ok(encoded)
}
