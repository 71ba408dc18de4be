//! SHA-256 digests over exact, fully in-bounds domain ranges.
//!
//! Unlike the accessors, hashing never clips: a digest over zero-filled or
//! truncated data would misreport the contents of memory.

use std::ops::Range;

use sha2::{Digest, Sha256};

use crate::MemoryDomain;

/// Length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

const CHUNK_BYTES: usize = 4096;

/// Uppercase hex SHA-256 digest of `bytes`.
#[must_use]
pub fn digest_hex(bytes: &[u8]) -> String {
    hex::encode_upper(Sha256::digest(bytes))
}

/// Domain addresses covered by `count` bytes at `addr`, when fully in bounds.
///
/// The start address must itself lie inside the domain, so an empty range is
/// only valid at an existing address.
#[must_use]
pub fn hash_bounds(addr: i64, count: usize, size: u64) -> Option<Range<u64>> {
    let start = u64::try_from(addr).ok().filter(|&start| start < size)?;
    let end = start.checked_add(u64::try_from(count).ok()?)?;
    (end <= size).then_some(start..end)
}

/// Digest of the domain bytes in `range`; the caller guarantees it is in bounds.
#[must_use]
pub fn hash_domain_range(domain: &dyn MemoryDomain, range: Range<u64>) -> String {
    let mut hasher = Sha256::new();
    let mut chunk = [0_u8; CHUNK_BYTES];
    let mut filled = 0;
    for addr in range {
        chunk[filled] = domain.peek_byte(addr);
        filled += 1;
        if filled == CHUNK_BYTES {
            hasher.update(chunk);
            filled = 0;
        }
    }
    hasher.update(&chunk[..filled]);
    hex::encode_upper(hasher.finalize())
}
