//! Path tokens
//!
//! A token is a 64-bit identifier derived from a normalized archive path with
//! Bob Jenkins' lookup3 `hashlittle2`. Tokens are stored in the table of
//! contents and give O(1) lookup without string comparison.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 64-bit identifier of a file inside an archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchiveFileToken(u64);

impl ArchiveFileToken {
    /// Sentinel that never identifies a stored file
    pub const INVALID: Self = Self(u64::MAX);

    /// Compute the token of an already normalized path
    ///
    /// The result is never [`ArchiveFileToken::INVALID`].
    pub fn from_normalized_path(path: &str) -> Self {
        let (pc, pb) = hashlittle2(path.as_bytes(), 0, 0);
        let raw = (u64::from(pc) << 32) | u64::from(pb);
        if raw == u64::MAX {
            Self(raw ^ 1)
        } else {
            Self(raw)
        }
    }

    /// Wrap a raw token value
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw value as stored on disk
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Whether this is the invalid sentinel
    pub const fn is_invalid(self) -> bool {
        self.0 == u64::MAX
    }
}

impl fmt::Display for ArchiveFileToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// lookup3 `hashlittle2`, returning `(pc, pb)`
fn hashlittle2(key: &[u8], pc: u32, pb: u32) -> (u32, u32) {
    let mut a = 0xdead_beef_u32
        .wrapping_add(u32::try_from(key.len()).unwrap_or(u32::MAX))
        .wrapping_add(pc);
    let mut b = a;
    let mut c = a.wrapping_add(pb);

    if key.is_empty() {
        return (c, b);
    }

    let mut k = key;
    while k.len() > 12 {
        a = a.wrapping_add(u32::from_le_bytes([k[0], k[1], k[2], k[3]]));
        b = b.wrapping_add(u32::from_le_bytes([k[4], k[5], k[6], k[7]]));
        c = c.wrapping_add(u32::from_le_bytes([k[8], k[9], k[10], k[11]]));
        mix(&mut a, &mut b, &mut c);
        k = &k[12..];
    }

    // Tail of 1..=12 bytes; missing bytes contribute zero
    let mut tail = [0u8; 12];
    tail[..k.len()].copy_from_slice(k);
    a = a.wrapping_add(u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]));
    b = b.wrapping_add(u32::from_le_bytes([tail[4], tail[5], tail[6], tail[7]]));
    c = c.wrapping_add(u32::from_le_bytes([tail[8], tail[9], tail[10], tail[11]]));

    final_mix(&mut a, &mut b, &mut c);
    (c, b)
}

fn mix(a: &mut u32, b: &mut u32, c: &mut u32) {
    *a = a.wrapping_sub(*c);
    *a ^= c.rotate_left(4);
    *c = c.wrapping_add(*b);

    *b = b.wrapping_sub(*a);
    *b ^= a.rotate_left(6);
    *a = a.wrapping_add(*c);

    *c = c.wrapping_sub(*b);
    *c ^= b.rotate_left(8);
    *b = b.wrapping_add(*a);

    *a = a.wrapping_sub(*c);
    *a ^= c.rotate_left(16);
    *c = c.wrapping_add(*b);

    *b = b.wrapping_sub(*a);
    *b ^= a.rotate_left(19);
    *a = a.wrapping_add(*c);

    *c = c.wrapping_sub(*b);
    *c ^= b.rotate_left(4);
    *b = b.wrapping_add(*a);
}

fn final_mix(a: &mut u32, b: &mut u32, c: &mut u32) {
    *c ^= *b;
    *c = c.wrapping_sub(b.rotate_left(14));

    *a ^= *c;
    *a = a.wrapping_sub(c.rotate_left(11));

    *b ^= *a;
    *b = b.wrapping_sub(a.rotate_left(25));

    *c ^= *b;
    *c = c.wrapping_sub(b.rotate_left(16));

    *a ^= *c;
    *a = a.wrapping_sub(c.rotate_left(4));

    *b ^= *a;
    *b = b.wrapping_sub(a.rotate_left(14));

    *c ^= *b;
    *c = c.wrapping_sub(b.rotate_left(24));
}
