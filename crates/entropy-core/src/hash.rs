//! Centralized keyed-mixing primitive.
//!
//! **ALL** hashing used by the conditioning pipeline lives here — no block or
//! pool code should reach for `sha2`/`sha1`/`md-5` directly. This is the
//! single, auditable gateway between the entropy pool and the hash crates.
//!
//! # Two-input combine
//!
//! `h2(kind, a, b)` XORs the first `min(|a|, |b|)` bytes of the *longer*
//! input with the *shorter* input's bytes, leaves the longer input's tail
//! untouched, then hashes the result as a single string. On a length tie,
//! `a` is treated as the longer input.

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

use crate::error::{EntropyError, Result};

/// Supported hash primitives. The pipeline always specifies `Sha512` at
/// block construction; the others are allowed but unexercised by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl HashKind {
    /// Digest length in bytes for this kind.
    pub fn output_len(self) -> usize {
        match self {
            HashKind::Md5 => 16,
            HashKind::Sha1 => 20,
            HashKind::Sha256 => 32,
            HashKind::Sha512 => 64,
        }
    }
}

impl std::fmt::Display for HashKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashKind::Md5 => write!(f, "md5"),
            HashKind::Sha1 => write!(f, "sha1"),
            HashKind::Sha256 => write!(f, "sha256"),
            HashKind::Sha512 => write!(f, "sha512"),
        }
    }
}

/// Hash a single byte string. This is `H1` in the spec.
pub fn h1(kind: HashKind, data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Err(EntropyError::HashFailure("empty input to h1".into()));
    }
    let digest = match kind {
        HashKind::Md5 => Md5::digest(data).to_vec(),
        HashKind::Sha1 => Sha1::digest(data).to_vec(),
        HashKind::Sha256 => Sha256::digest(data).to_vec(),
        HashKind::Sha512 => Sha512::digest(data).to_vec(),
    };
    Ok(digest)
}

/// Hash a pair of byte strings. This is `H2` in the spec: `H1(kind, combine(a, b))`.
pub fn h2(kind: HashKind, a: &[u8], b: &[u8]) -> Result<Vec<u8>> {
    if a.is_empty() || b.is_empty() {
        return Err(EntropyError::HashFailure("empty input to h2".into()));
    }
    h1(kind, &combine(a, b))
}

/// XOR-combine two byte strings: the first `min(|a|, |b|)` bytes of the
/// longer input are XORed with the shorter input's bytes; the longer
/// input's remaining tail passes through unchanged. Ties favor `a`.
pub fn combine(a: &[u8], b: &[u8]) -> Vec<u8> {
    let (longer, shorter) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut out = longer.to_vec();
    for (o, s) in out.iter_mut().zip(shorter.iter()) {
        *o ^= *s;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_xors_overlap_and_keeps_tail() {
        let a = [0xffu8, 0xff, 0xff, 0xff];
        let b = [0x0fu8, 0x0f];
        let out = combine(&a, &b);
        assert_eq!(out, vec![0xf0, 0xf0, 0xff, 0xff]);
    }

    #[test]
    fn combine_tie_favors_a() {
        let a = [1u8, 2, 3];
        let b = [4u8, 5, 6];
        assert_eq!(combine(&a, &b), vec![1 ^ 4, 2 ^ 5, 3 ^ 6]);
    }

    #[test]
    fn h2_matches_h1_of_xor_when_equal_length() {
        let a = b"abcdefg!";
        let b = b"gfedcba!";
        let direct: Vec<u8> = a.iter().zip(b.iter()).map(|(x, y)| x ^ y).collect();
        assert_eq!(
            h2(HashKind::Sha256, a, b).unwrap(),
            h1(HashKind::Sha256, &direct).unwrap()
        );
    }

    #[test]
    fn h1_rejects_empty_input() {
        assert!(h1(HashKind::Sha512, &[]).is_err());
    }

    #[test]
    fn output_lengths_match_kind() {
        assert_eq!(h1(HashKind::Md5, b"x").unwrap().len(), 16);
        assert_eq!(h1(HashKind::Sha1, b"x").unwrap().len(), 20);
        assert_eq!(h1(HashKind::Sha256, b"x").unwrap().len(), 32);
        assert_eq!(h1(HashKind::Sha512, b"x").unwrap().len(), 64);
    }
}
