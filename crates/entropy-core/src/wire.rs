//! Client ↔ load-balancer wire format: a fixed-layout descriptor naming the
//! backing entropy server.
//!
//! The original implementation transmits this as a raw `memcpy` of a C
//! struct. Rust has no safe equivalent of reinterpreting an arbitrary struct
//! as bytes across a process boundary, so the same layout is produced with
//! explicit field-by-field (de)serialization instead.

use crate::error::{EntropyError, Result};

/// Length of the fixed hostname field, matching the original `char[256]`.
pub const HOSTNAME_LEN: usize = 256;
/// Encoded size: hostname bytes + 4-byte port + 4-byte block_count.
pub const DESCRIPTOR_LEN: usize = HOSTNAME_LEN + 4 + 4;

/// Points a client at a specific entropy server and advertises how many
/// blocks its pool holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub hostname: String,
    pub port: i32,
    pub block_count: i32,
}

impl Descriptor {
    pub fn new(hostname: impl Into<String>, port: i32, block_count: i32) -> Result<Self> {
        let hostname = hostname.into();
        if hostname.len() >= HOSTNAME_LEN {
            return Err(EntropyError::InvalidArgument(format!(
                "hostname {hostname:?} too long for a {HOSTNAME_LEN}-byte field"
            )));
        }
        Ok(Self {
            hostname,
            port,
            block_count,
        })
    }

    /// Encode as `DESCRIPTOR_LEN` bytes: null-padded hostname, then
    /// little-endian `port`, then little-endian `block_count`.
    pub fn encode(&self) -> [u8; DESCRIPTOR_LEN] {
        let mut out = [0u8; DESCRIPTOR_LEN];
        let bytes = self.hostname.as_bytes();
        out[..bytes.len()].copy_from_slice(bytes);
        out[HOSTNAME_LEN..HOSTNAME_LEN + 4].copy_from_slice(&self.port.to_le_bytes());
        out[HOSTNAME_LEN + 4..].copy_from_slice(&self.block_count.to_le_bytes());
        out
    }

    /// Decode a descriptor from exactly `DESCRIPTOR_LEN` bytes.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() != DESCRIPTOR_LEN {
            return Err(EntropyError::InvalidArgument(format!(
                "expected {DESCRIPTOR_LEN} bytes, got {}",
                buf.len()
            )));
        }
        let hostname_end = buf[..HOSTNAME_LEN]
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(HOSTNAME_LEN);
        let hostname = String::from_utf8_lossy(&buf[..hostname_end]).into_owned();
        let port = i32::from_le_bytes(buf[HOSTNAME_LEN..HOSTNAME_LEN + 4].try_into().unwrap());
        let block_count = i32::from_le_bytes(buf[HOSTNAME_LEN + 4..].try_into().unwrap());
        Ok(Self {
            hostname,
            port,
            block_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trips() {
        let d = Descriptor::new("127.0.0.1", 10105, 32).unwrap();
        let bytes = d.encode();
        assert_eq!(bytes.len(), DESCRIPTOR_LEN);
        let decoded = Descriptor::decode(&bytes).unwrap();
        assert_eq!(d, decoded);
    }

    #[test]
    fn s6_expected_values() {
        let d = Descriptor::new("127.0.0.1", 10105, 32).unwrap();
        assert_eq!(d.hostname, "127.0.0.1");
        assert_eq!(d.port, 10105);
        assert_eq!(d.block_count, 32);
    }

    #[test]
    fn rejects_hostname_too_long() {
        let long = "a".repeat(HOSTNAME_LEN);
        assert!(Descriptor::new(long, 1, 1).is_err());
    }

    #[test]
    fn decode_rejects_wrong_length() {
        assert!(Descriptor::decode(&[0u8; 10]).is_err());
    }
}
