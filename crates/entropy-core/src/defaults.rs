//! Compiled-in pipeline parameters.
//!
//! The CLI surface (§6) takes only connection/device arguments, not pool
//! tuning knobs, so pool size, block size, and hash kind are named constants
//! here rather than flags — mirroring the reference implementation's
//! `#define`s.

use crate::hash::HashKind;

/// Number of blocks in the pool.
pub const POOL_SIZE: usize = 32;
/// Bytes of conditioned content (and staging) per block. The last byte is
/// an internal string-terminator sentinel (see `block.rs`) and is never
/// handed to a client; `WIRE_PAYLOAD_LEN` is what actually goes out.
pub const BLOCK_SIZE: usize = 65;
/// Bytes of a block actually written to the client socket (`BLOCK_SIZE`
/// minus the internal terminator byte).
pub const WIRE_PAYLOAD_LEN: usize = BLOCK_SIZE - 1;
/// Number of serial devices the entropy-server binary drives.
pub const DEVICE_COUNT: usize = 1;
/// Hash kind used for block mixing.
pub const HASH_KIND: HashKind = HashKind::Sha512;
/// Staging-fill percentage that triggers a mix on every update.
pub const THRESHOLD: f64 = 0.0;
/// Serial baud rate for the default device adapter.
pub const BAUD_RATE: u32 = 9600;

/// Hostname/port/block_count advertised by the load balancer (S6).
pub const BALANCER_HOSTNAME: &str = "127.0.0.1";
pub const BALANCER_PORT: i32 = 10105;
pub const BALANCER_BLOCK_COUNT: i32 = 32;

/// Maximum bytes read per client request over the wire.
pub const CONNECTION_BUFFER_SIZE: usize = 512;
