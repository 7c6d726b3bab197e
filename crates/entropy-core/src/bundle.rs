//! Pairing of a shared pool with an exclusively-owned device reader.

use std::sync::Arc;

use crate::device::DeviceReader;
use crate::pool::EntropyPool;

/// What a single Refiller thread owns: a reference to the shared pool and
/// sole ownership of one device.
pub struct EntropyBundle {
    pub pool: Arc<EntropyPool>,
    pub device: Box<dyn DeviceReader>,
}

impl EntropyBundle {
    pub fn new(pool: Arc<EntropyPool>, device: Box<dyn DeviceReader>) -> Self {
        Self { pool, device }
    }
}
