//! Refiller worker: moves a block from dirty to clean by feeding it device bytes.

use std::time::Duration;

use crate::bundle::EntropyBundle;
use crate::error::Result;
use crate::shutdown::Shutdown;

/// Bytes requested from the device per inner-loop iteration.
pub const READ_CHUNK: usize = 8;
/// How long to sleep when the dirty queue is empty.
pub const DEVICE_IDLE_INTERVAL: Duration = Duration::from_secs(1);

/// Run the outer refill loop until `shutdown` is no longer runnable.
///
/// One call owns `bundle` for its entire lifetime — callers spawn one
/// thread per device and hand it a bundle plus the shared shutdown flag.
pub fn run(mut bundle: EntropyBundle, shutdown: &Shutdown) {
    while shutdown.is_runnable() {
        match bundle.pool.take_dirty() {
            Ok(Some(idx)) => {
                match clean_one_block(&mut bundle, idx) {
                    Ok(()) => {
                        if let Err(e) = bundle.pool.return_clean(idx) {
                            log::warn!("{}: failed to return clean index {idx}: {e}", bundle.device.name());
                        } else {
                            log::debug!("{}: block {idx} mixed to clean", bundle.device.name());
                        }
                    }
                    Err(e) => {
                        log::warn!("{}: lost block {idx}: {e}", bundle.device.name());
                        if let Err(e) = bundle.pool.drop_index(idx) {
                            log::warn!("{}: failed to drop index {idx}: {e}", bundle.device.name());
                        }
                    }
                }
            }
            Ok(None) => std::thread::sleep(DEVICE_IDLE_INTERVAL),
            Err(e) => {
                log::error!("{}: pool lock failure: {e}", bundle.device.name());
                return;
            }
        }
    }
}

/// Inner loop: feed device reads into the indexed block until it goes
/// CLEAN, or a device/hash failure occurs. Holds block[idx]'s lock for the
/// whole loop, never the pool lock.
fn clean_one_block(bundle: &mut EntropyBundle, idx: usize) -> Result<()> {
    let block_mutex = bundle.pool.block(idx);
    let mut block = block_mutex
        .lock()
        .map_err(|_| crate::error::EntropyError::LockFailure("block mutex poisoned".into()))?;
    while block.state() == crate::block::BlockState::Dirty {
        let reading = bundle.device.read_chunk(READ_CHUNK)?;
        let payload = &reading[..reading.len() - 1];
        block.update(payload)?;
    }
    Ok(())
}
