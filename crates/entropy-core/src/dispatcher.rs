//! Dispatcher: serves one client request by draining a clean block.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{EntropyError, Result};
use crate::pool::EntropyPool;
use crate::shutdown::Shutdown;

/// How long to sleep when the clean queue is empty.
pub const REQUEST_IDLE_INTERVAL: Duration = Duration::from_secs(1);

/// Wait for a clean block, extract its content into a buffer of `out_len`
/// bytes, return the index to the dirty queue, and hand the caller the
/// extracted bytes. Polls `shutdown` between retries so a request in
/// progress during teardown still completes, but a request that never finds
/// a clean block exits promptly once `shutdown` goes non-runnable.
pub fn dispatch(pool: &Arc<EntropyPool>, out_len: usize, shutdown: &Shutdown) -> Result<Vec<u8>> {
    loop {
        match pool.take_clean()? {
            Some(idx) => return extract_one(pool, idx, out_len),
            None => {
                if !shutdown.is_runnable() {
                    return Err(EntropyError::NetworkFailure(
                        "shutting down before a clean block became available".into(),
                    ));
                }
                std::thread::sleep(REQUEST_IDLE_INTERVAL);
            }
        }
    }
}

fn extract_one(pool: &Arc<EntropyPool>, idx: usize, out_len: usize) -> Result<Vec<u8>> {
    let block_mutex = pool.block(idx);
    let mut out = vec![0u8; out_len];
    let extracted = {
        let mut block = block_mutex
            .lock()
            .map_err(|_| EntropyError::LockFailure("block mutex poisoned".into()))?;
        block.extract(&mut out)
    };
    match extracted {
        Ok(()) => {
            pool.return_dirty(idx)?;
            Ok(out)
        }
        Err(e) => {
            pool.drop_index(idx)?;
            Err(e)
        }
    }
}
