//! A bounded collection of blocks plus two work-queues under a pool-wide lock.
//!
//! The pool never holds a block's lock and never inspects block state while
//! the pool lock is held — callers are trusted to uphold the `return_*`
//! preconditions. That separation is what keeps the pool and block locks
//! from ever nesting (see the refiller/dispatcher modules).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::block::EntropyBlock;
use crate::error::{EntropyError, Result};
use crate::hash::HashKind;

/// Diagnostic counters exposed alongside the pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct PoolHealth {
    pub total: usize,
    pub dirty: usize,
    pub clean: usize,
    pub lost: usize,
}

struct PoolState {
    dirty_queue: VecDeque<usize>,
    clean_queue: VecDeque<usize>,
    lost_blocks: usize,
}

/// Shared entropy pool. Blocks are each independently lockable; the pool
/// lock only ever guards queue membership and the lost-block counter.
pub struct EntropyPool {
    blocks: Vec<Mutex<EntropyBlock>>,
    state: Mutex<PoolState>,
}

impl EntropyPool {
    /// Build a pool of `size` blocks, each `block_size` bytes, mixing at
    /// `threshold` percent fill with `hash_kind`. All indices start DIRTY,
    /// queued in ascending order.
    pub fn new(
        size: usize,
        block_size: usize,
        threshold: f64,
        hash_kind: HashKind,
    ) -> Result<Arc<Self>> {
        if size == 0 {
            return Err(EntropyError::InvalidArgument(
                "pool size must be positive".into(),
            ));
        }
        let mut blocks = Vec::with_capacity(size);
        for _ in 0..size {
            blocks.push(Mutex::new(EntropyBlock::new(
                block_size, threshold, hash_kind,
            )?));
        }
        let dirty_queue: VecDeque<usize> = (0..size).collect();
        Ok(Arc::new(Self {
            blocks,
            state: Mutex::new(PoolState {
                dirty_queue,
                clean_queue: VecDeque::new(),
                lost_blocks: 0,
            }),
        }))
    }

    pub fn size(&self) -> usize {
        self.blocks.len()
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, PoolState>> {
        self.state
            .lock()
            .map_err(|_| EntropyError::LockFailure("pool state mutex poisoned".into()))
    }

    /// Pop the head of the dirty queue, if any.
    pub fn take_dirty(&self) -> Result<Option<usize>> {
        Ok(self.lock_state()?.dirty_queue.pop_front())
    }

    /// Pop the head of the clean queue, if any.
    pub fn take_clean(&self) -> Result<Option<usize>> {
        Ok(self.lock_state()?.clean_queue.pop_front())
    }

    /// Return a newly-CLEAN index to the clean queue.
    pub fn return_clean(&self, index: usize) -> Result<()> {
        self.lock_state()?.clean_queue.push_back(index);
        Ok(())
    }

    /// Return a newly-DIRTY index to the dirty queue.
    pub fn return_dirty(&self, index: usize) -> Result<()> {
        self.lock_state()?.dirty_queue.push_back(index);
        Ok(())
    }

    /// Permanently remove an index from circulation after its block failed
    /// irrecoverably (device or hash failure). The block itself is left in
    /// place but never re-queued.
    pub fn drop_index(&self, _index: usize) -> Result<()> {
        self.lock_state()?.lost_blocks += 1;
        Ok(())
    }

    /// Lock and expose a single block by index. Never call this while
    /// holding the pool's internal queue lock.
    pub fn block(&self, index: usize) -> &Mutex<EntropyBlock> {
        &self.blocks[index]
    }

    pub fn health(&self) -> Result<PoolHealth> {
        let state = self.lock_state()?;
        Ok(PoolHealth {
            total: self.blocks.len(),
            dirty: state.dirty_queue.len(),
            clean: state.clean_queue.len(),
            lost: state.lost_blocks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pool_queues_all_indices_dirty_ascending() {
        let pool = EntropyPool::new(4, 16, 0.0, HashKind::Sha512).unwrap();
        for expected in 0..4 {
            assert_eq!(pool.take_dirty().unwrap(), Some(expected));
        }
        assert_eq!(pool.take_dirty().unwrap(), None);
        assert_eq!(pool.take_clean().unwrap(), None);
    }

    #[test]
    fn return_clean_then_take_clean_round_trips() {
        let pool = EntropyPool::new(2, 16, 0.0, HashKind::Sha512).unwrap();
        pool.take_dirty().unwrap();
        pool.return_clean(0).unwrap();
        assert_eq!(pool.take_clean().unwrap(), Some(0));
    }

    #[test]
    fn drop_index_increments_lost_and_does_not_requeue() {
        let pool = EntropyPool::new(2, 16, 0.0, HashKind::Sha512).unwrap();
        let idx = pool.take_dirty().unwrap().unwrap();
        pool.drop_index(idx).unwrap();
        let health = pool.health().unwrap();
        assert_eq!(health.lost, 1);
        assert_eq!(health.dirty, 1);
    }

    #[test]
    fn health_reports_consistent_totals() {
        let pool = EntropyPool::new(4, 16, 0.0, HashKind::Sha512).unwrap();
        let health = pool.health().unwrap();
        assert_eq!(health.total, 4);
        assert_eq!(health.dirty, 4);
        assert_eq!(health.clean, 0);
        assert_eq!(health.lost, 0);
    }

    #[test]
    fn rejects_zero_size_pool() {
        assert!(EntropyPool::new(0, 16, 0.0, HashKind::Sha512).is_err());
    }

    #[test]
    fn index_conservation_across_take_return_cycles() {
        let pool = EntropyPool::new(8, 16, 0.0, HashKind::Sha512).unwrap();
        let mut in_flight = Vec::new();
        while let Some(idx) = pool.take_dirty().unwrap() {
            in_flight.push(idx);
        }
        assert_eq!(in_flight.len(), 8);
        for idx in &in_flight {
            pool.return_clean(*idx).unwrap();
        }
        let health = pool.health().unwrap();
        assert_eq!(health.clean, 8);
        assert_eq!(health.dirty, 0);
        assert_eq!(health.lost, 0);
    }
}
