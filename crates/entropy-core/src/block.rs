//! A single fixed-size unit of conditioned entropy.
//!
//! All content/staging mutation happens under the block's own lock; the pool
//! never reaches into a block while holding its own lock (see `pool.rs`).

use crate::error::{EntropyError, Result};
use crate::hash::{h2, HashKind};

/// Population a block currently belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    /// Needs more device bytes mixed in before it can serve a client.
    Dirty,
    /// Ready to be extracted and served.
    Clean,
}

/// A fixed-size buffer of conditioned bytes plus a staging area that
/// accumulates fresh device reads prior to mixing.
pub struct EntropyBlock {
    size: usize,
    content: Vec<u8>,
    staging: Vec<u8>,
    staging_used: usize,
    state: BlockState,
    threshold: f64,
    hash_kind: HashKind,
}

impl EntropyBlock {
    /// Construct a new block, DIRTY, with zeroed content and staging.
    pub fn new(size: usize, threshold: f64, hash_kind: HashKind) -> Result<Self> {
        if size == 0 {
            return Err(EntropyError::InvalidArgument(
                "block size must be positive".into(),
            ));
        }
        if !(0.0..=100.0).contains(&threshold) {
            return Err(EntropyError::InvalidArgument(format!(
                "threshold {threshold} out of range [0.0, 100.0]"
            )));
        }
        Ok(Self {
            size,
            content: vec![0u8; size],
            staging: vec![0u8; size],
            staging_used: 0,
            state: BlockState::Dirty,
            threshold,
            hash_kind,
        })
    }

    pub fn state(&self) -> BlockState {
        self.state
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Current content, for testing/inspection only.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Current staging buffer (only the used prefix is meaningful), for
    /// testing/inspection only.
    pub fn staging_used(&self) -> &[u8] {
        &self.staging[..self.staging_used]
    }

    fn fill_pct(&self) -> f64 {
        100.0 * self.staging_used as f64 / self.size as f64
    }

    /// Append as many bytes of `new_data` as fit in `size - staging_used - 1`,
    /// then mix if the fill percentage now meets `threshold`.
    pub fn update(&mut self, new_data: &[u8]) -> Result<()> {
        let room = self.size.saturating_sub(self.staging_used).saturating_sub(1);
        let take = new_data.len().min(room);
        self.staging[self.staging_used..self.staging_used + take]
            .copy_from_slice(&new_data[..take]);
        self.staging_used += take;

        if self.fill_pct() < self.threshold {
            return Ok(());
        }
        self.mix()
    }

    fn mix(&mut self) -> Result<()> {
        match h2(self.hash_kind, &self.content, &self.staging[..self.staging_used]) {
            Ok(digest) => {
                self.zero();
                let n = (self.size - 1).min(digest.len());
                self.content[..n].copy_from_slice(&digest[..n]);
                self.content[self.size - 1] = 0;
                self.state = BlockState::Clean;
                Ok(())
            }
            Err(e) => {
                self.zero();
                Err(e)
            }
        }
    }

    /// Copy content into `out` (truncated/zero-padded to `out.len()`), zero
    /// both buffers, and transition to DIRTY. Precondition: state is CLEAN.
    pub fn extract(&mut self, out: &mut [u8]) -> Result<()> {
        if self.state != BlockState::Clean {
            return Err(EntropyError::InvalidArgument(
                "extract called on a non-clean block".into(),
            ));
        }
        let n = out.len().min(self.content.len());
        out[..n].copy_from_slice(&self.content[..n]);
        for b in &mut out[n..] {
            *b = 0;
        }
        self.zero();
        self.state = BlockState::Dirty;
        Ok(())
    }

    fn zero(&mut self) {
        self.content.iter_mut().for_each(|b| *b = 0);
        self.staging.iter_mut().for_each(|b| *b = 0);
        self.staging_used = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_threshold_zero_one_read_mixes() {
        let mut block = EntropyBlock::new(8, 0.0, HashKind::Sha512).unwrap();
        block.update(b"abcdefg").unwrap();
        assert_eq!(block.state(), BlockState::Clean);
        assert_eq!(block.content()[7], 0);

        let zero_content = [0u8; 8];
        let expected = h2(HashKind::Sha512, &zero_content, b"abcdefg").unwrap();
        assert_eq!(&block.content()[..7], &expected[..7]);
    }

    #[test]
    fn s2_threshold_fifty_two_partial_reads() {
        let mut block = EntropyBlock::new(16, 50.0, HashKind::Sha512).unwrap();
        block.update(b"AAAA").unwrap();
        assert_eq!(block.state(), BlockState::Dirty);
        assert_eq!(block.staging_used(), b"AAAA");

        block.update(b"BBBB").unwrap();
        assert_eq!(block.state(), BlockState::Clean);
    }

    #[test]
    fn extract_zeroes_and_returns_to_dirty() {
        let mut block = EntropyBlock::new(8, 0.0, HashKind::Sha512).unwrap();
        block.update(b"abcdefg").unwrap();
        let mut out = [0u8; 8];
        block.extract(&mut out).unwrap();
        assert_eq!(block.state(), BlockState::Dirty);
        assert_eq!(block.content(), &[0u8; 8]);
        assert_eq!(block.staging_used(), &[] as &[u8]);
        assert_ne!(out, [0u8; 8]);
    }

    #[test]
    fn extract_on_dirty_block_fails() {
        let mut block = EntropyBlock::new(8, 0.0, HashKind::Sha512).unwrap();
        let mut out = [0u8; 8];
        assert!(block.extract(&mut out).is_err());
    }

    #[test]
    fn rejects_zero_size() {
        assert!(EntropyBlock::new(0, 0.0, HashKind::Sha512).is_err());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        assert!(EntropyBlock::new(8, 150.0, HashKind::Sha512).is_err());
        assert!(EntropyBlock::new(8, -1.0, HashKind::Sha512).is_err());
    }

    #[test]
    fn update_never_overruns_staging_capacity() {
        let mut block = EntropyBlock::new(4, 100.0, HashKind::Sha512).unwrap();
        // Room is size - staging_used - 1 = 3 bytes max before a mix could fire.
        block.update(b"ABCDEFGH").unwrap();
        // Either it mixed (state clean) or it's still within bounds; either way
        // no panic/overrun occurred, which is the property under test.
        let _ = block.state();
    }
}
