//! # entropy-core
//!
//! The entropy pool conditioning and dispatch engine: a producer–consumer
//! pipeline where device-reader workers continuously refill "dirty" blocks
//! by hashing fresh device bytes into them, and request-handler workers
//! drain "clean" blocks to satisfy client reads.
//!
//! ## Architecture
//!
//! ```text
//! DeviceReader → Refiller → EntropyBlock (staging → content) → clean queue
//!                                                                  |
//!                                                             Dispatcher → SecureStream
//! ```
//!
//! A block's lock and the pool's lock are never held at the same time — the
//! pool only ever mediates queue membership; a block's own lock mediates its
//! content and staging. Workers transfer a block index between the two
//! under the pool lock, then do all I/O and hashing entirely under the
//! block's lock.
//!
//! ## Quick start
//!
//! ```no_run
//! use entropy_core::{defaults, hash::HashKind, pool::EntropyPool};
//!
//! let pool = EntropyPool::new(
//!     defaults::POOL_SIZE,
//!     defaults::BLOCK_SIZE,
//!     defaults::THRESHOLD,
//!     HashKind::Sha512,
//! )
//! .expect("pool construction");
//! ```

pub mod block;
pub mod bundle;
pub mod defaults;
pub mod device;
pub mod dispatcher;
pub mod error;
pub mod hash;
pub mod pool;
pub mod refiller;
pub mod shutdown;
pub mod tls;
pub mod wire;

pub use block::{BlockState, EntropyBlock};
pub use bundle::EntropyBundle;
pub use device::DeviceReader;
pub use error::{EntropyError, Result};
pub use hash::HashKind;
pub use pool::{EntropyPool, PoolHealth};
pub use shutdown::Shutdown;
pub use wire::Descriptor;

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
