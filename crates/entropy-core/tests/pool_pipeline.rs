//! Integration coverage of the producer-consumer pipeline across threads:
//! concurrent refill and dispatch (S3), mid-read shutdown (S4), and device
//! failure (S5).

use std::time::Duration;

use entropy_core::block::BlockState;
use entropy_core::defaults;
use entropy_core::device::DeviceReader;
use entropy_core::error::Result;
use entropy_core::hash::HashKind;
use entropy_core::pool::EntropyPool;
use entropy_core::shutdown::Shutdown;
use entropy_core::{bundle::EntropyBundle, dispatcher, refiller};

struct CountingDevice {
    name: String,
    counter: u64,
}

impl CountingDevice {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            counter: 0,
        }
    }
}

impl DeviceReader for CountingDevice {
    fn read_chunk(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut out = vec![0u8; n];
        for slot in out.iter_mut().take(n - 1) {
            self.counter = self.counter.wrapping_add(1);
            *slot = (self.counter % 251) as u8;
        }
        out[n - 1] = 0;
        Ok(out)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

struct FailOnceDevice {
    name: String,
    failed: bool,
}

impl DeviceReader for FailOnceDevice {
    fn read_chunk(&mut self, _n: usize) -> Result<Vec<u8>> {
        self.failed = true;
        Err(entropy_core::error::EntropyError::DeviceFailure(format!(
            "{} disconnected",
            self.name
        )))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[test]
fn s3_concurrent_refill_and_dispatch_preserves_index_conservation() {
    let pool_size = 4;
    let pool = EntropyPool::new(pool_size, 16, defaults::THRESHOLD, HashKind::Sha512).unwrap();
    let shutdown = Shutdown::manual();

    let mut handles = Vec::new();
    for n in 0..2 {
        let bundle = EntropyBundle::new(
            pool.clone(),
            Box::new(CountingDevice::new(&format!("dev{n}"))),
        );
        let sd = shutdown.clone();
        handles.push(std::thread::spawn(move || refiller::run(bundle, &sd)));
    }

    let mut served = 0;
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while served < 10 && std::time::Instant::now() < deadline {
        if let Ok(out) = dispatcher::dispatch(&pool, 16, &shutdown) {
            assert_eq!(out.len(), 16);
            served += 1;
        }
    }
    assert_eq!(served, 10, "expected all ten dispatcher requests to be served");

    shutdown.stop();
    for h in handles {
        h.join().unwrap();
    }

    let health = pool.health().unwrap();
    assert_eq!(health.total, pool_size);
    assert_eq!(health.dirty + health.clean, pool_size);
}

#[test]
fn s4_shutdown_mid_refill_lets_worker_exit_without_abandoning_the_lock() {
    let pool = EntropyPool::new(1, 16, defaults::THRESHOLD, HashKind::Sha512).unwrap();
    let bundle = EntropyBundle::new(pool.clone(), Box::new(CountingDevice::new("dev0")));
    let shutdown = Shutdown::manual();

    let sd = shutdown.clone();
    let handle = std::thread::spawn(move || refiller::run(bundle, &sd));

    std::thread::sleep(Duration::from_millis(50));
    shutdown.stop();
    handle.join().unwrap();

    // The block's lock must be acquirable after the worker exits — it was
    // never abandoned mid-critical-section.
    let _guard = pool.block(0).lock().unwrap();
}

#[test]
fn s5_device_failure_drops_block_and_pool_keeps_running() {
    let pool = EntropyPool::new(2, 16, defaults::THRESHOLD, HashKind::Sha512).unwrap();
    let mut bundle = EntropyBundle::new(
        pool.clone(),
        Box::new(FailOnceDevice {
            name: "flaky0".to_string(),
            failed: false,
        }),
    );

    let idx = bundle.pool.take_dirty().unwrap().unwrap();
    let block_mutex = bundle.pool.block(idx);
    let result = {
        let mut block = block_mutex.lock().unwrap();
        assert_eq!(block.state(), BlockState::Dirty);
        let read = bundle.device.read_chunk(8);
        match read {
            Ok(data) => block.update(&data),
            Err(e) => Err(e),
        }
    };
    assert!(result.is_err());
    bundle.pool.drop_index(idx).unwrap();

    let health = bundle.pool.health().unwrap();
    assert_eq!(health.lost, 1);
    assert_eq!(health.total, 2);
    assert_eq!(health.dirty, 1);
}
