//! Entropy client binary.
//!
//! Connects to a load balancer, receives a descriptor pointing at an
//! entropy server, fetches one block of conditioned bytes, and reseeds the
//! kernel entropy pool (`/dev/urandom`) with them. Optionally seeds the
//! kernel pool from a local file first.

use std::io::Read;
use std::process::ExitCode;

use clap::Parser;

use entropy_core::error::{EntropyError, Result};
use entropy_core::tls::{client_config, SecureClientStream, SecureStream};
use entropy_core::wire::{Descriptor, DESCRIPTOR_LEN};
use entropy_core::defaults;

const KERNEL_ENTROPY_POOL: &str = "/dev/urandom";
const ENTROPY_FILE_BUFFER_SIZE: usize = 2048;
const GREETING: &[u8] = b"Hello";

/// Fetches one block of conditioned entropy via a load balancer and
/// reseeds the kernel entropy pool.
#[derive(Parser, Debug)]
#[command(name = "entropy-client")]
struct Args {
    /// Hostname of the load balancer.
    lb_hostname: String,
    /// TCP port of the load balancer.
    lb_port: u16,
    /// Optional local file whose contents seed /dev/urandom before the
    /// network exchange.
    entropy_file: Option<String>,
}

fn main() -> ExitCode {
    env_logger::init();
    rustls::crypto::ring::default_provider()
        .install_default()
        .ok();
    let args = Args::parse();

    if let Some(path) = &args.entropy_file {
        if let Err(e) = seed_from_file(path) {
            log::warn!("failed to seed from {path}: {e}");
        }
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = client_config()?;

    let descriptor = fetch_descriptor(&args.lb_hostname, args.lb_port, config.clone())?;
    log::info!(
        "load balancer pointed us at {}:{} (advertised block_count={})",
        descriptor.hostname,
        descriptor.port,
        descriptor.block_count
    );

    let content = fetch_entropy(&descriptor, config)?;
    write_kernel_pool(&content)?;
    log::info!("reseeded {KERNEL_ENTROPY_POOL} with {} bytes", content.len());
    Ok(())
}

fn fetch_descriptor(
    host: &str,
    port: u16,
    config: std::sync::Arc<rustls::ClientConfig>,
) -> Result<Descriptor> {
    let mut stream = SecureClientStream::connect(host, port, config)?;
    stream.write_buf(GREETING)?;

    let mut buf = [0u8; DESCRIPTOR_LEN];
    read_exact(&mut stream, &mut buf)?;
    Descriptor::decode(&buf)
}

fn fetch_entropy(
    descriptor: &Descriptor,
    config: std::sync::Arc<rustls::ClientConfig>,
) -> Result<Vec<u8>> {
    let mut stream =
        SecureClientStream::connect(&descriptor.hostname, descriptor.port as u16, config)?;
    stream.write_buf(GREETING)?;

    let mut buf = vec![0u8; defaults::CONNECTION_BUFFER_SIZE];
    let n = stream.read_buf(&mut buf)?;
    buf.truncate(n);
    Ok(buf)
}

/// Read exactly `buf.len()` bytes, looping over short reads.
fn read_exact(stream: &mut SecureClientStream, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = stream.read_buf(&mut buf[filled..])?;
        if n == 0 {
            return Err(EntropyError::NetworkFailure(
                "connection closed before descriptor was fully read".into(),
            ));
        }
        filled += n;
    }
    Ok(())
}

fn seed_from_file(path: &str) -> Result<()> {
    let mut file = std::fs::File::open(path).map_err(EntropyError::from)?;
    let mut buf = vec![0u8; ENTROPY_FILE_BUFFER_SIZE];
    let n = file.read(&mut buf).map_err(EntropyError::from)?;
    buf.truncate(n);
    write_kernel_pool(&buf)
}

/// Write the full buffer to `/dev/urandom`, advancing past each partial
/// write rather than re-submitting the whole buffer (the reference
/// implementation's loop re-submits unconditionally and can overshoot on
/// partial writes; this advances the offset by the actual bytes written).
/// Opened `O_NONBLOCK`, matching the reference client's open flags.
fn write_kernel_pool(buf: &[u8]) -> Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(KERNEL_ENTROPY_POOL)
        .map_err(EntropyError::from)?;

    let mut written = 0;
    while written < buf.len() {
        let n = file.write(&buf[written..]).map_err(EntropyError::from)?;
        if n == 0 {
            return Err(EntropyError::NetworkFailure(format!(
                "short write to {KERNEL_ENTROPY_POOL}"
            )));
        }
        written += n;
    }
    Ok(())
}
