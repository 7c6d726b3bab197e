//! Entropy server binary.
//!
//! Owns one entropy pool, one refiller thread per serial device, and a TLS
//! accept loop that spawns one dispatcher per connection. Shuts down
//! cooperatively on SIGINT/SIGTERM/SIGQUIT/SIGTSTP.

use std::net::TcpListener;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use entropy_core::device::SerialDeviceReader;
use entropy_core::{bundle::EntropyBundle, defaults, dispatcher, hash::HashKind, pool::EntropyPool};
use entropy_core::{refiller, shutdown::Shutdown, tls};

/// Entropy distribution server: harvests bits from a serial device and
/// serves conditioned blocks over TLS.
#[derive(Parser, Debug)]
#[command(name = "entropy-server")]
struct Args {
    /// Serial port the entropy device is attached to (e.g. /dev/ttyUSB0).
    device_port_name: String,
    /// TCP port to accept TLS connections on.
    ssl_port: u16,
    /// PEM certificate file for the server's TLS identity.
    cert_file: String,
    /// PEM private key file for the server's TLS identity.
    key_file: String,
}

fn main() -> ExitCode {
    env_logger::init();
    rustls::crypto::ring::default_provider()
        .install_default()
        .ok();
    let args = Args::parse();

    let pool = match EntropyPool::new(
        defaults::POOL_SIZE,
        defaults::BLOCK_SIZE,
        defaults::THRESHOLD,
        HashKind::Sha512,
    ) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("pool construction failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let device = match SerialDeviceReader::open(&args.device_port_name, defaults::BAUD_RATE) {
        Ok(d) => d,
        Err(e) => {
            log::error!("failed to open device {}: {e}", args.device_port_name);
            return ExitCode::FAILURE;
        }
    };

    let server_config = match tls::server_config(&args.cert_file, &args.key_file) {
        Ok(c) => c,
        Err(e) => {
            log::error!("failed to load TLS identity: {e}");
            return ExitCode::FAILURE;
        }
    };

    let listener = match TcpListener::bind(("0.0.0.0", args.ssl_port)) {
        Ok(l) => l,
        Err(e) => {
            log::error!("failed to bind port {}: {e}", args.ssl_port);
            return ExitCode::FAILURE;
        }
    };

    let shutdown = match Shutdown::install() {
        Ok(s) => s,
        Err(e) => {
            log::error!("failed to install signal handlers: {e}");
            return ExitCode::FAILURE;
        }
    };

    log::info!(
        "entropy-server listening on {} with device {}",
        args.ssl_port,
        args.device_port_name
    );

    let refiller_handle = {
        let bundle = EntropyBundle::new(Arc::clone(&pool), Box::new(device));
        let sd = shutdown.clone();
        std::thread::spawn(move || refiller::run(bundle, &sd))
    };

    run_accept_loop(&listener, server_config, Arc::clone(&pool), &shutdown);

    shutdown.stop();
    if let Err(e) = refiller_handle.join() {
        log::error!("refiller thread panicked: {e:?}");
    }
    log::info!("entropy-server shut down cleanly");
    ExitCode::SUCCESS
}

fn run_accept_loop(
    listener: &TcpListener,
    server_config: Arc<rustls::ServerConfig>,
    pool: Arc<EntropyPool>,
    shutdown: &Shutdown,
) {
    listener
        .set_nonblocking(true)
        .expect("set_nonblocking on listener");

    while shutdown.is_runnable() {
        match listener.accept() {
            Ok((socket, addr)) => {
                socket.set_nonblocking(false).ok();
                let config = Arc::clone(&server_config);
                let pool = Arc::clone(&pool);
                let sd = shutdown.clone();
                std::thread::spawn(move || {
                    log::debug!("accepted connection from {addr}");
                    if let Err(e) = handle_connection(socket, config, &pool, &sd) {
                        log::warn!("request from {addr} failed: {e}");
                    }
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(std::time::Duration::from_millis(100));
            }
            Err(e) => {
                log::warn!("accept failed: {e}");
            }
        }
    }
}

fn handle_connection(
    socket: std::net::TcpStream,
    config: Arc<rustls::ServerConfig>,
    pool: &Arc<EntropyPool>,
    shutdown: &Shutdown,
) -> entropy_core::Result<()> {
    use std::io::{Read, Write};
    let conn = rustls::ServerConnection::new(config)
        .map_err(|e| entropy_core::EntropyError::NetworkFailure(e.to_string()))?;
    let mut stream = rustls::StreamOwned::new(conn, socket);

    let mut greeting = vec![0u8; defaults::CONNECTION_BUFFER_SIZE];
    let n = stream
        .read(&mut greeting)
        .map_err(|e| entropy_core::EntropyError::NetworkFailure(e.to_string()))?;
    log::debug!("received {n}-byte greeting");

    let mut content = dispatcher::dispatch(pool, defaults::WIRE_PAYLOAD_LEN, shutdown)?;
    if let Some(last) = content.last_mut() {
        *last = 0;
    }

    stream
        .write_all(&content)
        .map_err(|e| entropy_core::EntropyError::NetworkFailure(e.to_string()))?;
    Ok(())
}
