//! Load balancer binary.
//!
//! A trivial TLS responder: every connection gets the same fixed descriptor
//! pointing at the backing entropy server. No pool, no devices, no
//! dispatch — just the wire encoding of a `Descriptor` (§6).

use std::net::TcpListener;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use entropy_core::{defaults, shutdown::Shutdown, tls, wire::Descriptor};

/// Trivial load balancer: always points clients at the same entropy server.
#[derive(Parser, Debug)]
#[command(name = "entropy-balancer")]
struct Args {
    /// TCP port to accept TLS connections on.
    ssl_port: u16,
    /// PEM certificate file for the balancer's TLS identity.
    cert_file: String,
    /// PEM private key file for the balancer's TLS identity.
    key_file: String,
}

fn main() -> ExitCode {
    env_logger::init();
    rustls::crypto::ring::default_provider()
        .install_default()
        .ok();
    let args = Args::parse();

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
    listener
        .set_nonblocking(true)
        .expect("set_nonblocking on listener");

    let shutdown = match Shutdown::install() {
        Ok(s) => s,
        Err(e) => {
            log::error!("failed to install signal handlers: {e}");
            return ExitCode::FAILURE;
        }
    };

    let descriptor = Descriptor::new(
        defaults::BALANCER_HOSTNAME,
        defaults::BALANCER_PORT,
        defaults::BALANCER_BLOCK_COUNT,
    )
    .expect("static balancer descriptor is always valid");

    log::info!(
        "entropy-balancer listening on {} -> {}:{}",
        args.ssl_port,
        descriptor.hostname,
        descriptor.port
    );

    while shutdown.is_runnable() {
        match listener.accept() {
            Ok((socket, addr)) => {
                socket.set_nonblocking(false).ok();
                let config = Arc::clone(&server_config);
                let descriptor = descriptor.clone();
                std::thread::spawn(move || {
                    if let Err(e) = handle_connection(socket, config, &descriptor) {
                        log::warn!("request from {addr} failed: {e}");
                    }
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(std::time::Duration::from_millis(100));
            }
            Err(e) => log::warn!("accept failed: {e}"),
        }
    }

    log::info!("entropy-balancer shut down cleanly");
    ExitCode::SUCCESS
}

fn handle_connection(
    socket: std::net::TcpStream,
    config: Arc<rustls::ServerConfig>,
    descriptor: &Descriptor,
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

    stream
        .write_all(&descriptor.encode())
        .map_err(|e| entropy_core::EntropyError::NetworkFailure(e.to_string()))?;
    Ok(())
}
