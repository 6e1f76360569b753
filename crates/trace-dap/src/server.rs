//! Session entry points.
//! - serve: accept one TCP client and debug it
//! - run_session: drive a provider through an already-connected transport

use std::net::TcpListener;

use tracing::info;

use crate::adapter::{DebugAdapter, TcpTransport, Transport};
use crate::config::AdapterConfig;
use crate::error::AdapterError;
use crate::trace::TraceProvider;

/// Accept a single client on `listener` and run one debug session.
pub fn serve(
    listener: &TcpListener,
    provider: &mut dyn TraceProvider,
    config: AdapterConfig,
) -> Result<(), AdapterError> {
    info!(addr = %listener.local_addr()?, "waiting for debug client");
    let (stream, peer) = listener.accept()?;
    info!(%peer, "debug client connected");
    run_session(TcpTransport::new(stream)?, provider, config);
    Ok(())
}

/// Setup handshake, then hand the adapter to the provider as its line hook.
pub fn run_session(
    transport: impl Transport + 'static,
    provider: &mut dyn TraceProvider,
    config: AdapterConfig,
) {
    let mut adapter = DebugAdapter::new(transport, config);
    adapter.start();
    if adapter.is_stopped() {
        return;
    }
    provider.run(&mut adapter);
    adapter.finish();
    info!("debug session finished");
}
