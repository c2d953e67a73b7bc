//! # Port Allocator
//!
//! Finds a TCP port that is free on the loopback interface right now. The
//! listener is dropped before returning, so another process may claim the
//! port before the container binds it.

use crate::error::{DrydockError, Result};
use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use tracing::debug;

/// Allocate a currently unused local TCP port
pub fn allocate_port() -> Result<u16> {
    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
        .map_err(|e| DrydockError::resource_allocation("port", e.to_string()))?;

    let port = listener
        .local_addr()
        .map_err(|e| DrydockError::resource_allocation("port", e.to_string()))?
        .port();

    drop(listener);
    debug!(port = port, "Allocated free local port");

    Ok(port)
}
