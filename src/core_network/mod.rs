pub mod pasv;

use log::{debug, info};
use std::net::IpAddr;
use tokio::net::{lookup_host, TcpStream};

use crate::core_transfer::error::TransferError;

/// Resolves a hostname to a single numeric address, preferring IPv4.
pub async fn resolve(hostname: &str) -> Result<IpAddr, TransferError> {
    let addresses: Vec<IpAddr> = lookup_host((hostname, 0))
        .await
        .map_err(|e| TransferError::Resolution(format!("{}: {}", hostname, e)))?
        .map(|addr| addr.ip())
        .collect();

    let address = addresses
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addresses.first())
        .copied()
        .ok_or_else(|| TransferError::Resolution(format!("{}: no addresses found", hostname)))?;

    info!("Resolved IP address: {}", address);
    Ok(address)
}

/// Opens a TCP connection to the given address and port.
pub async fn connect(address: IpAddr, port: u16) -> Result<TcpStream, TransferError> {
    let endpoint = format!("{}:{}", address, port);
    let stream = TcpStream::connect((address, port))
        .await
        .map_err(|source| TransferError::Connection {
            endpoint: endpoint.clone(),
            source,
        })?;
    debug!("Connected to {}", endpoint);
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_numeric_addresses() {
        let address = resolve("127.0.0.1").await.unwrap();
        assert_eq!(address.to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn resolution_failure_is_reported() {
        let err = resolve("nonexistent.invalid").await.unwrap_err();
        assert!(matches!(err, TransferError::Resolution(_)));
    }

    #[tokio::test]
    async fn connect_refused_is_a_connection_error() {
        // Bind then drop to get a port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = connect(addr.ip(), addr.port()).await.unwrap_err();
        assert!(matches!(err, TransferError::Connection { .. }));
    }
}
