//! UDP datagram sender.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use regbridge_pipeline::{DatagramSender, TransportError};
use tokio::net::UdpSocket;
use tracing::info;

/// Sends each payload as one datagram to a fixed destination.
pub struct UdpSender {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpSender {
    /// Resolve the destination once and bind an ephemeral local socket.
    pub async fn bind(host: &str, port: u16) -> Result<Self, TransportError> {
        let target = tokio::net::lookup_host((host, port))
            .await?
            .next()
            .ok_or_else(|| TransportError::Protocol(format!("No address found for {}", host)))?;

        let local: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await?;

        info!(%target, "UDP sender ready");
        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl DatagramSender for UdpSender {
    async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let sent = self.socket.send_to(payload, self.target).await?;
        if sent != payload.len() {
            return Err(TransportError::ShortSend {
                sent,
                expected: payload.len(),
            });
        }
        Ok(())
    }
}
