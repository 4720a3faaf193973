//! One-hop UDP transport to neighboring beacon servers.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tracing::trace;

use beacon_control::Sender;
use beacon_control::error::SendError;

/// [`Sender`] over the server's shared UDP socket.
#[derive(Clone)]
pub struct UdpSender {
    socket: Arc<UdpSocket>,
}

impl UdpSender {
    pub fn new(socket: Arc<UdpSocket>) -> Self {
        Self { socket }
    }
}

impl Sender for UdpSender {
    async fn send(&self, msg: Vec<u8>, addr: SocketAddr) -> Result<(), SendError> {
        let sent = self.socket.send_to(&msg, addr).await?;
        if sent != msg.len() {
            return Err(SendError::ShortWrite {
                sent,
                len: msg.len(),
            });
        }
        trace!("sent {} bytes to {addr}", msg.len());
        Ok(())
    }
}
