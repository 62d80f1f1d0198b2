//! Collaborator seams: the device register reader and the datagram sender.

use std::future::Future;

use crate::error::TransportError;

/// Reads single 16-bit registers from the polled device.
///
/// The pipeline never issues more than one read at a time.
pub trait RegisterReader: Send {
    /// Read one raw register value.
    fn read_register(
        &mut self,
        address: u16,
    ) -> impl Future<Output = Result<u16, TransportError>> + Send;
}

/// Sends one encoded batch per call over a best-effort transport.
pub trait DatagramSender: Send {
    /// Send one payload. A failure loses the payload.
    fn send(&mut self, payload: &[u8]) -> impl Future<Output = Result<(), TransportError>> + Send;
}
