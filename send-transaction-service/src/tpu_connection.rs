//! The transport seam: how wire bytes reach a leader.
//!
//! Connection management (UDP vs QUIC, connection caches, pacing) lives
//! outside this crate; the service only needs a way to push a batch at a
//! socket address.

use {ridgeline_sdk::transport::Result as TransportResult, std::net::SocketAddr};

pub trait TpuConnection: Send + Sync {
    fn send_wire_transaction_batch(
        &self,
        wire_transactions: &[&[u8]],
        tpu_address: &SocketAddr,
    ) -> TransportResult<()>;
}
