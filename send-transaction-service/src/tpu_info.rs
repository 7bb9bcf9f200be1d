//! The gossip-table view the forwarding service consumes.

use {ridgeline_sdk::pubkey::Pubkey, std::net::SocketAddr};

pub trait TpuInfo {
    /// Re-read the cluster contact table; leaders come and go as gossip
    /// propagates.
    fn refresh_recent_peers(&mut self);

    /// The TPU socket a leader accepts transactions on, if gossip knows one.
    fn tpu_socket_addr(&self, leader: &Pubkey) -> Option<SocketAddr>;
}

/// A `TpuInfo` that knows no peers; every leader lookup misses.
#[derive(Clone)]
pub struct NullTpuInfo;

impl TpuInfo for NullTpuInfo {
    fn refresh_recent_peers(&mut self) {}

    fn tpu_socket_addr(&self, _leader: &Pubkey) -> Option<SocketAddr> {
        None
    }
}
