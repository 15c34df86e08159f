//! Tunnel address allocation
//!
//! A bounded pool over the configured subnet, with acquire/release
//! serialized through a single mutex so concurrent provisioning requests
//! can never be handed the same address. The network address, the first
//! host (reserved for the server) and the broadcast address are excluded.

use crate::{Error, Result};
use ipnetwork::Ipv4Network;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use tracing::debug;

pub struct AddressPool {
    subnet: Ipv4Network,
    free: Mutex<BTreeSet<u32>>,
}

impl AddressPool {
    pub fn new(subnet: Ipv4Network) -> Result<Self> {
        let network = u32::from(subnet.network());
        let broadcast = u32::from(subnet.broadcast());

        // First usable client address is network + 2 (server holds +1).
        let free: BTreeSet<u32> = (network.saturating_add(2)..broadcast).collect();
        if free.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "subnet {} has no assignable client addresses",
                subnet
            )));
        }

        Ok(Self {
            subnet,
            free: Mutex::new(free),
        })
    }

    /// The server's own address inside the subnet.
    pub fn server_address(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.subnet.network()) + 1)
    }

    /// Reserve the lowest free address.
    pub fn acquire(&self) -> Result<Ipv4Addr> {
        let mut free = self.free.lock();
        let ip = free.pop_first().ok_or(Error::AddressPoolExhausted)?;
        let addr = Ipv4Addr::from(ip);
        debug!(%addr, remaining = free.len(), "acquired tunnel address");
        Ok(addr)
    }

    /// Return an address to the pool. Addresses outside the assignable
    /// range are ignored.
    pub fn release(&self, addr: Ipv4Addr) {
        let value = u32::from(addr);
        let network = u32::from(self.subnet.network());
        let broadcast = u32::from(self.subnet.broadcast());
        if value > network + 1 && value < broadcast {
            self.free.lock().insert(value);
            debug!(%addr, "released tunnel address");
        }
    }

    pub fn available(&self) -> usize {
        self.free.lock().len()
    }
}
