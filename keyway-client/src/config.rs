//! Connection settings and the datacenter address table.

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use crate::TransportError;

const PORT: u16 = 443;

/// Telegram's test datacenters.
pub const TEST_DCS: &[(i32, Ipv4Addr)] = &[
    (1, Ipv4Addr::new(149, 154, 175, 10)),
    (2, Ipv4Addr::new(149, 154, 167, 40)),
    (3, Ipv4Addr::new(149, 154, 175, 117)),
];

/// Telegram's production datacenters.
pub const PRODUCTION_DCS: &[(i32, Ipv4Addr)] = &[
    (1, Ipv4Addr::new(149, 154, 175, 53)),
    (2, Ipv4Addr::new(149, 154, 167, 51)),
    (3, Ipv4Addr::new(149, 154, 175, 100)),
    (4, Ipv4Addr::new(149, 154, 167, 91)),
    (5, Ipv4Addr::new(91, 108, 56, 130)),
];

/// Settings for the pool and the handshake driver.
#[derive(Clone, Debug)]
pub struct Config {
    /// DC used when a caller does not name one.
    pub dc: i32,
    pub dcs: HashMap<i32, SocketAddr>,
    /// Upper bound on every wait for an inbound frame.
    pub recv_timeout: Duration,
    pub connect_timeout: Duration,
    /// Size of each connection's socket read buffer.
    pub read_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dc: 2,
            dcs: table(TEST_DCS),
            recv_timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(10),
            read_buffer: 1 << 16,
        }
    }
}

fn table(entries: &[(i32, Ipv4Addr)]) -> HashMap<i32, SocketAddr> {
    entries.iter().map(|&(id, ip)| (id, SocketAddr::V4(SocketAddrV4::new(ip, PORT)))).collect()
}

impl Config {
    /// Defaults, pointed at the production datacenters.
    pub fn production() -> Self {
        Self { dcs: table(PRODUCTION_DCS), ..Self::default() }
    }

    pub fn dc_addr(&self, dc: i32) -> Result<SocketAddr, TransportError> {
        self.dcs.get(&dc).copied().ok_or(TransportError::UnknownDc(dc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_test_dc2() {
        let config = Config::default();
        assert_eq!(config.dc, 2);
        assert_eq!(config.dc_addr(2).unwrap(), "149.154.167.40:443".parse().unwrap());
    }

    #[test]
    fn unknown_dc_is_an_error() {
        let config = Config::production();
        assert!(config.dc_addr(5).is_ok());
        assert!(matches!(config.dc_addr(9), Err(TransportError::UnknownDc(9))));
    }
}
