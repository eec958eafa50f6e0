//! Async MTProto auth key generation.
//!
//! * [`Connection`]: abridged framing over any tokio byte stream, with
//!   independent send and receive tasks
//! * [`ConnectionPool`]: one shared connection per DC, inbound frames merged
//!   into one queue
//! * [`AuthKeyGenerator`]: walks the handshake states over the pool
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), keyway_client::AuthError> {
//! let config = keyway_client::Config::default();
//! let (auth_key, salt) = keyway_client::generate_auth_key(&config).await?;
//! println!("salt {salt}, key starts {:02x?}", &auth_key[..8]);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

mod auth;
mod config;
pub mod connection;
pub mod dc_pool;
mod errors;

use std::sync::Arc;

pub use auth::AuthKeyGenerator;
pub use config::{Config, PRODUCTION_DCS, TEST_DCS};
pub use connection::Connection;
pub use dc_pool::{Connect, ConnectionPool, TcpConnector};
pub use errors::{AuthError, TransportError};
pub use keyway_mtproto::ErrorKind;

/// Connect to `config.dc` over TCP, run one handshake and close the pool.
pub async fn generate_auth_key(config: &Config) -> Result<([u8; 256], i64), AuthError> {
    let pool = Arc::new(ConnectionPool::tcp(config));
    let result = AuthKeyGenerator::new(Arc::clone(&pool), config).get_key().await;
    pool.shutdown().await;
    result
}
