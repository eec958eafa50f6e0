//! Generate an auth key against a Telegram datacenter and print it.
//!
//! ```text
//! cargo run -p keyway-connect -- 2
//! KEYWAY_PRODUCTION=1 KEYWAY_TIMEOUT_SECS=30 cargo run -p keyway-connect
//! ```
//!
//! The DC comes from the first argument, then `KEYWAY_DC`, then the default (2).
//! Test datacenters are used unless `KEYWAY_PRODUCTION` is set.

use std::time::{Duration, Instant};

use keyway_client::Config;
use keyway_crypto::AuthKey;

#[tokio::main]
async fn main() {
    if std::env::var("RUST_LOG").is_err() {
        // SAFETY: no other threads are reading the environment yet
        unsafe { std::env::set_var("RUST_LOG", "keyway_client=info,keyway_connect=info"); }
    }
    env_logger::init();

    if let Err(e) = run().await {
        eprintln!("✗ {e}");
        std::process::exit(1);
    }
}

fn config() -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match std::env::var_os("KEYWAY_PRODUCTION") {
        Some(_) => Config::production(),
        None => Config::default(),
    };

    if let Some(dc) = std::env::args().nth(1).or_else(|| std::env::var("KEYWAY_DC").ok()) {
        config.dc = dc.parse().map_err(|e| format!("invalid DC id {dc:?}: {e}"))?;
    }
    if let Ok(secs) = std::env::var("KEYWAY_TIMEOUT_SECS") {
        let secs: u64 = secs.parse().map_err(|e| format!("invalid KEYWAY_TIMEOUT_SECS {secs:?}: {e}"))?;
        config.recv_timeout = Duration::from_secs(secs);
    }
    Ok(config)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = config()?;
    let addr = config.dc_addr(config.dc)?;
    log::info!("[connect] DC{} at {addr}", config.dc);

    let started = Instant::now();
    let (key, salt) = keyway_client::generate_auth_key(&config).await?;
    let key = AuthKey::from_bytes(key);

    println!("✓ Auth key generated in {:.2?}", started.elapsed());
    println!("  key_id      = {:016x}", u64::from_le_bytes(key.key_id()));
    println!("  first_salt  = {salt}");
    println!("  auth_key    = {:02x?}…", &key.to_bytes()[..8]);
    Ok(())
}
