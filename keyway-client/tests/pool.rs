use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use keyway_client::{Config, Connect, ConnectionPool, TransportError};
use keyway_mtproto::transport;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, duplex};

struct Duplexes(Mutex<HashMap<i32, DuplexStream>>);

impl Connect for Duplexes {
    type Stream = DuplexStream;

    async fn connect(&self, dc: i32) -> Result<DuplexStream, TransportError> {
        self.0.lock().unwrap().remove(&dc).ok_or(TransportError::UnknownDc(dc))
    }
}

fn pool(dcs: &[i32]) -> (ConnectionPool<Duplexes>, HashMap<i32, DuplexStream>) {
    let mut clients = HashMap::new();
    let mut servers = HashMap::new();
    for &dc in dcs {
        let (client, server) = duplex(4096);
        clients.insert(dc, client);
        servers.insert(dc, server);
    }
    (ConnectionPool::new(Duplexes(Mutex::new(clients)), &Config::default()), servers)
}

#[tokio::test]
async fn default_dc_connection_is_reused() {
    let (pool, mut servers) = pool(&[2]);
    pool.queue(1, vec![1; 4 * 3], None).await.unwrap();
    // a second connect would fail: the fake has only one stream per DC
    pool.queue(2, vec![2; 4 * 3], Some(2)).await.unwrap();

    let server = servers.get_mut(&2).unwrap();
    let mut wire = [0u8; 1 + 2 * (1 + 12)];
    server.read_exact(&mut wire).await.unwrap();
    assert_eq!(wire[0], 0xef);
    assert_eq!(&wire[1..14], &[&[3u8][..], &[1; 12]].concat()[..]);
    assert_eq!(&wire[14..], &[&[3u8][..], &[2; 12]].concat()[..]);
}

#[tokio::test]
async fn frames_from_every_dc_reach_the_shared_queue() {
    let (pool, mut servers) = pool(&[2, 4]);
    pool.queue(1, vec![0; 4], Some(2)).await.unwrap();
    pool.queue(2, vec![0; 4], Some(4)).await.unwrap();

    for (dc, server) in servers.iter_mut() {
        server.write_all(&transport::frame(&vec![*dc as u8; 8]).unwrap()).await.unwrap();
    }

    let mut frames = pool.read().await;
    let mut got = vec![frames.next().await.unwrap().unwrap(), frames.next().await.unwrap().unwrap()];
    got.sort();
    assert_eq!(got, [vec![2; 8], vec![4; 8]]);
}

#[tokio::test]
async fn per_connection_order_is_kept() {
    let (pool, mut servers) = pool(&[2]);
    pool.queue(1, vec![0; 4], None).await.unwrap();

    let server = servers.get_mut(&2).unwrap();
    let mut wire = Vec::new();
    for i in 1..=5u8 {
        wire.extend(transport::frame(&[i; 8]).unwrap());
    }
    server.write_all(&wire).await.unwrap();

    for i in 1..=5u8 {
        assert_eq!(pool.read_single().await.unwrap(), vec![i; 8]);
    }
}

#[tokio::test]
async fn read_single_timeout_expires() {
    let (pool, _servers) = pool(&[2]);
    pool.queue(1, vec![0; 4], None).await.unwrap();
    let err = pool.read_single_timeout(Duration::from_millis(50)).await.unwrap_err();
    assert!(matches!(err, TransportError::Timeout));
}

#[tokio::test]
async fn unaligned_payload_is_refused_without_closing_the_dc() {
    let (pool, mut servers) = pool(&[2]);
    let err = pool.queue(1, vec![0; 5], None).await.unwrap_err();
    assert!(matches!(err, TransportError::Framing(_)));

    // the shared connection still carries other callers' traffic
    pool.queue(2, vec![6; 8], None).await.unwrap();
    let server = servers.get_mut(&2).unwrap();
    let mut wire = [0u8; 1 + 1 + 8];
    server.read_exact(&mut wire).await.unwrap();
    assert_eq!(wire, [0xef, 2, 6, 6, 6, 6, 6, 6, 6, 6]);
}

#[tokio::test]
async fn shutdown_closes_everything() {
    let (pool, _servers) = pool(&[2]);
    pool.queue(1, vec![0; 4], None).await.unwrap();
    pool.shutdown().await;

    assert!(matches!(pool.read_single().await, Err(TransportError::Closed)));
    assert!(matches!(pool.queue(2, vec![0; 4], None).await, Err(TransportError::Closed)));
}
