use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use keyway_client::{AuthError, AuthKeyGenerator, Config, Connect, ConnectionPool, ErrorKind, TransportError};
use keyway_crypto::rsa::KeyRing;
use keyway_mtproto::random::{RandomError, RandomSource};
use keyway_mtproto::transport::{self, FrameDecoder};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, duplex};
use tokio::sync::oneshot;

include!("../../keyway-mtproto/tests/fixtures/recorded.rs");

fn unhex(s: &str) -> Vec<u8> {
    (0..s.len()).step_by(2).map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap()).collect()
}

struct Scripted(Mutex<VecDeque<Vec<u8>>>);

impl Scripted {
    fn recorded() -> Arc<Self> {
        let step2 = unhex(STEP2_RANDOM);
        let step3 = unhex(STEP3_RANDOM);
        Arc::new(Self(Mutex::new(VecDeque::from([
            unhex(STEP1_RANDOM),
            step2[..32].to_vec(),
            vec![0; 255],
            step3[..256].to_vec(),
            step3[256..].to_vec(),
        ]))))
    }
}

impl RandomSource for Scripted {
    fn fill(&self, buf: &mut [u8]) -> Result<(), RandomError> {
        let chunk = self.0.lock().unwrap().pop_front().ok_or_else(|| RandomError("script exhausted".into()))?;
        buf.copy_from_slice(&chunk[..buf.len()]);
        Ok(())
    }
}

/// Hands out one pre-made in-memory stream per DC.
struct Duplexes(Mutex<HashMap<i32, DuplexStream>>);

impl Connect for Duplexes {
    type Stream = DuplexStream;

    async fn connect(&self, dc: i32) -> Result<DuplexStream, TransportError> {
        self.0.lock().unwrap().remove(&dc).ok_or(TransportError::UnknownDc(dc))
    }
}

fn pool_with_server(config: &Config) -> (Arc<ConnectionPool<Duplexes>>, DuplexStream) {
    let (client, server) = duplex(1 << 16);
    let connector = Duplexes(Mutex::new(HashMap::from([(config.dc, client)])));
    (Arc::new(ConnectionPool::new(connector, config)), server)
}

fn config() -> Config {
    Config { recv_timeout: Duration::from_secs(5), ..Config::default() }
}

async fn read_request(stream: &mut DuplexStream, decoder: &mut FrameDecoder) -> Vec<u8> {
    let mut buf = [0u8; 512];
    loop {
        if let Some(frame) = decoder.next_frame().unwrap() {
            assert_eq!(&frame[..8], &[0; 8], "requests must be unsecured");
            return frame[20..].to_vec();
        }
        let n = stream.read(&mut buf).await.unwrap();
        assert!(n > 0, "client hung up");
        decoder.push(&buf[..n]);
    }
}

async fn answer(stream: &mut DuplexStream, seq: i64, content: &[u8]) {
    let mut msg = vec![0u8; 8];
    msg.extend_from_slice(&((1693436740i64 << 32) | (seq * 4 + 1)).to_le_bytes());
    msg.extend_from_slice(&(content.len() as i32).to_le_bytes());
    msg.extend_from_slice(content);
    stream.write_all(&transport::frame(&msg).unwrap()).await.unwrap();
}

/// Expects the marker, then answers each request in turn with `answers`.
async fn serve(mut stream: DuplexStream, answers: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
    let mut marker = [0u8; 1];
    stream.read_exact(&mut marker).await.unwrap();
    assert_eq!(marker[0], 0xef);

    let mut decoder = FrameDecoder::new();
    let mut requests = Vec::new();
    for (seq, content) in answers.iter().enumerate() {
        requests.push(read_request(&mut stream, &mut decoder).await);
        answer(&mut stream, seq as i64, content).await;
    }
    requests
}

#[tokio::test]
async fn recorded_exchange_over_pool() {
    let config = config();
    let (pool, server) = pool_with_server(&config);
    let server = tokio::spawn(serve(
        server,
        vec![unhex(STEP1_RESPONSE), unhex(STEP2_RESPONSE), unhex(STEP3_RESPONSE)],
    ));

    let generator = AuthKeyGenerator::new(Arc::clone(&pool), &config).with_random(Scripted::recorded());
    let (key, salt) = generator.get_key().await.unwrap();

    assert_eq!(key.to_vec(), unhex(EXPECTED_AUTH_KEY));
    assert_eq!(salt, EXPECTED_SALT);

    let requests = server.await.unwrap();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0], unhex(STEP1_REQUEST));
    assert_eq!(requests[2], unhex(STEP3_REQUEST));
    // the server's message ids moved the clock onto its time
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64;
    assert!((now + generator.clock().offset() - 1693436740).abs() <= 1);

    pool.shutdown().await;
}

#[tokio::test]
async fn transport_error_code_fails_the_exchange() {
    let config = config();
    let (pool, mut server) = pool_with_server(&config);
    tokio::spawn(async move {
        let mut head = [0u8; 1 + 1 + 40];
        server.read_exact(&mut head).await.unwrap();
        server.write_all(&transport::frame(&(-404i32).to_le_bytes()).unwrap()).await.unwrap();
        server
    });

    let err = AuthKeyGenerator::new(pool, &config).get_key().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportFailure);
    assert!(matches!(err, AuthError::Transport(TransportError::Code(-404))));
}

#[tokio::test]
async fn silent_server_times_out() {
    let config = Config { recv_timeout: Duration::from_millis(100), ..Config::default() };
    let (pool, server) = pool_with_server(&config);

    let err = AuthKeyGenerator::new(pool, &config).get_key().await.unwrap_err();
    assert!(matches!(err, AuthError::Transport(TransportError::Timeout)));
    drop(server);
}

#[tokio::test]
async fn retry_ignores_late_answer_to_failed_attempt() {
    let config = Config { recv_timeout: Duration::from_millis(500), ..Config::default() };
    let (pool, mut server) = pool_with_server(&config);
    let (failed_tx, failed_rx) = oneshot::channel();
    let (late_tx, late_rx) = oneshot::channel();

    let server = tokio::spawn(async move {
        let mut marker = [0u8; 1];
        server.read_exact(&mut marker).await.unwrap();
        let mut decoder = FrameDecoder::new();

        // first attempt: answer only after the client gave up
        read_request(&mut server, &mut decoder).await;
        failed_rx.await.unwrap();
        let mut late = unhex(STEP1_RESPONSE);
        late[4] ^= 0xff;
        answer(&mut server, 0, &late).await;
        late_tx.send(()).unwrap();

        for (seq, content) in [STEP1_RESPONSE, STEP2_RESPONSE, STEP3_RESPONSE].into_iter().enumerate() {
            read_request(&mut server, &mut decoder).await;
            answer(&mut server, seq as i64 + 1, &unhex(content)).await;
        }
    });

    let rng = Scripted::recorded();
    rng.0.lock().unwrap().push_front(vec![9; 16]);
    let generator = AuthKeyGenerator::new(Arc::clone(&pool), &config).with_random(rng);

    let err = generator.get_key().await.unwrap_err();
    assert!(matches!(err, AuthError::Transport(TransportError::Timeout)));
    failed_tx.send(()).unwrap();
    late_rx.await.unwrap();
    // let the late frame reach the pool-wide queue
    tokio::time::sleep(Duration::from_millis(100)).await;

    let (key, salt) = generator.get_key().await.unwrap();
    assert_eq!(key.to_vec(), unhex(EXPECTED_AUTH_KEY));
    assert_eq!(salt, EXPECTED_SALT);

    server.await.unwrap();
    pool.shutdown().await;
}

#[tokio::test]
async fn foreign_nonce_is_a_protocol_violation() {
    let config = config();
    let (pool, server) = pool_with_server(&config);
    tokio::spawn(serve(server, vec![unhex(STEP1_RESPONSE)]));

    // OS randomness cannot reproduce the recorded nonce
    let err = AuthKeyGenerator::new(pool, &config).get_key().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
}

#[tokio::test]
async fn unknown_server_key() {
    let config = config();
    let (pool, server) = pool_with_server(&config);
    tokio::spawn(serve(server, vec![unhex(STEP1_RESPONSE)]));

    let err = AuthKeyGenerator::new(pool, &config)
        .with_random(Scripted::recorded())
        .with_key_store(Arc::new(KeyRing::default()))
        .get_key()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::KeyNotFound);
}

#[tokio::test]
async fn unreachable_dc() {
    let config = config();
    let (pool, _server) = pool_with_server(&config);

    let err = AuthKeyGenerator::new(pool, &config).with_dc(4).get_key().await.unwrap_err();
    assert!(matches!(err, AuthError::Transport(TransportError::UnknownDc(4))));
}
