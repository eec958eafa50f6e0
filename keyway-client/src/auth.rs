//! Drives the auth key exchange over a [`ConnectionPool`].

use std::sync::Arc;
use std::time::Duration;

use keyway_crypto::rsa::{KeyRing, KeyStore};
use keyway_mtproto::authentication::{self as auth, AuthPayload, AuthState};
use keyway_mtproto::{BufferPool, MsgIdClock, OsRandom, RandomSource, UnsecuredMessage};
use keyway_tl_types::{Serializable, TlObject};

use crate::dc_pool::{Connect, ConnectionPool, TcpConnector};
use crate::{AuthError, Config};

/// Runs one handshake per [`get_key`](Self::get_key) call.
pub struct AuthKeyGenerator<C: Connect = TcpConnector> {
    pool: Arc<ConnectionPool<C>>,
    clock: Arc<MsgIdClock>,
    buffers: Arc<BufferPool>,
    rng: Arc<dyn RandomSource>,
    keys: Arc<dyn KeyStore>,
    dc: Option<i32>,
    announce_dc: bool,
    recv_timeout: Duration,
}

impl<C: Connect> AuthKeyGenerator<C> {
    /// A generator using OS randomness and the built-in server keys.
    pub fn new(pool: Arc<ConnectionPool<C>>, config: &Config) -> Self {
        Self {
            pool,
            clock: Arc::new(MsgIdClock::new()),
            buffers: BufferPool::new(),
            rng: Arc::new(OsRandom),
            keys: Arc::new(KeyRing::builtin()),
            dc: None,
            announce_dc: false,
            recv_timeout: config.recv_timeout,
        }
    }

    pub fn with_random(mut self, rng: Arc<dyn RandomSource>) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_key_store(mut self, keys: Arc<dyn KeyStore>) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_clock(mut self, clock: Arc<MsgIdClock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run the exchange with `dc` instead of the pool's default DC.
    pub fn with_dc(mut self, dc: i32) -> Self {
        self.dc = Some(dc);
        self
    }

    /// Name the target DC inside the encrypted inner data (`p_q_inner_data_dc`).
    pub fn announce_dc(mut self, yes: bool) -> Self {
        self.announce_dc = yes;
        self
    }

    pub fn clock(&self) -> &Arc<MsgIdClock> {
        &self.clock
    }

    /// Perform a full exchange and return the auth key and first salt.
    ///
    /// Frames left in the pool by an earlier attempt are discarded first.
    pub async fn get_key(&self) -> Result<([u8; 256], i64), AuthError> {
        let dc = self.dc.unwrap_or(self.pool.default_dc());
        self.pool.drain().await;
        let mut payload = AuthPayload::new(self.announce_dc.then_some(dc));
        let rng = self.rng.as_ref();

        tracing::info!("[auth] Generating auth key on DC{dc} …");
        let mut state = AuthState::ReqPq;
        while state != AuthState::End {
            tracing::debug!("[auth] {state:?}");
            match state {
                AuthState::ReqPq => {
                    let req = auth::req_pq(&mut payload, rng)?;
                    self.send(&req, dc).await?;
                }
                AuthState::ResPq => {
                    let msg = self.receive().await?;
                    auth::res_pq(&mut payload, msg.content())?;
                    msg.release();
                }
                AuthState::ReqDh => {
                    let req = auth::req_dh(&mut payload, rng, self.keys.as_ref())?;
                    self.send(&req, dc).await?;
                }
                AuthState::ResDh => {
                    let msg = self.receive().await?;
                    auth::res_dh(&mut payload, msg.content(), rng)?;
                    msg.release();
                }
                AuthState::SetDh => {
                    let req = auth::set_dh(&mut payload, rng)?;
                    self.send(&req, dc).await?;
                }
                AuthState::DhGenCheck => {
                    let msg = self.receive().await?;
                    auth::dh_gen_check(&mut payload, msg.content())?;
                    msg.release();
                }
                AuthState::End => {}
            }
            state = state.next();
        }

        let (key, salt) = auth::finish(&payload)?;
        tracing::info!("[auth] Auth key ready ✓ (DC{dc})");
        Ok((key, salt))
    }

    async fn send<T: TlObject + Serializable>(&self, obj: &T, dc: i32) -> Result<(), AuthError> {
        let msg = UnsecuredMessage::from_object(obj, &self.clock, &self.buffers)?;
        tracing::trace!("[auth] >>\n{msg}");
        self.pool.queue(msg.msg_id(), msg.as_bytes().to_vec(), Some(dc)).await?;
        msg.release();
        Ok(())
    }

    async fn receive(&self) -> Result<UnsecuredMessage, AuthError> {
        let bytes = self.pool.read_single_timeout(self.recv_timeout).await?;
        let msg = UnsecuredMessage::from_bytes(&bytes, &self.clock, &self.buffers)?;
        tracing::trace!("[auth] <<\n{msg}");
        Ok(msg)
    }
}
