//! Sans-IO auth key exchange.
//!
//! The exchange is a fixed sequence of [`AuthState`]s. Each state has one
//! handler that reads and extends an [`AuthPayload`]: outbound states return
//! the request to send, inbound states consume the content of the server's
//! answer. The caller owns the socket and the loop:
//!
//! ```text
//! ReqPq  ──req_pq_multi──▶  ResPq  ◀──resPQ
//! ReqDh  ──req_DH_params──▶ ResDh  ◀──server_DH_params_ok
//! SetDh  ──set_client_DH_params──▶ DhGenCheck ◀──dh_gen_ok
//! End    → finish() yields (auth_key, salt)
//! ```

use std::fmt;

use keyway_crypto::rsa::{self, KeyStore};
use keyway_crypto::{AuthKey, FactorizeError, aes, factorize, generate_key_data_from_nonce, sha1};
use keyway_tl_types::mtproto::{
    ClientDhInnerData, PqInner, PqInnerData, PqInnerDataDc, ReqDhParams, ReqPqMulti, ResPq,
    ServerDhInnerData, ServerDhParams, SetClientDhParams, SetClientDhParamsAnswer,
};
use keyway_tl_types::{Cursor, Deserializable, Serializable};
use num_bigint::BigUint;
use num_traits::{CheckedSub, One};

use crate::{ErrorKind, hex};
use crate::random::{self, RandomError, RandomSource};

// ─── Error ────────────────────────────────────────────────────────────────────

/// Errors that can occur during auth key generation.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// A handler ran before the state it depends on was produced.
    MissingState { what: &'static str },
    InvalidNonce { got: [u8; 16], expected: [u8; 16] },
    InvalidServerNonce { got: [u8; 16], expected: [u8; 16] },
    /// None of the offered fingerprints is in the key store.
    UnknownFingerprints { fingerprints: Vec<i64> },
    Factorize(FactorizeError),
    Rsa(rsa::Error),
    Cipher(aes::UnalignedInput),
    Decode(keyway_tl_types::Error),
    Random(RandomError),
    InvalidAnswerHash { got: [u8; 20], expected: [u8; 20] },
    InvalidNewNonceHash { got: [u8; 16], expected: [u8; 16] },
    GParameterOutOfRange { value: BigUint, low: BigUint, high: BigUint },
    /// The exchange reached its end without the server accepting a key.
    NoKey,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingState { .. } | Self::NoKey => ErrorKind::StateViolation,
            Self::InvalidNonce { .. } | Self::InvalidServerNonce { .. } | Self::Decode(_) => {
                ErrorKind::ProtocolViolation
            }
            Self::UnknownFingerprints { .. } => ErrorKind::KeyNotFound,
            Self::Factorize(_)
            | Self::Rsa(_)
            | Self::Cipher(_)
            | Self::Random(_)
            | Self::InvalidAnswerHash { .. }
            | Self::InvalidNewNonceHash { .. }
            | Self::GParameterOutOfRange { .. } => ErrorKind::CryptoFailure,
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingState { what } => write!(f, "handshake state missing: {what}"),
            Self::InvalidNonce { got, expected } => {
                write!(f, "nonce mismatch: got {got:?}, expected {expected:?}")
            }
            Self::InvalidServerNonce { got, expected } => {
                write!(f, "server_nonce mismatch: got {got:?}, expected {expected:?}")
            }
            Self::UnknownFingerprints { fingerprints } => {
                write!(f, "no known fingerprint in {fingerprints:?}")
            }
            Self::Factorize(e) => write!(f, "pq factorization failed: {e}"),
            Self::Rsa(e) => write!(f, "RSA encryption failed: {e}"),
            Self::Cipher(e) => write!(f, "AES-IGE failed: {e}"),
            Self::Decode(e) => write!(f, "malformed server answer: {e}"),
            Self::Random(e) => write!(f, "{e}"),
            Self::InvalidAnswerHash { got, expected } => {
                write!(f, "answer hash mismatch: got {got:?}, expected {expected:?}")
            }
            Self::InvalidNewNonceHash { got, expected } => {
                write!(f, "new nonce hash mismatch: got {got:?}, expected {expected:?}")
            }
            Self::GParameterOutOfRange { value, low, high } => {
                write!(f, "g={value} not in range ({low}, {high})")
            }
            Self::NoKey => write!(f, "server did not accept the generated key"),
        }
    }
}

impl From<FactorizeError> for Error {
    fn from(e: FactorizeError) -> Self {
        Self::Factorize(e)
    }
}

impl From<rsa::Error> for Error {
    fn from(e: rsa::Error) -> Self {
        Self::Rsa(e)
    }
}

impl From<aes::UnalignedInput> for Error {
    fn from(e: aes::UnalignedInput) -> Self {
        Self::Cipher(e)
    }
}

impl From<keyway_tl_types::Error> for Error {
    fn from(e: keyway_tl_types::Error) -> Self {
        Self::Decode(e)
    }
}

impl From<RandomError> for Error {
    fn from(e: RandomError) -> Self {
        Self::Random(e)
    }
}

// ─── State ────────────────────────────────────────────────────────────────────

/// Position in the exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthState {
    ReqPq,
    ResPq,
    ReqDh,
    ResDh,
    SetDh,
    DhGenCheck,
    End,
}

impl AuthState {
    /// The state that follows this one. `End` is terminal.
    pub fn next(self) -> Self {
        match self {
            Self::ReqPq => Self::ResPq,
            Self::ResPq => Self::ReqDh,
            Self::ReqDh => Self::ResDh,
            Self::ResDh => Self::SetDh,
            Self::SetDh => Self::DhGenCheck,
            Self::DhGenCheck | Self::End => Self::End,
        }
    }
}

/// Diffie-Hellman values from `server_DH_inner_data` plus our secret `b`.
#[derive(Clone, Debug)]
pub struct DhParams {
    pub prime: BigUint,
    pub g: BigUint,
    pub g_a: BigUint,
    pub b: BigUint,
    pub server_time: i32,
}

/// Everything one handshake attempt accumulates.
#[derive(Clone, Debug, Default)]
pub struct AuthPayload {
    /// Datacenter to name in `p_q_inner_data_dc`; `None` sends plain `p_q_inner_data`.
    pub dc: Option<i32>,
    pub nonce: Option<[u8; 16]>,
    pub server_nonce: Option<[u8; 16]>,
    pub new_nonce: Option<[u8; 32]>,
    pub pq: Option<Vec<u8>>,
    pub fingerprints: Vec<i64>,
    pub dh: Option<DhParams>,
    /// `g_a^b mod prime`, until the server confirms it.
    pub candidate_key: Option<[u8; 256]>,
    pub auth_key: Option<AuthKey>,
    pub salt: Option<i64>,
}

impl AuthPayload {
    pub fn new(dc: Option<i32>) -> Self {
        Self { dc, ..Self::default() }
    }
}

fn need<T: Copy>(value: Option<T>, what: &'static str) -> Result<T, Error> {
    value.ok_or(Error::MissingState { what })
}

fn to_key_bytes(value: &BigUint) -> [u8; 256] {
    let bytes = value.to_bytes_be();
    let mut out = [0u8; 256];
    let skip = 256usize.saturating_sub(bytes.len());
    out[skip..].copy_from_slice(&bytes[bytes.len().saturating_sub(256)..]);
    out
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// `ReqPq`: pick the client nonce.
pub fn req_pq(payload: &mut AuthPayload, rng: &dyn RandomSource) -> Result<ReqPqMulti, Error> {
    let nonce: [u8; 16] = random::array(rng)?;
    payload.nonce = Some(nonce);
    log::debug!("req_pq_multi: nonce {}", hex(&nonce));
    Ok(ReqPqMulti { nonce })
}

/// `ResPq`: record the server nonce, `pq` and offered key fingerprints.
pub fn res_pq(payload: &mut AuthPayload, content: &[u8]) -> Result<(), Error> {
    let nonce = need(payload.nonce, "client nonce")?;
    let res_pq = ResPq::from_bytes(content)?;
    check_nonce(&res_pq.nonce, &nonce)?;

    log::debug!(
        "resPQ: pq {} with {} fingerprint(s)",
        hex(&res_pq.pq),
        res_pq.server_public_key_fingerprints.len()
    );
    payload.server_nonce = Some(res_pq.server_nonce);
    payload.pq = Some(res_pq.pq);
    payload.fingerprints = res_pq.server_public_key_fingerprints;
    Ok(())
}

/// `ReqDh`: factor `pq`, seal `p_q_inner_data` under a known server key.
pub fn req_dh(
    payload: &mut AuthPayload,
    rng: &dyn RandomSource,
    keys: &dyn KeyStore,
) -> Result<ReqDhParams, Error> {
    let nonce = need(payload.nonce, "client nonce")?;
    let server_nonce = need(payload.server_nonce, "server nonce")?;
    let pq = payload.pq.clone().ok_or(Error::MissingState { what: "pq" })?;

    let (p, q) = factorize(&BigUint::from_bytes_be(&pq))?;
    log::debug!("pq factorized: {p} * {q}");
    let (p, q) = (p.to_bytes_be(), q.to_bytes_be());

    let new_nonce: [u8; 32] = random::array(rng)?;
    payload.new_nonce = Some(new_nonce);

    let inner = match payload.dc {
        Some(dc) => PqInner::Dc(PqInnerDataDc {
            pq,
            p: p.clone(),
            q: q.clone(),
            nonce,
            server_nonce,
            new_nonce,
            dc,
        }),
        None => PqInner::Plain(PqInnerData { pq, p: p.clone(), q: q.clone(), nonce, server_nonce, new_nonce }),
    }
    .to_bytes()?;

    let (fingerprint, key) = payload
        .fingerprints
        .iter()
        .find_map(|&fp| keys.lookup(fp).map(|key| (fp, key)))
        .ok_or_else(|| Error::UnknownFingerprints { fingerprints: payload.fingerprints.clone() })?;

    // SHA1(data) ‖ data ‖ random, 255 bytes in total
    let pad_len = (255 - (20 + inner.len()) % 255) % 255;
    let mut padding = vec![0u8; pad_len];
    rng.fill(&mut padding)?;

    let mut block = Vec::with_capacity(20 + inner.len() + pad_len);
    block.extend_from_slice(&sha1!(&inner));
    block.extend_from_slice(&inner);
    block.extend_from_slice(&padding);

    let encrypted_data = key.encrypt(&block)?;
    log::debug!("req_DH_params: fingerprint {fingerprint}, {} encrypted bytes", encrypted_data.len());

    Ok(ReqDhParams { nonce, server_nonce, p, q, public_key_fingerprint: fingerprint, encrypted_data })
}

/// `ResDh`: decrypt `server_DH_inner_data`, choose `b`, compute `g_a^b`.
///
/// A `server_DH_params_fail` answer leaves no DH state behind, so the
/// following `SetDh` reports the missing parameters.
pub fn res_dh(payload: &mut AuthPayload, content: &[u8], rng: &dyn RandomSource) -> Result<(), Error> {
    let nonce = need(payload.nonce, "client nonce")?;
    let server_nonce = need(payload.server_nonce, "server nonce")?;
    let new_nonce = need(payload.new_nonce, "new nonce")?;

    let ok = match ServerDhParams::from_bytes(content)? {
        ServerDhParams::Fail(fail) => {
            check_nonce(&fail.nonce, &nonce)?;
            check_server_nonce(&fail.server_nonce, &server_nonce)?;
            log::warn!("server_DH_params_fail received");
            payload.dh = None;
            payload.candidate_key = None;
            return Ok(());
        }
        ServerDhParams::Ok(ok) => ok,
    };
    check_nonce(&ok.nonce, &nonce)?;
    check_server_nonce(&ok.server_nonce, &server_nonce)?;

    let (key, iv) = generate_key_data_from_nonce(&server_nonce, &new_nonce);
    let plain = aes::decrypt(&ok.encrypted_answer, &iv, &key)?;
    if plain.len() < 20 {
        return Err(Error::Decode(keyway_tl_types::Error::UnexpectedEof));
    }

    let mut got_hash = [0u8; 20];
    got_hash.copy_from_slice(&plain[..20]);
    let mut cursor = Cursor::from_slice(&plain[20..]);
    let inner = ServerDhInnerData::deserialize(&mut cursor)?;

    let expected_hash = sha1!(&plain[20..20 + cursor.pos()]);
    if got_hash != expected_hash {
        return Err(Error::InvalidAnswerHash { got: got_hash, expected: expected_hash });
    }
    check_nonce(&inner.nonce, &nonce)?;
    check_server_nonce(&inner.server_nonce, &server_nonce)?;

    let prime = BigUint::from_bytes_be(&inner.dh_prime);
    let g = BigUint::from(u32::try_from(inner.g).unwrap_or_default());
    let g_a = BigUint::from_bytes_be(&inner.g_a);

    let one = BigUint::one();
    let upper = below(&prime, &one);
    check_g_in_range(&g, &one, &upper)?;
    check_g_in_range(&g_a, &one, &upper)?;
    let safety = &one << (2048 - 64);
    check_g_in_range(&g_a, &safety, &below(&prime, &safety))?;

    let b_bytes: [u8; 256] = random::array(rng)?;
    let b = BigUint::from_bytes_be(&b_bytes);
    let candidate = g_a.modpow(&b, &prime);

    log::debug!("server_DH_inner_data: g={g}, {}-bit prime, server_time {}", prime.bits(), inner.server_time);
    payload.candidate_key = Some(to_key_bytes(&candidate));
    payload.dh = Some(DhParams { prime, g, g_a, b, server_time: inner.server_time });
    Ok(())
}

/// `SetDh`: send `g^b` sealed under the temporary AES key.
pub fn set_dh(payload: &mut AuthPayload, rng: &dyn RandomSource) -> Result<SetClientDhParams, Error> {
    let nonce = need(payload.nonce, "client nonce")?;
    let server_nonce = need(payload.server_nonce, "server nonce")?;
    let new_nonce = need(payload.new_nonce, "new nonce")?;
    let dh = payload.dh.as_ref().ok_or(Error::MissingState { what: "DH parameters" })?;

    let g_b = dh.g.modpow(&dh.b, &dh.prime);
    let one = BigUint::one();
    check_g_in_range(&g_b, &one, &below(&dh.prime, &one))?;
    let safety = &one << (2048 - 64);
    check_g_in_range(&g_b, &safety, &below(&dh.prime, &safety))?;

    let inner = ClientDhInnerData { nonce, server_nonce, retry_id: 0, g_b: g_b.to_bytes_be() }.to_bytes()?;

    let pad_len = (16 - (20 + inner.len()) % 16) % 16;
    let mut padding = vec![0u8; pad_len];
    rng.fill(&mut padding)?;

    let mut hashed = Vec::with_capacity(20 + inner.len() + pad_len);
    hashed.extend_from_slice(&sha1!(&inner));
    hashed.extend_from_slice(&inner);
    hashed.extend_from_slice(&padding);

    let (key, iv) = generate_key_data_from_nonce(&server_nonce, &new_nonce);
    aes::ige_encrypt(&mut hashed, &key, &iv)?;
    log::debug!("set_client_DH_params: {} encrypted bytes", hashed.len());

    Ok(SetClientDhParams { nonce, server_nonce, encrypted_data: hashed })
}

/// `DhGenCheck`: on `dh_gen_ok`, confirm the key and derive the salt.
///
/// `dh_gen_retry` and `dh_gen_fail` drop the candidate key.
pub fn dh_gen_check(payload: &mut AuthPayload, content: &[u8]) -> Result<(), Error> {
    let nonce = need(payload.nonce, "client nonce")?;
    let server_nonce = need(payload.server_nonce, "server nonce")?;
    let new_nonce = need(payload.new_nonce, "new nonce")?;

    let ok = match SetClientDhParamsAnswer::from_bytes(content)? {
        SetClientDhParamsAnswer::Ok(ok) => ok,
        SetClientDhParamsAnswer::Retry(x) => {
            check_nonce(&x.nonce, &nonce)?;
            check_server_nonce(&x.server_nonce, &server_nonce)?;
            log::warn!("dh_gen_retry received");
            payload.candidate_key = None;
            return Ok(());
        }
        SetClientDhParamsAnswer::Fail(x) => {
            check_nonce(&x.nonce, &nonce)?;
            check_server_nonce(&x.server_nonce, &server_nonce)?;
            log::warn!("dh_gen_fail received");
            payload.candidate_key = None;
            return Ok(());
        }
    };
    check_nonce(&ok.nonce, &nonce)?;
    check_server_nonce(&ok.server_nonce, &server_nonce)?;

    let candidate = payload.candidate_key.take().ok_or(Error::MissingState { what: "candidate key" })?;
    let auth_key = AuthKey::from_bytes(candidate);
    let expected = auth_key.calc_new_nonce_hash(&new_nonce, 1);
    check_new_nonce_hash(&ok.new_nonce_hash1, &expected)?;

    let mut salt = [0u8; 8];
    for ((dst, a), b) in salt.iter_mut().zip(&new_nonce[..8]).zip(&server_nonce[..8]) {
        *dst = a ^ b;
    }
    let salt = i64::from_le_bytes(salt);

    log::debug!("dh_gen_ok: key {auth_key:?}, salt {salt}");
    payload.auth_key = Some(auth_key);
    payload.salt = Some(salt);
    Ok(())
}

/// `End`: hand out the negotiated key and salt.
pub fn finish(payload: &AuthPayload) -> Result<([u8; 256], i64), Error> {
    match (&payload.auth_key, payload.salt) {
        (Some(key), Some(salt)) => Ok((key.to_bytes(), salt)),
        _ => Err(Error::NoKey),
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn check_nonce(got: &[u8; 16], expected: &[u8; 16]) -> Result<(), Error> {
    if got == expected {
        Ok(())
    } else {
        Err(Error::InvalidNonce { got: *got, expected: *expected })
    }
}

fn check_server_nonce(got: &[u8; 16], expected: &[u8; 16]) -> Result<(), Error> {
    if got == expected {
        Ok(())
    } else {
        Err(Error::InvalidServerNonce { got: *got, expected: *expected })
    }
}

fn check_new_nonce_hash(got: &[u8; 16], expected: &[u8; 16]) -> Result<(), Error> {
    if got == expected {
        Ok(())
    } else {
        Err(Error::InvalidNewNonceHash { got: *got, expected: *expected })
    }
}

fn check_g_in_range(value: &BigUint, low: &BigUint, high: &BigUint) -> Result<(), Error> {
    if low < value && value < high {
        Ok(())
    } else {
        Err(Error::GParameterOutOfRange { value: value.clone(), low: low.clone(), high: high.clone() })
    }
}

/// `prime - by`, or zero when that would underflow.
fn below(prime: &BigUint, by: &BigUint) -> BigUint {
    prime.checked_sub(by).unwrap_or_default()
}
