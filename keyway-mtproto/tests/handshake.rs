use std::collections::VecDeque;
use std::sync::Mutex;

use keyway_crypto::rsa::KeyRing;
use keyway_mtproto::ErrorKind;
use keyway_mtproto::authentication::{self as auth, AuthPayload, AuthState};
use keyway_mtproto::random::{RandomError, RandomSource};
use keyway_tl_types::Serializable;

include!("fixtures/recorded.rs");

fn unhex(s: &str) -> Vec<u8> {
    (0..s.len()).step_by(2).map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap()).collect()
}

/// Hands out queued chunks, one per call, truncated to the requested size.
struct Scripted(Mutex<VecDeque<Vec<u8>>>);

impl Scripted {
    fn recorded() -> Self {
        let step2 = unhex(STEP2_RANDOM);
        let step3 = unhex(STEP3_RANDOM);
        Self(Mutex::new(VecDeque::from([
            unhex(STEP1_RANDOM),
            step2[..32].to_vec(),
            vec![0; 255],
            step3[..256].to_vec(),
            step3[256..].to_vec(),
        ])))
    }
}

impl RandomSource for Scripted {
    fn fill(&self, buf: &mut [u8]) -> Result<(), RandomError> {
        let chunk = self.0.lock().unwrap().pop_front().ok_or_else(|| RandomError("script exhausted".into()))?;
        buf.copy_from_slice(&chunk[..buf.len()]);
        Ok(())
    }
}

#[test]
fn replays_recorded_exchange() {
    let rng = Scripted::recorded();
    let keys = KeyRing::builtin();
    let mut payload = AuthPayload::default();

    let req = auth::req_pq(&mut payload, &rng).unwrap();
    assert_eq!(req.to_bytes().unwrap(), unhex(STEP1_REQUEST));
    auth::res_pq(&mut payload, &unhex(STEP1_RESPONSE)).unwrap();

    let req = auth::req_dh(&mut payload, &rng, &keys).unwrap();
    assert_eq!(req.public_key_fingerprint, -5595554452916591101);
    assert_eq!(req.encrypted_data.len(), 256);
    auth::res_dh(&mut payload, &unhex(STEP2_RESPONSE), &rng).unwrap();

    let req = auth::set_dh(&mut payload, &rng).unwrap();
    assert_eq!(req.to_bytes().unwrap(), unhex(STEP3_REQUEST));
    auth::dh_gen_check(&mut payload, &unhex(STEP3_RESPONSE)).unwrap();

    let (key, salt) = auth::finish(&payload).unwrap();
    assert_eq!(key.to_vec(), unhex(EXPECTED_AUTH_KEY));
    assert_eq!(salt, EXPECTED_SALT);
}

#[test]
fn tampered_answer_fails_hash_check() {
    let rng = Scripted::recorded();
    let mut payload = AuthPayload::default();
    auth::req_pq(&mut payload, &rng).unwrap();
    auth::res_pq(&mut payload, &unhex(STEP1_RESPONSE)).unwrap();
    auth::req_dh(&mut payload, &rng, &KeyRing::builtin()).unwrap();

    let mut answer = unhex(STEP2_RESPONSE);
    let last = answer.len() - 20;
    answer[last] ^= 0x01;
    let err = auth::res_dh(&mut payload, &answer, &rng).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CryptoFailure);
}

#[test]
fn foreign_server_nonce_is_rejected() {
    let rng = Scripted::recorded();
    let mut payload = AuthPayload::default();
    auth::req_pq(&mut payload, &rng).unwrap();
    auth::res_pq(&mut payload, &unhex(STEP1_RESPONSE)).unwrap();
    auth::req_dh(&mut payload, &rng, &KeyRing::builtin()).unwrap();
    payload.server_nonce = Some([0; 16]);

    let err = auth::res_dh(&mut payload, &unhex(STEP2_RESPONSE), &rng).unwrap_err();
    assert!(matches!(err, auth::Error::InvalidServerNonce { .. }));
}

#[test]
fn driver_loop_reaches_end() {
    let rng = Scripted::recorded();
    let keys = KeyRing::builtin();
    let mut payload = AuthPayload::default();
    let mut answers = VecDeque::from([unhex(STEP1_RESPONSE), unhex(STEP2_RESPONSE), unhex(STEP3_RESPONSE)]);

    let mut state = AuthState::ReqPq;
    while state != AuthState::End {
        match state {
            AuthState::ReqPq => drop(auth::req_pq(&mut payload, &rng).unwrap()),
            AuthState::ResPq => auth::res_pq(&mut payload, &answers.pop_front().unwrap()).unwrap(),
            AuthState::ReqDh => drop(auth::req_dh(&mut payload, &rng, &keys).unwrap()),
            AuthState::ResDh => auth::res_dh(&mut payload, &answers.pop_front().unwrap(), &rng).unwrap(),
            AuthState::SetDh => drop(auth::set_dh(&mut payload, &rng).unwrap()),
            AuthState::DhGenCheck => auth::dh_gen_check(&mut payload, &answers.pop_front().unwrap()).unwrap(),
            AuthState::End => unreachable!(),
        }
        state = state.next();
    }
    assert_eq!(auth::finish(&payload).unwrap().1, EXPECTED_SALT);
}
