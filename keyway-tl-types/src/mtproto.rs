//! MTProto entities used by the auth key exchange.
//!
//! Declared by hand in the shape a schema generator would emit: one struct
//! per constructor or function, one enum per boxed type with several
//! constructors.

use crate::{tl_enum, tl_object, RemoteCall};

// ─── Constructors ────────────────────────────────────────────────────────────

tl_object! {
    pub struct ResPq = "resPQ#05162463 nonce:int128 server_nonce:int128 pq:bytes \
                        server_public_key_fingerprints:Vector<long> = ResPQ" {
        pub nonce: [u8; 16],
        pub server_nonce: [u8; 16],
        pub pq: Vec<u8>,
        pub server_public_key_fingerprints: Vec<i64>,
    }
}

tl_object! {
    pub struct PqInnerData = "p_q_inner_data#83c95aec pq:bytes p:bytes q:bytes nonce:int128 \
                              server_nonce:int128 new_nonce:int256 = P_Q_inner_data" {
        pub pq: Vec<u8>,
        pub p: Vec<u8>,
        pub q: Vec<u8>,
        pub nonce: [u8; 16],
        pub server_nonce: [u8; 16],
        pub new_nonce: [u8; 32],
    }
}

tl_object! {
    /// Variant that also names the target datacenter.
    pub struct PqInnerDataDc = "p_q_inner_data_dc#a9f55f95 pq:bytes p:bytes q:bytes nonce:int128 \
                                server_nonce:int128 new_nonce:int256 dc:int = P_Q_inner_data" {
        pub pq: Vec<u8>,
        pub p: Vec<u8>,
        pub q: Vec<u8>,
        pub nonce: [u8; 16],
        pub server_nonce: [u8; 16],
        pub new_nonce: [u8; 32],
        pub dc: i32,
    }
}

tl_object! {
    pub struct ServerDhParamsFail = "server_DH_params_fail#79cb045d nonce:int128 server_nonce:int128 \
                                     new_nonce_hash:int128 = Server_DH_Params" {
        pub nonce: [u8; 16],
        pub server_nonce: [u8; 16],
        pub new_nonce_hash: [u8; 16],
    }
}

tl_object! {
    pub struct ServerDhParamsOk = "server_DH_params_ok#d0e8075c nonce:int128 server_nonce:int128 \
                                   encrypted_answer:bytes = Server_DH_Params" {
        pub nonce: [u8; 16],
        pub server_nonce: [u8; 16],
        pub encrypted_answer: Vec<u8>,
    }
}

tl_object! {
    pub struct ServerDhInnerData = "server_DH_inner_data#b5890dba nonce:int128 server_nonce:int128 \
                                    g:int dh_prime:bytes g_a:bytes server_time:int = Server_DH_inner_data" {
        pub nonce: [u8; 16],
        pub server_nonce: [u8; 16],
        pub g: i32,
        pub dh_prime: Vec<u8>,
        pub g_a: Vec<u8>,
        pub server_time: i32,
    }
}

tl_object! {
    pub struct ClientDhInnerData = "client_DH_inner_data#6643b654 nonce:int128 server_nonce:int128 \
                                    retry_id:long g_b:bytes = Client_DH_Inner_Data" {
        pub nonce: [u8; 16],
        pub server_nonce: [u8; 16],
        pub retry_id: i64,
        pub g_b: Vec<u8>,
    }
}

tl_object! {
    pub struct DhGenOk = "dh_gen_ok#3bcbf734 nonce:int128 server_nonce:int128 \
                          new_nonce_hash1:int128 = Set_client_DH_params_answer" {
        pub nonce: [u8; 16],
        pub server_nonce: [u8; 16],
        pub new_nonce_hash1: [u8; 16],
    }
}

tl_object! {
    pub struct DhGenRetry = "dh_gen_retry#46dc1fb9 nonce:int128 server_nonce:int128 \
                             new_nonce_hash2:int128 = Set_client_DH_params_answer" {
        pub nonce: [u8; 16],
        pub server_nonce: [u8; 16],
        pub new_nonce_hash2: [u8; 16],
    }
}

tl_object! {
    pub struct DhGenFail = "dh_gen_fail#a69dae02 nonce:int128 server_nonce:int128 \
                            new_nonce_hash3:int128 = Set_client_DH_params_answer" {
        pub nonce: [u8; 16],
        pub server_nonce: [u8; 16],
        pub new_nonce_hash3: [u8; 16],
    }
}

// ─── Boxed types ─────────────────────────────────────────────────────────────

tl_enum! {
    pub enum PqInner = "P_Q_inner_data" {
        Plain(PqInnerData),
        Dc(PqInnerDataDc),
    }
}

tl_enum! {
    pub enum ServerDhParams = "Server_DH_Params" {
        Fail(ServerDhParamsFail),
        Ok(ServerDhParamsOk),
    }
}

tl_enum! {
    pub enum SetClientDhParamsAnswer = "Set_client_DH_params_answer" {
        Ok(DhGenOk),
        Retry(DhGenRetry),
        Fail(DhGenFail),
    }
}

// ─── Functions ───────────────────────────────────────────────────────────────

tl_object! {
    pub struct ReqPqMulti = "req_pq_multi#be7e8ef1 nonce:int128 = ResPQ" {
        pub nonce: [u8; 16],
    }
}

tl_object! {
    pub struct ReqDhParams = "req_DH_params#d712e4be nonce:int128 server_nonce:int128 p:bytes q:bytes \
                              public_key_fingerprint:long encrypted_data:bytes = Server_DH_Params" {
        pub nonce: [u8; 16],
        pub server_nonce: [u8; 16],
        pub p: Vec<u8>,
        pub q: Vec<u8>,
        pub public_key_fingerprint: i64,
        pub encrypted_data: Vec<u8>,
    }
}

tl_object! {
    pub struct SetClientDhParams = "set_client_DH_params#f5045f1f nonce:int128 server_nonce:int128 \
                                    encrypted_data:bytes = Set_client_DH_params_answer" {
        pub nonce: [u8; 16],
        pub server_nonce: [u8; 16],
        pub encrypted_data: Vec<u8>,
    }
}

impl RemoteCall for ReqPqMulti {
    type Return = ResPq;
}

impl RemoteCall for ReqDhParams {
    type Return = ServerDhParams;
}

impl RemoteCall for SetClientDhParams {
    type Return = SetClientDhParamsAnswer;
}
