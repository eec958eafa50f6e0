//! RSA public keys, their fingerprints, and the key store the handshake
//! looks keys up in.

use std::fmt;

use num_bigint::BigUint;

use crate::sha1;

/// Modulus of the production datacenter key.
const PRODUCTION_N: &str = "29379598170669337022986177149456128565388431120058863768162556424047512191330847455146576344487764408661701890505066208632169112269581063774293102577308490531282748465986139880977280302242772832972539403531316010870401287642763009136156734339538042419388722777357134487746169093539093850251243897188928735903389451772730245253062963384108812842079887538976360465290946139638691491496062099570836476454855996319192747663615955633778034897140982517446405334423701359108810182097749467210509584293428076654573384828809574217079944388301239431309115013843331317877374435868468779972014486325557807783825502498215169806323";

/// Modulus of the test datacenter key.
const TEST_N: &str = "25342889448840415564971689590713473206898847759084779052582026594546022463853940585885215951168491965708222649399180603818074200620463776135424884632162512403163793083921641631564740959529419359595852941166848940585952337613333022396096584117954892216031229237302943701877588456738335398602461675225081791820393153757504952636234951323237820036543581047826906120927972487366805292115792231423684261262330394324750785450942589751755390156647751460719351439969059949569615302809050721500330239005077889855323917509948255722081644689442127297605422579707142646660768825302832201908302295573257427896031830742328565032949";

const DEFAULT_E: &str = "65537";

/// Errors from [`Key::encrypt`].
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// The input, read as a big-endian integer, is not below the modulus.
    DataTooLarge { len: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataTooLarge { len } => write!(f, "{len} bytes do not fit under the RSA modulus"),
        }
    }
}

impl std::error::Error for Error {}

/// An RSA public key (n, e).
#[derive(Clone, PartialEq)]
pub struct Key {
    n: BigUint,
    e: BigUint,
}

impl Key {
    /// Parse decimal `n` and `e` strings.
    pub fn new(n: &str, e: &str) -> Option<Self> {
        Some(Self {
            n: BigUint::parse_bytes(n.as_bytes(), 10)?,
            e: BigUint::parse_bytes(e.as_bytes(), 10)?,
        })
    }

    /// Lower 64 bits of `SHA1(bytes(n) ‖ bytes(e))`, read little-endian, where
    /// `bytes` is the TL byte-string encoding of the big-endian value.
    pub fn fingerprint(&self) -> i64 {
        let mut buf = Vec::new();
        tl_bytes(&mut buf, &self.n.to_bytes_be());
        tl_bytes(&mut buf, &self.e.to_bytes_be());
        let hash = sha1!(&buf);
        let mut low = [0u8; 8];
        low.copy_from_slice(&hash[12..]);
        i64::from_le_bytes(low)
    }

    /// Size of the modulus in bytes.
    pub fn size(&self) -> usize {
        self.n.bits().div_ceil(8) as usize
    }

    /// Textbook RSA: `data^e mod n`, left-padded to the modulus size.
    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        let m = BigUint::from_bytes_be(data);
        if m >= self.n {
            return Err(Error::DataTooLarge { len: data.len() });
        }
        let c = m.modpow(&self.e, &self.n).to_bytes_be();
        let mut block = vec![0u8; self.size().saturating_sub(c.len())];
        block.extend_from_slice(&c);
        Ok(block)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key(fingerprint={})", self.fingerprint())
    }
}

fn tl_bytes(buf: &mut Vec<u8>, data: &[u8]) {
    let header = if data.len() < 254 {
        buf.push(data.len() as u8);
        1
    } else {
        buf.push(0xfe);
        buf.extend_from_slice(&(data.len() as u32).to_le_bytes()[..3]);
        4
    };
    buf.extend_from_slice(data);
    buf.resize(buf.len() + (4 - (header + data.len()) % 4) % 4, 0);
}

/// Lookup of server public keys by fingerprint.
pub trait KeyStore: Send + Sync {
    fn lookup(&self, fingerprint: i64) -> Option<&Key>;
}

/// A fixed set of keys with their fingerprints computed up front.
#[derive(Clone, Debug, Default)]
pub struct KeyRing {
    keys: Vec<(i64, Key)>,
}

impl KeyRing {
    pub fn new(keys: impl IntoIterator<Item = Key>) -> Self {
        Self { keys: keys.into_iter().map(|k| (k.fingerprint(), k)).collect() }
    }

    /// Telegram's production and test datacenter keys.
    pub fn builtin() -> Self {
        Self::new([PRODUCTION_N, TEST_N].into_iter().filter_map(|n| Key::new(n, DEFAULT_E)))
    }

    pub fn fingerprints(&self) -> impl Iterator<Item = i64> + '_ {
        self.keys.iter().map(|(fp, _)| *fp)
    }
}

impl KeyStore for KeyRing {
    fn lookup(&self, fingerprint: i64) -> Option<&Key> {
        self.keys.iter().find(|(fp, _)| *fp == fingerprint).map(|(_, k)| k)
    }
}
