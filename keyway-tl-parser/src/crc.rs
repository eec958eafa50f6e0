//! Constructor ids for descriptors written without `#id`.

const POLY: u32 = 0xEDB8_8320;

const TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut c = i as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 { (c >> 1) ^ POLY } else { c >> 1 };
            k += 1;
        }
        table[i] = c;
        i += 1;
    }
    table
};

/// CRC-32 of the canonical descriptor text: `#id` removed, whitespace
/// collapsed, `Vector<long>` written as `Vector long`.
pub(crate) fn descriptor_id(descriptor: &str) -> u32 {
    let canonical = descriptor
        .split_whitespace()
        .enumerate()
        .map(|(i, tok)| if i == 0 { tok.split('#').next().unwrap_or(tok) } else { tok })
        .collect::<Vec<_>>()
        .join(" ")
        .replace('<', " ")
        .replace('>', "");
    crc32(canonical.as_bytes())
}

fn crc32(data: &[u8]) -> u32 {
    !data.iter().fold(0xFFFF_FFFF, |crc: u32, &b| {
        TABLE[((crc ^ u32::from(b)) & 0xFF) as usize] ^ (crc >> 8)
    })
}
