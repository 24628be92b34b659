//! CRC-32 (ISO 3309 / PNG Annex D), table-based.
//!
//! A small from-scratch table-driven implementation rather than a
//! fabricated dependency; gated behind the `crc` feature so the checking
//! code can be compiled out entirely.

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 { 0xEDB8_8320 ^ (c >> 1) } else { c >> 1 };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

const CRC_TABLE: [u32; 256] = build_table();

/// Update a running CRC-32 with `data`. Callers XOR the seed with
/// `0xFFFF_FFFF` going in and coming out (`crc32(0xFFFF_FFFF, data) ^
/// 0xFFFF_FFFF` gives the on-wire value).
pub fn crc32_update(mut crc: u32, data: &[u8]) -> u32 {
    for &byte in data {
        let idx = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = CRC_TABLE[idx] ^ (crc >> 8);
    }
    crc
}

/// Compute the PNG chunk CRC-32 over a complete `type + data` span.
pub fn crc32(data: &[u8]) -> u32 {
    crc32_update(0xFFFF_FFFF, data) ^ 0xFFFF_FFFF
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        assert_eq!(crc32(b""), 0);
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn incremental_matches_whole() {
        let data = b"IDATsome pixel bytes here";
        let whole = crc32(data);
        let mut crc = 0xFFFF_FFFF;
        crc = crc32_update(crc, &data[..4]);
        crc = crc32_update(crc, &data[4..]);
        assert_eq!(crc ^ 0xFFFF_FFFF, whole);
    }
}
