//! Onset-pair hashing.
//!
//! Codes are MurmurHash2 (Austin Appleby, 32-bit variant) of a 5-byte key
//! built from two quantized onset deltas and the band index, truncated to
//! [`CODE_BITS`] bits.

/// Seed for every code hash.
pub const HASH_SEED: u32 = 0x9ea5_fa36;
/// Number of significant bits in a code.
pub const CODE_BITS: u32 = 20;
/// Mask applied to the raw hash.
pub const CODE_MASK: u32 = (1 << CODE_BITS) - 1;

const M: u32 = 0x5bd1_e995;
const R: u32 = 24;

/// 32-bit MurmurHash2 of `key`.
pub fn murmur_hash2(key: &[u8], seed: u32) -> u32 {
    let mut h = seed ^ key.len() as u32;

    let mut blocks = key.chunks_exact(4);
    for block in &mut blocks {
        let mut k = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
        k = k.wrapping_mul(M);
        k ^= k >> R;
        k = k.wrapping_mul(M);

        h = h.wrapping_mul(M);
        h ^= k;
    }

    let tail = blocks.remainder();
    if tail.len() >= 3 {
        h ^= u32::from(tail[2]) << 16;
    }
    if tail.len() >= 2 {
        h ^= u32::from(tail[1]) << 8;
    }
    if let Some(&first) = tail.first() {
        h ^= u32::from(first);
        h = h.wrapping_mul(M);
    }

    h ^= h >> 13;
    h = h.wrapping_mul(M);
    h ^= h >> 15;
    h
}

/// Builds the hash key for a pair of quantized deltas in `band`.
///
/// Deltas are truncated to 16 bits and stored little-endian.
pub fn code_key(delta0: u32, delta1: u32, band: u8) -> [u8; 5] {
    let [d0_lo, d0_hi] = (delta0 as u16).to_le_bytes();
    let [d1_lo, d1_hi] = (delta1 as u16).to_le_bytes();
    [d0_lo, d0_hi, d1_lo, d1_hi, band]
}

/// Hashes a pair of quantized deltas into a 20-bit code.
pub fn hash_code(delta0: u32, delta1: u32, band: u8) -> u32 {
    murmur_hash2(&code_key(delta0, delta1, band), HASH_SEED) & CODE_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_murmur_known_values() {
        assert_eq!(murmur_hash2(&[0, 0, 0, 0, 0], HASH_SEED), 0xb6ab_2e4c);
        assert_eq!(murmur_hash2(&[1, 0, 2, 0, 3], HASH_SEED), 0x9b3c_2048);
        assert_eq!(murmur_hash2(&[8, 0, 16, 0, 7], HASH_SEED), 0x9dd0_355a);
        assert_eq!(murmur_hash2(&[0x10, 0x01, 0x20, 0x02, 5], HASH_SEED), 0xd643_3381);
    }

    #[test]
    fn test_murmur_other_lengths() {
        assert_eq!(murmur_hash2(&[0, 0, 0, 0], HASH_SEED), 554_743_670);
        assert_eq!(murmur_hash2(&[1, 2, 3], HASH_SEED), 251_371_557);
    }

    #[test]
    fn test_code_key_layout() {
        assert_eq!(code_key(0x0110, 0x0220, 5), [0x10, 0x01, 0x20, 0x02, 5]);
        // Only the low 16 bits of a delta take part.
        assert_eq!(code_key(0x1_0001, 2, 0), [1, 0, 2, 0, 0]);
    }

    #[test]
    fn test_codes_fit_in_twenty_bits() {
        assert_eq!(hash_code(0, 0, 0), 0xb6ab_2e4c & CODE_MASK);
        assert_eq!(hash_code(0, 0, 0), 732_748);
        assert_eq!(hash_code(8, 16, 7), 13_658);
        for band in 0..8u8 {
            for d0 in 0..40 {
                for d1 in 0..40 {
                    assert!(hash_code(d0, d1, band) < 1 << CODE_BITS);
                }
            }
        }
    }
}
