//! Checksum module - 16-bit Internet checksum
//!
//! One's-complement sum of big-endian 16-bit words, folded and inverted.
//! Catches every single-bit error; a small fraction of multi-bit
//! corruption patterns still slips through.

/// Compute the checksum of `bytes`
///
/// An odd trailing byte is treated as the high byte of a zero-padded word.
pub fn compute(bytes: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut words = bytes.chunks_exact(2);

    for word in &mut words {
        sum = sum.wrapping_add(u32::from(u16::from_be_bytes([word[0], word[1]])));
        // keep the carry bits from outgrowing the accumulator
        if sum > 0xffff_0000 {
            sum = (sum & 0xffff) + (sum >> 16);
        }
    }

    if let Some(&last) = words.remainder().first() {
        sum = sum.wrapping_add(u32::from(last) << 8);
    }

    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }

    !(sum as u16)
}

/// Recompute the checksum of `bytes` and compare it to `code`
pub fn verify(bytes: &[u8], code: u16) -> bool {
    compute(bytes) == code
}
