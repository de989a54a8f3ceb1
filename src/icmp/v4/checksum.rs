//! Internet checksum (RFC 1071).

/// Computes the 16-bit one's complement of the one's complement sum of all
/// big-endian 16-bit words in `data`. An odd trailing byte is padded with zero.
pub(crate) fn checksum(data: &[u8]) -> u16 {
    let mut chunks = data.chunks_exact(2);
    let mut sum: u32 = chunks
        .by_ref()
        .map(|word| u32::from(u16::from_be_bytes([word[0], word[1]])))
        .fold(0, u32::wrapping_add);
    if let [last] = chunks.remainder() {
        sum = sum.wrapping_add(u32::from(*last) << 8);
    }
    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    // The fold above leaves at most 16 significant bits.
    #[allow(clippy::cast_possible_truncation)]
    let folded = sum as u16;
    !folded
}

/// A buffer that already carries its checksum sums to zero.
pub(crate) fn is_valid(data: &[u8]) -> bool {
    checksum(data) == 0
}
