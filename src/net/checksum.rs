/// RFC 791 Internet checksum: the one's complement of the one's-complement
/// sum of every big-endian 16-bit word in `buffer`. An odd trailing byte is
/// taken as the high byte of a final word with a zero low byte. RFC 1071
/// spells out the computation.
pub fn rfc1071_checksum(buffer: &[u8]) -> u16 {
    let mut sum: u32 = 0;

    let mut words = buffer.chunks_exact(2);
    for word in &mut words {
        sum += u32::from(u16::from_be_bytes([word[0], word[1]]));
    }
    if let Some(&last) = words.remainder().first() {
        sum += u32::from(last) << 8;
    }

    // End-around carry; a single fold pass is not enough for all inputs.
    while sum > 0xFFFF {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    !(sum as u16)
}

/// A header whose checksum field is intact sums to all ones, so checksumming
/// it again yields zero.
pub fn verify(buffer: &[u8]) -> bool {
    rfc1071_checksum(buffer) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    // The RFC 791 worked example header, checksum field zeroed.
    const WIKIPEDIA_HEADER: [u8; 20] = [
        0x45, 0x00, 0x00, 0x30, 0x44, 0x22, 0x40, 0x00, 0x80, 0x06, 0x00, 0x00, 0x8c, 0x7c,
        0x19, 0xac, 0xae, 0x24, 0x1e, 0x2b,
    ];

    #[test]
    fn wikipedia_header_checksums_to_442e() {
        assert_eq!(rfc1071_checksum(&WIKIPEDIA_HEADER), 0x442e);
    }

    #[test]
    fn header_with_checksum_in_place_folds_to_zero() {
        let mut header = WIKIPEDIA_HEADER;
        header[10..12].copy_from_slice(&0x442eu16.to_be_bytes());
        assert_eq!(rfc1071_checksum(&header), 0x0000);
        assert!(verify(&header));
    }

    #[test]
    fn corrupted_header_fails_verification() {
        let mut header = WIKIPEDIA_HEADER;
        header[10..12].copy_from_slice(&0x442eu16.to_be_bytes());
        header[8] = header[8].wrapping_add(1);
        assert!(!verify(&header));
    }

    #[test]
    fn odd_length_input_pads_the_low_byte() {
        // 0x12 alone is the word 0x1200.
        assert_eq!(rfc1071_checksum(&[0x12]), 0xedff);
    }

    #[test]
    fn empty_input_is_all_ones() {
        assert_eq!(rfc1071_checksum(&[]), 0xffff);
    }

    #[test]
    fn carry_folds_until_it_fits() {
        // 0xffff + 0x8000 + 0x8000 = 0x1ffff; the first fold leaves 0x10000,
        // which still carries.
        assert_eq!(rfc1071_checksum(&[0xff, 0xff, 0x80, 0x00, 0x80, 0x00]), 0xfffe);
    }
}
