pub fn format_hexdump(data: &[u8]) -> String {
    let mut result = String::new();

    for (i, line) in data.chunks(16).enumerate() {
        // Address column
        result.push_str(&format!("0x{:04x}:  ", i * 16));

        // Big-endian 16-bit words, the same unit the checksum sums over
        for (j, word) in line.chunks(2).enumerate() {
            if j > 0 {
                result.push(' ');
            }
            for byte in word {
                result.push_str(&format!("{:02x}", byte));
            }
        }

        result.push('\n');
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_bytes_into_words() {
        let dump = format_hexdump(&[0x45, 0x00, 0x00, 0x16]);
        assert_eq!(dump, "0x0000:  4500 0016\n");
    }

    #[test]
    fn odd_trailing_byte_stands_alone() {
        let dump = format_hexdump(&[0xab, 0xcd, 0xef]);
        assert_eq!(dump, "0x0000:  abcd ef\n");
    }

    #[test]
    fn wraps_at_sixteen_bytes() {
        let data: Vec<u8> = (0u8..18).collect();
        let dump = format_hexdump(&data);
        assert_eq!(
            dump,
            "0x0000:  0001 0203 0405 0607 0809 0a0b 0c0d 0e0f\n0x0010:  1011\n"
        );
    }

    #[test]
    fn empty_input_prints_nothing() {
        assert_eq!(format_hexdump(&[]), "");
    }
}
