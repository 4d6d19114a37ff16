use std::net::Ipv4Addr;

use thiserror::Error;

use super::checksum::rfc1071_checksum;

// The fixed wire profile. Every knob the client never turns lives here so
// the builder stays free of magic numbers and tests can try other values
// through the public fields.
pub const IPV4_VERSION: u8 = 4;
pub const MIN_IHL_WORDS: u8 = 5;
pub const MAX_IHL_WORDS: u8 = 15;
pub const IP_HEADER_LENGTH: u16 = 20;
pub const MAX_PAYLOAD_LENGTH: u16 = u16::MAX - IP_HEADER_LENGTH;
pub const DEFAULT_TTL: u8 = 50;
pub const TCP_PROTOCOL_NUM: u8 = 6;

/// A header field violated its bit-width or range invariant. Raised before
/// any bytes are written, so the caller can fix the field set and retry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidField {
    #[error("version must be 4 for IPv4, got {0}")]
    Version(u8),
    #[error("header length must be 5..=15 words, got {0}")]
    HeaderLength(u8),
    #[error("flags are a 3-bit field, got {0:#05b}")]
    Flags(u8),
    #[error("fragment offset is a 13-bit field, got {0}")]
    FragmentOffset(u16),
    #[error("total length {0} cannot cover the 20-byte header")]
    TotalLength(u16),
    #[error("payload of {0} bytes overflows the 16-bit total length")]
    PayloadTooLarge(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Header {
    // version: 4 bits
    pub version: u8,
    // Internet header length: 4 bits, in 32-bit words
    pub ihl: u8,
    // Type of service: 8 bits (unimplemented, stays 0)
    pub tos: u8,
    // Total length: 16 bits, header plus payload
    pub total_length: u16,
    // Identification: 16 bits (unimplemented, stays 0)
    pub identification: u16,
    // Flags: 3 bits — reserved, DF, MF
    pub flags: u8,
    // Fragment offset: 13 bits
    pub frag_offset: u16,
    // Time to live: 8 bits
    pub ttl: u8,
    // Protocol: 8 bits
    pub proto: u8,
    // Header checksum: 16 bits; pack() computes it, parsing keeps the
    // received value
    pub checksum: u16,
    // Source address
    pub source_address: u32,
    // Destination address
    pub destination_address: u32,
}

impl Ipv4Header {
    fn validate(&self) -> Result<(), InvalidField> {
        if self.version != IPV4_VERSION {
            return Err(InvalidField::Version(self.version));
        }
        if self.ihl < MIN_IHL_WORDS || self.ihl > MAX_IHL_WORDS {
            return Err(InvalidField::HeaderLength(self.ihl));
        }
        if self.flags > 0b111 {
            return Err(InvalidField::Flags(self.flags));
        }
        if self.frag_offset > 0x1FFF {
            return Err(InvalidField::FragmentOffset(self.frag_offset));
        }
        if self.total_length < IP_HEADER_LENGTH {
            return Err(InvalidField::TotalLength(self.total_length));
        }
        Ok(())
    }

    /// Serializes the 20-byte header in network byte order, computing the
    /// checksum over the zero-checksum bytes and writing it into place.
    /// Every field is range-checked before a single byte is written; no
    /// value is ever silently truncated to fit its slot.
    pub fn pack(&self) -> Result<Vec<u8>, InvalidField> {
        self.validate()?;

        let mut buffer = Vec::with_capacity(usize::from(IP_HEADER_LENGTH));

        // 1. First byte: version (4 bits) + IHL (4 bits)
        buffer.push((self.version << 4) | self.ihl);
        buffer.push(self.tos);
        buffer.extend_from_slice(&self.total_length.to_be_bytes());
        buffer.extend_from_slice(&self.identification.to_be_bytes());

        // 2. Flags (3 bits) + fragment offset (13 bits) share two bytes,
        // flags on top
        let flags_frag = (u16::from(self.flags) << 13) | self.frag_offset;
        buffer.extend_from_slice(&flags_frag.to_be_bytes());

        buffer.push(self.ttl);
        buffer.push(self.proto);
        // 3. Checksum placeholder, filled in once the header is complete
        buffer.extend_from_slice(&0u16.to_be_bytes());
        buffer.extend_from_slice(&self.source_address.to_be_bytes());
        buffer.extend_from_slice(&self.destination_address.to_be_bytes());

        // 4. Checksum over the full zero-checksum header, never a partial one
        let checksum = rfc1071_checksum(&buffer);
        buffer[10..12].copy_from_slice(&checksum.to_be_bytes());

        Ok(buffer)
    }
}

/// Builds a complete packet for the fixed wire profile: version 4, IHL 5
/// (no options, ever), TTL 50, protocol TCP, fragmentation flags clear.
/// Total length is derived from the payload.
pub fn create_ip_packet(
    payload: &[u8],
    source_ip: &Ipv4Addr,
    dest_ip: &Ipv4Addr,
) -> Result<Vec<u8>, InvalidField> {
    if payload.len() > usize::from(MAX_PAYLOAD_LENGTH) {
        return Err(InvalidField::PayloadTooLarge(payload.len()));
    }

    let header = Ipv4Header {
        version: IPV4_VERSION,
        ihl: MIN_IHL_WORDS,
        tos: 0,
        total_length: IP_HEADER_LENGTH + payload.len() as u16,
        identification: 0,
        flags: 0, // reserved, DF and MF all clear
        frag_offset: 0,
        ttl: DEFAULT_TTL,
        proto: TCP_PROTOCOL_NUM,
        checksum: 0, // pack() computes the real one
        source_address: source_ip.to_bits(),
        destination_address: dest_ip.to_bits(),
    };

    let mut packet = header.pack()?;
    packet.extend_from_slice(payload);
    Ok(packet)
}

/// Reads the fields back out of a packed header at their bit offsets.
/// Returns the header and the slice after it, or `None` when the buffer is
/// shorter than the header it claims.
pub fn parse_ipv4_header(buf: &[u8]) -> Option<(Ipv4Header, &[u8])> {
    if buf.len() < usize::from(IP_HEADER_LENGTH) {
        return None;
    }

    // IHL counts 32-bit words; anything above 5 would carry options
    let header_len = usize::from(buf[0] & 0x0f) * 4;
    if header_len < usize::from(IP_HEADER_LENGTH) || buf.len() < header_len {
        return None;
    }

    let flags_frag = u16::from_be_bytes([buf[6], buf[7]]);
    let header = Ipv4Header {
        version: buf[0] >> 4,
        ihl: buf[0] & 0x0f,
        tos: buf[1],
        total_length: u16::from_be_bytes([buf[2], buf[3]]),
        identification: u16::from_be_bytes([buf[4], buf[5]]),
        flags: (flags_frag >> 13) as u8,
        frag_offset: flags_frag & 0x1FFF,
        ttl: buf[8],
        proto: buf[9],
        checksum: u16::from_be_bytes([buf[10], buf[11]]),
        source_address: u32::from_be_bytes([buf[12], buf[13], buf[14], buf[15]]),
        destination_address: u32::from_be_bytes([buf[16], buf[17], buf[18], buf[19]]),
    };

    Some((header, &buf[header_len..]))
}
