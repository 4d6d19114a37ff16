use std::io;
use std::mem::MaybeUninit;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use rand::prelude::*;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use thiserror::Error;

use crate::hextools::format_hexdump;
use crate::net::checksum;
use crate::net::ip::{create_ip_packet, parse_ipv4_header, InvalidField, IP_HEADER_LENGTH};

// Session profile: twelve packets, payload starting at two bytes and
// growing by two each round.
pub const SOURCE_ADDRESS: Ipv4Addr = Ipv4Addr::new(127, 0, 0, 1);
pub const PACKET_ROUNDS: u16 = 12;
pub const INITIAL_PAYLOAD_LEN: u16 = 2;
pub const PAYLOAD_STEP: u16 = 2;

const SOCKET_TIMEOUT: Duration = Duration::from_secs(5);
const RESPONSE_BUFFER_LEN: usize = 65535;

/// Anything that can end a session early: a header field that refuses to
/// pack, or the socket failing under us.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid header field: {0}")]
    InvalidField(#[from] InvalidField),
    #[error("channel failure: {0}")]
    ChannelFailure(#[from] io::Error),
}

/// Payload length for each round: 2, 4, 6, and so on up to the twelfth
/// packet.
pub fn payload_schedule() -> impl Iterator<Item = u16> {
    (0..PACKET_ROUNDS).map(|round| INITIAL_PAYLOAD_LEN + round * PAYLOAD_STEP)
}

fn random_payload(len: usize) -> Vec<u8> {
    let mut payload = vec![0u8; len];
    rand::thread_rng().fill(&mut payload[..]);
    payload
}

/// Connects to the server over TCP and sends the full packet schedule,
/// dumping every packet to the console as it goes out. After the last
/// packet, waits once for a reply; a silent server is not an error.
pub fn run_session(server_ip: &Ipv4Addr, server_port: u16) -> Result<(), ClientError> {
    println!("\n🔌 Configuring socket...");
    let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_read_timeout(Some(SOCKET_TIMEOUT))?;
    println!("  Read timeout set");
    socket.set_write_timeout(Some(SOCKET_TIMEOUT))?;
    println!("  Write timeout set");

    let server_addr = SockAddr::from(SocketAddr::new((*server_ip).into(), server_port));
    socket.connect(&server_addr)?;
    println!("Connected to Server.");

    // The destination field carries the address the socket actually
    // connected to, not the one we were asked for
    let peer = socket.peer_addr()?.as_socket_ipv4().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            "peer is not an IPv4 endpoint",
        )
    })?;
    let dest_ip = *peer.ip();

    println!("\n📝 Session Configuration:");
    println!("  Source IP: {}", SOURCE_ADDRESS);
    println!("  Destination IP: {}", dest_ip);
    println!("  Destination Port: {}", peer.port());
    println!("  Packets to send: {}", PACKET_ROUNDS);

    for (round, payload_len) in payload_schedule().enumerate() {
        let payload = random_payload(usize::from(payload_len));
        let packet = create_ip_packet(&payload, &SOURCE_ADDRESS, &dest_ip)?;

        println!(
            "\n📦 Packet {}/{}: {} header bytes + {} payload bytes",
            round + 1,
            PACKET_ROUNDS,
            IP_HEADER_LENGTH,
            payload_len
        );
        print!("{}", format_hexdump(&packet));

        let sent = socket.send(&packet)?;
        if sent != packet.len() {
            return Err(ClientError::ChannelFailure(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("sent {} of {} bytes", sent, packet.len()),
            )));
        }
        println!("  📤 Sent {} bytes", sent);
    }

    read_response(&socket)?;

    Ok(())
}

fn read_response(socket: &Socket) -> Result<(), ClientError> {
    println!("\n📥 Waiting for response (timeout: 5s)...");
    let mut buf = [MaybeUninit::uninit(); RESPONSE_BUFFER_LEN];

    match socket.recv(&mut buf) {
        Ok(0) => {
            println!("  Server closed the connection");
            Ok(())
        }
        Ok(n) => {
            println!("  Received {} bytes", n);

            let response: Vec<u8> = buf[..n]
                .iter()
                .map(|b| unsafe { b.assume_init() })
                .collect();
            inspect_response(&response);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut => {
            println!("  No response received (timeout)");
            Ok(())
        }
        Err(e) => Err(ClientError::ChannelFailure(e)),
    }
}

fn inspect_response(response: &[u8]) {
    print!("{}", format_hexdump(response));

    // An echoed packet can be checked against its own checksum field
    if let Some((header, rest)) = parse_ipv4_header(response) {
        let header_len = usize::from(header.ihl) * 4;
        println!("  Parsed IPv4 header:");
        println!("    → Version: {}", header.version);
        println!("    → Total Length: {}", header.total_length);
        println!("    → TTL: {}", header.ttl);
        println!("    → Protocol: {}", header.proto);
        println!("    → Checksum: 0x{:04x}", header.checksum);
        println!("    → Payload bytes: {}", rest.len());
        if checksum::verify(&response[..header_len]) {
            println!("  ✅ Header checksum verifies");
        } else {
            println!("  ❌ Header checksum does not verify");
        }
    } else {
        println!("  Response is not an IPv4 packet");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_has_twelve_rounds_starting_at_two() {
        let lengths: Vec<u16> = payload_schedule().collect();
        assert_eq!(lengths.len(), usize::from(PACKET_ROUNDS));
        assert_eq!(lengths.first(), Some(&2));
        assert_eq!(lengths.last(), Some(&24));
        for pair in lengths.windows(2) {
            assert_eq!(pair[1] - pair[0], PAYLOAD_STEP);
        }
    }

    #[test]
    fn generated_total_lengths_grow_by_two() {
        let dest = Ipv4Addr::new(18, 221, 102, 182);
        let mut previous = None;

        for payload_len in payload_schedule() {
            let payload = random_payload(usize::from(payload_len));
            let packet = create_ip_packet(&payload, &SOURCE_ADDRESS, &dest).unwrap();

            let total = u16::from_be_bytes([packet[2], packet[3]]);
            assert_eq!(total, IP_HEADER_LENGTH + payload_len);
            assert!(checksum::verify(&packet[..usize::from(IP_HEADER_LENGTH)]));

            if let Some(prev) = previous {
                assert_eq!(total - prev, PAYLOAD_STEP);
            }
            previous = Some(total);
        }
    }

    #[test]
    fn random_payload_has_the_requested_length() {
        for len in [0usize, 2, 24] {
            assert_eq!(random_payload(len).len(), len);
        }
    }
}
