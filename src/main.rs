use std::env;
use std::net::Ipv4Addr;

mod client;
mod hextools;
mod net;

const DEFAULT_SERVER_IP: Ipv4Addr = Ipv4Addr::new(18, 221, 102, 182);
const DEFAULT_SERVER_PORT: u16 = 38003;

fn help(program_name: &str) {
    let help_message = format!("
************************************************************************************************

    IPv4 Forge is a small CLI that hand-builds IPv4 packets and sends them to an echo server 💜

    Session behaviour:
    - Connects to the server over TCP (default {DEFAULT_SERVER_IP}:{DEFAULT_SERVER_PORT})
    - Sends 12 packets with a hand-packed 20-byte IPv4 header
    - Payload is random data, starting at 2 bytes and growing by 2 each packet
    - Every header carries its RFC 791 checksum; each packet is hexdumped as it goes out
    - After the last packet, waits up to 5 seconds for a reply and verifies its checksum


    Usage:
    {program_name} --help
    {program_name} -h

    {program_name}                                    # sends to the default server
    {program_name} --send <ip_address> [port]         # port is optional, defaults to {DEFAULT_SERVER_PORT}
    {program_name} -s <ip_address> [port]

    Examples:
    {program_name} --send 127.0.0.1 9000      # sends the schedule to a local server
    {program_name} --send 18.221.102.182      # sends to the default server explicitly

************************************************************************************************
", );
    println!("{}", help_message);
}

fn run(server_ip: &Ipv4Addr, server_port: u16) -> std::io::Result<()> {
    println!("🚀 Starting IPv4 Packet Client");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Target: {}:{}", server_ip, server_port);

    let outcome = client::run_session(server_ip, server_port);

    if let Err(err) = &outcome {
        println!("\nUh oh! Looks like something went wrong: {}", err);
    }
    println!("Disconnected from Server.");

    match outcome {
        Ok(()) => Ok(()),
        Err(_) => std::process::exit(1),
    }
}

fn main() -> std::io::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--help" | "-h" => {
                help(&args[0]);
                Ok(())
            }
            "--send" | "-s" => {
                if args.len() < 3 {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "Missing IP address",
                    ));
                }

                // Parse the IP address (arg[2])
                let server_ip = args[2].parse::<Ipv4Addr>().map_err(|_| {
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, "Invalid IP address")
                })?;

                // Get port from arguments if provided, otherwise use default
                let server_port = if args.len() > 3 {
                    match args[3].parse::<u16>() {
                        Ok(p) => p,
                        Err(_) => {
                            println!(
                                "Invalid port number. Using default port {}",
                                DEFAULT_SERVER_PORT
                            );
                            DEFAULT_SERVER_PORT
                        }
                    }
                } else {
                    DEFAULT_SERVER_PORT
                };

                run(&server_ip, server_port)
            }
            _ => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Invalid argument. Use --help to see usage.",
            )),
        }
    } else {
        // No arguments: talk to the default server
        run(&DEFAULT_SERVER_IP, DEFAULT_SERVER_PORT)
    }
}
