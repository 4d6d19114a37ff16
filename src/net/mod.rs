pub mod checksum;
pub mod ip;
