//! Primitive codecs for command arguments and console responses.
//!
//! The module's console is forgiving text: numbers stop at the first
//! non-digit, hex may or may not carry a `0x` prefix, and addresses are dotted
//! quads. These helpers never fail; they decode as much as is there.

use std::net::Ipv4Addr;

/// Format a value as the module expects hex arguments: `0x` + uppercase nibbles.
pub fn to_hex_arg(value: u32) -> String {
    format!("0x{value:X}")
}

/// Format a value as a decimal argument.
pub fn to_dec_arg(value: u32) -> String {
    value.to_string()
}

/// Parse leading decimal digits, ignoring anything after them.
///
/// Overflow wraps, matching the module's own 32-bit counters.
pub fn parse_dec(text: &str) -> u32 {
    text.bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0u32, |acc, b| acc.wrapping_mul(10).wrapping_add(u32::from(b - b'0')))
}

/// Parse leading hex digits. An optional `0x`/`0X` prefix is skipped.
pub fn parse_hex(text: &str) -> u32 {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);

    digits
        .chars()
        .map_while(|c| c.to_digit(16))
        .fold(0u32, |acc, nibble| (acc << 4) | nibble)
}

/// Format an address as a dotted quad.
pub fn ip_to_string(addr: Ipv4Addr) -> String {
    addr.to_string()
}

/// Decode a dotted quad leniently.
///
/// Missing octets are zero and trailing text (such as a `:port` suffix) is
/// ignored, so `"10.0.0.5:2000"` decodes to `10.0.0.5`.
pub fn parse_ip(text: &str) -> Ipv4Addr {
    let mut octets = [0u8; 4];
    let mut rest = text;

    for (ind, octet) in octets.iter_mut().enumerate() {
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        *octet = parse_dec(&rest[..digits]) as u8;
        rest = &rest[digits..];
        if ind < 3 {
            match rest.strip_prefix('.') {
                Some(next) => rest = next,
                None => break,
            }
        }
    }

    Ipv4Addr::from(octets)
}

/// True when `addr` is exactly four decimal octets in `0..=255`.
pub fn is_dot_quad(addr: &str) -> bool {
    let parts: Vec<&str> = addr.split('.').collect();
    parts.len() == 4
        && parts.iter().all(|part| {
            !part.is_empty()
                && part.len() <= 3
                && part.bytes().all(|b| b.is_ascii_digit())
                && parse_dec(part) <= 255
        })
}

/// Replace spaces so an argument survives the console's token splitting.
///
/// The module swaps the replacement character back itself.
pub fn substitute_spaces(arg: &str, replacement: char) -> String {
    arg.replace(' ', &replacement.to_string())
}
