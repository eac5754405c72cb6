//! CIDR parsing, range arithmetic and subnet enumeration
//!
//! Provides the calculation pipeline behind `netcalc`:
//! - Parse IPv4/IPv6 literals with an optional `/prefix`
//! - Collect them into a [`NetworkSession`] and compute the superblock
//! - Enumerate subnets of a given size with [`Subnets`]
//! - Render addresses and aligned tables ([`format`], [`table`])
//!
//! # Examples
//!
//! ```
//! use netcalc_cidr::{format, parse_address, NetworkSession, SessionOptions};
//!
//! let mut session = NetworkSession::new(SessionOptions::default());
//! session.add("10.0.0.1").unwrap();
//! session.add("10.0.0.254").unwrap();
//!
//! let bounds = session.bounds().unwrap();
//! assert_eq!(format::format_ipv4(&bounds.superblock), "10.0.0.0");
//! assert_eq!(bounds.inclusive_cidr, 120); // /24 in IPv4 terms
//!
//! let addr = parse_address("2001:db8::1/64").unwrap();
//! assert_eq!(addr.prefix_len(), 64);
//! ```

use netcalc_core::{AddressFamily, NetcalcError, GROUPS, MAX_PREFIX};

pub mod format;
pub mod session;
pub mod subnets;
pub mod table;

pub use netcalc_core::{mask, Address, Result};
pub use session::{Bounds, NetworkSession, SessionOptions};
pub use subnets::Subnets;
pub use table::{Report, Row, RowKind, Table};

/// Parse an address literal with an optional trailing `/prefix`
///
/// IPv4 literals come back IPv6-mapped with their prefix offset by 96. A
/// missing prefix means a host route (128).
///
/// # Errors
///
/// * [`NetcalcError::InvalidCidr`] for a prefix that is out of range or not
///   a number
/// * [`NetcalcError::InvalidAddress`] for a malformed address
///
/// # Examples
///
/// ```
/// use netcalc_cidr::parse_address;
///
/// let v4 = parse_address("192.168.1.10/24").unwrap();
/// assert_eq!(v4.prefix_len(), 120);
/// assert!(v4.is_ipv4_mapped());
///
/// assert!(parse_address("10.0.0.1/33").is_err());
/// assert!(parse_address("::1::2").is_err());
/// ```
pub fn parse_address(literal: &str) -> Result<Address> {
    let literal = literal.trim();
    let (addr_str, prefix) = match literal.split_once('/') {
        Some((addr, prefix)) => (addr, Some(parse_prefix(literal, prefix)?)),
        None => (literal, None),
    };

    let family = AddressFamily::detect(addr_str);
    let prefix = match prefix {
        Some(prefix) if prefix <= u32::from(family.max_prefix()) => prefix as u8,
        Some(prefix) => {
            return Err(NetcalcError::InvalidCidr(format!(
                "'{}': /{} is out of range (expected 0-{} for {})",
                literal,
                prefix,
                family.max_prefix(),
                family
            )))
        }
        None => family.max_prefix(),
    };

    match family {
        AddressFamily::Ipv4 => Address::from_ipv4(parse_ipv4(literal, addr_str)?, prefix),
        AddressFamily::Ipv6 => Address::new(parse_ipv6(literal, addr_str)?, prefix),
    }
}

/// Parse a prefix length the way `strtol(s, NULL, 0)` reads it: `0x` is
/// hexadecimal, a leading `0` is octal, anything else decimal.
fn parse_prefix(token: &str, text: &str) -> Result<u32> {
    let invalid = || {
        NetcalcError::InvalidCidr(format!(
            "'{}': prefix '{}' is not a number (expected /N)",
            token, text
        ))
    };

    let (digits, radix) = if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        (hex, 16)
    } else if text.len() > 1 && text.starts_with('0') {
        (&text[1..], 8)
    } else {
        (text, 10)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(invalid());
    }

    u32::from_str_radix(digits, radix).map_err(|_| invalid())
}

/// Parse a dotted-quad IPv4 address into octets
fn parse_ipv4(token: &str, text: &str) -> Result<[u8; 4]> {
    let parts: Vec<&str> = text.split('.').collect();
    if parts.len() != 4 {
        return Err(NetcalcError::InvalidAddress(format!(
            "'{}': expected 4 dotted octets (a.b.c.d)",
            token
        )));
    }

    let mut octets = [0u8; 4];
    for (octet, part) in octets.iter_mut().zip(&parts) {
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(NetcalcError::InvalidAddress(format!(
                "'{}': octet '{}' is not a decimal number",
                token, part
            )));
        }

        let value: u16 = part.parse().map_err(|_| {
            NetcalcError::InvalidAddress(format!("'{}': invalid octet '{}'", token, part))
        })?;
        *octet = u8::try_from(value).map_err(|_| {
            NetcalcError::InvalidAddress(format!(
                "'{}': octet '{}' is not in 0-255",
                token, part
            ))
        })?;
    }

    Ok(octets)
}

/// Parse an IPv6 address, including `::` compression and an embedded
/// IPv4 tail, into eight groups
fn parse_ipv6(token: &str, text: &str) -> Result<[u16; GROUPS]> {
    if text.matches("::").count() > 1 {
        return Err(NetcalcError::InvalidAddress(format!(
            "'{}': '::' may appear only once",
            token
        )));
    }

    let (head, tail) = match text.split_once("::") {
        Some((head, tail)) => (head, Some(tail)),
        None => (text, None),
    };

    let head_groups = parse_groups(token, head, tail.is_none())?;
    let tail_groups = match tail {
        Some(tail) => parse_groups(token, tail, true)?,
        None => Vec::new(),
    };

    let mut groups = [0u16; GROUPS];
    match tail {
        None => {
            if head_groups.len() != GROUPS {
                return Err(NetcalcError::InvalidAddress(format!(
                    "'{}': expected 8 groups, found {}",
                    token,
                    head_groups.len()
                )));
            }
            groups.copy_from_slice(&head_groups);
        }
        Some(_) => {
            // '::' stands for at least one zero group
            if head_groups.len() + tail_groups.len() >= GROUPS {
                return Err(NetcalcError::InvalidAddress(format!(
                    "'{}': too many groups around '::'",
                    token
                )));
            }
            groups[..head_groups.len()].copy_from_slice(&head_groups);
            groups[GROUPS - tail_groups.len()..].copy_from_slice(&tail_groups);
        }
    }

    if text.contains('.') && !(groups[..5].iter().all(|&g| g == 0) && groups[5] == 0xffff) {
        return Err(NetcalcError::InvalidAddress(format!(
            "'{}': embedded IPv4 requires the ::ffff: prefix",
            token
        )));
    }

    Ok(groups)
}

/// Parse one side of a `::` split into groups
///
/// An embedded IPv4 literal is only accepted as the very last segment of
/// the address and expands to two groups.
fn parse_groups(token: &str, part: &str, holds_last: bool) -> Result<Vec<u16>> {
    if part.is_empty() {
        return Ok(Vec::new());
    }

    let segments: Vec<&str> = part.split(':').collect();
    if segments.len() > GROUPS {
        return Err(NetcalcError::InvalidAddress(format!(
            "'{}': more than 8 groups",
            token
        )));
    }

    let mut groups = Vec::with_capacity(GROUPS);
    for (i, segment) in segments.iter().enumerate() {
        if segment.contains('.') {
            if !holds_last || i + 1 != segments.len() {
                return Err(NetcalcError::InvalidAddress(format!(
                    "'{}': embedded IPv4 '{}' must be the last group",
                    token, segment
                )));
            }
            let octets = parse_ipv4(token, segment)?;
            groups.push(u16::from_be_bytes([octets[0], octets[1]]));
            groups.push(u16::from_be_bytes([octets[2], octets[3]]));
        } else {
            groups.push(parse_hex_group(token, segment)?);
        }
    }

    Ok(groups)
}

fn parse_hex_group(token: &str, segment: &str) -> Result<u16> {
    if segment.is_empty()
        || segment.len() > 4
        || !segment.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return Err(NetcalcError::InvalidAddress(format!(
            "'{}': group '{}' is not 1-4 hex digits",
            token, segment
        )));
    }

    u16::from_str_radix(segment, 16).map_err(|_| {
        NetcalcError::InvalidAddress(format!("'{}': invalid group '{}'", token, segment))
    })
}

/// Prefix length of the whole space for a display family, in shared terms
pub(crate) fn family_floor(family: AddressFamily) -> u8 {
    MAX_PREFIX - family.max_prefix()
}
