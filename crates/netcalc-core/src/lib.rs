//! Core types for netcalc (CIDR network calculator)
//!
//! This crate provides the value types every other netcalc crate builds on:
//! - [`Address`] - 128-bit address stored as eight 16-bit groups
//! - [`AddressFamily`] - IPv4 or IPv6, detected from the input literal
//! - [`NetcalcError`] - Error types
//! - [`mask`] - Netmask, wildcard and network arithmetic
//!
//! IPv4 addresses are lifted into IPv6-mapped form (`::ffff:a.b.c.d`) and
//! their prefix lengths are offset by 96, so both families share one
//! compare/mask domain.
//!
//! ```
//! use netcalc_core::Address;
//!
//! let addr = Address::from_ipv4([192, 168, 1, 10], 24).unwrap();
//! assert!(addr.is_ipv4_mapped());
//! assert_eq!(addr.prefix_len(), 120);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::ops::{BitAnd, BitOr, Not};
use thiserror::Error;

pub mod mask;

/// Number of 16-bit groups in an address
pub const GROUPS: usize = 8;

/// Widest prefix length in the shared 128-bit space
pub const MAX_PREFIX: u8 = 128;

/// Offset added to IPv4 prefix lengths (128 - 32)
pub const IPV4_PREFIX_OFFSET: u8 = 96;

/// Address family of an input literal or of a whole calculation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    /// Detect the family of a literal: any `:` means IPv6.
    pub fn detect(literal: &str) -> Self {
        if literal.contains(':') {
            AddressFamily::Ipv6
        } else {
            AddressFamily::Ipv4
        }
    }

    /// Widest user-facing prefix length for this family
    pub fn max_prefix(self) -> u8 {
        match self {
            AddressFamily::Ipv4 => 32,
            AddressFamily::Ipv6 => MAX_PREFIX,
        }
    }

    /// Offset between the user-facing prefix and the shared 128-bit space
    pub fn prefix_offset(self) -> u8 {
        match self {
            AddressFamily::Ipv4 => IPV4_PREFIX_OFFSET,
            AddressFamily::Ipv6 => 0,
        }
    }

    /// Convert a user-facing prefix length into the shared 128-bit space
    ///
    /// # Examples
    ///
    /// ```
    /// use netcalc_core::AddressFamily;
    ///
    /// assert_eq!(AddressFamily::Ipv4.to_shared_prefix(24).unwrap(), 120);
    /// assert!(AddressFamily::Ipv4.to_shared_prefix(33).is_err());
    /// ```
    pub fn to_shared_prefix(self, prefix: u8) -> Result<u8> {
        if prefix > self.max_prefix() {
            return Err(NetcalcError::InvalidCidr(format!(
                "/{} (expected 0-{} for {})",
                prefix,
                self.max_prefix(),
                self
            )));
        }
        Ok(prefix + self.prefix_offset())
    }

    /// Convert a shared-space prefix back into this family's space
    ///
    /// Prefixes narrower than the family offset saturate at 0.
    pub fn to_family_prefix(self, prefix: u8) -> u8 {
        prefix.min(MAX_PREFIX).saturating_sub(self.prefix_offset())
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::Ipv4 => write!(f, "IPv4"),
            AddressFamily::Ipv6 => write!(f, "IPv6"),
        }
    }
}

/// A 128-bit address with its prefix length
///
/// Groups are stored most significant first. The prefix length lives in the
/// shared 128-bit space (an IPv4 `/24` is stored as 120). Ordering compares
/// the groups first and falls back to the prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawAddress")]
pub struct Address {
    groups: [u16; GROUPS],
    prefix_len: u8,
}

/// Unchecked wire form; deserialization goes through [`Address::new`]
#[derive(Deserialize)]
struct RawAddress {
    groups: [u16; GROUPS],
    prefix_len: u8,
}

impl TryFrom<RawAddress> for Address {
    type Error = NetcalcError;

    fn try_from(raw: RawAddress) -> Result<Self> {
        Address::new(raw.groups, raw.prefix_len)
    }
}

impl Address {
    /// The all-zero address (`::/128`)
    pub const UNSPECIFIED: Address = Address {
        groups: [0; GROUPS],
        prefix_len: MAX_PREFIX,
    };

    /// Create an address from raw groups and a shared-space prefix length
    pub fn new(groups: [u16; GROUPS], prefix_len: u8) -> Result<Self> {
        if prefix_len > MAX_PREFIX {
            return Err(NetcalcError::InvalidCidr(format!(
                "/{} (expected 0-{})",
                prefix_len, MAX_PREFIX
            )));
        }
        Ok(Self { groups, prefix_len })
    }

    /// Create an IPv6-mapped address from IPv4 octets and an IPv4 prefix (0-32)
    pub fn from_ipv4(octets: [u8; 4], prefix_len: u8) -> Result<Self> {
        let prefix_len = AddressFamily::Ipv4.to_shared_prefix(prefix_len)?;
        Ok(Self {
            groups: mapped_groups(octets),
            prefix_len,
        })
    }

    /// Create an address from a 128-bit integer, as a host route
    pub fn from_u128(value: u128) -> Self {
        let mut groups = [0u16; GROUPS];
        for (i, group) in groups.iter_mut().enumerate() {
            *group = (value >> (112 - 16 * i)) as u16;
        }
        Self {
            groups,
            prefix_len: MAX_PREFIX,
        }
    }

    /// The address as a 128-bit integer
    pub fn to_u128(&self) -> u128 {
        self.groups
            .iter()
            .fold(0u128, |acc, &group| (acc << 16) | group as u128)
    }

    /// All eight groups, most significant first
    pub fn groups(&self) -> [u16; GROUPS] {
        self.groups
    }

    /// Bounds-checked group accessor
    pub fn group(&self, index: usize) -> Option<u16> {
        self.groups.get(index).copied()
    }

    /// Prefix length in the shared 128-bit space
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Same address with a different prefix length (clamped to 128)
    pub fn with_prefix(self, prefix_len: u8) -> Self {
        Self {
            groups: self.groups,
            prefix_len: prefix_len.min(MAX_PREFIX),
        }
    }

    /// True for `::ffff:a.b.c.d`
    pub fn is_ipv4_mapped(&self) -> bool {
        self.groups[..5].iter().all(|&g| g == 0) && self.groups[5] == 0xffff
    }

    /// Low 32 bits as IPv4 octets
    pub fn ipv4_octets(&self) -> [u8; 4] {
        let [hi0, hi1] = self.groups[6].to_be_bytes();
        let [lo0, lo1] = self.groups[7].to_be_bytes();
        [hi0, hi1, lo0, lo1]
    }
}

fn mapped_groups(octets: [u8; 4]) -> [u16; GROUPS] {
    [
        0,
        0,
        0,
        0,
        0,
        0xffff,
        u16::from_be_bytes([octets[0], octets[1]]),
        u16::from_be_bytes([octets[2], octets[3]]),
    ]
}

impl Default for Address {
    fn default() -> Self {
        Self::UNSPECIFIED
    }
}

impl From<Ipv4Addr> for Address {
    fn from(ip: Ipv4Addr) -> Self {
        Self {
            groups: mapped_groups(ip.octets()),
            prefix_len: MAX_PREFIX,
        }
    }
}

impl From<Ipv6Addr> for Address {
    fn from(ip: Ipv6Addr) -> Self {
        Self {
            groups: ip.segments(),
            prefix_len: MAX_PREFIX,
        }
    }
}

impl From<Address> for Ipv6Addr {
    fn from(addr: Address) -> Self {
        let g = addr.groups;
        Ipv6Addr::new(g[0], g[1], g[2], g[3], g[4], g[5], g[6], g[7])
    }
}

impl BitAnd for Address {
    type Output = Address;

    fn bitand(self, rhs: Address) -> Address {
        let mut groups = self.groups;
        for (group, other) in groups.iter_mut().zip(rhs.groups) {
            *group &= other;
        }
        Address { groups, ..self }
    }
}

impl BitOr for Address {
    type Output = Address;

    fn bitor(self, rhs: Address) -> Address {
        let mut groups = self.groups;
        for (group, other) in groups.iter_mut().zip(rhs.groups) {
            *group |= other;
        }
        Address { groups, ..self }
    }
}

impl Not for Address {
    type Output = Address;

    fn not(self) -> Address {
        Address {
            groups: self.groups.map(|g| !g),
            ..self
        }
    }
}

/// Error types for netcalc operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetcalcError {
    /// Prefix length out of range or not a number
    #[error("Invalid CIDR: {0}")]
    InvalidCidr(String),

    /// Malformed IPv4 or IPv6 literal
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Mutually exclusive display modes requested together
    #[error("Conflicting options: {0}")]
    ConflictingOptions(String),

    /// Allocation failure while storing parsed addresses
    #[error("Out of memory while storing {0} addresses")]
    OutOfMemory(usize),

    /// Bounds requested before any address was added
    #[error("No addresses to calculate")]
    NoAddresses,
}

/// Result type alias for netcalc operations
pub type Result<T> = std::result::Result<T, NetcalcError>;
