//! Mask arithmetic over the shared 128-bit domain
//!
//! Every function here is pure and works on eight 16-bit groups, so IPv4
//! (mapped) and IPv6 addresses share one implementation. Prefix lengths are
//! in the shared space and anything above 128 is clamped to 128.
//!
//! # Examples
//!
//! ```
//! use netcalc_core::{mask, Address};
//!
//! let addr = Address::from_ipv4([192, 168, 1, 10], 24).unwrap();
//! let network = mask::network_address(addr, addr.prefix_len());
//! assert_eq!(network.ipv4_octets(), [192, 168, 1, 0]);
//!
//! let broadcast = mask::broadcast_address(addr, addr.prefix_len());
//! assert_eq!(broadcast.ipv4_octets(), [192, 168, 1, 255]);
//! ```

use crate::{Address, GROUPS, MAX_PREFIX};
use std::cmp::Ordering;

/// Mask with the top `cidr` bits set
pub fn netmask(cidr: u8) -> Address {
    let cidr = cidr.min(MAX_PREFIX);
    let mut groups = [0u16; GROUPS];

    let full = usize::from(cidr / 16);
    for group in groups.iter_mut().take(full) {
        *group = 0xffff;
    }

    let partial = cidr % 16;
    if partial > 0 {
        groups[full] = 0xffff << (16 - partial);
    }

    Address {
        groups,
        prefix_len: cidr,
    }
}

/// Complement of [`netmask`]: the host bits of a `cidr` network
pub fn wildcard_mask(cidr: u8) -> Address {
    let cidr = cidr.min(MAX_PREFIX);
    (!netmask(cidr)).with_prefix(cidr)
}

/// `addr & netmask(cidr)`, carrying `cidr` as the prefix length
pub fn network_address(addr: Address, cidr: u8) -> Address {
    (addr & netmask(cidr)).with_prefix(cidr)
}

/// `addr | wildcard_mask(cidr)`, carrying `cidr` as the prefix length
pub fn broadcast_address(addr: Address, cidr: u8) -> Address {
    (addr | wildcard_mask(cidr)).with_prefix(cidr)
}

/// Compare two addresses group by group, most significant first
///
/// Prefix lengths are ignored.
pub fn compare(a: &Address, b: &Address) -> Ordering {
    a.groups.cmp(&b.groups)
}

/// Compare two addresses after masking both at `cidr`
///
/// Returns `Ordering::Equal` when both fall in the same `cidr` network.
pub fn compare_within(a: &Address, b: &Address, cidr: u8) -> Ordering {
    let mask = netmask(cidr);
    compare(&(*a & mask), &(*b & mask))
}

/// Narrowest prefix, starting from `start`, at which `lower` and `upper`
/// share one network
///
/// Walks down one bit at a time. Prefix 0 is the whole address space and
/// always matches, so the walk ends there at the latest.
///
/// ```
/// use netcalc_core::{mask, Address};
///
/// let lower = Address::from_ipv4([10, 0, 0, 1], 32).unwrap();
/// let upper = Address::from_ipv4([10, 0, 0, 254], 32).unwrap();
/// assert_eq!(mask::inclusive_cidr(&lower, &upper, 128), 120);
/// ```
pub fn inclusive_cidr(lower: &Address, upper: &Address, start: u8) -> u8 {
    let mut cidr = start.min(MAX_PREFIX);
    while cidr > 0 && compare_within(lower, upper, cidr) != Ordering::Equal {
        cidr -= 1;
    }
    cidr
}

/// Add two addresses with carry propagation across 16-bit groups
///
/// Returns `None` when the carry leaves the most significant group. The
/// prefix length of `a` is kept.
pub fn checked_add(a: Address, b: Address) -> Option<Address> {
    let mut groups = [0u16; GROUPS];
    let mut carry = 0u32;

    for i in (0..GROUPS).rev() {
        let sum = u32::from(a.groups[i]) + u32::from(b.groups[i]) + carry;
        groups[i] = (sum & 0xffff) as u16;
        carry = sum >> 16;
    }

    if carry != 0 {
        return None;
    }

    Some(Address {
        groups,
        prefix_len: a.prefix_len,
    })
}

/// Distance between consecutive `cidr` networks: a single bit at
/// `1 << (128 - cidr)`
///
/// `None` for prefix 0, whose step does not fit in 128 bits.
pub fn increment_step(cidr: u8) -> Option<Address> {
    let cidr = cidr.min(MAX_PREFIX);
    if cidr == 0 {
        return None;
    }

    let bit = usize::from(MAX_PREFIX - cidr);
    let mut groups = [0u16; GROUPS];
    groups[GROUPS - 1 - bit / 16] = 1 << (bit % 16);

    Some(Address {
        groups,
        prefix_len: cidr,
    })
}

/// Number of `cidr_incr` subnets inside a `cidr` network
///
/// `Some(0)` when the increment is wider than the network. `None` when the
/// count spans 64 bits or more and is reported as not applicable.
///
/// ```
/// use netcalc_core::mask::subnet_count;
///
/// assert_eq!(subnet_count(120, 128), Some(256));
/// assert_eq!(subnet_count(120, 112), Some(0));
/// assert_eq!(subnet_count(0, 64), None);
/// ```
pub fn subnet_count(cidr: u8, cidr_incr: u8) -> Option<u64> {
    let cidr = cidr.min(MAX_PREFIX);
    let cidr_incr = cidr_incr.min(MAX_PREFIX);
    if cidr_incr < cidr {
        return Some(0);
    }

    let span = cidr_incr - cidr;
    if span >= 64 {
        None
    } else {
        Some(1u64 << span)
    }
}
