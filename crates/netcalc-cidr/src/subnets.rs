//! Lazy enumeration of the subnets inside a superblock

use netcalc_core::mask;
use netcalc_core::{Address, MAX_PREFIX};
use std::cmp::Ordering;
use std::iter::FusedIterator;

use crate::session::Bounds;

/// Iterator over the `cidr_incr` networks contained in a superblock
///
/// Yields network addresses in ascending order, each carrying `cidr_incr`
/// as its prefix length. The walk ends once the known subnet count is used
/// up, the carry overflows the top group, or the next network no longer
/// falls inside the superblock. Nothing is yielded when `cidr_incr` is
/// wider than the superblock.
///
/// # Examples
///
/// ```
/// use netcalc_cidr::{format, parse_address, Subnets};
///
/// let block = parse_address("192.168.0.0/24").unwrap();
/// let subnets: Vec<String> = Subnets::new(block, 120, 122)
///     .map(|s| format::format_ipv4(&s))
///     .collect();
/// assert_eq!(subnets, ["192.168.0.0", "192.168.0.64", "192.168.0.128", "192.168.0.192"]);
/// ```
#[derive(Debug, Clone)]
pub struct Subnets {
    superblock: Address,
    inclusive_cidr: u8,
    step: Option<Address>,
    next: Option<Address>,
    remaining: Option<u64>,
}

impl Subnets {
    /// Start enumerating `cidr_incr` subnets of the `inclusive_cidr` network
    /// around `superblock`
    pub fn new(superblock: Address, inclusive_cidr: u8, cidr_incr: u8) -> Self {
        let inclusive_cidr = inclusive_cidr.min(MAX_PREFIX);
        let cidr_incr = cidr_incr.min(MAX_PREFIX);
        let superblock = mask::network_address(superblock, inclusive_cidr);

        let next = if cidr_incr < inclusive_cidr {
            None
        } else {
            Some(mask::network_address(superblock, cidr_incr))
        };

        Self {
            superblock,
            inclusive_cidr,
            step: mask::increment_step(cidr_incr),
            next,
            remaining: mask::subnet_count(inclusive_cidr, cidr_incr),
        }
    }

    /// Subnets of the session superblock at the session increment
    pub fn from_bounds(bounds: &Bounds) -> Self {
        Self::new(
            bounds.superblock,
            bounds.inclusive_cidr,
            bounds.cidr_increment,
        )
    }

    /// Subnets still to come, when the count fits in 64 bits
    pub fn remaining(&self) -> Option<u64> {
        if self.next.is_none() {
            return Some(0);
        }
        self.remaining
    }
}

impl Iterator for Subnets {
    type Item = Address;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        if self.remaining == Some(0)
            || mask::compare_within(&current, &self.superblock, self.inclusive_cidr)
                != Ordering::Equal
        {
            self.next = None;
            return None;
        }

        self.next = self.step.and_then(|step| mask::checked_add(current, step));
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
        }

        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.remaining().map(usize::try_from) {
            Some(Ok(count)) => (count, Some(count)),
            _ => (0, None),
        }
    }
}

impl FusedIterator for Subnets {}
