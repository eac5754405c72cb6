//! One calculation run: parsed inputs, options and the computed bounds
//!
//! A [`NetworkSession`] is filled by [`NetworkSession::add`] in argument
//! order. [`NetworkSession::bounds`] sorts the inputs once and derives the
//! lower/upper addresses, the inclusive CIDR and the superblock; after that
//! the session is only read.

use netcalc_core::mask;
use netcalc_core::{Address, AddressFamily, NetcalcError, Result, MAX_PREFIX};
use serde::Serialize;
use tracing::debug;

use crate::format::DisplayOptions;
use crate::parse_address;

/// Default cap on enumerated subnet rows
pub const DEFAULT_MAX_SUBNETS: usize = 65_536;

/// Default enumeration size for IPv6 runs (/64)
pub const DEFAULT_IPV6_INCREMENT: u8 = 64;

/// Display and behaviour flags for one run
///
/// `cidr_limit` and `cidr_increment` are given in the display family's own
/// prefix space (`/24` for IPv4, not 120).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Render IPv4 input as IPv4 even when the run is IPv6-mapped
    pub force_ipv4: bool,
    /// Render everything as IPv6
    pub force_ipv6: bool,
    /// List every parsed input
    pub verbose: bool,
    /// Enumerate `cidr_increment` subnets of the superblock
    pub list_subnets: bool,
    /// Show every network enclosing the superblock
    pub show_inclusive: bool,
    /// IPv6 without `::` compression
    pub full: bool,
    /// IPv6 groups zero-padded to 4 digits (implies `full`)
    pub expanded: bool,
    /// Do not render `::ffff:a.b.c.d` as mapped
    pub no_map: bool,
    /// Narrowest prefix allowed for the superblock
    pub cidr_limit: Option<u8>,
    /// Subnet size used by enumeration
    pub cidr_increment: Option<u8>,
    /// Stop enumerating after this many subnets
    pub max_subnets: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            force_ipv4: false,
            force_ipv6: false,
            verbose: false,
            list_subnets: false,
            show_inclusive: false,
            full: false,
            expanded: false,
            no_map: false,
            cidr_limit: None,
            cidr_increment: None,
            max_subnets: DEFAULT_MAX_SUBNETS,
        }
    }
}

/// Result of the bounds computation
///
/// All prefix lengths are in the shared 128-bit space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds {
    /// Numerically smallest input
    pub lower: Address,
    /// Numerically largest input
    pub upper: Address,
    /// Smallest input prefix, clamped to `cidr_limit`
    pub effective_cidr: u8,
    /// Narrowest prefix whose network holds both `lower` and `upper`
    pub inclusive_cidr: u8,
    /// Network address of `lower` at `inclusive_cidr`
    pub superblock: Address,
    /// Narrowest superblock prefix allowed
    pub cidr_limit: u8,
    /// Subnet size for counts and listing
    pub cidr_increment: u8,
    /// Family used to render the report
    pub display_family: AddressFamily,
}

/// Parsed inputs of one invocation
#[derive(Debug, Clone)]
pub struct NetworkSession {
    addresses: Vec<Address>,
    family: AddressFamily,
    all_mapped: bool,
    min_prefix: u8,
    options: SessionOptions,
}

impl NetworkSession {
    /// Create an empty session
    pub fn new(options: SessionOptions) -> Self {
        Self {
            addresses: Vec::new(),
            family: AddressFamily::Ipv4,
            all_mapped: true,
            min_prefix: MAX_PREFIX,
            options,
        }
    }

    /// Parse one literal and add it to the session
    ///
    /// Any IPv6 literal switches the whole run to IPv6.
    ///
    /// # Examples
    ///
    /// ```
    /// use netcalc_cidr::{NetworkSession, SessionOptions};
    /// use netcalc_core::AddressFamily;
    ///
    /// let mut session = NetworkSession::new(SessionOptions::default());
    /// session.add("10.0.0.1").unwrap();
    /// assert_eq!(session.family(), AddressFamily::Ipv4);
    ///
    /// session.add("::ffff:10.0.0.2").unwrap();
    /// assert_eq!(session.family(), AddressFamily::Ipv6);
    /// ```
    pub fn add(&mut self, literal: &str) -> Result<()> {
        let address = parse_address(literal)?;

        self.addresses
            .try_reserve(1)
            .map_err(|_| NetcalcError::OutOfMemory(self.addresses.len() + 1))?;

        if AddressFamily::detect(literal) == AddressFamily::Ipv6 {
            self.family = AddressFamily::Ipv6;
        }
        self.all_mapped &= address.is_ipv4_mapped();
        self.min_prefix = self.min_prefix.min(address.prefix_len());

        debug!(
            literal,
            prefix = address.prefix_len(),
            family = %self.family,
            "parsed address"
        );

        self.addresses.push(address);
        Ok(())
    }

    /// Parse every literal, stopping at the first failure
    pub fn extend<I, S>(&mut self, literals: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for literal in literals {
            self.add(literal.as_ref())?;
        }
        Ok(())
    }

    /// Parsed inputs (sorted once [`bounds`](Self::bounds) has run)
    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// Number of parsed inputs
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// True before any input has been added
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Family of the run: IPv6 once any IPv6 literal was added
    pub fn family(&self) -> AddressFamily {
        self.family
    }

    /// Options the session was created with
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Family used for rendering, after the `-4`/`-6` overrides
    pub fn display_family(&self) -> AddressFamily {
        if self.options.force_ipv6 {
            AddressFamily::Ipv6
        } else if self.options.force_ipv4 {
            AddressFamily::Ipv4
        } else {
            self.family
        }
    }

    /// Family whose prefix numbering `cidr_limit` and `cidr_increment` use
    ///
    /// IPv4 runs, and mapped runs shown as IPv4, count prefixes up to 32.
    /// `-6` only changes rendering and leaves this alone.
    pub fn prefix_family(&self) -> AddressFamily {
        if self.options.force_ipv4 && self.all_mapped {
            AddressFamily::Ipv4
        } else {
            self.family
        }
    }

    /// Rendering options derived from the session flags
    pub fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            family: self.display_family(),
            full: self.options.full || self.options.expanded,
            expanded: self.options.expanded,
            no_map: self.options.no_map,
        }
    }

    /// Reject option combinations that cannot be honoured
    pub fn validate(&self) -> Result<()> {
        if self.options.force_ipv4 && self.options.force_ipv6 {
            return Err(NetcalcError::ConflictingOptions(
                "IPv4 and IPv6 display cannot both be forced".to_string(),
            ));
        }

        if self.options.force_ipv4 && !self.all_mapped {
            return Err(NetcalcError::ConflictingOptions(
                "IPv4 display requested for native IPv6 input".to_string(),
            ));
        }

        Ok(())
    }

    /// Sort the inputs and compute the superblock
    ///
    /// # Errors
    ///
    /// * [`NetcalcError::ConflictingOptions`] from [`validate`](Self::validate)
    /// * [`NetcalcError::InvalidCidr`] for a limit or increment outside the
    ///   range of [`prefix_family`](Self::prefix_family)
    /// * [`NetcalcError::NoAddresses`] for an empty session
    pub fn bounds(&mut self) -> Result<Bounds> {
        self.validate()?;
        if self.addresses.is_empty() {
            return Err(NetcalcError::NoAddresses);
        }

        let display_family = self.display_family();
        let prefix_family = self.prefix_family();
        let cidr_limit = match self.options.cidr_limit {
            Some(limit) => prefix_family.to_shared_prefix(limit)?,
            None => MAX_PREFIX,
        };
        let cidr_increment = match self.options.cidr_increment {
            Some(increment) => prefix_family.to_shared_prefix(increment)?,
            None => match self.family {
                AddressFamily::Ipv4 => MAX_PREFIX,
                AddressFamily::Ipv6 => DEFAULT_IPV6_INCREMENT,
            },
        };

        self.addresses.sort();
        let lower = self.addresses[0];
        let upper = self.addresses[self.addresses.len() - 1];

        let effective_cidr = self.min_prefix.min(cidr_limit);
        let inclusive_cidr = if self.addresses.len() == 1 {
            effective_cidr
        } else {
            mask::inclusive_cidr(&lower, &upper, effective_cidr)
        };
        let superblock = mask::network_address(lower, inclusive_cidr);

        debug!(
            inputs = self.addresses.len(),
            effective_cidr,
            inclusive_cidr,
            cidr_limit,
            cidr_increment,
            "computed bounds"
        );

        Ok(Bounds {
            lower,
            upper,
            effective_cidr,
            inclusive_cidr,
            superblock,
            cidr_limit,
            cidr_increment,
            display_family,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::format_ipv4;

    fn session(literals: &[&str]) -> NetworkSession {
        session_with(literals, SessionOptions::default())
    }

    fn session_with(literals: &[&str], options: SessionOptions) -> NetworkSession {
        let mut session = NetworkSession::new(options);
        session.extend(literals).unwrap();
        session
    }

    #[test]
    fn test_two_hosts_share_slash_24() {
        let bounds = session(&["10.0.0.254", "10.0.0.1"]).bounds().unwrap();
        assert_eq!(format_ipv4(&bounds.lower), "10.0.0.1");
        assert_eq!(format_ipv4(&bounds.upper), "10.0.0.254");
        assert_eq!(bounds.effective_cidr, 128);
        assert_eq!(bounds.inclusive_cidr, 120);
        assert_eq!(format_ipv4(&bounds.superblock), "10.0.0.0");
    }

    #[test]
    fn test_single_input_keeps_its_cidr() {
        let bounds = session(&["192.168.1.10/24"]).bounds().unwrap();
        assert_eq!(bounds.inclusive_cidr, 120);
        assert_eq!(format_ipv4(&bounds.superblock), "192.168.1.0");
        assert_eq!(bounds.superblock.prefix_len(), 120);
    }

    #[test]
    fn test_single_host_is_clamped_by_limit() {
        let options = SessionOptions {
            cidr_limit: Some(28),
            ..SessionOptions::default()
        };
        let bounds = session_with(&["10.1.1.77"], options).bounds().unwrap();
        assert_eq!(bounds.cidr_limit, 124);
        assert_eq!(bounds.inclusive_cidr, 124);
        assert_eq!(format_ipv4(&bounds.superblock), "10.1.1.64");
    }

    #[test]
    fn test_widest_input_prefix_wins() {
        let bounds = session(&["10.0.0.1", "10.0.0.2/16"]).bounds().unwrap();
        assert_eq!(bounds.effective_cidr, 112);
        assert_eq!(bounds.inclusive_cidr, 112);
        assert_eq!(format_ipv4(&bounds.superblock), "10.0.0.0");
    }

    #[test]
    fn test_run_family_switches_to_ipv6() {
        let s = session(&["10.0.0.1", "2001:db8::1"]);
        assert_eq!(s.family(), AddressFamily::Ipv6);
        assert_eq!(s.display_family(), AddressFamily::Ipv6);
    }

    #[test]
    fn test_force_ipv6_display() {
        let options = SessionOptions {
            force_ipv6: true,
            ..SessionOptions::default()
        };
        let s = session_with(&["10.0.0.1"], options);
        assert_eq!(s.family(), AddressFamily::Ipv4);
        assert_eq!(s.display_family(), AddressFamily::Ipv6);
    }

    #[test]
    fn test_conflicting_display_modes() {
        let options = SessionOptions {
            force_ipv4: true,
            force_ipv6: true,
            ..SessionOptions::default()
        };
        let err = session_with(&["10.0.0.1"], options).bounds().unwrap_err();
        assert!(matches!(err, NetcalcError::ConflictingOptions(_)));
    }

    #[test]
    fn test_force_ipv4_on_native_ipv6_conflicts() {
        let options = SessionOptions {
            force_ipv4: true,
            ..SessionOptions::default()
        };
        let err = session_with(&["2001:db8::1"], options.clone())
            .bounds()
            .unwrap_err();
        assert!(matches!(err, NetcalcError::ConflictingOptions(_)));

        // mapped input can still be shown as IPv4
        let bounds = session_with(&["::ffff:10.0.0.1"], options).bounds().unwrap();
        assert_eq!(bounds.display_family, AddressFamily::Ipv4);
    }

    #[test]
    fn test_default_increment_follows_run_family() {
        assert_eq!(session(&["10.0.0.0/24"]).bounds().unwrap().cidr_increment, 128);
        assert_eq!(session(&["2001:db8::/48"]).bounds().unwrap().cidr_increment, 64);
    }

    #[test]
    fn test_limit_and_increment_in_input_family_space() {
        let options = SessionOptions {
            cidr_limit: Some(24),
            cidr_increment: Some(26),
            ..SessionOptions::default()
        };
        let bounds = session_with(&["10.0.0.0/16"], options).bounds().unwrap();
        assert_eq!(bounds.cidr_limit, 120);
        assert_eq!(bounds.cidr_increment, 122);

        let options = SessionOptions {
            cidr_increment: Some(33),
            ..SessionOptions::default()
        };
        let err = session_with(&["10.0.0.0/16"], options).bounds().unwrap_err();
        assert!(matches!(err, NetcalcError::InvalidCidr(_)));
    }

    #[test]
    fn test_force_ipv6_keeps_ipv4_prefix_numbering() {
        let plain = SessionOptions {
            cidr_limit: Some(24),
            cidr_increment: Some(26),
            ..SessionOptions::default()
        };
        let forced = SessionOptions {
            force_ipv6: true,
            ..plain.clone()
        };

        let expected = session_with(&["10.0.0.1", "10.0.0.254"], plain)
            .bounds()
            .unwrap();
        let mut s = session_with(&["10.0.0.1", "10.0.0.254"], forced);
        assert_eq!(s.prefix_family(), AddressFamily::Ipv4);
        let bounds = s.bounds().unwrap();

        assert_eq!(bounds.display_family, AddressFamily::Ipv6);
        assert_eq!(bounds.inclusive_cidr, expected.inclusive_cidr);
        assert_eq!(bounds.inclusive_cidr, 120);
        assert_eq!(bounds.superblock, expected.superblock);
        assert_eq!(bounds.cidr_increment, 122);
    }

    #[test]
    fn test_mapped_run_numbering() {
        let options = SessionOptions {
            cidr_limit: Some(120),
            ..SessionOptions::default()
        };
        let s = session_with(&["::ffff:10.0.0.1", "::ffff:10.0.0.9"], options.clone());
        assert_eq!(s.prefix_family(), AddressFamily::Ipv6);

        let forced_v4 = SessionOptions {
            force_ipv4: true,
            cidr_limit: Some(24),
            ..options
        };
        let mut s = session_with(&["::ffff:10.0.0.1", "::ffff:10.0.0.9"], forced_v4);
        assert_eq!(s.prefix_family(), AddressFamily::Ipv4);
        assert_eq!(s.bounds().unwrap().cidr_limit, 120);
    }

    #[test]
    fn test_empty_session() {
        let err = session(&[]).bounds().unwrap_err();
        assert_eq!(err, NetcalcError::NoAddresses);
    }

    #[test]
    fn test_parse_failure_is_fail_fast() {
        let mut s = NetworkSession::new(SessionOptions::default());
        let err = s.extend(["10.0.0.1", "999.1.1.1", "10.0.0.2"]).unwrap_err();
        assert!(matches!(err, NetcalcError::InvalidAddress(_)));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_bounds_sorts_inputs() {
        let mut s = session(&["10.0.0.9", "10.0.0.3", "10.0.0.5"]);
        s.bounds().unwrap();
        let rendered: Vec<String> = s.addresses().iter().map(format_ipv4).collect();
        assert_eq!(rendered, ["10.0.0.3", "10.0.0.5", "10.0.0.9"]);
    }

    #[test]
    fn test_whole_space_inputs() {
        let bounds = session(&["::", "ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff"])
            .bounds()
            .unwrap();
        assert_eq!(bounds.inclusive_cidr, 0);
        assert_eq!(bounds.superblock, Address::UNSPECIFIED.with_prefix(0));
    }

    #[test]
    fn test_display_options_expanded_implies_full() {
        let options = SessionOptions {
            expanded: true,
            ..SessionOptions::default()
        };
        let display = session_with(&["::1"], options).display_options();
        assert!(display.full);
        assert!(display.expanded);
    }
}
