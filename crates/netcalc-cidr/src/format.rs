//! Text rendering of addresses, prefixes and counts
//!
//! Every function returns an owned `String`; there is no shared buffer.

use netcalc_core::{Address, AddressFamily};

/// How addresses are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    pub family: AddressFamily,
    /// All eight groups, no `::`
    pub full: bool,
    /// Zero-pad every group to 4 digits (only with `full`)
    pub expanded: bool,
    /// Never render the `::ffff:a.b.c.d` form
    pub no_map: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            family: AddressFamily::Ipv6,
            full: false,
            expanded: false,
            no_map: false,
        }
    }
}

/// Low 32 bits as a dotted quad
pub fn format_ipv4(addr: &Address) -> String {
    let [a, b, c, d] = addr.ipv4_octets();
    format!("{}.{}.{}.{}", a, b, c, d)
}

/// IPv6 text form
///
/// Compressed output replaces the longest run of two or more zero groups
/// (first run on ties) with `::`. IPv4-mapped addresses keep their dotted
/// tail unless `no_map` is set.
///
/// ```
/// use netcalc_cidr::format::{format_ipv6, DisplayOptions};
/// use netcalc_cidr::parse_address;
///
/// let opts = DisplayOptions::default();
/// assert_eq!(format_ipv6(&parse_address("2001:0db8:0:0:1:0:0:1").unwrap(), &opts), "2001:db8::1:0:0:1");
/// assert_eq!(format_ipv6(&parse_address("10.0.0.1").unwrap(), &opts), "::ffff:10.0.0.1");
/// ```
pub fn format_ipv6(addr: &Address, opts: &DisplayOptions) -> String {
    let groups = addr.groups();
    let mapped = !opts.no_map && addr.is_ipv4_mapped();
    // a mapped address renders its last two groups as a dotted quad
    let hex_groups = if mapped { &groups[..6] } else { &groups[..] };

    let mut out = if opts.full || opts.expanded {
        join_groups(hex_groups, opts.expanded)
    } else {
        let (start, len) = longest_zero_run(hex_groups);
        if len > 1 {
            format!(
                "{}::{}",
                join_groups(&hex_groups[..start], false),
                join_groups(&hex_groups[start + len..], false)
            )
        } else {
            join_groups(hex_groups, false)
        }
    };

    if mapped {
        out.push(':');
        out.push_str(&format_ipv4(addr));
    }

    out
}

/// Render in the display family
pub fn format_address(addr: &Address, opts: &DisplayOptions) -> String {
    match opts.family {
        AddressFamily::Ipv4 => format_ipv4(addr),
        AddressFamily::Ipv6 => format_ipv6(addr, opts),
    }
}

/// Shared-space prefix rendered in the display family, e.g. `/24`
pub fn format_cidr(cidr: u8, family: AddressFamily) -> String {
    format!("/{}", family.to_family_prefix(cidr))
}

/// Address with its own prefix, e.g. `10.0.0.0/8`
pub fn format_network(addr: &Address, opts: &DisplayOptions) -> String {
    format!(
        "{}{}",
        format_address(addr, opts),
        format_cidr(addr.prefix_len(), opts.family)
    )
}

/// Subnet count, or `n/a` when it does not fit in 64 bits
pub fn format_count(count: Option<u64>) -> String {
    match count {
        Some(count) => count.to_string(),
        None => "n/a".to_string(),
    }
}

fn join_groups(groups: &[u16], padded: bool) -> String {
    groups
        .iter()
        .map(|g| {
            if padded {
                format!("{:04x}", g)
            } else {
                format!("{:x}", g)
            }
        })
        .collect::<Vec<_>>()
        .join(":")
}

/// Start and length of the longest run of zero groups; first run wins ties
fn longest_zero_run(groups: &[u16]) -> (usize, usize) {
    let mut best = (0, 0);
    let mut run_start = 0;
    let mut run_len = 0;

    for (i, &group) in groups.iter().enumerate() {
        if group == 0 {
            if run_len == 0 {
                run_start = i;
            }
            run_len += 1;
            if run_len > best.1 {
                best = (run_start, run_len);
            }
        } else {
            run_len = 0;
        }
    }

    best
}
