//! Report rows and aligned table rendering
//!
//! A [`Report`] collects every row of one invocation as rendered text. A
//! [`Table`] then measures all cells (header included) before writing
//! anything, so every line shares the same column widths.
//!
//! ```
//! use netcalc_cidr::{NetworkSession, Report, SessionOptions, Table};
//!
//! let mut session = NetworkSession::new(SessionOptions::default());
//! session.add("192.168.1.10/24").unwrap();
//! let bounds = session.bounds().unwrap();
//!
//! let report = Report::build(&session, &bounds);
//! let table = Table::new(report.rows());
//! let lines: Vec<String> = table.lines().collect();
//! assert!(lines[0].starts_with("Kind"));
//! assert!(lines[1].contains("192.168.1.255"));
//! ```

use netcalc_core::mask;
use netcalc_core::{Address, AddressFamily};
use serde::Serialize;
use std::fmt;
use tracing::warn;

use crate::family_floor;
use crate::format::{format_address, format_cidr, format_count, DisplayOptions};
use crate::session::{Bounds, NetworkSession};
use crate::subnets::Subnets;

/// Column headers, in rendering order
pub const HEADERS: [&str; 8] = [
    "Kind",
    "Address",
    "Network",
    "Broadcast",
    "Netmask",
    "Wildcard",
    "CIDR",
    "Subnets",
];

const COLUMNS: usize = HEADERS.len();

/// Where a row comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    /// A parsed input address
    Input,
    /// A network wider than the superblock that contains it
    Enclosing,
    /// The smallest network holding every input
    Superblock,
    /// One enumerated subnet of the superblock
    Subnet,
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKind::Input => write!(f, "input"),
            RowKind::Enclosing => write!(f, "enclosing"),
            RowKind::Superblock => write!(f, "superblock"),
            RowKind::Subnet => write!(f, "subnet"),
        }
    }
}

/// One report line, rendered to text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub kind: RowKind,
    pub address: String,
    pub network: String,
    pub broadcast: String,
    pub netmask: String,
    pub wildcard: String,
    pub cidr: String,
    /// Number of increment-sized subnets; `None` when not representable
    pub subnets: Option<u64>,
}

impl Row {
    /// Render `address` as a member of its `cidr` network
    pub fn new(
        kind: RowKind,
        address: Address,
        cidr: u8,
        cidr_increment: u8,
        opts: &DisplayOptions,
    ) -> Self {
        Self {
            kind,
            address: format_address(&address, opts),
            network: format_address(&mask::network_address(address, cidr), opts),
            broadcast: format_address(&mask::broadcast_address(address, cidr), opts),
            netmask: format_address(&mask::netmask(cidr), &no_map(opts)),
            wildcard: format_address(&mask::wildcard_mask(cidr), &no_map(opts)),
            cidr: format_cidr(cidr, opts.family),
            subnets: mask::subnet_count(cidr, cidr_increment),
        }
    }

    fn cells(&self) -> [String; COLUMNS] {
        [
            self.kind.to_string(),
            self.address.clone(),
            self.network.clone(),
            self.broadcast.clone(),
            self.netmask.clone(),
            self.wildcard.clone(),
            self.cidr.clone(),
            format_count(self.subnets),
        ]
    }
}

// masks are never shown in the ::ffff: form
fn no_map(opts: &DisplayOptions) -> DisplayOptions {
    DisplayOptions {
        no_map: true,
        ..*opts
    }
}

/// Every row of one invocation
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub family: AddressFamily,
    pub superblock: String,
    pub inputs: usize,
    /// Subnet listing stopped at `max_subnets`
    pub truncated: bool,
    rows: Vec<Row>,
}

impl Report {
    /// Build the rows for a session whose bounds have been computed
    ///
    /// Order: inputs (verbose), enclosing networks from the family's `/0`
    /// down (show-inclusive), the superblock, then enumerated subnets
    /// (list-subnets).
    pub fn build(session: &NetworkSession, bounds: &Bounds) -> Self {
        let opts = session.display_options();
        let options = session.options();
        let incr = bounds.cidr_increment;
        let mut rows = Vec::new();

        if options.verbose {
            for &address in session.addresses() {
                let cidr = address.prefix_len().min(bounds.cidr_limit);
                rows.push(Row::new(RowKind::Input, address, cidr, incr, &opts));
            }
        }

        if options.show_inclusive {
            let floor = family_floor(opts.family).min(bounds.inclusive_cidr);
            for cidr in floor..bounds.inclusive_cidr {
                let network = mask::network_address(bounds.superblock, cidr);
                rows.push(Row::new(RowKind::Enclosing, network, cidr, incr, &opts));
            }
        }

        rows.push(Row::new(
            RowKind::Superblock,
            bounds.superblock,
            bounds.inclusive_cidr,
            incr,
            &opts,
        ));

        let mut truncated = false;
        if options.list_subnets {
            let mut subnets = Subnets::from_bounds(bounds);
            for subnet in subnets.by_ref().take(options.max_subnets) {
                rows.push(Row::new(RowKind::Subnet, subnet, incr, incr, &opts));
            }
            if subnets.next().is_some() {
                truncated = true;
                warn!(
                    max_subnets = options.max_subnets,
                    "subnet listing truncated"
                );
            }
        }

        Self {
            family: opts.family,
            superblock: format!(
                "{}{}",
                format_address(&bounds.superblock, &opts),
                format_cidr(bounds.inclusive_cidr, opts.family)
            ),
            inputs: session.len(),
            truncated,
            rows,
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}

/// Rows laid out with per-column widths
///
/// Widths are the maximum rendered width over the header and every row,
/// computed before any line is produced.
#[derive(Debug, Clone)]
pub struct Table {
    widths: [usize; COLUMNS],
    cells: Vec<[String; COLUMNS]>,
}

impl Table {
    /// Render every cell and measure the columns
    pub fn new(rows: &[Row]) -> Self {
        let mut widths = HEADERS.map(str::len);
        let cells: Vec<[String; COLUMNS]> = rows.iter().map(Row::cells).collect();

        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        Self { widths, cells }
    }

    pub fn widths(&self) -> &[usize] {
        &self.widths
    }

    /// Header line padded to the column widths
    pub fn header(&self) -> String {
        self.layout(&HEADERS.map(str::to_string))
    }

    /// Data lines, padded to the column widths
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        self.cells.iter().map(|row| self.layout(row))
    }

    /// Header followed by the data lines
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(self.header()).chain(self.rows())
    }

    fn layout(&self, cells: &[String; COLUMNS]) -> String {
        let mut line = String::new();
        for (i, (cell, width)) in cells.iter().zip(self.widths).enumerate() {
            if i > 0 {
                line.push_str("  ");
            }
            // counts are right-aligned
            if i == COLUMNS - 1 {
                line.push_str(&format!("{:>width$}", cell, width = width));
            } else {
                line.push_str(&format!("{:<width$}", cell, width = width));
            }
        }
        line.trim_end().to_string()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionOptions;

    fn report(literals: &[&str], options: SessionOptions) -> Report {
        let mut session = NetworkSession::new(options);
        session.extend(literals).unwrap();
        let bounds = session.bounds().unwrap();
        Report::build(&session, &bounds)
    }

    #[test]
    fn test_superblock_row_ipv4() {
        let report = report(&["192.168.1.10/24"], SessionOptions::default());
        assert_eq!(report.rows().len(), 1);

        let row = &report.rows()[0];
        assert_eq!(row.kind, RowKind::Superblock);
        assert_eq!(row.address, "192.168.1.0");
        assert_eq!(row.network, "192.168.1.0");
        assert_eq!(row.broadcast, "192.168.1.255");
        assert_eq!(row.netmask, "255.255.255.0");
        assert_eq!(row.wildcard, "0.0.0.255");
        assert_eq!(row.cidr, "/24");
        assert_eq!(row.subnets, Some(256));
        assert_eq!(report.superblock, "192.168.1.0/24");
    }

    #[test]
    fn test_superblock_row_ipv6() {
        let report = report(&["2001:db8::1", "2001:db8::ffff"], SessionOptions::default());
        let row = &report.rows()[0];
        assert_eq!(row.network, "2001:db8::");
        assert_eq!(row.broadcast, "2001:db8::ffff");
        assert_eq!(row.netmask, "ffff:ffff:ffff:ffff:ffff:ffff:ffff:0");
        assert_eq!(row.wildcard, "::ffff");
        assert_eq!(row.cidr, "/112");
        // default IPv6 increment is /64, wider than the /112 superblock
        assert_eq!(row.subnets, Some(0));
    }

    #[test]
    fn test_forced_ipv6_renders_masks_without_mapping() {
        let options = SessionOptions {
            force_ipv6: true,
            ..SessionOptions::default()
        };
        let report = report(&["10.0.0.0/8"], options);
        let row = &report.rows()[0];
        assert_eq!(row.address, "::ffff:10.0.0.0");
        assert_eq!(row.netmask, "ffff:ffff:ffff:ffff:ffff:ffff:ff00:0");
        assert_eq!(row.cidr, "/104");
    }

    #[test]
    fn test_verbose_lists_sorted_inputs() {
        let options = SessionOptions {
            verbose: true,
            ..SessionOptions::default()
        };
        let report = report(&["10.0.0.254", "10.0.0.1"], options);
        let kinds: Vec<RowKind> = report.rows().iter().map(|r| r.kind).collect();
        assert_eq!(kinds, [RowKind::Input, RowKind::Input, RowKind::Superblock]);
        assert_eq!(report.rows()[0].address, "10.0.0.1");
        assert_eq!(report.rows()[0].cidr, "/32");
        assert_eq!(report.rows()[2].address, "10.0.0.0");
    }

    #[test]
    fn test_show_inclusive_lists_enclosing_networks() {
        let options = SessionOptions {
            show_inclusive: true,
            ..SessionOptions::default()
        };
        let report = report(&["10.1.2.3/30"], options);
        assert_eq!(report.rows().len(), 31);
        assert_eq!(report.rows()[0].cidr, "/0");
        assert_eq!(report.rows()[0].network, "0.0.0.0");
        assert_eq!(report.rows()[8].cidr, "/8");
        assert_eq!(report.rows()[8].network, "10.0.0.0");
        assert_eq!(report.rows()[30].kind, RowKind::Superblock);
        assert_eq!(report.rows()[30].network, "10.1.2.0");
    }

    #[test]
    fn test_list_subnets() {
        let options = SessionOptions {
            list_subnets: true,
            cidr_increment: Some(26),
            ..SessionOptions::default()
        };
        let report = report(&["192.168.0.0/24"], options);
        let subnets: Vec<&str> = report
            .rows()
            .iter()
            .filter(|r| r.kind == RowKind::Subnet)
            .map(|r| r.network.as_str())
            .collect();
        assert_eq!(subnets, ["192.168.0.0", "192.168.0.64", "192.168.0.128", "192.168.0.192"]);
        assert_eq!(report.rows()[1].broadcast, "192.168.0.63");
        assert_eq!(report.rows()[0].subnets, Some(4));
        assert!(!report.truncated);
    }

    #[test]
    fn test_list_subnets_truncates() {
        let options = SessionOptions {
            list_subnets: true,
            max_subnets: 10,
            ..SessionOptions::default()
        };
        let report = report(&["10.0.0.0/24"], options);
        assert_eq!(report.rows().len(), 11);
        assert!(report.truncated);
    }

    #[test]
    fn test_table_two_pass_widths() {
        let options = SessionOptions {
            verbose: true,
            ..SessionOptions::default()
        };
        let report = report(&["10.0.0.1", "10.200.100.250"], options);
        let table = Table::new(report.rows());

        assert_eq!(table.widths()[1], "10.200.100.250".len());
        assert_eq!(table.widths()[0], "superblock".len());

        let lines: Vec<String> = table.lines().collect();
        assert_eq!(lines.len(), 4);

        let network_col = lines[0].find("Network").unwrap();
        for line in &lines[1..] {
            let cell = &line[network_col..];
            assert!(cell.starts_with("10."), "misaligned line: {}", line);
        }
    }

    #[test]
    fn test_table_right_aligns_counts() {
        let report = report(&["10.0.0.0/8"], SessionOptions::default());
        let table = Table::new(report.rows());
        let lines: Vec<String> = table.lines().collect();
        assert!(lines[0].ends_with("Subnets"));
        assert!(lines[1].ends_with("16777216"));
        assert_eq!(lines[0].len(), lines[1].len());
    }

    #[test]
    fn test_row_serialization() {
        let report = report(&["10.0.0.0/8"], SessionOptions::default());
        let json = serde_json::to_string(&report.rows()[0]).expect("serialization failed");
        assert!(json.contains("\"kind\":\"superblock\""));
        assert!(json.contains("\"netmask\":\"255.0.0.0\""));
    }
}
