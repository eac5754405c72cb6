use anyhow::{Context, Result};
use clap::Parser;
use netcalc_cidr::session::DEFAULT_MAX_SUBNETS;
use netcalc_cidr::{NetworkSession, Report, SessionOptions};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod output;

use output::OutputFormat;

/// Environment variable holding the log filter (e.g. `debug`)
const LOG_ENV: &str = "NETCALC_LOG";

/// CIDR-aware IPv4/IPv6 network calculator
#[derive(Parser)]
#[command(name = "netcalc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Addresses or networks (e.g., 10.0.0.1, 192.168.0.0/24, 2001:db8::/32)
    #[arg(value_name = "ADDRESS", required = true)]
    addresses: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    output: OutputFormat,

    /// Show IPv4-mapped input as IPv4
    #[arg(short = '4', long = "ipv4")]
    force_ipv4: bool,

    /// Show every address in IPv6 notation
    #[arg(short = '6', long = "ipv6")]
    force_ipv6: bool,

    /// Show all networks enclosing the superblock
    #[arg(short = 'a', long = "all")]
    show_inclusive: bool,

    /// List the subnets of the superblock at the increment size
    #[arg(short = 'l', long = "list")]
    list_subnets: bool,

    /// List every parsed input
    #[arg(short, long)]
    verbose: bool,

    /// Do not render IPv4-mapped IPv6 addresses as ::ffff:a.b.c.d
    #[arg(short = 'n', long = "no-map")]
    no_map: bool,

    /// Full IPv6 notation (no :: compression)
    #[arg(short, long)]
    full: bool,

    /// Full IPv6 notation with zero-padded groups
    #[arg(short = 'x', long)]
    expanded: bool,

    /// Narrowest prefix the superblock may have
    #[arg(short = 'c', long = "cidr-limit", value_name = "PREFIX")]
    cidr_limit: Option<u8>,

    /// Subnet size used for listing and subnet counts
    #[arg(short = 'i', long = "increment", value_name = "PREFIX")]
    increment: Option<u8>,

    /// Maximum number of subnets to list
    #[arg(long, value_name = "COUNT", default_value_t = DEFAULT_MAX_SUBNETS)]
    max_subnets: usize,
}

impl Cli {
    fn session_options(&self) -> SessionOptions {
        SessionOptions {
            force_ipv4: self.force_ipv4,
            force_ipv6: self.force_ipv6,
            verbose: self.verbose,
            list_subnets: self.list_subnets,
            show_inclusive: self.show_inclusive,
            full: self.full,
            expanded: self.expanded,
            no_map: self.no_map,
            cidr_limit: self.cidr_limit,
            cidr_increment: self.increment,
            max_subnets: self.max_subnets,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let mut session = NetworkSession::new(cli.session_options());
    session
        .extend(&cli.addresses)
        .context("failed to parse addresses")?;
    debug!(inputs = session.len(), family = %session.family(), "inputs parsed");

    let bounds = session
        .bounds()
        .context("failed to calculate network bounds")?;
    let report = Report::build(&session, &bounds);

    output::print_report(&report, cli.output)?;
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
