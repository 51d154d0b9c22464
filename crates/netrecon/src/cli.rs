//! Clap derive structures for the `netrecon` CLI.
//!
//! Kept free of crate-internal imports: `build.rs` includes this file to
//! render man pages and completions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// netrecon -- reconcile live network telemetry into an IPAM inventory
#[derive(Debug, Parser)]
#[command(
    name = "netrecon",
    version,
    about = "Reconcile router and hypervisor telemetry into an IPAM inventory",
    long_about = "Reads interface addresses, ARP tables, DHCP leases, PPP sessions and\n\
        exposed services captured from managed devices, and merges them into a\n\
        deduplicated inventory of subnets, devices, IP addresses and services.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "NETRECON_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Inventory snapshot (JSON) to read and update
    #[arg(long, short = 'i', env = "NETRECON_INVENTORY", global = true)]
    pub inventory: Option<PathBuf>,

    /// Output format (defaults to the configured one, else table)
    #[arg(long, short = 'o', env = "NETRECON_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output (defaults to the configured mode, else auto)
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

/// Subnet resolution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SubnetMatchArg {
    /// First containing subnet in inventory order
    FirstMatch,
    /// Longest prefix wins
    MostSpecific,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Merge a telemetry capture into the inventory
    #[command(alias = "s")]
    Sync(SyncArgs),

    /// Apply pending inventory schema migrations
    Migrate,

    /// Show which subnet an address belongs to
    #[command(alias = "r")]
    Resolve(ResolveArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Sync ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Telemetry capture (JSON) to replay
    #[arg(long, short = 't')]
    pub telemetry: Option<PathBuf>,

    /// Create a subnet for addresses no known subnet contains
    #[arg(long)]
    pub create_subnets: bool,

    /// How to pick among several containing subnets
    #[arg(long, value_enum)]
    pub subnet_match: Option<SubnetMatchArg>,

    /// Prefix length of auto-created subnets
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=32))]
    pub subnet_prefix: Option<u8>,
}

// ── Resolve ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// IPv4 address to classify
    pub address: String,

    /// How to pick among several containing subnets
    #[arg(long, value_enum)]
    pub subnet_match: Option<SubnetMatchArg>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
