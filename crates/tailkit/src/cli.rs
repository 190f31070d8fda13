//! Clap derive structures for the `tailkit` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// tailkit -- administer a tailnet's policy, DNS, keys and devices
#[derive(Debug, Parser)]
#[command(
    name = "tailkit",
    version,
    about = "Administer a tailnet from the command line",
    long_about = "Reads and writes tailnet configuration through the v2 administration API.\n\n\
        Singletons (the policy file and DNS settings) are never deleted remotely;\n\
        `reset` writes their default value back.",
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
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "TAILKIT_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Tailnet name (overrides profile)
    #[arg(long, short = 't', global = true)]
    pub tailnet: Option<String>,

    /// API access token (overrides profile and keyring)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// API base URL (overrides profile)
    #[arg(long, env = "TAILKIT_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "TAILKIT_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "TAILKIT_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
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

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read or replace the tailnet policy file
    Acl(AclArgs),

    /// Manage tailnet DNS settings
    Dns(DnsArgs),

    /// Manage auth keys
    #[command(alias = "key")]
    Keys(KeysArgs),

    /// Inspect devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Manage a device's approved subnet routes
    Routes(RoutesArgs),

    /// Authorize (or revoke) a device
    Authorize(AuthorizeArgs),

    /// Compare an applied-state snapshot against the tailnet
    Drift(DriftArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── ACL ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AclArgs {
    /// Exchange the policy as raw HuJSON instead of structured JSON
    #[arg(long, global = true)]
    pub hujson: bool,

    #[command(subcommand)]
    pub command: AclCommand,
}

#[derive(Debug, Subcommand)]
pub enum AclCommand {
    /// Show the current policy file
    Get,

    /// Replace the policy file
    Set {
        /// Policy file to upload
        file: PathBuf,

        /// Only write if the remote policy still carries this ETag
        #[arg(long)]
        if_match: Option<String>,
    },

    /// Restore the allow-all default policy
    Reset,
}

// ── DNS ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DnsArgs {
    #[command(subcommand)]
    pub command: DnsCommand,
}

#[derive(Debug, Subcommand)]
pub enum DnsCommand {
    /// Global nameservers
    #[command(alias = "ns")]
    Nameservers {
        #[command(subcommand)]
        command: DnsListCommand,
    },

    /// Search domains appended to short names
    SearchPaths {
        #[command(subcommand)]
        command: DnsListCommand,
    },

    /// MagicDNS and related preferences
    #[command(alias = "prefs")]
    Preferences {
        #[command(subcommand)]
        command: DnsPreferencesCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum DnsListCommand {
    /// Show the current values
    Get,
    /// Replace the list
    Set {
        /// New values, in order
        #[arg(required = true)]
        values: Vec<String>,
    },
    /// Clear the list
    Reset,
}

#[derive(Debug, Subcommand)]
pub enum DnsPreferencesCommand {
    /// Show the current preferences
    Get,
    /// Replace the preferences
    Set {
        /// Enable MagicDNS
        #[arg(long, action = clap::ArgAction::Set)]
        magic_dns: bool,
    },
    /// Restore default preferences
    Reset,
}

// ── Keys ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct KeysArgs {
    #[command(subcommand)]
    pub command: KeysCommand,
}

#[derive(Debug, Subcommand)]
pub enum KeysCommand {
    /// Create an auth key (the secret is shown once)
    Create(KeyCreateArgs),

    /// Show one key's metadata
    Get {
        /// Key ID
        id: String,
    },

    /// List keys
    #[command(alias = "ls")]
    List,

    /// Delete a key
    #[command(alias = "rm")]
    Delete {
        /// Key ID
        id: String,
    },
}

#[derive(Debug, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct KeyCreateArgs {
    /// Allow the key to join more than one device
    #[arg(long)]
    pub reusable: bool,

    /// Devices joined with this key are removed when they go offline
    #[arg(long)]
    pub ephemeral: bool,

    /// Devices joined with this key skip device approval
    #[arg(long)]
    pub preauthorized: bool,

    /// Tags applied to devices that join (repeatable, e.g. tag:server)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Key lifetime in seconds
    #[arg(long, conflicts_with = "no_expiry")]
    pub expiry: Option<u64>,

    /// Request a key that never expires
    #[arg(long)]
    pub no_expiry: bool,

    /// Free-form description
    #[arg(long, short = 'd')]
    pub description: Option<String>,
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices
    #[command(alias = "ls")]
    List {
        /// Only devices whose name starts with this prefix
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Show one device (by ID or full name)
    Get {
        /// Device ID or name
        device: String,
    },
}

// ── Routes ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RoutesArgs {
    #[command(subcommand)]
    pub command: RoutesCommand,
}

#[derive(Debug, Subcommand)]
pub enum RoutesCommand {
    /// Show advertised and approved routes
    Get {
        /// Device ID or name
        device: String,
    },

    /// Replace the approved routes
    Set {
        /// Device ID or name
        device: String,
        /// CIDR prefixes to approve
        #[arg(required = true)]
        routes: Vec<String>,
    },

    /// Withdraw all approved routes
    Reset {
        /// Device ID or name
        device: String,
    },
}

// ── Authorize ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AuthorizeArgs {
    /// Device ID or name
    pub device: String,

    /// Revoke authorization instead of granting it
    #[arg(long)]
    pub revoke: bool,
}

// ── Drift ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DriftArgs {
    /// Applied-state snapshot (JSON)
    pub state: PathBuf,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the configuration (secrets masked)
    Show,

    /// Print the configuration file path
    Path,

    /// Store an API key in the system keyring for a profile
    SetKey {
        /// Key to store (prompted for when omitted)
        key: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
