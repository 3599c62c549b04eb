//! Clap derive structures for the `gatelink` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// gatelink -- keep gate controllers connected and drive them
#[derive(Debug, Parser)]
#[command(
    name = "gatelink",
    version,
    about = "Keep gate controllers connected and send them open/close commands",
    long_about = "Supervises TCP connections to networked gate and access controllers.\n\n\
        `gatelink run` keeps the configured controllers connected and logs what\n\
        they send; `gatelink send` delivers a single command and exits.",
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
    /// Path to the configuration file
    #[arg(long, env = "GATELINK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "GATELINK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Log line format
    #[arg(long, env = "GATELINK_LOG_FORMAT", default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
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

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Supervise the configured controllers until interrupted
    Run(RunArgs),

    /// Connect, send one command, and exit
    Send(SendArgs),

    /// List configured controllers
    #[command(alias = "dev", alias = "d")]
    Devices,

    /// List or trigger rule actions
    Actions(ActionsArgs),

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Run ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Seconds between configuration file checks (0 disables)
    #[arg(long)]
    pub reload_interval: Option<u64>,
}

// ── Send ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SendArgs {
    /// Controller id or name (default: first enabled controller)
    #[arg(long, short = 'd', global = true)]
    pub device: Option<String>,

    #[command(subcommand)]
    pub command: SendCommand,
}

#[derive(Debug, Subcommand)]
pub enum SendCommand {
    /// Send OPEN
    Open,
    /// Send CLOSE
    Close,
    /// Send arbitrary text verbatim
    Raw {
        /// Text to send
        text: String,
    },
}

// ── Actions ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ActionsArgs {
    #[command(subcommand)]
    pub command: Option<ActionsCommand>,
}

#[derive(Debug, Subcommand)]
pub enum ActionsCommand {
    /// List the actions offered to rule engines (default)
    List,

    /// Trigger an action once against one controller
    Run {
        /// Action slug or id (e.g. open-gate)
        action: String,

        /// Controller id or name (default: first enabled controller)
        #[arg(long, short = 'd')]
        device: Option<String>,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the configuration file path
    Path,

    /// Display current resolved configuration
    Show,

    /// Write a starter configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
