//! Command-line arguments.
//!
//! The CLI is thin: it turns flags into [`PipelineOptions`] and a gateway
//! configuration, and leaves every decision about retries or validation to
//! the library crates.

use clap::{Parser, Subcommand, ValueEnum};
use gateway::GatewayConfig;
use pipeline::{CollectorName, PipelineOptions};

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "cournot",
    version,
    about = "Resolve prediction-market questions through the Cournot gateway",
    after_help = "Examples:\n  cournot resolve --query \"Will BTC close above $100k on 2025-12-31?\" --code <CODE>\n  cournot resolve --query \"...\" --code <CODE> --collectors CollectorGeminiGrounded,CollectorWeb --json\n  cournot capabilities --code <CODE>",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Gateway endpoint (defaults to the public Cournot interface)
    #[arg(long, global = true, env = gateway::GATEWAY_URL_ENV, value_name = "URL")]
    pub gateway_url: Option<String>,

    /// Log line format on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl RootArgs {
    /// Gateway configuration with any endpoint override applied.
    pub fn gateway_config(&self) -> GatewayConfig {
        match &self.gateway_url {
            Some(url) if !url.trim().is_empty() => GatewayConfig::default().with_url(url.trim()),
            _ => GatewayConfig::default(),
        }
    }
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full resolution pipeline for a query
    Resolve(ResolveArgs),
    /// List the collectors and providers the gateway offers
    Capabilities(CapabilitiesArgs),
}

impl Command {
    /// The access code supplied to whichever command was chosen.
    pub fn code(&self) -> &str {
        match self {
            Command::Resolve(args) => &args.code,
            Command::Capabilities(args) => &args.code,
        }
    }
}

/// `resolve` inputs.
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Question to resolve
    #[arg(long, value_name = "TEXT")]
    pub query: String,

    /// Gateway access code
    #[arg(long, value_name = "CODE")]
    pub code: String,

    /// Interpret the query strictly
    #[arg(long)]
    pub strict: bool,

    /// Comma-separated collector names (default: CollectorGeminiGrounded)
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub collectors: Vec<String>,

    /// Ask collectors for raw page content
    #[arg(long)]
    pub include_raw: bool,

    /// Emit the report as JSON instead of markdown
    #[arg(long)]
    pub json: bool,
}

impl ResolveArgs {
    /// Builds run options; blank collector names are dropped.
    pub fn pipeline_options(&self) -> PipelineOptions {
        let collectors = self
            .collectors
            .iter()
            .filter_map(|name| CollectorName::new(name.trim()))
            .collect();
        PipelineOptions::new(self.query.clone())
            .with_strict_mode(self.strict)
            .with_collectors(collectors)
            .with_raw_content(self.include_raw)
    }
}

/// `capabilities` inputs.
#[derive(Parser, Debug)]
pub struct CapabilitiesArgs {
    /// Gateway access code
    #[arg(long, value_name = "CODE")]
    pub code: String,

    /// Emit JSON instead of markdown
    #[arg(long)]
    pub json: bool,
}

/// Log line format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Compact human-readable lines
    Text,
    /// One JSON object per line
    Json,
}
