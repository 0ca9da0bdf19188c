use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use domain::attribute::entity::AttrType;
use infrastructure::config::{LogFormat, LogLevel};
use infrastructure::constants::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug)]
#[command(
    name = "deepinspect-agent",
    about = "Alert correlation and inspection task fan-out",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(
        short,
        long,
        default_value = DEFAULT_CONFIG_PATH,
        env = "DEEPINSPECT_CONFIG",
        global = true
    )]
    pub config: String,

    /// Log level override (takes precedence over config file)
    #[arg(short, long, env = "DEEPINSPECT_LOG_LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Log format: json (default, production) or text (development)
    #[arg(long, env = "DEEPINSPECT_LOG_FORMAT", global = true)]
    pub log_format: Option<LogFormat>,

    /// Output format
    #[arg(short, long, default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Print Prometheus metrics collected during the command
    #[arg(long, global = true)]
    pub print_metrics: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table (default)
    Table,
    /// JSON
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Display version and build information
    Version,

    /// Correlate an alert into a report and dispatch its attributes
    Correlate {
        /// JSON file holding one alert
        #[arg(long)]
        alert: PathBuf,
    },

    /// Run the built-in inspector on task messages (one JSON message per line)
    Inspect {
        /// File of task messages
        #[arg(long)]
        task: PathBuf,
    },

    /// Consume inspector output from the content or attribute queue
    Feedback(FeedbackArgs),

    /// Show everything staged for a report
    Show {
        /// Report identifier
        #[arg(long)]
        report_id: String,
    },

    /// Run the built-in inspector on one attribute without publishing
    Try {
        /// Attribute type
        #[arg(long = "type", value_name = "TYPE")]
        attr_type: AttrType,

        /// Attribute key
        #[arg(long)]
        key: String,

        /// Attribute value
        #[arg(long)]
        value: String,
    },

    /// Delete expired records from the store
    Purge,
}

#[derive(Args, Debug)]
pub struct FeedbackArgs {
    #[command(subcommand)]
    pub command: FeedbackCommand,
}

#[derive(Subcommand, Debug)]
pub enum FeedbackCommand {
    /// Stage a content message as a report section
    Content {
        /// JSON file holding one content message
        #[arg(long)]
        message: PathBuf,
    },
    /// Gate a new-attribute message and dispatch it if unseen
    Attribute {
        /// JSON file holding one attribute message
        #[arg(long)]
        message: PathBuf,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
