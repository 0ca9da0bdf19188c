#![forbid(unsafe_code)]

mod cli;
mod commands;
mod inspectors;
mod startup;

use anyhow::Result;
use tracing::Instrument;

use cli::{Command, FeedbackCommand};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::parse();
    let output = cli.output;

    let command = match &cli.command {
        None | Some(Command::Version) => {
            println!("deepinspect-agent {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some(command) => command,
    };

    let services = startup::bootstrap(&cli)?;
    let root_span = tracing::info_span!("deepinspect", service.name = "deepinspect");

    let result = async {
        match command {
            Command::Version => Ok(()),
            Command::Correlate { alert } => {
                commands::cmd_correlate(&services, alert, output).await
            }
            Command::Inspect { task } => commands::cmd_inspect(&services, task, output).await,
            Command::Feedback(args) => match &args.command {
                FeedbackCommand::Content { message } => {
                    commands::cmd_feedback_content(&services, message, output)
                }
                FeedbackCommand::Attribute { message } => {
                    commands::cmd_feedback_attribute(&services, message, output).await
                }
            },
            Command::Show { report_id } => commands::cmd_show(&services, report_id, output),
            Command::Try {
                attr_type,
                key,
                value,
            } => commands::cmd_try(*attr_type, key, value, output).await,
            Command::Purge => commands::cmd_purge(&services, output),
        }
    }
    .instrument(root_span)
    .await;

    if cli.print_metrics {
        print!("{}", services.metrics.encode());
    }
    result
}
