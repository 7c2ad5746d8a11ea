/// flowsync command-line entry point
///
/// Creates or updates the Blockforge build dispatcher workflow on an n8n instance.
/// Prints the resulting name and id on success; any failure exits non-zero.

use clap::Parser;
use flowsync::{
    config::{CliArgs, Config},
    error::{Error, Operation},
    register_workflow,
};
use tracing::Level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    // Rejected here, before any request is attempted
    let config = Config::from_args(args)?;

    let outcome = register_workflow(&config).await.map_err(with_headline)?;
    println!("{}", outcome);

    Ok(())
}

/// Log to stderr so stdout only carries the result line
fn init_tracing(verbose: bool) {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();
}

/// Prefix failures with the stage that aborted the run
fn with_headline(err: Error) -> anyhow::Error {
    let headline = match err.operation() {
        Some(Operation::List) => "Unable to query existing workflows from n8n.",
        Some(Operation::Create | Operation::Update) => "Failed to upsert workflow.",
        None => return err.into(),
    };
    anyhow::Error::new(err).context(headline)
}
