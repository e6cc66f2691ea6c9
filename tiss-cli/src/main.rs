use anyhow::Context;
use clap::Parser;
use tiss_cli::{load_registries, run, Cli, Settings};
use tracing::debug;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if cli.verbose {
        settings.logging.log_level = "debug".to_string();
    }
    let redactor = logger_redacted::init(&settings.logging).context("failed to initialize logging")?;
    let registries = load_registries()?;
    debug!(command = ?cli.command, versions = ?registries.versions(), "starting");

    let output = run(cli.command, &settings, &registries, redactor).await?;
    println!("{}", output.render(cli.format)?);

    if !output.success {
        std::process::exit(1);
    }
    Ok(())
}
