mod cli;

use airline_sentiment::Settings;
use anyhow::Result;
use clap::Parser;
use cli::args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.runtime.config.as_deref())?;
    cli.runtime.apply(&mut settings);
    tracing::debug!(?settings, "resolved settings");

    match &cli.command {
        None | Some(Commands::Interactive) => cli::commands::handle_interactive(&settings).await?,
        Some(Commands::Predict { text, json }) => {
            cli::commands::handle_predict(&settings, &text.join(" "), *json).await?
        }
        Some(Commands::Examples) => cli::commands::handle_examples(&settings)?,
    }

    Ok(())
}

/// `RUST_LOG` controls verbosity; logs go to stderr so they never mix with results.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
