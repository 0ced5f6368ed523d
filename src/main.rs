use anyhow::Result;
use clap::Parser;
use fablebook::app::App;
use fablebook::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.debug {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt::init();
    }

    let mut app = App::new(&cli)?;
    app.initialize().await?;
    app.run().await?;

    Ok(())
}
