use clap::Parser;
use url::Url;

/// fablebook - terminal storybook viewer for generated children's stories
#[derive(Debug, Parser)]
#[command(name = "fablebook")]
#[command(about = "A TUI storybook viewer with page-turn animation and narration")]
#[command(version)]
pub struct Cli {
    /// Base URL of the story generation backend
    #[arg(long, default_value = "http://localhost:8000/")]
    pub backend_url: Url,

    /// Open generated stories in the flipbook presentation instead of the
    /// animated book
    #[arg(long)]
    pub flip: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}
