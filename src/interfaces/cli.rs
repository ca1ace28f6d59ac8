use clap::Parser;

#[derive(Parser)]
#[command(name = "mtrans")]
#[command(about = "Translate text with several providers at once.")]
#[command(version)]
pub struct Cli {
    /// Target language for this run (overrides the config default)
    #[arg(short = 't', long = "to")]
    pub target: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Choose color theme
    #[arg(short = 'T', long)]
    pub theme: Option<String>,

    /// Keep history and error log in memory only
    #[arg(long)]
    pub ephemeral: bool,

    /// Show translation history
    #[arg(long)]
    pub history: bool,

    /// Clear translation history
    #[arg(long)]
    pub clear_history: bool,

    /// Show error log
    #[arg(long)]
    pub errors: bool,

    /// Clear error log
    #[arg(long)]
    pub clear_errors: bool,

    /// Generate config sample
    #[arg(long)]
    pub generate_config: bool,

    /// Edit configuration file
    #[arg(long)]
    pub edit_config: bool,

    /// Show status
    #[arg(long)]
    pub status: bool,

    /// Text to translate; reads lines from stdin when omitted
    #[arg(num_args = 1..)]
    pub query: Vec<String>,
}
