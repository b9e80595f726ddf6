use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "voxcanvas-demo")]
#[command(author, version, about = "Run prompts through the VoxCanvas moderation pipeline")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run prompts through the full pipeline and print the resulting gallery
    Run {
        /// Prompts to run, in order
        #[arg(required = true)]
        prompts: Vec<String>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<String>,

        /// Hide adult-rated entries from the printed gallery
        #[arg(long)]
        hide_adult: bool,

        /// Print the session audit trail as JSON
        #[arg(long)]
        audit: bool,

        /// Print Prometheus metrics after the run
        #[arg(long)]
        metrics: bool,

        #[command(flatten)]
        overrides: Overrides,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Moderate a prompt without generating anything
    Check {
        /// Prompt text
        prompt: String,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<String>,

        #[command(flatten)]
        overrides: Overrides,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the default configuration as YAML
    DefaultConfig,
}

/// Settings that take precedence over the configuration file
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
    /// Simulate an unreachable text classifier
    #[arg(long)]
    pub text_offline: bool,

    /// Simulate an unreachable image classifier
    #[arg(long)]
    pub image_offline: bool,

    /// Number of generator calls that fail transiently
    #[arg(long)]
    pub fail_generations: Option<u32>,

    /// Generation attempts per run, including the first (at most 2)
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Extra blocked term (repeatable)
    #[arg(long = "block-term")]
    pub block_terms: Vec<String>,
}
