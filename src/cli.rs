use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List installed extensions that can be translated
    List,

    /// Translate an extension's README and show it next to the original
    Translate {
        /// Extension id or display name; prompts for a choice when omitted
        extension: Option<String>,

        /// Target language (ISO 639-1), overrides the configuration
        #[arg(short, long)]
        target_lang: Option<String>,

        /// Write the page to this HTML file instead of serving it
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not open the preview in a browser
        #[arg(long)]
        no_open: bool,
    },

    /// Write the default configuration file
    InitConfig {
        /// Destination path
        #[arg(default_value = "readme-lens.toml")]
        path: PathBuf,
    },
}
