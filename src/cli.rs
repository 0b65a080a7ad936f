use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_SOURCE;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Provider configuration, a file path or an http(s) URL
    #[arg(short, long, default_value = DEFAULT_CONFIG_SOURCE)]
    pub config: String,

    /// Settings file path (defaults to settings.toml when present)
    #[arg(short, long)]
    pub settings: Option<PathBuf>,

    /// Directory for downloaded subtitle files
    #[arg(short, long)]
    pub download_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the interactive shell (default)
    Shell,

    /// Print the transcript function URL for the loaded configuration
    Endpoint,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["subfetch"]);
        assert!(!args.verbose);
        assert_eq!(args.config, "firebase_config.json");
        assert!(args.settings.is_none());
        assert!(args.command.is_none());
    }

    #[test]
    fn test_explicit_options() {
        let args = Args::parse_from([
            "subfetch",
            "-v",
            "--config",
            "https://example.com/firebase_config.json",
            "--download-dir",
            "out",
            "endpoint",
        ]);
        assert!(args.verbose);
        assert_eq!(args.config, "https://example.com/firebase_config.json");
        assert_eq!(args.download_dir, Some(PathBuf::from("out")));
        assert_eq!(args.command, Some(Commands::Endpoint));
    }
}
