use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "priestess-obs", version, about = "Priestess bot observability tools")]
pub struct Cli {
    /// Configuration file path (defaults to observability.toml if present)
    #[arg(short, long, global = true, env = "PRIESTESS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Exercise every observability component once (default)
    Check,

    /// Print a one-shot status report
    Status {
        /// Print the snapshot as JSON
        #[arg(long, conflicts_with = "chat")]
        json: bool,

        /// Print the health, metrics and error messages posted to chat
        #[arg(long)]
        chat: bool,
    },

    /// Display the live monitoring dashboard
    Monitor {
        /// Refresh interval in seconds
        #[arg(short, long, default_value = "30")]
        interval: u64,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Display the effective configuration
    Show,

    /// Validate configuration file and environment overrides
    Validate,
}

impl Cli {
    /// Get the command to execute, defaulting to Check if none provided
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_check() {
        let cli = Cli {
            config: None,
            command: None,
        };
        assert!(matches!(cli.get_command(), Commands::Check));
    }

    #[test]
    fn test_cli_parsing_status_json() {
        let cli = Cli::try_parse_from(["priestess-obs", "status", "--json"]).unwrap();
        match cli.get_command() {
            Commands::Status { json, chat } => {
                assert!(json);
                assert!(!chat);
            }
            _ => panic!("Expected Status command"),
        }
    }

    #[test]
    fn test_cli_status_formats_conflict() {
        assert!(Cli::try_parse_from(["priestess-obs", "status", "--json", "--chat"]).is_err());
    }

    #[test]
    fn test_cli_parsing_monitor_interval() {
        let cli = Cli::try_parse_from(["priestess-obs", "monitor", "--interval", "5"]).unwrap();
        match cli.get_command() {
            Commands::Monitor { interval } => assert_eq!(interval, 5),
            _ => panic!("Expected Monitor command"),
        }
    }

    #[test]
    fn test_cli_parsing_global_config() {
        let cli =
            Cli::try_parse_from(["priestess-obs", "config", "show", "--config", "obs.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("obs.toml")));
        assert!(matches!(
            cli.get_command(),
            Commands::Config {
                action: ConfigCommands::Show
            }
        ));
    }
}
