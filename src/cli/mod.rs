//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};

/// Minimal unit-test execution engine
#[derive(Parser, Debug)]
#[command(name = "microunit")]
#[command(version = "0.1.0")]
#[command(about = "Run unit-test suites with dependencies, repetition and timeouts")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run test suites
    Run(RunArgs),

    /// List available suites and their methods
    List(ListArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Suite to run (repeatable; all suites when omitted)
    #[arg(short, long = "suite")]
    pub suites: Vec<String>,

    /// Output format (text, json, json-pretty, summary)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,

    /// Print the cause chain of each failure
    #[arg(short, long)]
    pub details: bool,

    /// Configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Save results to file
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Show every lifecycle method with its metadata
    #[arg(short, long)]
    pub detailed: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "./microunit.yaml")]
        output: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Show environment overrides instead
        #[arg(long)]
        env: bool,

        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Validate a configuration file
    Validate {
        /// File to validate (searched for when omitted)
        file: Option<String>,
    },

    /// Describe the supported environment variables
    Env,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["microunit", "list", "--detailed"]);
        match args.command {
            Command::List(list_args) => {
                assert!(list_args.detailed);
                assert_eq!(list_args.format, "text");
            }
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_run_args() {
        let args = Args::parse_from([
            "microunit",
            "run",
            "--suite",
            "CalculatorSuite",
            "--suite",
            "InventorySuite",
            "--format",
            "summary",
            "--no-color",
            "-v",
        ]);
        assert!(args.verbose);
        match args.command {
            Command::Run(run_args) => {
                assert_eq!(run_args.suites, ["CalculatorSuite", "InventorySuite"]);
                assert_eq!(run_args.format.as_deref(), Some("summary"));
                assert!(run_args.no_color);
                assert!(!run_args.details);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_config_init_defaults() {
        let args = Args::parse_from(["microunit", "config", "init"]);
        match args.command {
            Command::Config(ConfigArgs {
                action: ConfigAction::Init { output, force },
            }) => {
                assert_eq!(output, "./microunit.yaml");
                assert!(!force);
            }
            _ => panic!("Expected Config init command"),
        }
    }
}
