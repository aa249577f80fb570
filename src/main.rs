//! microunit - minimal unit-test execution engine
//!
//! Runs the bundled demonstration suites and reports every failure.
//!
//! ## Usage
//!
//! ```bash
//! # Run every bundled suite
//! microunit run
//!
//! # Run one suite with a compact summary
//! microunit run --suite CalculatorSuite --format summary
//!
//! # List suites with their lifecycle methods
//! microunit list --detailed
//!
//! # Write an example configuration file
//! microunit config init
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, info};

use microunit::config::{self, AppConfig, ConfigFile, EnvConfig};
use microunit::output::{write_result_to_file, ConsoleReporter, OutputFormat, ResultFormatter};
use microunit::suites;
use microunit::utils::{init_logger, LogLevel};
use microunit::{RunnableSuite, TestRunner};

mod cli;

use cli::Args;

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Only `run` needs the layered config; `config validate` must still
    // work when the file it is asked about is broken.
    let app = match &args.command {
        cli::Command::Run(run_args) => load_config(run_args.config.as_deref())?,
        _ => {
            let mut app = AppConfig::default();
            app.apply_env(&EnvConfig::load());
            app
        }
    };

    let level = if args.verbose {
        LogLevel::Debug
    } else {
        app.log_level().unwrap_or(LogLevel::Warn)
    };
    init_logger(level);
    quiet_panics();

    match args.command {
        cli::Command::Run(run_args) => run_tests(run_args, app),
        cli::Command::List(list_args) => {
            list_suites(list_args)?;
            Ok(ExitCode::SUCCESS)
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Layer defaults, the config file and the environment
fn load_config(explicit: Option<&str>) -> Result<AppConfig> {
    let env = EnvConfig::load();

    let path = explicit
        .map(config::expand_path)
        .or_else(|| env.config_file.as_deref().map(config::expand_path))
        .or_else(ConfigFile::find);

    let mut app = match path {
        Some(path) => ConfigFile::load(&path)?.app,
        None => AppConfig::default(),
    };
    app.apply_env(&env);
    app.validate().context("Invalid configuration")?;
    Ok(app)
}

/// Failing tests unwind on purpose; keep the default hook from printing them.
fn quiet_panics() {
    std::panic::set_hook(Box::new(|info| {
        debug!("test body panicked: {info}");
    }));
}

fn run_tests(args: cli::RunArgs, mut app: AppConfig) -> Result<ExitCode> {
    if let Some(format) = args.format {
        app.format = format;
    }
    if args.no_color {
        app.colorize = false;
    }
    if args.details {
        app.details = true;
    }
    let format = app.output_format()?;

    let names = if args.suites.is_empty() {
        app.default_suites.clone()
    } else {
        args.suites
    };
    let selected = select_suites(&names)?;
    let suites: Vec<&dyn RunnableSuite> = selected.iter().map(|s| s.as_ref()).collect();

    info!(
        "Running {} suite(s) with {} format",
        suites.len(),
        format.name()
    );

    let runner = TestRunner::new(app.engine_config());
    let mut reporter = ConsoleReporter::stdout().colorize(app.colorize);

    // Machine-readable output must not be interleaved with the live tree
    let outcome = if format.is_textual() {
        runner.run(&suites, &mut reporter)
    } else {
        runner.run(&suites, &mut microunit::NullReporter)
    };

    let mut formatter = ResultFormatter::new(format).with_details(app.details);
    if !app.colorize {
        formatter = formatter.no_color();
    }

    match outcome {
        Ok(result) => {
            println!("{}", formatter.format_result(&result));
            if let Some(path) = &args.output {
                write_result_to_file(path, &result, format)?;
                println!("Results saved to {path}");
            }
            Ok(if result.succeeded() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Err(aborted) => {
            println!("{}", formatter.format_result(&aborted.partial));
            eprintln!("Error: {aborted}");
            let mut source = std::error::Error::source(&aborted.source);
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            Ok(ExitCode::from(2))
        }
    }
}

fn select_suites(names: &[String]) -> Result<Vec<Box<dyn RunnableSuite>>> {
    if names.is_empty() {
        return Ok(suites::all());
    }

    names
        .iter()
        .map(|name| {
            suites::find(name).with_context(|| {
                format!(
                    "Unknown suite: {name} (available: {})",
                    suites::names().join(", ")
                )
            })
        })
        .collect()
}

fn list_suites(args: cli::ListArgs) -> Result<()> {
    let format = OutputFormat::from_str(&args.format)
        .with_context(|| format!("Unknown output format: {}", args.format))?;
    let formatter = ResultFormatter::new(format);

    let all = suites::all();
    if format.is_textual() {
        println!("\nAvailable suites ({} total)\n", all.len());
    }
    for suite in &all {
        println!(
            "{}",
            formatter.format_suite(suite.name(), &suite.descriptors(), args.detailed)
        );
    }
    Ok(())
}

fn manage_config(args: cli::ConfigArgs) -> Result<()> {
    match args.action {
        cli::ConfigAction::Init { output, force } => {
            let path = Path::new(&output);
            if path.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {output}. Use --force to overwrite."
                );
            }

            ConfigFile::example().save(path)?;
            println!("Configuration file created: {output}");
            println!("\nEdit the file to customize your settings.");
        }

        cli::ConfigAction::Show { env, format } => {
            if env {
                EnvConfig::load().print_summary();
            } else {
                let config = ConfigFile::load_default()?;
                let output = if format == "json" {
                    serde_json::to_string_pretty(&config)?
                } else {
                    serde_yaml::to_string(&config)?
                };
                println!("{output}");
            }
        }

        cli::ConfigAction::Validate { file } => {
            let path = file.unwrap_or_else(|| {
                ConfigFile::find()
                    .map(|p| p.to_string_lossy().to_string())
                    .unwrap_or_else(|| "./microunit.yaml".to_string())
            });

            match ConfigFile::load(&path) {
                Ok(_) => println!("Configuration file is valid: {path}"),
                Err(e) => {
                    println!("Configuration file is invalid: {path}");
                    println!("  Error: {e:#}");
                    return Err(e);
                }
            }
        }

        cli::ConfigAction::Env => config::print_env_help(),
    }

    Ok(())
}
