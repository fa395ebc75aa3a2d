//! cbci CLI tool.
//!
//! Every command prints a single line on stdout. Failures print their
//! diagnostic on stdout too, since the workflow captures that stream, and
//! exit with status 1.

use std::process::ExitCode;

use cbci_config::{ExclusionKey, UnknownKeyPolicy};
use cbci_core::ProcessEnv;
use cbci_core::env::KEY_PROJECT_TYPE;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "cbci")]
#[command(about = "Generate CI build configuration and job matrices", long_about = None)]
#[command(version)]
struct Cli {
    /// Environment variable holding the SDK project identity
    #[arg(long, global = true, env = "CBCI_PROJECT_ENV_KEY", default_value = KEY_PROJECT_TYPE)]
    project_env: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the build options for the sdist stage
    #[command(name = "parse_sdist_config")]
    ParseSdistConfig {
        /// Environment variable holding the user's JSON configuration
        config_key: String,
        /// Fail on configuration keys that are not build options
        #[arg(long)]
        strict_keys: bool,
    },
    /// Print the build options for the wheel stage
    #[command(name = "parse_wheel_config")]
    ParseWheelConfig {
        /// Environment variable holding the user's JSON configuration
        config_key: String,
        /// Fail on configuration keys that are not build options
        #[arg(long)]
        strict_keys: bool,
    },
    /// Print the wheel build and validate job matrices as JSON
    #[command(name = "get_stage_matrices")]
    GetStageMatrices {
        /// Environment variable holding the user's JSON configuration
        config_key: String,
        /// Key naming each fragment's exclusion list (exlude or exclude)
        #[arg(long, default_value = "exlude")]
        exclude_key: ExclusionKey,
    },
    /// Print the name-version prefix of a wheel filename
    #[command(name = "parse_wheel_name")]
    ParseWheelName {
        /// Wheel filename
        wheel_name: String,
        /// Expected distribution name
        project_name: String,
    },
}

fn key_policy(strict: bool) -> UnknownKeyPolicy {
    if strict {
        UnknownKeyPolicy::Reject
    } else {
        UnknownKeyPolicy::Ignore
    }
}

fn run(cli: Cli) -> anyhow::Result<String> {
    let env = ProcessEnv;

    let output = match cli.command {
        Commands::ParseSdistConfig {
            config_key,
            strict_keys,
        } => commands::config::parse_sdist_config(
            &env,
            &cli.project_env,
            &config_key,
            key_policy(strict_keys),
        )?,
        Commands::ParseWheelConfig {
            config_key,
            strict_keys,
        } => commands::config::parse_wheel_config(
            &env,
            &cli.project_env,
            &config_key,
            key_policy(strict_keys),
        )?,
        Commands::GetStageMatrices {
            config_key,
            exclude_key,
        } => commands::matrix::get_stage_matrices(&env, &config_key, exclude_key)?,
        Commands::ParseWheelName {
            wheel_name,
            project_name,
        } => commands::wheel::parse_wheel_name(&wheel_name, &project_name)?,
    };

    Ok(output)
}

fn main() -> ExitCode {
    // Logs go to stderr; stdout carries the command's output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            _ => {
                println!("{}", err.render());
                return ExitCode::FAILURE;
            }
        },
    };

    match run(cli) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            println!("{}", err);
            ExitCode::FAILURE
        }
    }
}
