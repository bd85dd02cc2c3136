//! Tuning file helper
//!
//! Prints the default tuning document or checks an existing one.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use social_core::config::{TuningConfig, DEFAULT_TUNING_PATH};

#[derive(Parser, Debug)]
#[command(name = "social_tuning")]
#[command(about = "Inspect and validate social engine tuning files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the default tuning file
    Defaults,
    /// Load, validate and summarize a tuning file
    Check {
        #[arg(default_value = DEFAULT_TUNING_PATH)]
        path: PathBuf,

        /// Apply SCENE_* environment overrides before validating
        #[arg(long)]
        env: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Defaults => match TuningConfig::default().to_toml() {
            Ok(text) => {
                print!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
        Commands::Check { path, env } => match check(&path, env) {
            Ok(config) => {
                let scene = &config.scene;
                let rumor = &config.rumor;
                println!(
                    "{}: ok (cooldown {}m, pair {}m, queue {}-{}m, spread {:.2}-{:.2}, mutation {:.2})",
                    path.display(),
                    scene.cooldown_minutes,
                    scene.pair_cooldown_minutes,
                    scene.queue_min_delay,
                    scene.queue_max_delay,
                    rumor.spread_base,
                    rumor.spread_cap,
                    rumor.mutation_probability,
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}: {e}", path.display());
                ExitCode::FAILURE
            }
        },
    }
}

fn check(path: &Path, env: bool) -> Result<TuningConfig, social_core::ConfigError> {
    let mut config = TuningConfig::from_file(path)?;
    if env {
        config = config.with_env_overrides()?;
    }
    config.validate()?;
    Ok(config)
}
