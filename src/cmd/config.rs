//! Configuration view and validation: `statesandbox config`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use statesandbox::config::{CONFIG_FILE_NAME, SandboxConfig, SandboxToml};

use super::super::ConfigCommands;

pub fn cmd_config(path: Option<&Path>, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("StateSandbox Configuration");
            println!("==========================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No {} found; using defaults.", config_path.display());
            }
            println!();

            let existing = config_path.exists().then_some(config_path.as_path());
            let config = SandboxConfig::load(existing)?;
            let rendered =
                toml::to_string_pretty(&config.toml).context("Failed to render configuration")?;
            println!("{}", rendered.trim_end());
            println!();

            println!("Effective values (with env overrides):");
            println!("  generator = {}", config.toml.generator.backend);
            println!(
                "  {} = {}",
                config.toml.generator.api_key_env,
                if config.api_key.is_some() { "set" } else { "not set" }
            );
            println!("  listen = {}", config.bind_address());
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No {} found. Using defaults (valid).", config_path.display());
                return Ok(());
            }

            let toml = SandboxToml::load(&config_path)?;
            toml.check()?;
            let warnings = toml.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("{} already exists.", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            SandboxToml::default().save(&config_path)?;
            println!("Created {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [generator] backend, models, claude_cmd");
            println!("  - [turn] period_months, sampler_seed");
            println!("  - [guard] stale_after_secs, sweep_interval_secs");
            println!("  - schema_path for a custom dimension list");
            println!();
        }
    }

    Ok(())
}
