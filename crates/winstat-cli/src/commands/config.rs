//! Config command - show or create the configuration file.

use std::path::PathBuf;
use winstat_core::Config;

/// Run the config command.
pub fn run(
    config: &Config,
    config_path: Option<PathBuf>,
    init: bool,
    force: bool,
) -> anyhow::Result<()> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_config_path()?,
    };

    if init {
        if path.exists() && !force {
            anyhow::bail!(
                "{} already exists. Use --force to overwrite it.",
                path.display()
            );
        }
        Config::default().save_to(&path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let status = if path.exists() { "" } else { " (not found, using defaults)" };
    println!("# {}{}", path.display(), status);
    println!();
    print!("{}", config.to_toml()?);

    Ok(())
}
