use super::config::{default_config_path, PpccConfig};
use std::path::PathBuf;

/// Write a commented default config and its demo graphs
///
/// Refuses to replace an existing config unless `force` is set.
pub fn execute(output: Option<String>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = output
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    if config_path.exists() && !force {
        return Err(format!(
            "Config file '{}' already exists (use --force to overwrite)",
            config_path.display()
        )
        .into());
    }

    PpccConfig::create_default(&config_path)?;

    println!("📝 Created {}", config_path.display());
    println!("   Demo graphs written next to it under graphs/");
    println!("   Run a round with: ppcc run --config {}", config_path.display());
    Ok(())
}
