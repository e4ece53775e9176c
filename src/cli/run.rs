use super::config::{default_config_path, PpccConfig};
use super::logging::init_logging;
use ppcc::graph::read_tgf;
use ppcc::protocol::{ChainOutput, Round, Topology};
use std::path::PathBuf;

/// Command-line overrides for the `[round]` section
#[derive(Debug, Default, Clone)]
pub struct RunOverrides {
    pub seed: Option<String>,
    pub seed_owner: Option<usize>,
    pub max_depth: Option<u32>,
}

/// Run one contact-chaining round
///
/// ## Configuration Loading
///
/// 1. `--config` flag if provided
/// 2. Default config at `~/.config/ppcc/config.toml`
///
/// If the config file doesn't exist, a default one is generated together
/// with a small demo graph, so a first `ppcc run` works out of the box.
pub async fn execute(
    config_path: Option<String>,
    overrides: RunOverrides,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    if !config_path.exists() {
        eprintln!("📝 No config file found. Creating default configuration...");
        PpccConfig::create_default(&config_path)?;
        eprintln!("   Created: {}", config_path.display());
    }

    let mut config = PpccConfig::load(&config_path)?;
    apply_overrides(&mut config, overrides);
    init_logging(&config.logging);

    let output = run_round(&config).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_summary(&config, &output);
    }
    Ok(())
}

fn apply_overrides(config: &mut PpccConfig, overrides: RunOverrides) {
    if let Some(seed) = overrides.seed {
        config.round.seed = seed;
    }
    if let Some(owner) = overrides.seed_owner {
        config.round.seed_owner = owner;
    }
    if let Some(depth) = overrides.max_depth {
        config.round.max_depth = depth;
    }
}

/// Load every telecom graph and run the configured round
pub async fn run_round(config: &PpccConfig) -> Result<ChainOutput, Box<dyn std::error::Error>> {
    let subgraphs = config
        .telecoms
        .iter()
        .map(|telecom| read_tgf(&telecom.graph))
        .collect::<Result<Vec<_>, _>>()?;

    let topology = Topology::new(subgraphs)?;
    let round = Round::new(topology, config.round_config()?);
    let output = round
        .run(
            &config.round.seed,
            config.round.seed_owner,
            config.round.max_depth,
        )
        .await?;
    Ok(output)
}

fn print_summary(config: &PpccConfig, output: &ChainOutput) {
    println!(
        "Seed {} (telecom {}), depth {}: {} identifier(s) reached",
        config.round.seed,
        config.round.seed_owner,
        config.round.max_depth,
        output.len()
    );
    for identifier in &output.identifiers {
        println!("  {}", identifier);
    }
    println!(
        "{} queries, {} replies, {} messages ({} bytes)",
        output.queries, output.replies, output.messages, output.bytes
    );
}
