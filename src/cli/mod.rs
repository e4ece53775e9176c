use clap::{Parser, Subcommand};

pub mod config;
pub mod init_config;
pub mod logging;
pub mod run;
pub mod version;

#[derive(Parser)]
#[command(name = "ppcc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Privacy-preserving contact chaining", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a commented default config and demo graphs
    InitConfig {
        /// Where to write the config (default: ~/.config/ppcc/config.toml)
        #[arg(long)]
        output: Option<String>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Run one contact-chaining round
    Run {
        /// Path to config file (default: ~/.config/ppcc/config.toml)
        #[arg(long)]
        config: Option<String>,

        /// Seed identifier (overrides round.seed)
        #[arg(long)]
        seed: Option<String>,

        /// Index of the telecom owning the seed (overrides round.seed_owner)
        #[arg(long)]
        owner: Option<usize>,

        /// Maximum hops from the seed (overrides round.max_depth)
        #[arg(long)]
        depth: Option<u32>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display version information
    Version,
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::InitConfig { output, force } => init_config::execute(output, force),
        Commands::Run {
            config,
            seed,
            owner,
            depth,
            json,
        } => {
            let overrides = run::RunOverrides {
                seed,
                seed_owner: owner,
                max_depth: depth,
            };
            run::execute(config, overrides, json).await
        }
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_init_config() {
        let cli = Cli::parse_from(["ppcc", "init-config", "--output", "/tmp/ppcc.toml"]);

        match cli.command {
            Commands::InitConfig { output, force } => {
                assert_eq!(output, Some("/tmp/ppcc.toml".to_string()));
                assert!(!force);
            }
            _ => panic!("Expected InitConfig command"),
        }
    }

    #[test]
    fn test_cli_parse_run_defaults() {
        let cli = Cli::parse_from(["ppcc", "run"]);

        match cli.command {
            Commands::Run {
                config,
                seed,
                owner,
                depth,
                json,
            } => {
                assert_eq!(config, None);
                assert_eq!(seed, None);
                assert_eq!(owner, None);
                assert_eq!(depth, None);
                assert!(!json);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_run_with_all_options() {
        let cli = Cli::parse_from([
            "ppcc",
            "run",
            "--config",
            "/etc/ppcc/config.toml",
            "--seed",
            "15550100",
            "--owner",
            "2",
            "--depth",
            "3",
            "--json",
        ]);

        match cli.command {
            Commands::Run {
                config,
                seed,
                owner,
                depth,
                json,
            } => {
                assert_eq!(config, Some("/etc/ppcc/config.toml".to_string()));
                assert_eq!(seed, Some("15550100".to_string()));
                assert_eq!(owner, Some(2));
                assert_eq!(depth, Some(3));
                assert!(json);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_rejects_negative_depth() {
        assert!(Cli::try_parse_from(["ppcc", "run", "--depth", "-1"]).is_err());
    }

    #[test]
    fn test_cli_parse_version() {
        let cli = Cli::parse_from(["ppcc", "version"]);
        assert!(matches!(cli.command, Commands::Version));
    }
}
