use clap::{Parser, Subcommand};

pub mod check_config;
pub mod config;
pub mod init_config;
pub mod logging;
pub mod simulate;
pub mod version;

#[derive(Parser)]
#[command(name = "sigvault")]
#[command(author = "Sigvault Project")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator CLI for the Sigvault multi-signature vault", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a commented default configuration file
    InitConfig {
        /// Path to config file (default: ~/.local/share/sigvault/config.toml)
        #[arg(long)]
        config: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate a configuration file by building a vault from it
    CheckConfig {
        /// Path to config file (default: ~/.local/share/sigvault/config.toml)
        #[arg(long)]
        config: Option<String>,
    },

    /// Replay a JSON script of vault operations and print the outcomes
    Simulate {
        /// Path to the JSON script
        #[arg(long)]
        script: String,

        /// Path to config file (default: ~/.local/share/sigvault/config.toml)
        #[arg(long)]
        config: Option<String>,

        /// CBOR state snapshot, loaded before and saved after the run
        #[arg(long)]
        state: Option<String>,
    },

    /// Display version information
    Version,
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::InitConfig { config, force } => init_config::execute(config, force),
        Commands::CheckConfig { config } => check_config::execute(config),
        Commands::Simulate {
            script,
            config,
            state,
        } => simulate::execute(script, config, state).await,
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}
