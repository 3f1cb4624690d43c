mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cloudloom_core::{AssemblyConfig, Environment, config};

use crate::commands::synth::OutputFormat;

#[derive(Parser)]
#[command(name = "loom")]
#[command(version)]
#[command(about = "Assemble declarative infrastructure and emit it for provisioning", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Assembly configuration, from flags or the `LOOM_*` environment.
#[derive(clap::Args)]
struct ConfigArgs {
    /// Account identifier
    #[arg(long, env = "LOOM_ACCOUNT")]
    account: String,

    /// Region identifier
    #[arg(long, env = "LOOM_REGION")]
    region: String,

    /// Prefix for logical resource names
    #[arg(long, env = "LOOM_STACK_PREFIX", default_value = config::DEFAULT_STACK_PREFIX)]
    prefix: String,

    /// Apex domain for routable hostnames
    #[arg(long, env = "LOOM_DOMAIN", default_value = config::DEFAULT_DOMAIN)]
    domain: String,

    /// Free-text stack description
    #[arg(long, env = "LOOM_DESCRIPTION", default_value = config::DEFAULT_DESCRIPTION)]
    description: String,

    /// Target environment (dev, stag, prod); repeatable, defaults to all
    #[arg(long = "env", value_name = "ENV")]
    environments: Vec<Environment>,
}

impl ConfigArgs {
    fn into_config(self) -> AssemblyConfig {
        let mut config = AssemblyConfig::new(self.account, self.region);
        config.stack_prefix = self.prefix;
        config.domain = self.domain;
        config.description = self.description;
        if self.environments.is_empty() {
            config
        } else {
            config.with_environments(&self.environments)
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the resource graph and emit the template
    Synth {
        #[command(flatten)]
        config: ConfigArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Write the template to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Assemble and validate without emitting anything
    Validate {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Synth {
            config,
            format,
            out,
        } => commands::synth::handle(config.into_config(), format, out),
        Commands::Validate { config } => commands::validate::handle(config.into_config()),
    }
}
