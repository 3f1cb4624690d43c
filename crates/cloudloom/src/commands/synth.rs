use std::path::PathBuf;

use clap::ValueEnum;
use colored::Colorize;

use cloudloom_core::AssemblyConfig;
use cloudloom_stacks::assemble;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

pub fn handle(
    config: AssemblyConfig,
    format: OutputFormat,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let assembly = match assemble(&config) {
        Ok(assembly) => assembly,
        Err(e) => {
            eprintln!("{} {}", "✗ assembly failed:".red().bold(), e);
            std::process::exit(1);
        }
    };

    let resources = assembly.graph.len();
    let template = assembly.into_template(&config)?;
    let rendered = match format {
        OutputFormat::Json => template.to_json()?,
        OutputFormat::Yaml => template.to_yaml()?,
    };

    match out {
        Some(path) => {
            std::fs::write(&path, rendered)?;
            eprintln!(
                "{} wrote {} resources to {}",
                "✓".green().bold(),
                resources,
                path.display().to_string().cyan()
            );
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
