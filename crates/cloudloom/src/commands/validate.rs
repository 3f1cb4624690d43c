use colored::Colorize;

use cloudloom_core::AssemblyConfig;
use cloudloom_stacks::assemble;

pub fn handle(config: AssemblyConfig) -> anyhow::Result<()> {
    println!("{}", "Validating assembly...".blue());

    match assemble(&config) {
        Ok(assembly) => {
            println!("{}", "✓ Assembly is valid".green().bold());
            println!();
            println!("Summary:");
            println!("  Environments: {}", config.environments.len());
            for environment in &config.environments {
                println!("    - {}", environment.to_string().cyan());
            }
            println!("  Stages: {}", assembly.plan.stages.len());
            for stage in &assembly.plan.stages {
                println!(
                    "    - {} ({} resources)",
                    stage.cyan(),
                    assembly.graph.stage_members(stage).len()
                );
            }
            println!("  Resources: {}", assembly.graph.len());
        }
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ Configuration error".red().bold());
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
