use clap::{Parser, Subcommand};
use std::path::PathBuf;

use saviser_core::{
    evaluate_against, resolve_rules_path, RuleSet, VitalSignsInput, VitalSignsRecord,
};

#[derive(Parser)]
#[command(name = "saviser")]
#[command(about = "SAVISER triage classification CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a rule definition file and print its canonical form
    CheckRules {
        /// Path to the rule definition YAML
        path: PathBuf,
    },
    /// Classify one vital-signs snapshot from a JSON file
    Classify {
        /// Path to a JSON file with the vital-signs input
        vitals: PathBuf,
        /// Rule definition file (defaults to the configured rules/default.yaml)
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::CheckRules { path } => check_rules(&path),
        Commands::Classify { vitals, rules } => classify(&vitals, rules),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn check_rules(path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let set = RuleSet::load_from_path(path)?;
    println!("{} rules OK ({})", set.len(), path.display());
    print!("{}", set.to_source());
    Ok(())
}

fn classify(
    vitals_path: &std::path::Path,
    rules_override: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let rules_path = resolve_rules_path(rules_override)?;
    let rules = RuleSet::load_from_path(&rules_path)?;

    let raw = std::fs::read_to_string(vitals_path)?;
    let input: VitalSignsInput = serde_json::from_str(&raw)?;
    let record = VitalSignsRecord::new(input)?;

    let result = evaluate_against(&rules, &record)?;

    println!("Level: {}", result.level());
    println!("Rationale: {}", result.rationale());
    println!("Matched rules: {}", result.matched_rule_ids().join(", "));
    Ok(())
}
