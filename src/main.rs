use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use ecprofile::cli::{Cli, Command};
use ecprofile::config::Config;
use ecprofile::driver::DriverConfig;
use ecprofile::extract::{self, Extraction};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Command::Completions { shell }) = cli.command {
        ecprofile::cli::print_completions(shell);
        return Ok(());
    }

    if let Some(code) = cli.usage_exit_code() {
        ecprofile::cli::print_usage();
        std::process::exit(code);
    }

    let config = resolve_config(&cli);
    cmd_inspect(&cli, &config)
}

/// Config files first, then command-line overrides.
fn resolve_config(cli: &Cli) -> Config {
    let mut config = ecprofile::config::load(cli.config.as_ref());
    if let Some(controller) = &cli.controller {
        config.controller.expected = controller.clone();
    }
    if cli.strict {
        config.checks.strict = true;
    }
    config
}

fn cmd_inspect(cli: &Cli, config: &Config) -> Result<()> {
    let mut extractions: Vec<Extraction> = Vec::new();
    let mut failures = Vec::new();

    for path in ecprofile::scan::collect_profiles(&cli.paths) {
        let result = path.and_then(|p| extract::extract_file(&p, config));
        match result {
            Ok(ex) => extractions.push(ex),
            Err(e) => {
                if !cli.json {
                    ecprofile::output::print_failure(&e);
                }
                failures.push(e);
            }
        }
    }

    let drivers: Vec<DriverConfig> = extractions
        .iter()
        .map(|ex| DriverConfig::derive(ex, &config.controller.token))
        .collect();

    if cli.json {
        let report = ecprofile::output::json_report(&extractions, &drivers, &failures);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if cli.driver {
        for driver in &drivers {
            ecprofile::output::print_driver(driver);
        }
    } else {
        for ex in &extractions {
            ecprofile::output::print_extraction(ex);
        }
    }

    let total = extractions.len() + failures.len();
    if total > 1 {
        let unsupported = failures.iter().filter(|e| e.is_not_supported()).count();
        eprintln!(
            "{} {} inspected, {} unsupported, {} failed",
            "Done:".bold(),
            extractions.len().to_string().green(),
            unsupported,
            (failures.len() - unsupported).to_string().red()
        );
    }

    Ok(())
}
