use anyhow::Context;
use clap::Parser;
use dev_ready::config::scenario::StepConfig;
use dev_ready::utils::{logger, validation::Validate};
use dev_ready::{ScenarioConfig, ScenarioRunner};

#[derive(Parser)]
#[command(name = "dev-loop")]
#[command(about = "Drive a dev server through an edit-and-observe scenario")]
struct Args {
    /// Path to TOML scenario file
    #[arg(short, long, default_value = "dev-loop.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Show what would run without starting anything
    #[arg(long)]
    dry_run: bool,
}

fn describe(config: &ScenarioConfig) {
    println!("📋 Scenario: {}", config.scenario.name);
    if let Some(description) = &config.scenario.description {
        println!("   {}", description);
    }
    println!("📁 Project: {} ({} files)", config.scenario.project_dir, config.files.len());
    for process in &config.processes {
        println!(
            "▶️ {}: {} {} (ready on {:?})",
            process.name,
            process.command,
            process.args.join(" "),
            process.ready_pattern
        );
    }
    for (index, step) in config.steps.iter().enumerate() {
        let summary = match step {
            StepConfig::WriteFile { path, .. } => format!("write {}", path),
            StepConfig::WaitForLog {
                process, pattern, ..
            } => format!("wait for /{}/ from {}", pattern, process),
            StepConfig::ExpectHttp { url, contains, .. } => {
                format!("expect '{}' at {}", contains, url)
            }
            StepConfig::Sleep { ms } => format!("sleep {}ms", ms),
        };
        println!("  {}. {}", index + 1, summary);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let config = ScenarioConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load scenario file '{}'", args.config))?;
    config
        .validate()
        .with_context(|| format!("Scenario '{}' is invalid", args.config))?;

    if args.dry_run {
        describe(&config);
        return Ok(());
    }

    let report = ScenarioRunner::new(config)
        .run()
        .await
        .context("Scenario failed")?;

    println!(
        "✅ Scenario '{}' passed: {} processes, {} steps in {:?}",
        report.name, report.processes_started, report.steps_run, report.elapsed
    );
    Ok(())
}
