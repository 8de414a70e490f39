//! bevy-migrate CLI - Bevy version migration assistant

use anyhow::Context;
use bevy_migrate::{MigrationEngine, MigrationOptions, MigrationReport, MigrationUnit};
use bevy_migrate::catalog;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "bevy-migrate")]
#[command(about = "Migrate Bevy projects between engine versions")]
#[command(version)]
struct Cli {
    /// Path to the project root (contains Cargo.toml)
    project_path: PathBuf,

    /// Target Bevy version
    #[arg(short, long, default_value = "0.18")]
    target_version: String,

    /// Current Bevy version (detected from Cargo.toml when omitted)
    #[arg(short, long)]
    from_version: Option<String>,

    /// Don't write changes, just show what would change
    #[arg(long)]
    dry_run: bool,

    /// Directory for the pre-write backup (default: migration_backup/<timestamp>)
    #[arg(long)]
    backup_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Migrate even when the declared version disagrees with detection
    #[arg(long)]
    force: bool,

    /// Glob to exclude from scanning (repeatable)
    #[arg(long = "exclude", value_name = "GLOB")]
    exclude: Vec<String>,

    /// Worker threads (0 = one per CPU)
    #[arg(short, long, default_value_t = 0)]
    jobs: usize,

    /// Directory of extra YAML rule sets to register
    #[arg(long)]
    rules_dir: Option<PathBuf>,

    /// Output the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let options = MigrationOptions {
        dry_run: cli.dry_run,
        exclude: cli.exclude.clone(),
        force: cli.force,
        backup_dir: cli.backup_dir.clone(),
        jobs: cli.jobs,
        file_timeout: Duration::from_secs(30),
    };

    let mut engine = MigrationEngine::new(catalog::builtin(), catalog::callbacks(), options);
    if let Some(dir) = &cli.rules_dir {
        if let Err(e) = load_rule_sets(&mut engine, dir) {
            eprintln!("Failed to load rules: {:#}", e);
            std::process::exit(1);
        }
    }

    let report = match engine.run(
        &cli.project_path,
        cli.from_version.as_deref(),
        &cli.target_version,
    ) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Migration error: {}", e);
            std::process::exit(1);
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report).unwrap());
    } else {
        print_report(&report);
    }
    std::process::exit(report.exit_code());
}

/// Register every YAML unit found directly inside `dir`
fn load_rule_sets(engine: &mut MigrationEngine, dir: &std::path::Path) -> anyhow::Result<()> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml")
            )
        })
        .collect();
    paths.sort();
    for path in paths {
        let unit = MigrationUnit::from_path(&path)
            .with_context(|| format!("parsing {}", path.display()))?;
        log::info!("loaded rule set {} from {}", unit.key(), path.display());
        engine.add_unit(unit);
    }
    Ok(())
}

fn print_report(report: &MigrationReport) {
    println!(
        "Migration: {} -> {}",
        report.from_version, report.to_version
    );
    println!("===================================================");
    println!();

    if report.plan_applied.is_empty() {
        println!("Already at target version, nothing to do.");
        return;
    }
    println!("Steps: {}", report.plan_applied.join(", "));
    println!();

    if report.total_transformations == 0 {
        println!("No source changes needed.");
    } else {
        println!(
            "Changes: {} across {} of {} files",
            report.total_transformations, report.files_modified, report.files_scanned
        );
        println!();
        for file in &report.per_file {
            if file.transforms.is_empty() {
                continue;
            }
            println!("  {}", file.path.display());
            for change in &file.transforms {
                println!("    Line {}: {}", change.line, change.description);
                println!("      - {}", truncate(&change.before, 60));
                println!("      + {}", truncate(&change.after, 60));
            }
            println!();
        }
    }

    if report.manifest_updated {
        println!("Cargo.toml: bevy version set to {}", report.to_version);
    }
    if let Some(backup) = &report.backup {
        println!("Backup written to: {}", backup.display());
    }
    if !report.degraded_rules.is_empty() {
        println!(
            "Reduced accuracy: rule(s) {} matched via regex fallback, review their changes",
            report.degraded_rules.join(", ")
        );
    }
    if !report.warnings.is_empty() {
        println!("Warnings:");
        for warning in &report.warnings {
            println!("  ! {}", warning);
        }
    }
    if report.dry_run {
        println!();
        println!("Dry run - no files modified.");
    }
}

fn truncate(s: &str, max: usize) -> String {
    let flat = s.replace('\n', " ");
    if flat.len() <= max {
        flat
    } else {
        let mut end = max;
        while !flat.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &flat[..end])
    }
}
