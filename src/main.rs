use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use reclaim::cleaner::{self, BackupManifest, CleanOptions};
use reclaim::cli::args::{
    self, Cli, Commands, CompletionShell, ConfigAction, OutputFormat, ScanArgs,
};
use reclaim::cli::output;
use reclaim::common::config::Config;
use reclaim::common::format;
use reclaim::{Engine, PathCatalog};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let _guard = init_logging(&cli)?;

    match cli.command {
        Commands::Scan { ref scan, list } => cmd_scan(&cli, scan, list),

        Commands::Clean {
            ref scan,
            ref categories,
            execute,
            no_backup,
            yes,
        } => cmd_clean(&cli, scan, categories, execute, no_backup, yes),

        Commands::Restore {
            ref backup,
            last,
            list,
        } => cmd_restore(&cli, backup.as_deref(), last, list),

        Commands::Config { ref action } => cmd_config(&cli, action),

        Commands::Completions { ref shell } => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            let shell = match shell {
                CompletionShell::Bash => clap_complete::Shell::Bash,
                CompletionShell::Zsh => clap_complete::Shell::Zsh,
                CompletionShell::Fish => clap_complete::Shell::Fish,
            };
            clap_complete::generate(shell, &mut cmd, "reclaim", &mut std::io::stdout());
            Ok(())
        }
    }
}

// ─── Setup ────────────────────────────────────────────────────────────────────

/// Logs go to stderr so JSON on stdout stays parseable. `RECLAIM_LOG`
/// overrides the level chosen from `--verbose`.
fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let default_level = if cli.verbose {
        "reclaim=debug"
    } else {
        "reclaim=warn"
    };
    let filter =
        EnvFilter::try_from_env("RECLAIM_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(!cli.no_color);

    if !cli.log_file {
        tracing_subscriber::registry()
            .with(stderr_layer)
            .with(filter)
            .init();
        return Ok(None);
    }

    let dir = Config::logs_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
    let file_appender = tracing_appender::rolling::daily(&dir, "reclaim.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(filter)
        .init();

    Ok(Some(guard))
}

fn config_path(cli: &Cli) -> PathBuf {
    cli.config.clone().unwrap_or_else(Config::config_path)
}

fn load_config(cli: &Cli) -> Result<Config> {
    Config::load_from(&config_path(cli))
}

fn show_progress(cli: &Cli) -> bool {
    !cli.quiet && cli.format == OutputFormat::Human
}

fn catalog_for(scan: &ScanArgs) -> Result<PathCatalog> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(scan
        .catalog(&cwd)?
        .unwrap_or_else(PathCatalog::for_current_os))
}

fn confirm(prompt: &str) -> Result<bool> {
    use std::io::Write;
    // stderr keeps stdout clean for --format json
    eprint!("\n  {} {} [y/N] ", "❓", prompt);
    std::io::stderr().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

// ─── Scan ─────────────────────────────────────────────────────────────────────

fn cmd_scan(cli: &Cli, scan: &ScanArgs, list: bool) -> Result<()> {
    let config = load_config(cli)?;
    let catalog = catalog_for(scan)?;
    let options = scan.scan_options(show_progress(cli));

    let mut engine = Engine::new(config)?;
    let report = engine.scan(&catalog, &options)?;

    match cli.format {
        OutputFormat::Human => output::print_scan_results(report, list),
        OutputFormat::Json => output::print_scan_json(report),
        OutputFormat::Quiet => output::print_scan_quiet(report),
    }

    Ok(())
}

// ─── Clean ────────────────────────────────────────────────────────────────────

fn cmd_clean(
    cli: &Cli,
    scan: &ScanArgs,
    categories: &[String],
    execute: bool,
    no_backup: bool,
    yes: bool,
) -> Result<()> {
    let config = load_config(cli)?;
    let catalog = catalog_for(scan)?;
    let progress = show_progress(cli);

    let categories = args::parse_categories(categories)?;
    let mut options = CleanOptions::new(categories.iter().copied());
    options.safe_mode = !execute;
    options.backup_enabled = !no_backup;
    options.show_progress = progress;
    options.validate()?;

    let mut engine = Engine::new(config)?;
    engine.scan(&catalog, &scan.scan_options(progress))?;

    if execute && !yes {
        let plan = engine.preview(&options)?;
        if plan.is_empty() {
            eprintln!("  {} Nothing to clean.", "✨");
            return Ok(());
        }
        output::print_plan(&plan, &categories);

        let action = if options.backup_enabled {
            "Back up and remove"
        } else {
            "PERMANENTLY DELETE"
        };
        let prompt = format!(
            "{} {} ({})?",
            action,
            format::plural(plan.len(), "file"),
            format::format_size(plan.total_bytes)
        );
        if !confirm(&prompt)? {
            eprintln!("  {} Cancelled", "✗".red());
            return Ok(());
        }
    }

    let result = match engine.clean(&options) {
        Ok(result) => result,
        Err(e) => {
            if let Some(partial) = e.partial_result() {
                if cli.format == OutputFormat::Human {
                    output::print_clean_result(partial);
                }
            }
            return Err(e.into());
        }
    };

    match cli.format {
        OutputFormat::Human => output::print_clean_result(&result),
        OutputFormat::Json => output::print_clean_json(&result),
        OutputFormat::Quiet => output::print_clean_quiet(&result),
    }

    Ok(())
}

// ─── Restore ──────────────────────────────────────────────────────────────────

fn cmd_restore(cli: &Cli, backup: Option<&str>, last: bool, list: bool) -> Result<()> {
    let config = load_config(cli)?;
    let base = config.backup_base();

    if list {
        let sessions = BackupManifest::list_sessions(&base)?;
        match cli.format {
            OutputFormat::Json => {
                let json: Vec<_> = sessions
                    .iter()
                    .map(|(root, m)| {
                        serde_json::json!({
                            "path": root,
                            "session_id": m.session_id,
                            "timestamp": m.timestamp,
                            "files_removed": m.files_removed,
                            "bytes_freed": m.bytes_freed,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            OutputFormat::Quiet => {
                for (root, _) in &sessions {
                    println!("{}", root.display());
                }
            }
            OutputFormat::Human => output::print_backups(&sessions),
        }
        return Ok(());
    }

    let session_root = if last {
        BackupManifest::list_sessions(&base)?
            .into_iter()
            .next()
            .map(|(root, _)| root)
            .ok_or_else(|| anyhow::anyhow!("No backups found in {}", base.display()))?
    } else {
        let given = backup.ok_or_else(|| {
            anyhow::anyhow!("Specify a backup, or use --last or --list")
        })?;
        resolve_backup(&base, given)
    };

    let report = cleaner::restore_backup(&session_root, show_progress(cli))?;

    match cli.format {
        OutputFormat::Human => output::print_restore_report(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Quiet => println!(
            "{}  {}",
            report.restored_count,
            format::format_size(report.restored_bytes)
        ),
    }

    Ok(())
}

/// A backup is given either as its directory or as the session id under
/// the configured backup base
fn resolve_backup(base: &Path, given: &str) -> PathBuf {
    let as_path = PathBuf::from(given);
    if as_path.is_dir() {
        as_path
    } else {
        base.join(given)
    }
}

// ─── Config ───────────────────────────────────────────────────────────────────

fn cmd_config(cli: &Cli, action: &ConfigAction) -> Result<()> {
    let path = config_path(cli);
    match action {
        ConfigAction::Show => {
            let config = Config::load_from(&path)?;
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
                _ => println!("{}", toml::to_string_pretty(&config)?),
            }
            Ok(())
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config already exists at {} (use --force to overwrite)",
                    path.display()
                );
            }
            Config::default().save_to(&path)?;
            println!(
                "  {} Wrote default configuration to {}",
                "✓".green(),
                format::display_path(&path)
            );
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}
