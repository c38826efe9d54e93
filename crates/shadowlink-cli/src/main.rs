//! shadowlink CLI
//!
//! Inspects and repairs override shadows, relinks asset sources and isolates
//! instance scripts in a project snapshot.

mod cli;
mod commands;
mod context;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands};
use context::Context;
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Logs go to stderr; without `--verbose`, `SHADOWLINK_LOG` sets the level.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("SHADOWLINK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        tracing::debug!("Verbose mode enabled");
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(cmd) = cli.command else {
        println!("{} linked-asset override maintenance", "shadowlink".green().bold());
        println!();
        println!("Run {} for available commands.", "shadowlink --help".cyan());
        return Ok(());
    };

    let cwd = std::env::current_dir()?;
    let mut ctx = Context::open(cli.project.as_deref(), &cwd, cli.dry_run, cli.json)?;
    if !cli.select.is_empty() && ctx.select(&cli.select) == 0 {
        return Err(CliError::user(format!(
            "No asset sources match {}",
            cli.select.join(", ")
        )));
    }
    if cli.headless
        && let Some(stats) = ctx.session.fix_on_load()
    {
        tracing::info!(
            fixed = stats.fixed,
            missing = stats.missing,
            "On-load link fix"
        );
        if stats.fixed > 0 {
            ctx.save()?;
        }
    }

    let mutates = cmd.mutates();
    execute_command(&mut ctx, cmd)?;
    if ctx.dry_run && mutates && !ctx.json {
        println!(
            "{} Dry run: {} was not written",
            "=>".blue().bold(),
            ctx.path.display()
        );
    }
    Ok(())
}

fn execute_command(ctx: &mut Context, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Status => commands::run_status(ctx),
        Commands::Check { broken } => commands::run_check(ctx, broken),
        Commands::Repair { ids } => commands::run_repair(ctx, ids),
        Commands::Resync { id, hierarchy } => commands::run_resync(ctx, &id, hierarchy),
        Commands::Promote {
            name,
            source,
            script,
        } => commands::run_promote(ctx, &name, &source, script.as_deref()),
        Commands::Clear { id } => commands::run_clear(ctx, &id),
        Commands::Sources => commands::run_sources(ctx),
        Commands::Relocate { source, path } => commands::run_relocate(ctx, &source, &path),
        Commands::Reload { ids } => commands::run_reload(ctx, ids),
        Commands::Relink {
            search,
            replace,
            ids,
        } => commands::run_relink(ctx, &search, &replace, ids),
        Commands::SearchFolder {
            dir,
            ids,
            no_recursive,
        } => commands::run_search_folder(ctx, &dir, ids, !no_recursive),
        Commands::Versions { ids } => commands::run_versions(ctx, ids),
        Commands::Bump { ids } => commands::run_bump(ctx, ids),
        Commands::Autofix { report_only } => commands::run_autofix(ctx, report_only),
        Commands::Report => commands::run_report(ctx),
        Commands::Validate => commands::run_validate(ctx),
        Commands::Isolate { id, instance } => commands::run_isolate(ctx, &id, &instance),
        Commands::ValidateScript { name } => commands::run_validate_script(ctx, &name),
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_cli_error_user() {
        let error = crate::error::CliError::user("test error");
        assert_eq!(format!("{}", error), "test error");
    }
}
