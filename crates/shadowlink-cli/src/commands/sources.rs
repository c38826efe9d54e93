//! Asset source commands: listing, relocation, relinking and versions

use std::path::Path;

use colored::Colorize;
use serde_json::json;
use shadowlink_core::{BatchSummary, ItemStatus};

use crate::context::Context;
use crate::error::{CliError, Result};

/// Run the sources command
pub fn run_sources(ctx: &Context) -> Result<()> {
    let registry = ctx.session.registry();
    if ctx.json {
        return ctx.emit_json(&registry.sources());
    }

    if registry.is_empty() {
        println!("{}", "No asset sources".dimmed());
        return Ok(());
    }
    for source in registry.sources() {
        let mark = if source.exists { "+".green() } else { "!".red() };
        let mut line = format!("{} {}", mark, source.name.cyan());
        if let Some(size) = source.file_size() {
            line.push_str(&format!(" {}", size.dimmed()));
        }
        if let Some(version) = source.detected_version {
            line.push_str(&format!(" v{version:02}"));
        }
        if source.has_newer_version {
            line.push_str(&format!(" {}", "(newer available)".yellow()));
        }
        if source.override_count > 0 {
            line.push_str(&format!(" [{} overrides]", source.override_count));
        }
        println!("{line}");
        println!("    {}", source.path.dimmed());
    }
    Ok(())
}

/// Run the relocate command
pub fn run_relocate(ctx: &mut Context, source: &str, path: &str) -> Result<()> {
    let reloaded = ctx.session.relocate(source, path)?;
    ctx.save()?;

    if ctx.json {
        return ctx.emit_json(&json!({ "source": source, "path": path, "reloaded": reloaded }));
    }
    if reloaded {
        println!("{} {} -> {}", "OK".green().bold(), source.cyan(), path);
    } else {
        println!(
            "{} {} now points at {} but could not be reloaded",
            "WARN".yellow().bold(),
            source.cyan(),
            path
        );
    }
    Ok(())
}

/// Run the reload command
pub fn run_reload(ctx: &mut Context, ids: Vec<String>) -> Result<()> {
    let ids = ctx.source_ids(ids);
    let summary = ctx.session.batch_reload(&ids);
    print_summary(ctx, "Reload", &summary)
}

/// Run the relink command
pub fn run_relink(ctx: &mut Context, search: &str, replace: &str, ids: Vec<String>) -> Result<()> {
    let ids = ctx.source_ids(ids);
    let summary = ctx.session.batch_relink(&ids, search, replace)?;
    ctx.save()?;
    print_summary(ctx, "Relink", &summary)
}

/// Run the search-folder command
pub fn run_search_folder(
    ctx: &mut Context,
    dir: &Path,
    ids: Vec<String>,
    recursive: bool,
) -> Result<()> {
    let ids = ctx.source_ids(ids);
    let summary = ctx.session.batch_search_folder(&ids, dir, recursive)?;
    ctx.save()?;
    print_summary(ctx, "Search", &summary)
}

/// Run the versions command
pub fn run_versions(ctx: &Context, ids: Vec<String>) -> Result<()> {
    let ids = ctx.source_ids(ids);
    let mut infos = Vec::with_capacity(ids.len());
    for id in &ids {
        infos.push((id.clone(), ctx.session.version_info(id)?));
    }

    if ctx.json {
        let entries: Vec<_> = infos
            .iter()
            .map(|(name, info)| json!({ "source": name, "version": info }))
            .collect();
        return ctx.emit_json(&entries);
    }
    for (name, info) in &infos {
        match info.current {
            None => println!("{} {}", "-".dimmed(), name.cyan()),
            Some(current) => {
                let status = if info.has_newer {
                    format!("v{current:02} (latest v{:02})", info.latest.unwrap_or(current))
                        .yellow()
                } else {
                    format!("v{current:02} (latest)").green()
                };
                println!("{} {} {}", "+".green(), name.cyan(), status);
                for file in &info.all_versions {
                    println!("    {}", file.path.dimmed());
                }
            }
        }
    }
    Ok(())
}

/// Run the bump command
pub fn run_bump(ctx: &mut Context, ids: Vec<String>) -> Result<()> {
    let ids = ctx.source_ids(ids);
    if ids.is_empty() {
        return Err(CliError::user("No asset sources to update"));
    }
    let summary = ctx.session.bump_to_latest(&ids);
    ctx.save()?;
    print_summary(ctx, "Update", &summary)
}

fn print_summary(ctx: &Context, action: &str, summary: &BatchSummary) -> Result<()> {
    if ctx.json {
        return ctx.emit_json(summary);
    }
    for outcome in &summary.outcomes {
        let mark = match outcome.status {
            ItemStatus::Succeeded => "+".green(),
            ItemStatus::Failed => "!".red(),
            ItemStatus::Skipped => "-".dimmed(),
        };
        println!("   {} {} ({}): {}", mark, outcome.id.cyan(), outcome.status, outcome.detail);
    }
    println!(
        "{} {action}: {} succeeded, {} failed, {} skipped",
        "=>".blue().bold(),
        summary.succeeded,
        summary.failed,
        summary.skipped
    );
    Ok(())
}
