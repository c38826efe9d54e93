//! Status, check, repair, resync, promote and clear commands

use colored::Colorize;
use serde_json::json;
use shadowlink_core::{HealthStatus, LinkedRef, ResyncMode, Severity};

use crate::context::Context;
use crate::error::Result;

/// Run the status command
pub fn run_status(ctx: &Context) -> Result<()> {
    let project = ctx.session.project();
    let registry = ctx.session.registry();
    let summary = ctx.session.health_summary();
    let missing = registry.missing().count();

    if ctx.json {
        return ctx.emit_json(&json!({
            "project": ctx.path.display().to_string(),
            "sources": registry.len(),
            "missing_sources": missing,
            "overrides": summary,
            "scripts": project.scripts.len(),
        }));
    }

    println!("{}", "Project Status".bold());
    println!();
    println!("{}:     {}", "Snapshot".dimmed(), ctx.path.display());
    println!(
        "{}:      {} ({} missing)",
        "Sources".dimmed(),
        registry.len(),
        if missing == 0 {
            missing.to_string().green()
        } else {
            missing.to_string().red()
        }
    );
    println!(
        "{}:    {} healthy, {} warning, {} error",
        "Overrides".dimmed(),
        summary.healthy.to_string().green(),
        summary.warning.to_string().yellow(),
        summary.error.to_string().red()
    );
    println!("{}:      {}", "Scripts".dimmed(), project.scripts.len());
    Ok(())
}

/// Run the check command
pub fn run_check(ctx: &Context, broken_only: bool) -> Result<()> {
    if broken_only {
        let broken = ctx.session.find_broken();
        if ctx.json {
            let entries: Vec<_> = broken
                .iter()
                .map(|(name, issues)| json!({ "shadow": name, "issues": issues }))
                .collect();
            return ctx.emit_json(&entries);
        }
        if broken.is_empty() {
            println!("{} No broken overrides.", "OK".green().bold());
        }
        for (name, issues) in &broken {
            println!("{} {}", "BROKEN".red().bold(), name.cyan());
            for issue in issues {
                println!("   {} {}", "!".red(), issue.message);
            }
        }
        return Ok(());
    }

    let reports = ctx.session.run_health_check();
    if ctx.json {
        return ctx.emit_json(&reports);
    }

    println!("{} Checking {} overrides...", "=>".blue().bold(), reports.len());
    for report in &reports {
        let label = match report.status {
            HealthStatus::Healthy => "OK".green().bold(),
            HealthStatus::Warning => "WARN".yellow().bold(),
            HealthStatus::Error => "ERROR".red().bold(),
        };
        println!("{} {}", label, report.shadow.cyan());
        for issue in &report.issues {
            let marker = match issue.severity {
                Severity::Error => "!".red(),
                Severity::Warning => "-".yellow(),
                Severity::Info => "i".dimmed(),
            };
            println!("   {} {}", marker, issue.message);
        }
    }
    if reports.iter().any(|r| !r.healthy) {
        println!();
        println!("Run {} to fix what can be fixed.", "shadowlink repair".cyan());
    }
    Ok(())
}

/// Run the repair command
pub fn run_repair(ctx: &mut Context, ids: Vec<String>) -> Result<()> {
    let ids = if ids.is_empty() {
        ctx.session
            .run_health_check()
            .into_iter()
            .map(|r| r.shadow)
            .collect()
    } else {
        ids
    };

    let mut reports = Vec::with_capacity(ids.len());
    for id in &ids {
        reports.push(ctx.session.repair(id)?);
    }
    ctx.save()?;

    if ctx.json {
        return ctx.emit_json(&reports);
    }
    for report in &reports {
        if report.is_noop() && report.failures.is_empty() {
            println!("{} {} needs no repair", "OK".green().bold(), report.shadow.cyan());
            continue;
        }
        println!("{} {}", "=>".blue().bold(), report.shadow.cyan());
        for fix in &report.fixes {
            println!("   {} {}", "+".green(), fix);
        }
        for failure in &report.failures {
            println!("   {} {}", "!".red(), failure);
        }
    }
    Ok(())
}

/// Run the resync command
pub fn run_resync(ctx: &mut Context, id: &str, hierarchy: bool) -> Result<()> {
    let mode = if hierarchy {
        ResyncMode::Hierarchy
    } else {
        ResyncMode::Single
    };
    let report = ctx.session.resync(id, mode)?;
    if report.succeeded() {
        ctx.save()?;
    }

    if ctx.json {
        return ctx.emit_json(&report);
    }
    match &report.error {
        Some(error) => println!("{} {}: {}", "FAILED".red().bold(), id.cyan(), error),
        None => {
            println!(
                "{} Resynced {} ({} joints added, {} removed, {} properties dropped)",
                "OK".green().bold(),
                report.resynced.join(", ").cyan(),
                report.joints_added,
                report.joints_removed,
                report.dropped_properties
            );
            for name in &report.unmatched {
                println!("   {} {} has no upstream counterpart", "-".yellow(), name);
            }
        }
    }
    Ok(())
}

/// Run the promote command
pub fn run_promote(ctx: &mut Context, name: &str, source: &str, script: Option<&str>) -> Result<()> {
    let kind = ctx
        .session
        .project()
        .upstream_for(name)
        .map(|node| node.kind.clone())
        .unwrap_or_default();
    let outcome = ctx
        .session
        .promote(LinkedRef::new(name, source), kind, script)?;
    ctx.save()?;

    if ctx.json {
        return ctx.emit_json(&outcome);
    }
    println!(
        "{} Created override {} ({} properties editable)",
        "OK".green().bold(),
        outcome.name.cyan(),
        outcome.editable_added
    );
    if let Some(script) = &outcome.script {
        println!("   {} isolated script {}", "+".green(), script);
    }
    if let Some(execution) = &outcome.execution
        && let Some(error) = &execution.error
    {
        println!("   {} script not run: {}", "!".red(), error);
    }
    Ok(())
}

/// Run the clear command
pub fn run_clear(ctx: &mut Context, id: &str) -> Result<()> {
    let removed = ctx.session.clear_override(id)?;
    ctx.save()?;

    if ctx.json {
        return ctx.emit_json(&json!({ "cleared": removed.name }));
    }
    println!("{} Cleared override {}", "OK".green().bold(), removed.name.cyan());
    Ok(())
}
