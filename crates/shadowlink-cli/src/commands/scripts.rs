//! Script isolation and safety commands

use colored::Colorize;
use serde_json::json;

use crate::context::Context;
use crate::error::Result;

/// Run the isolate command
pub fn run_isolate(ctx: &mut Context, id: &str, instance: &str) -> Result<()> {
    let script = ctx.session.isolate_script(id, instance)?;
    ctx.save()?;

    if ctx.json {
        return ctx.emit_json(&json!({ "shadow": id, "script": script }));
    }
    println!(
        "{} {} now runs its own copy {}",
        "OK".green().bold(),
        id.cyan(),
        script.cyan()
    );
    Ok(())
}

/// Run the validate-script command
pub fn run_validate_script(ctx: &Context, name: &str) -> Result<()> {
    let flags = ctx.session.validate_script(name)?;
    if ctx.json {
        return ctx.emit_json(&flags);
    }
    if flags.is_empty() {
        println!("{} {} has no unsafe operations", "OK".green().bold(), name.cyan());
    } else {
        println!("{} {} uses unsafe operations:", "WARN".yellow().bold(), name.cyan());
        for flag in &flags {
            println!("   {} {}", "!".red(), flag);
        }
    }
    Ok(())
}
