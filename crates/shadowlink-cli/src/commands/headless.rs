//! Non-interactive link checking: autofix, report and validate

use colored::Colorize;

use crate::context::Context;
use crate::error::{CliError, Result};

/// Run the autofix command
pub fn run_autofix(ctx: &mut Context, report_only: bool) -> Result<()> {
    let stats = ctx.session.auto_fix_broken_links(report_only);
    if !report_only && stats.fixed > 0 {
        ctx.save()?;
    }

    if ctx.json {
        return ctx.emit_json(&stats);
    }
    let verb = if report_only { "fixable" } else { "fixed" };
    println!(
        "{} {} sources: {} ok, {} {verb}, {} missing",
        "=>".blue().bold(),
        stats.total,
        stats.already_ok.to_string().green(),
        stats.fixed.to_string().cyan(),
        stats.missing.to_string().red()
    );
    Ok(())
}

/// Run the report command
pub fn run_report(ctx: &Context) -> Result<()> {
    let lines = ctx.session.library_report();
    if ctx.json {
        return ctx.emit_json(&lines);
    }
    println!("{}", "Library Report".bold());
    for line in &lines {
        println!("{line}");
    }
    Ok(())
}

/// Run the validate command
pub fn run_validate(ctx: &Context) -> Result<()> {
    let valid = ctx.session.validate_all();
    if ctx.json {
        ctx.emit_json(&serde_json::json!({ "valid": valid }))?;
    } else if valid {
        println!("{} All sources resolve.", "OK".green().bold());
    }
    if valid {
        Ok(())
    } else {
        Err(CliError::user("Some asset sources are missing"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadowlink_test_utils::snapshot::SnapshotBuilder;
    use shadowlink_test_utils::tree::AssetTree;

    #[test]
    fn test_validate_fails_on_missing_source() {
        let tree = AssetTree::new();
        tree.touch("here.blend");
        let path = SnapshotBuilder::new()
            .source("here", "here.blend")
            .source("gone", "gone.blend")
            .write(tree.root());
        let ctx = Context::open(Some(&path), tree.root(), false, false).unwrap();

        assert!(run_report(&ctx).is_ok());
        let err = run_validate(&ctx).unwrap_err();
        assert_eq!(err.to_string(), "Some asset sources are missing");
    }

    #[test]
    fn test_report_only_autofix_leaves_snapshot_alone() {
        let tree = AssetTree::new();
        let path = SnapshotBuilder::new()
            .source("env", "${SHADOWLINK_TEST_UNSET_ROOT}/env.blend")
            .write(tree.root());
        let before = std::fs::read_to_string(&path).unwrap();
        let mut ctx = Context::open(Some(&path), tree.root(), false, false).unwrap();

        run_autofix(&mut ctx, true).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }
}
