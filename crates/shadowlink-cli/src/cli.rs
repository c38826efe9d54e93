//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// shadowlink - Keep linked-asset overrides healthy
#[derive(Parser, Debug)]
#[command(name = "shadowlink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project snapshot (default: nearest shadowlink.toml)
    #[arg(short, long, global = true, env = "SHADOWLINK_PROJECT")]
    pub project: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Do not write changes back to the snapshot
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Output as JSON for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Run the on-load link fix first (when the project enables it)
    #[arg(long, global = true)]
    pub headless: bool,

    /// Select asset sources whose name contains PATTERN (repeatable);
    /// batch commands given no names act on the selection
    #[arg(long, global = true, value_name = "PATTERN")]
    pub select: Vec<String>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show project overview
    Status,

    /// Run a health check on every override
    Check {
        /// Only list overrides with errors
        #[arg(long)]
        broken: bool,
    },

    /// Repair overrides (all of them when none are named)
    Repair {
        /// Override names
        ids: Vec<String>,
    },

    /// Re-derive an override from its upstream object
    Resync {
        /// Override name
        id: String,

        /// Include children, matched by name
        #[arg(long)]
        hierarchy: bool,
    },

    /// Create an override for a linked object
    ///
    /// Examples:
    ///   shadowlink promote hero_rig --source hero
    ///   shadowlink promote hero_rig --source hero --script rig_ui
    Promote {
        /// Linked object name
        name: String,

        /// Asset source the object comes from
        #[arg(short, long)]
        source: String,

        /// Shared script to isolate for the new instance
        #[arg(long)]
        script: Option<String>,
    },

    /// Remove an override, reverting it to a plain link
    Clear {
        /// Override name
        id: String,
    },

    /// List asset sources
    Sources,

    /// Point a source at a new file and reload it
    Relocate {
        /// Source name
        source: String,

        /// New path (may contain variables)
        path: String,
    },

    /// Reload sources (all when none are named)
    Reload {
        ids: Vec<String>,
    },

    /// Replace text in source paths and reload
    ///
    /// Examples:
    ///   shadowlink relink --search 'S:\' --replace 'P:\'
    ///   shadowlink relink --search /old/ --replace /new/ hero crate
    Relink {
        /// Text to find
        #[arg(long)]
        search: String,

        /// Replacement text
        #[arg(long)]
        replace: String,

        /// Source names (default: all)
        ids: Vec<String>,
    },

    /// Find missing source files by name under a folder
    SearchFolder {
        /// Folder to search
        dir: PathBuf,

        /// Source names (default: all)
        ids: Vec<String>,

        /// Only look directly inside the folder
        #[arg(long)]
        no_recursive: bool,
    },

    /// Show version information for sources
    Versions {
        ids: Vec<String>,
    },

    /// Move sources to their newest version
    Bump {
        ids: Vec<String>,
    },

    /// Fix broken links by expanding variables in their paths
    Autofix {
        /// Count what could be fixed without changing anything
        #[arg(long)]
        report_only: bool,
    },

    /// Print a status line for every source
    Report,

    /// Exit non-zero when any source is missing
    Validate,

    /// Give an override's rig its own copy of its script
    Isolate {
        /// Override name
        id: String,

        /// Instance name for the copy
        instance: String,
    },

    /// Scan a script for unsafe operations
    ValidateScript {
        /// Script name
        name: String,
    },
}

impl Commands {
    /// Whether the command can change the snapshot.
    pub fn mutates(&self) -> bool {
        !matches!(
            self,
            Self::Status
                | Self::Check { .. }
                | Self::Sources
                | Self::Versions { .. }
                | Self::Report
                | Self::Validate
                | Self::ValidateScript { .. }
                | Self::Autofix {
                    report_only: true
                }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_relink_with_windows_paths() {
        let cli = Cli::parse_from([
            "shadowlink", "relink", "--search", r"S:\", "--replace", r"P:\", "hero",
        ]);
        assert_eq!(
            cli.command,
            Some(Commands::Relink {
                search: r"S:\".to_string(),
                replace: r"P:\".to_string(),
                ids: vec!["hero".to_string()],
            })
        );
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["shadowlink", "bump", "--dry-run", "--json"]);
        assert!(cli.dry_run);
        assert!(cli.json);
        assert!(cli.command.unwrap().mutates());
    }

    #[test]
    fn parse_repeated_select_patterns() {
        let cli = Cli::parse_from(["shadowlink", "reload", "--select", "hero", "--select", "prop"]);
        assert_eq!(cli.select, vec!["hero".to_string(), "prop".to_string()]);
        assert_eq!(cli.command, Some(Commands::Reload { ids: Vec::new() }));
    }

    #[test]
    fn read_only_commands_do_not_mutate() {
        assert!(!Commands::Report.mutates());
        assert!(!Commands::Autofix { report_only: true }.mutates());
        assert!(Commands::Autofix { report_only: false }.mutates());
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
