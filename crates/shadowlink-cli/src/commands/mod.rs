//! Command implementations for shadowlink-cli

pub mod headless;
pub mod overrides;
pub mod scripts;
pub mod sources;

pub use headless::{run_autofix, run_report, run_validate};
pub use overrides::{run_check, run_clear, run_promote, run_repair, run_resync, run_status};
pub use scripts::{run_isolate, run_validate_script};
pub use sources::{
    run_bump, run_relink, run_relocate, run_reload, run_search_folder, run_sources, run_versions,
};
