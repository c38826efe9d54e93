//! Settings that steer linking, repair and batch behavior
//!
//! Settings live in the `[settings]` table of a project snapshot or in a
//! standalone TOML file. Every key is optional.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

fn enabled() -> bool {
    true
}

/// Behavior switches for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Make every property editable right after promoting to an override
    #[serde(default = "enabled")]
    pub auto_make_editable: bool,

    /// Give each promoted instance its own copy of the rig's script
    #[serde(default = "enabled")]
    pub isolate_scripts: bool,

    /// Run the instance script right after promoting
    #[serde(default)]
    pub auto_execute_scripts: bool,

    /// Scan scripts for unsafe operations before running them
    #[serde(default = "enabled")]
    pub validate_scripts: bool,

    /// Fill version information on every registry refresh
    #[serde(default = "enabled")]
    pub auto_detect_versions: bool,

    /// Expand `${NAME}`, `$NAME`, `%NAME%` and `~` in stored paths
    #[serde(default = "enabled")]
    pub use_environment_variables: bool,

    /// Repair broken source paths when a project is opened headless
    #[serde(default = "enabled")]
    pub auto_fix_on_load: bool,

    /// Cap on shadows inspected per health run (0 = unlimited)
    #[serde(default)]
    pub max_health_check_objects: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_make_editable: true,
            isolate_scripts: true,
            auto_execute_scripts: false,
            validate_scripts: true,
            auto_detect_versions: true,
            use_environment_variables: true,
            auto_fix_on_load: true,
            max_health_check_objects: 0,
        }
    }
}

impl Settings {
    /// Parse settings from TOML content.
    ///
    /// ```
    /// use shadowlink_core::Settings;
    ///
    /// let settings = Settings::parse("auto_execute_scripts = true").unwrap();
    /// assert!(settings.auto_execute_scripts);
    /// assert!(settings.validate_scripts);
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load settings from a TOML, JSON or YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(shadowlink_fs::document::load(path)?)
    }
}
