//! Variable sources consulted during path expansion
//!
//! Path expansion never reads the process environment directly; it goes
//! through a [`VarSource`] so callers (and tests) can supply their own
//! variables and home directory.

use std::collections::HashMap;
use std::path::PathBuf;

/// Supplies environment variables and the user's home directory.
pub trait VarSource: Send + Sync {
    /// Look up a variable by name.
    fn var(&self, name: &str) -> Option<String>;

    /// The directory a leading `~` expands to.
    fn home_dir(&self) -> Option<PathBuf>;
}

/// Reads from the live process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEnv;

impl VarSource for SystemEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }
}

/// A fixed set of variables, independent of the process environment.
#[derive(Debug, Default, Clone)]
pub struct MapEnv {
    vars: HashMap<String, String>,
    home: Option<PathBuf>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a variable.
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Set the home directory used for `~`.
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }
}

impl VarSource for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            home: None,
        }
    }
}
