//! Name-indexed store of customization scripts

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A customization script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub name: String,
    #[serde(default)]
    pub text: String,
}

impl Script {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// `sha256:<hex>` digest of the text.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.text.as_bytes());
        format!("sha256:{:x}", hasher.finalize())
    }
}

/// All scripts known to a project, keyed by name.
///
/// Stored as a plain list in snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Script>", into = "Vec<Script>")]
pub struct ScriptLibrary {
    scripts: BTreeMap<String, Script>,
}

impl ScriptLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a script, returning the previous one.
    pub fn insert(&mut self, script: Script) -> Option<Script> {
        self.scripts.insert(script.name.clone(), script)
    }

    pub fn get(&self, name: &str) -> Option<&Script> {
        self.scripts.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Script> {
        self.scripts.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Script> {
        self.scripts.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scripts.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scripts.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Script> {
        self.scripts.values()
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    /// `base` if free, else `base_1`, `base_2`, ... (lowest unused).
    pub fn unique_name(&self, base: &str) -> String {
        if !self.contains(base) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{base}_{n}"))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

impl From<Vec<Script>> for ScriptLibrary {
    fn from(scripts: Vec<Script>) -> Self {
        let mut library = Self::new();
        for script in scripts {
            library.insert(script);
        }
        library
    }
}

impl From<ScriptLibrary> for Vec<Script> {
    fn from(library: ScriptLibrary) -> Self {
        library.scripts.into_values().collect()
    }
}

impl FromIterator<Script> for ScriptLibrary {
    fn from_iter<I: IntoIterator<Item = Script>>(iter: I) -> Self {
        iter.into_iter().collect::<Vec<_>>().into()
    }
}
