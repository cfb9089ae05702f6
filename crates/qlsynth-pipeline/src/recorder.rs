//! A recording [`Design`] host.
//!
//! `ScriptDesign` accepts every operation and appends it to a command log
//! instead of transforming a netlist. The log is what a real synthesis tool
//! would be fed, so it doubles as a script generator. The whole state
//! serializes to JSON, which lets a later invocation continue where an
//! earlier, window-limited run stopped.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use qlsynth_types::{Operation, Result};

use crate::invoker::Design;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptDesign {
    commands: Vec<String>,
    scratch_ints: BTreeMap<String, i64>,
    scratch_strings: BTreeMap<String, String>,
    top: Option<String>,
    fully_selected: bool,
    /// Operation names this host rejects; used to exercise failure paths.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    reject: BTreeSet<String>,
}

impl ScriptDesign {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            scratch_ints: BTreeMap::new(),
            scratch_strings: BTreeMap::new(),
            top: None,
            fully_selected: true,
            reject: BTreeSet::new(),
        }
    }

    /// Name of the module `hierarchy -auto-top` would pick.
    pub fn with_top(mut self, top: impl Into<String>) -> Self {
        self.top = Some(top.into());
        self
    }

    pub fn with_partial_selection(mut self) -> Self {
        self.fully_selected = false;
        self
    }

    pub fn with_scratch_int(mut self, key: &str, value: i64) -> Self {
        self.scratch_ints.insert(key.to_string(), value);
        self
    }

    pub fn with_scratch_string(mut self, key: &str, value: impl Into<String>) -> Self {
        self.scratch_strings.insert(key.to_string(), value.into());
        self
    }

    /// Reject every operation called `name`.
    pub fn failing_on(mut self, name: impl Into<String>) -> Self {
        self.reject.insert(name.into());
        self
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// The command log as a Yosys script.
    pub fn to_script(&self) -> String {
        let mut script = String::new();
        for command in &self.commands {
            script.push_str(command);
            script.push('\n');
        }
        script
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Load `path` if it exists, otherwise start from an empty design.
    pub fn load_or_new(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn resolve_hierarchy(&mut self, args: &str) {
        let mut words = args.split_whitespace();
        while let Some(word) = words.next() {
            if word == "-top" {
                if let Some(name) = words.next() {
                    self.top = Some(name.to_string());
                }
            }
        }
    }
}

impl Default for ScriptDesign {
    fn default() -> Self {
        Self::new()
    }
}

impl Design for ScriptDesign {
    fn execute(&mut self, op: &Operation) -> std::result::Result<(), String> {
        if self.reject.contains(&op.name) {
            return Err(format!("host rejected '{}'", op.command()));
        }
        if op.name == "hierarchy" {
            self.resolve_hierarchy(&op.args);
        }
        self.commands.push(op.command());
        Ok(())
    }

    fn is_fully_selected(&self) -> bool {
        self.fully_selected
    }

    fn top_module(&self) -> Option<String> {
        self.top.clone()
    }

    fn scratchpad_get_int(&self, key: &str) -> Option<i64> {
        self.scratch_ints.get(key).copied()
    }

    fn scratchpad_set_int(&mut self, key: &str, value: i64) {
        self.scratch_ints.insert(key.to_string(), value);
    }

    fn scratchpad_get_string(&self, key: &str) -> Option<String> {
        self.scratch_strings.get(key).cloned()
    }
}
