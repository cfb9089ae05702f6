//! Shared types, errors, families and checkpoint labels for the qlsynth pipeline.
//!
//! This crate provides the foundational types used across the other qlsynth crates:
//! - `SynthError` — unified error taxonomy
//! - `Family` — the closed set of target device families
//! - `Label` — the fixed, totally ordered pipeline checkpoints
//! - `SynthConfig` / `Toggles` — the resolved configuration of one run
//! - `Operation` — one opaque named transformation with its literal arguments

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unified error type for all qlsynth subsystems.
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    // === Precondition Errors ===
    #[error("Invalid family specified: '{0}'")]
    InvalidFamily(String),

    #[error("This command only operates on fully selected designs!")]
    NotFullySelected,

    #[error("Unknown checkpoint label '{0}'")]
    UnknownLabel(String),

    #[error("Invalid run window '{from}:{to}': start comes after end")]
    InvalidRunWindow { from: String, to: String },

    #[error("Invalid argument '{flag}': {message}")]
    InvalidArgument { flag: String, message: String },

    #[error("Saved checkpoint is for family '{found}', not '{expected}'")]
    FamilyMismatch { expected: String, found: String },

    // === Invocation Errors ===
    #[error("Operation '{operation}' failed in checkpoint '{label}' (args: '{args}'): {message}")]
    Invocation {
        label: String,
        operation: String,
        args: String,
        message: String,
    },

    #[error("Checkpoint '{label}' needs a top module, but none was given or detected")]
    UnresolvedTop { label: String },

    // === Generic ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl SynthError {
    /// Returns `true` for errors raised before any checkpoint executes.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            SynthError::InvalidFamily(_)
                | SynthError::NotFullySelected
                | SynthError::UnknownLabel(_)
                | SynthError::InvalidRunWindow { .. }
                | SynthError::InvalidArgument { .. }
                | SynthError::FamilyMismatch { .. }
        )
    }

    /// The checkpoint a failure happened in, if any.
    pub fn label(&self) -> Option<&str> {
        match self {
            SynthError::Invocation { label, .. } | SynthError::UnresolvedTop { label } => {
                Some(label)
            }
            _ => None,
        }
    }
}

/// A convenience alias for `Result<T, SynthError>`.
pub type Result<T> = std::result::Result<T, SynthError>;

// ---------------------------------------------------------------------------
// Family — target device architecture
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    #[serde(rename = "pp3")]
    Pp3,
    #[serde(rename = "qlf_k4n8")]
    #[default]
    QlfK4n8,
    #[serde(rename = "qlf_k6n10")]
    QlfK6n10,
    #[serde(rename = "qlf_k6n10f")]
    QlfK6n10f,
}

impl Family {
    /// Every supported family, in the order they are documented.
    pub const ALL: [Family; 4] = [
        Family::Pp3,
        Family::QlfK4n8,
        Family::QlfK6n10,
        Family::QlfK6n10f,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Family::Pp3 => "pp3",
            Family::QlfK4n8 => "qlf_k4n8",
            Family::QlfK6n10 => "qlf_k6n10",
            Family::QlfK6n10f => "qlf_k6n10f",
        }
    }

    /// Families with a hard multiplier path in `map_dsp`.
    pub fn has_dsp(self) -> bool {
        matches!(self, Family::QlfK6n10 | Family::QlfK6n10f)
    }

    /// Families with a block RAM path in `map_bram`.
    pub fn has_bram(self) -> bool {
        matches!(self, Family::Pp3 | Family::QlfK6n10 | Family::QlfK6n10f)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Family {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self> {
        Family::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| SynthError::InvalidFamily(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Label — named pipeline checkpoint
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Begin,
    Prepare,
    MapDsp,
    Coarse,
    MapBram,
    MapFfram,
    MapGates,
    MapFfs,
    MapLuts,
    MapCells,
    Check,
    Iomap,
    Finalize,
    Blif,
    Edif,
    Verilog,
}

impl Label {
    /// All checkpoints in execution order.
    pub const ALL: [Label; 16] = [
        Label::Begin,
        Label::Prepare,
        Label::MapDsp,
        Label::Coarse,
        Label::MapBram,
        Label::MapFfram,
        Label::MapGates,
        Label::MapFfs,
        Label::MapLuts,
        Label::MapCells,
        Label::Check,
        Label::Iomap,
        Label::Finalize,
        Label::Blif,
        Label::Edif,
        Label::Verilog,
    ];

    pub const FIRST: Label = Label::Begin;
    pub const LAST: Label = Label::Verilog;

    pub fn name(self) -> &'static str {
        match self {
            Label::Begin => "begin",
            Label::Prepare => "prepare",
            Label::MapDsp => "map_dsp",
            Label::Coarse => "coarse",
            Label::MapBram => "map_bram",
            Label::MapFfram => "map_ffram",
            Label::MapGates => "map_gates",
            Label::MapFfs => "map_ffs",
            Label::MapLuts => "map_luts",
            Label::MapCells => "map_cells",
            Label::Check => "check",
            Label::Iomap => "iomap",
            Label::Finalize => "finalize",
            Label::Blif => "blif",
            Label::Edif => "edif",
            Label::Verilog => "verilog",
        }
    }

    /// Position in the total order.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The checkpoint after this one, `None` for the terminal checkpoint.
    pub fn next(self) -> Option<Label> {
        Label::ALL.get(self.index() + 1).copied()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Label {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self> {
        Label::ALL
            .into_iter()
            .find(|l| l.name() == s)
            .ok_or_else(|| SynthError::UnknownLabel(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// SynthConfig — resolved flags for one run
// ---------------------------------------------------------------------------

/// Independent boolean switches of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toggles {
    pub no_dsp: bool,
    pub use_dsp_cfg_params: bool,
    pub no_adder: bool,
    pub no_bram: bool,
    pub bram_types: bool,
    pub no_ff_map: bool,
    pub no_sdff: bool,
    pub no_abc_opt: bool,
    pub no_abc9: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthConfig {
    pub family: Family,
    /// Explicit top module; `None` auto-detects the hierarchy top.
    pub top: Option<String>,
    pub blif_file: Option<String>,
    pub edif_file: Option<String>,
    pub verilog_file: Option<String>,
    pub toggles: Toggles,
}

impl SynthConfig {
    pub fn new(family: Family) -> Self {
        Self {
            family,
            ..Self::default()
        }
    }

    /// Argument passed to `hierarchy` to select the top module.
    pub fn top_option(&self) -> String {
        match self.top.as_deref() {
            Some(top) if !top.is_empty() => format!("-top {top}"),
            _ => "-auto-top".to_string(),
        }
    }

    pub fn blif(&self) -> Option<&str> {
        non_empty(&self.blif_file)
    }

    pub fn edif(&self) -> Option<&str> {
        non_empty(&self.edif_file)
    }

    pub fn verilog(&self) -> Option<&str> {
        non_empty(&self.verilog_file)
    }
}

fn non_empty(path: &Option<String>) -> Option<&str> {
    path.as_deref().filter(|p| !p.is_empty())
}

// ---------------------------------------------------------------------------
// Operation — one opaque transformation call
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    pub args: String,
}

impl Operation {
    pub fn new(name: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: args.into(),
        }
    }

    /// Split a command line at the first whitespace into name and arguments.
    pub fn parse(command: &str) -> Self {
        let command = command.trim();
        match command.split_once(char::is_whitespace) {
            Some((name, args)) => Self::new(name, args.trim()),
            None => Self::new(command, ""),
        }
    }

    /// The full command line as the host would receive it.
    pub fn command(&self) -> String {
        if self.args.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.args)
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_invalid_family() {
        let err = SynthError::InvalidFamily("ice40".into());
        assert_eq!(err.to_string(), "Invalid family specified: 'ice40'");
    }

    #[test]
    fn error_display_invocation() {
        let err = SynthError::Invocation {
            label: "map_luts".into(),
            operation: "abc9".into(),
            args: "-maxlut 6".into(),
            message: "no delay target".into(),
        };
        assert_eq!(
            err.to_string(),
            "Operation 'abc9' failed in checkpoint 'map_luts' (args: '-maxlut 6'): no delay target"
        );
        assert_eq!(err.label(), Some("map_luts"));
        assert!(!err.is_precondition());
    }

    #[test]
    fn precondition_errors_are_classified() {
        assert!(SynthError::InvalidFamily("x".into()).is_precondition());
        assert!(SynthError::NotFullySelected.is_precondition());
        assert!(SynthError::UnknownLabel("x".into()).is_precondition());
        assert!(SynthError::FamilyMismatch {
            expected: "pp3".into(),
            found: "qlf_k4n8".into(),
        }
        .is_precondition());
        assert!(!SynthError::Other("x".into()).is_precondition());
    }

    #[test]
    fn unresolved_top_names_its_checkpoint() {
        let err = SynthError::UnresolvedTop {
            label: "edif".into(),
        };
        assert_eq!(err.label(), Some("edif"));
        assert!(err.to_string().contains("'edif'"));
        assert!(!err.is_precondition());
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SynthError = io_err.into();
        assert!(matches!(err, SynthError::Io(_)));
    }

    // --- Family ---

    #[test]
    fn family_parses_every_supported_name() {
        for family in Family::ALL {
            assert_eq!(family.name().parse::<Family>().unwrap(), family);
        }
    }

    #[test]
    fn family_rejects_unknown_name() {
        let err = "qlf_k4n9".parse::<Family>().unwrap_err();
        assert!(matches!(err, SynthError::InvalidFamily(ref f) if f == "qlf_k4n9"));
    }

    #[test]
    fn family_capabilities() {
        assert!(!Family::Pp3.has_dsp());
        assert!(!Family::QlfK4n8.has_dsp());
        assert!(Family::QlfK6n10.has_dsp());
        assert!(Family::QlfK6n10f.has_dsp());
        assert!(!Family::QlfK4n8.has_bram());
        assert!(Family::Pp3.has_bram());
    }

    #[test]
    fn family_default_is_k4n8() {
        assert_eq!(Family::default(), Family::QlfK4n8);
    }

    #[test]
    fn family_serializes_to_its_name() {
        assert_eq!(
            serde_json::to_string(&Family::QlfK6n10f).unwrap(),
            "\"qlf_k6n10f\""
        );
    }

    // --- Label ---

    #[test]
    fn labels_are_in_total_order() {
        for pair in Label::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert_eq!(pair[0].next(), Some(pair[1]));
        }
        assert_eq!(Label::LAST.next(), None);
        assert_eq!(Label::FIRST.index(), 0);
    }

    #[test]
    fn label_round_trips_through_name() {
        for label in Label::ALL {
            assert_eq!(label.name().parse::<Label>().unwrap(), label);
        }
        assert!("map_everything".parse::<Label>().is_err());
    }

    // --- SynthConfig ---

    #[test]
    fn top_option_defaults_to_auto_top() {
        let mut cfg = SynthConfig::new(Family::Pp3);
        assert_eq!(cfg.top_option(), "-auto-top");
        cfg.top = Some("counter".into());
        assert_eq!(cfg.top_option(), "-top counter");
    }

    #[test]
    fn empty_output_paths_count_as_absent() {
        let cfg = SynthConfig {
            blif_file: Some(String::new()),
            edif_file: Some("out.edif".into()),
            ..SynthConfig::default()
        };
        assert_eq!(cfg.blif(), None);
        assert_eq!(cfg.edif(), Some("out.edif"));
        assert_eq!(cfg.verilog(), None);
    }

    // --- Operation ---

    #[test]
    fn operation_parse_splits_name_and_args() {
        let op = Operation::parse("techmap -map +/techmap.v");
        assert_eq!(op.name, "techmap");
        assert_eq!(op.args, "-map +/techmap.v");
        assert_eq!(op.command(), "techmap -map +/techmap.v");

        let bare = Operation::parse("opt_clean");
        assert_eq!(bare.name, "opt_clean");
        assert!(bare.args.is_empty());
        assert_eq!(bare.to_string(), "opt_clean");
    }
}
