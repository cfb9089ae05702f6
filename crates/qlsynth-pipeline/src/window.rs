//! The resume window: the inclusive range of checkpoints one invocation runs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use qlsynth_types::{Label, Result, SynthError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunWindow {
    pub from: Label,
    pub to: Label,
}

impl RunWindow {
    pub fn new(from: Label, to: Label) -> Result<Self> {
        if from > to {
            return Err(SynthError::InvalidRunWindow {
                from: from.name().to_string(),
                to: to.name().to_string(),
            });
        }
        Ok(Self { from, to })
    }

    /// Every checkpoint, `begin` through `verilog`.
    pub fn full() -> Self {
        Self {
            from: Label::FIRST,
            to: Label::LAST,
        }
    }

    /// Parse `from[:to]`. A single label runs just that checkpoint; either
    /// side may be left empty to mean the corresponding end of the pipeline.
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Ok(Self::full());
        }
        let (from, to) = match spec.split_once(':') {
            Some((from, to)) => (from, to),
            None => (spec, spec),
        };
        let from = if from.is_empty() {
            Label::FIRST
        } else {
            from.parse()?
        };
        let to = if to.is_empty() { Label::LAST } else { to.parse()? };
        Self::new(from, to)
    }

    pub fn contains(&self, label: Label) -> bool {
        self.from <= label && label <= self.to
    }

    /// The checkpoints inside the window, in execution order.
    pub fn labels(&self) -> impl Iterator<Item = Label> + '_ {
        Label::ALL.into_iter().filter(|l| self.contains(*l))
    }

    /// Restart the window at `from`, keeping its end.
    pub fn starting_at(self, from: Label) -> Result<Self> {
        Self::new(from, self.to)
    }

    pub fn is_full(&self) -> bool {
        *self == Self::full()
    }
}

impl Default for RunWindow {
    fn default() -> Self {
        Self::full()
    }
}

impl fmt::Display for RunWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.from, self.to)
    }
}

impl FromStr for RunWindow {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_spec_is_full_range() {
        let w = RunWindow::parse("").unwrap();
        assert!(w.is_full());
        assert_eq!(w.labels().count(), Label::ALL.len());
    }

    #[test]
    fn pair_is_inclusive_on_both_ends() {
        let w: RunWindow = "begin:map_gates".parse().unwrap();
        assert!(w.contains(Label::Begin));
        assert!(w.contains(Label::MapGates));
        assert!(!w.contains(Label::MapFfs));
        assert_eq!(w.labels().last(), Some(Label::MapGates));
        assert_eq!(w.to_string(), "begin:map_gates");
    }

    #[test]
    fn single_label_runs_one_checkpoint() {
        let w = RunWindow::parse("map_luts").unwrap();
        assert_eq!(w.labels().collect::<Vec<_>>(), vec![Label::MapLuts]);
    }

    #[test]
    fn open_ends_default_to_pipeline_bounds() {
        let w = RunWindow::parse("map_ffs:").unwrap();
        assert_eq!(w.from, Label::MapFfs);
        assert_eq!(w.to, Label::Verilog);
        let w = RunWindow::parse(":coarse").unwrap();
        assert_eq!(w.from, Label::Begin);
        assert_eq!(w.to, Label::Coarse);
    }

    #[test]
    fn reversed_window_is_rejected() {
        match RunWindow::parse("finalize:begin").unwrap_err() {
            SynthError::InvalidRunWindow { from, to } => {
                assert_eq!(from, "finalize");
                assert_eq!(to, "begin");
            }
            other => panic!("Expected InvalidRunWindow, got: {other:?}"),
        }
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = RunWindow::parse("begin:map_everything").unwrap_err();
        assert!(matches!(err, SynthError::UnknownLabel(ref l) if l == "map_everything"));
        assert!(err.is_precondition());
    }

    #[test]
    fn starting_at_keeps_end() {
        let w = RunWindow::parse("begin:finalize").unwrap();
        let resumed = w.starting_at(Label::MapFfs).unwrap();
        assert_eq!(resumed.to_string(), "map_ffs:finalize");
        assert!(w.starting_at(Label::Verilog).is_err());
    }
}
