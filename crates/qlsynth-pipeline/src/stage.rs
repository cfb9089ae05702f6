//! Declarative stage descriptors.
//!
//! A [`Stage`] is the content of one checkpoint: an ordered list of
//! [`Step`]s, each carrying the [`Guard`] under which it runs. Commands that
//! depend on run values are rendered from [`Bindings`], which the selector
//! fills either with the resolved configuration or with help placeholders.

use std::fmt;

use qlsynth_types::{Label, Result, SynthError};

use crate::dsp::DspRule;
use crate::guard::Guard;
use crate::invoker::Design;
use crate::resolver::{ResolvedParams, PP3_ABC_PHASES};

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// Values substituted into rendered commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bindings {
    pub lib: String,
    pub family: String,
    /// `hierarchy` top selection, e.g. `-auto-top` or `-top cpu`.
    pub top_option: String,
    /// Name of the resolved top module.
    pub top_module: String,
    pub dff_args: String,
    pub blif: String,
    pub edif: String,
    pub verilog: String,
    pub abc_script: String,
}

impl Bindings {
    /// Bindings for a real run. `top_module` is the hierarchy top as known to
    /// the host when the stage is planned.
    pub fn concrete<D: Design + ?Sized>(
        params: &ResolvedParams,
        design: &D,
    ) -> Self {
        let cfg = &params.config;
        let top_module = cfg
            .top
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| design.top_module())
            .unwrap_or_default();
        let lut_defs = design.rewrite_filename(&params.lut_defs());
        Self {
            lib: params.lib_path.clone(),
            family: cfg.family.name().to_string(),
            top_option: cfg.top_option(),
            top_module,
            dff_args: params.dff_args.to_string(),
            blif: cfg.blif().unwrap_or_default().to_string(),
            edif: cfg.edif().unwrap_or_default().to_string(),
            verilog: cfg.verilog().unwrap_or_default().to_string(),
            abc_script: format!("+read_lut,{};{}", lut_defs, PP3_ABC_PHASES.join(";")),
        }
    }

    /// Fails with [`SynthError::UnresolvedTop`] when no top module name is
    /// bound for a checkpoint that writes it.
    pub fn require_top(&self, label: Label) -> Result<&str> {
        if self.top_module.is_empty() {
            return Err(SynthError::UnresolvedTop {
                label: label.name().to_string(),
            });
        }
        Ok(&self.top_module)
    }

    /// Placeholder bindings for help output.
    pub fn preview(lib_path: &str) -> Self {
        Self {
            lib: lib_path.to_string(),
            family: "<family>".into(),
            top_option: "-top <top>".into(),
            top_module: "<top>".into(),
            dff_args: String::new(),
            blif: "<file-name>".into(),
            edif: "<file-name>".into(),
            verilog: "<file-name>".into(),
            abc_script: "<script>".into(),
        }
    }
}

pub type Render = fn(&Bindings) -> String;

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub enum Action {
    Literal(&'static str),
    Render(Render),
    /// One `techmap` through `mul2dsp` per rule, each followed by resetting
    /// unclaimed multipliers so the next rule can see them.
    DspRules(&'static [DspRule]),
    /// Re-type every TDP36K cell to its specialized variant.
    BramTypes,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Literal(cmd) => f.debug_tuple("Literal").field(cmd).finish(),
            Action::Render(_) => f.write_str("Render(..)"),
            Action::DspRules(rules) => f.debug_tuple("DspRules").field(&rules.len()).finish(),
            Action::BramTypes => f.write_str("BramTypes"),
        }
    }
}

/// An optional trailing argument appended when its guard holds.
#[derive(Clone)]
pub struct Fragment {
    pub guard: Guard,
    pub render: Render,
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment").field("guard", &self.guard).finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct Step {
    pub guard: Guard,
    pub action: Action,
    pub fragments: Vec<Fragment>,
}

impl Step {
    fn with_action(action: Action) -> Self {
        Self {
            guard: Guard::Always,
            action,
            fragments: Vec::new(),
        }
    }

    pub fn cmd(command: &'static str) -> Self {
        Self::with_action(Action::Literal(command))
    }

    pub fn render(render: Render) -> Self {
        Self::with_action(Action::Render(render))
    }

    pub fn dsp_rules(rules: &'static [DspRule]) -> Self {
        Self::with_action(Action::DspRules(rules))
    }

    pub fn bram_types() -> Self {
        Self::with_action(Action::BramTypes)
    }

    pub fn when(mut self, guard: Guard) -> Self {
        self.guard = self.guard.and(guard);
        self
    }

    pub fn arg_when(mut self, guard: Guard, render: Render) -> Self {
        self.fragments.push(Fragment { guard, render });
        self
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Stage {
    pub label: Label,
    pub guard: Guard,
    pub steps: Vec<Step>,
}

impl Stage {
    pub fn new(label: Label, steps: Vec<Step>) -> Self {
        Self {
            label,
            guard: Guard::Always,
            steps,
        }
    }

    pub fn when(mut self, guard: Guard) -> Self {
        self.guard = self.guard.and(guard);
        self
    }
}
