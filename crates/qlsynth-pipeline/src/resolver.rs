//! Parameter resolution: per-family overrides, library paths, the derived
//! flip-flop argument fragment and the LUT mapper's timing target.
//!
//! Resolution happens exactly once per execution, before the first
//! checkpoint, so every checkpoint of a resumed run sees the same values as
//! it would in a single full run.

use std::fmt;

use qlsynth_types::{Family, SynthConfig, Toggles};

use crate::invoker::Design;

pub const DEFAULT_LIB_PATH: &str = "+/quicklogic/";

/// Scratchpad key overriding the technology library location.
pub const LIB_PATH_KEY: &str = "ql.lib_path";

/// Scratchpad key holding the abc9 delay target in picoseconds.
pub const DELAY_TARGET_KEY: &str = "abc9.D";

/// 12 MHz is 83.33 ns; halved to leave room for interconnect delay.
pub const DEFAULT_DELAY_TARGET: i64 = 500;

/// Phases of the scripted pp3 LUT flow, after the LUT library is read.
/// The final `dress` restores the original signal names.
pub const PP3_ABC_PHASES: &[&str] = &[
    "strash", "ifraig", "scorr", "dc2", "dretime", "strash", "dch,-f", "if", "mfs2",
    "sweep", "eliminate", "if", "mfs", "lutpack",
    "dress",
];

// ---------------------------------------------------------------------------
// RunContext
// ---------------------------------------------------------------------------

/// Cross-run state read from the host scratchpad at the start of one
/// execution and written back by the engine when a default was filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub lib_path: String,
    /// `None` when the scratchpad had no (or a zero) delay target.
    pub delay_target: Option<i64>,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            lib_path: DEFAULT_LIB_PATH.to_string(),
            delay_target: None,
        }
    }

    pub fn from_design<D: Design + ?Sized>(design: &D) -> Self {
        Self {
            lib_path: design
                .scratchpad_get_string(LIB_PATH_KEY)
                .unwrap_or_else(|| DEFAULT_LIB_PATH.to_string()),
            delay_target: design
                .scratchpad_get_int(DELAY_TARGET_KEY)
                .filter(|d| *d != 0),
        }
    }

    pub fn with_lib_path(mut self, lib_path: impl Into<String>) -> Self {
        self.lib_path = lib_path.into();
        self
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// DffArgs — the derived argument fragment
// ---------------------------------------------------------------------------

/// Suffix appended to every `opt` call that must not re-infer flip-flop
/// features the family (or the user) disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DffArgs(String);

impl DffArgs {
    fn derive(family: Family, toggles: &Toggles) -> Self {
        let mut args = String::new();
        if toggles.no_sdff {
            args.push_str(" -nosdff");
        }
        if family == Family::QlfK4n8 {
            args.push_str(" -nodffe");
        }
        Self(args)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DffArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Everything the stage selector needs, derived from configuration and
/// context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedParams {
    /// The configuration after family overrides were applied.
    pub config: SynthConfig,
    pub lib_path: String,
    pub dff_args: DffArgs,
    pub delay_target: Option<i64>,
    /// `true` when the delay target was filled in with the fallback.
    pub delay_defaulted: bool,
}

impl ResolvedParams {
    pub fn family(&self) -> Family {
        self.config.family
    }

    /// Directory holding the family's techmap and simulation files.
    pub fn family_path(&self) -> String {
        format!("{}{}", self.lib_path, self.config.family)
    }

    /// LUT definition file used by the scripted pp3 flow.
    pub fn lut_defs(&self) -> String {
        format!("{}/lutdefs.txt", self.family_path())
    }
}

/// Toggles a family forces regardless of user input.
pub fn apply_family_overrides(family: Family, toggles: Toggles) -> Toggles {
    match family {
        Family::QlfK4n8 => Toggles {
            no_sdff: true,
            ..toggles
        },
        Family::Pp3 | Family::QlfK6n10 | Family::QlfK6n10f => toggles,
    }
}

/// Resolve `config` against `ctx`. Fills in the delay target in `ctx` when
/// abc9 is in use and none was supplied.
pub fn resolve(config: &SynthConfig, ctx: &mut RunContext) -> ResolvedParams {
    let mut config = config.clone();
    config.toggles = apply_family_overrides(config.family, config.toggles);

    let mut delay_defaulted = false;
    if !config.toggles.no_abc9 && ctx.delay_target.is_none() {
        tracing::warn!(
            "delay target has not been set via SDC or scratchpad; assuming 12 MHz clock"
        );
        ctx.delay_target = Some(DEFAULT_DELAY_TARGET);
        delay_defaulted = true;
    }

    let dff_args = DffArgs::derive(config.family, &config.toggles);
    ResolvedParams {
        config,
        lib_path: ctx.lib_path.clone(),
        dff_args,
        delay_target: ctx.delay_target,
        delay_defaulted,
    }
}
