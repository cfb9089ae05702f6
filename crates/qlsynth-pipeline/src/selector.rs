//! Stage selection: two interpreters over the stage table.
//!
//! [`plan`] evaluates every guard against a configuration and returns the
//! exact operations a checkpoint performs. [`preview`] ignores guards
//! altogether, visiting every family and option branch, and describes each
//! command together with the condition under which it would run. Both walk
//! the same [`Stage`] descriptors, so help output cannot drift from what a
//! real run does.

use std::fmt::Write as _;

use qlsynth_types::{Label, Operation, SynthConfig};

use crate::bram;
use crate::stage::{Action, Bindings, Stage, Step};
use crate::table;

const SOFT_MUL_RESET: &str = "chtype -set $mul t:$__soft_mul";
const BRAM_TYPES_SUMMARY: &str = "chtype -set TDP36K_<mode> t:TDP36K a:<mode>";

// ---------------------------------------------------------------------------
// Concrete interpreter
// ---------------------------------------------------------------------------

/// The operations `stage` performs for `cfg`, in order. Empty when the
/// stage's own guard does not hold.
pub fn plan(stage: &Stage, cfg: &SynthConfig, bindings: &Bindings) -> Vec<Operation> {
    if !stage.guard.holds(cfg) {
        return Vec::new();
    }
    let mut ops = Vec::new();
    for step in stage.steps.iter().filter(|s| s.guard.holds(cfg)) {
        for command in expand(step, bindings, |frag| frag.guard.holds(cfg), false) {
            ops.push(Operation::parse(&command));
        }
    }
    ops
}

/// Convenience wrapper planning the stage registered for `label`.
pub fn plan_label(label: Label, cfg: &SynthConfig, bindings: &Bindings) -> Vec<Operation> {
    plan(table::stage(label), cfg, bindings)
}

fn expand(
    step: &Step,
    bindings: &Bindings,
    keep_fragment: impl Fn(&crate::stage::Fragment) -> bool,
    preview: bool,
) -> Vec<String> {
    let with_fragments = |mut command: String| {
        for frag in step.fragments.iter().filter(|f| keep_fragment(f)) {
            let text = (frag.render)(bindings);
            if preview {
                let _ = write!(command, " [{text}]");
            } else {
                command.push(' ');
                command.push_str(&text);
            }
        }
        vec![command]
    };
    match &step.action {
        Action::Literal(text) => with_fragments(text.to_string()),
        Action::Render(render) => with_fragments(render(bindings)),
        Action::DspRules(rules) => rules
            .iter()
            .flat_map(|rule| {
                [
                    format!("techmap -map +/mul2dsp.v {}", rule.defines()),
                    SOFT_MUL_RESET.to_string(),
                ]
            })
            .collect(),
        Action::BramTypes if preview => vec![BRAM_TYPES_SUMMARY.to_string()],
        Action::BramTypes => bram::variants().iter().map(|v| v.command()).collect(),
    }
}

// ---------------------------------------------------------------------------
// Preview interpreter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewLine {
    pub command: String,
    pub condition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePreview {
    pub label: Label,
    pub condition: Option<String>,
    pub lines: Vec<PreviewLine>,
}

/// Describe every step of `stage`, regardless of family or options.
pub fn preview(stage: &Stage, bindings: &Bindings) -> StagePreview {
    let lines = stage
        .steps
        .iter()
        .flat_map(|step| {
            let condition = step.guard.describe();
            expand(step, bindings, |_| true, true)
                .into_iter()
                .map(move |command| PreviewLine {
                    command,
                    condition: condition.clone(),
                })
        })
        .collect();
    StagePreview {
        label: stage.label,
        condition: stage.guard.describe(),
        lines,
    }
}

/// Previews of every checkpoint, in order.
pub fn preview_all(lib_path: &str) -> Vec<StagePreview> {
    let bindings = Bindings::preview(lib_path);
    table::stages()
        .iter()
        .map(|stage| preview(stage, &bindings))
        .collect()
}

/// The documentation listing of every command the pipeline may run.
pub fn render_help_script(lib_path: &str) -> String {
    let mut out = String::new();
    for stage in preview_all(lib_path) {
        let _ = write!(out, "\n    {}:", stage.label);
        if let Some(cond) = &stage.condition {
            let _ = write!(out, "    ({cond})");
        }
        out.push('\n');
        for line in &stage.lines {
            let _ = write!(out, "        {}", line.command);
            if let Some(cond) = &line.condition {
                let _ = write!(out, "    ({cond})");
            }
            out.push('\n');
        }
    }
    out
}
