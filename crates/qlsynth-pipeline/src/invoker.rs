//! Host design trait and the stage invoker that drives it.

use qlsynth_types::{Label, Operation, Result, SynthError};

use crate::events::{EventEmitter, PipelineEvent};

// ---------------------------------------------------------------------------
// Design trait
// ---------------------------------------------------------------------------

/// The host environment's mutable design graph.
///
/// The pipeline never looks inside the design; it only issues named
/// operations, queries the selection and hierarchy state, and reads or
/// writes the scratchpad shared between runs.
pub trait Design {
    /// Execute one operation. An `Err` carries the host's diagnostic text.
    fn execute(&mut self, op: &Operation) -> std::result::Result<(), String>;

    /// Whether every module of the design is currently selected.
    fn is_fully_selected(&self) -> bool;

    /// The top module once hierarchy resolution has run.
    fn top_module(&self) -> Option<String>;

    fn scratchpad_get_int(&self, key: &str) -> Option<i64>;

    fn scratchpad_set_int(&mut self, key: &str, value: i64);

    fn scratchpad_get_string(&self, key: &str) -> Option<String>;

    /// Expand host-relative paths such as `+/` into real file names.
    fn rewrite_filename(&self, path: &str) -> String {
        path.to_string()
    }
}

// ---------------------------------------------------------------------------
// StageInvoker
// ---------------------------------------------------------------------------

/// Wraps single operation calls against a design, turning host failures into
/// fatal [`SynthError::Invocation`] errors.
pub struct StageInvoker<'a, D: Design + ?Sized> {
    design: &'a mut D,
    events: Option<&'a EventEmitter>,
    invoked: usize,
}

impl<'a, D: Design + ?Sized> StageInvoker<'a, D> {
    pub fn new(design: &'a mut D) -> Self {
        Self {
            design,
            events: None,
            invoked: 0,
        }
    }

    pub fn with_events(mut self, events: &'a EventEmitter) -> Self {
        self.events = Some(events);
        self
    }

    /// Run `op` as part of checkpoint `label`. No retries.
    pub fn invoke(&mut self, label: Label, op: &Operation) -> Result<()> {
        tracing::debug!(label = %label, command = %op, "Invoking operation");
        if let Some(events) = self.events {
            events.emit(PipelineEvent::OperationInvoked {
                label: label.name().to_string(),
                command: op.command(),
            });
        }
        self.design.execute(op).map_err(|message| {
            tracing::error!(label = %label, operation = %op.name, %message, "Operation failed");
            SynthError::Invocation {
                label: label.name().to_string(),
                operation: op.name.clone(),
                args: op.args.clone(),
                message,
            }
        })?;
        self.invoked += 1;
        Ok(())
    }

    /// Number of operations that completed successfully.
    pub fn invoked(&self) -> usize {
        self.invoked
    }

    pub fn design(&self) -> &D {
        self.design
    }
}
