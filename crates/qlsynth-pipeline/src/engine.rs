//! Checkpoint pipeline engine: the straight-line checkpoint loop.
//!
//! One run walks every checkpoint in order. Checkpoints inside the resume
//! window are planned by the selector and invoked operation by operation;
//! the rest are skipped without side effects. The first failing operation
//! aborts the run.

use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use qlsynth_types::{Family, Label, Result, SynthConfig, SynthError};

use crate::checkpoint::{load_checkpoint, save_checkpoint, RunCheckpoint};
use crate::events::{EventEmitter, PipelineEvent};
use crate::invoker::{Design, StageInvoker};
use crate::resolver::{resolve, ResolvedParams, RunContext, DELAY_TARGET_KEY};
use crate::selector;
use crate::stage::Bindings;
use crate::table;
use crate::window::RunWindow;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Drives checkpoints against a [`Design`].
pub struct PipelineExecutor {
    config: PipelineConfig,
    events: EventEmitter,
}

/// Executor-wide settings, independent of any one request.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// When set, a [`RunCheckpoint`] is written here after every executed
    /// checkpoint.
    pub checkpoint_dir: Option<PathBuf>,
}

/// Everything one execution needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub config: SynthConfig,
    pub window: RunWindow,
    /// Overrides the library path found in the host scratchpad.
    pub lib_path: Option<String>,
}

impl RunRequest {
    pub fn new(config: SynthConfig) -> Self {
        Self {
            config,
            window: RunWindow::full(),
            lib_path: None,
        }
    }

    pub fn with_window(mut self, window: RunWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_lib_path(mut self, lib_path: impl Into<String>) -> Self {
        self.lib_path = Some(lib_path.into());
        self
    }
}

/// The result of a completed pipeline execution.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub family: Family,
    /// Checkpoints that ran, in order. Skipped ones are absent.
    pub executed: Vec<Label>,
    /// Total number of invoked operations.
    pub operations: usize,
    pub params: ResolvedParams,
}

// ---------------------------------------------------------------------------
// PipelineExecutor
// ---------------------------------------------------------------------------

impl PipelineExecutor {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            events: EventEmitter::default(),
        }
    }

    pub fn with_events(mut self, events: EventEmitter) -> Self {
        self.events = events;
        self
    }

    pub fn events(&self) -> &EventEmitter {
        &self.events
    }

    /// Run the checkpoints of `request.window` against `design`.
    pub fn run<D: Design + ?Sized>(
        &self,
        design: &mut D,
        request: &RunRequest,
    ) -> Result<PipelineResult> {
        if !design.is_fully_selected() {
            return Err(SynthError::NotFullySelected);
        }

        // A window starting after `begin` continues the run saved in the
        // checkpoint directory.
        if let Some(dir) = &self.config.checkpoint_dir {
            if request.window.from != Label::FIRST {
                if let Some(saved) = load_checkpoint(dir)? {
                    saved.ensure_family(request.config.family)?;
                }
            }
        }

        let mut ctx = RunContext::from_design(&*design);
        if let Some(lib_path) = &request.lib_path {
            ctx = ctx.with_lib_path(lib_path.clone());
        }
        let params = resolve(&request.config, &mut ctx);
        if params.delay_defaulted {
            if let Some(delay) = params.delay_target {
                design.scratchpad_set_int(DELAY_TARGET_KEY, delay);
            }
        }

        let window = request.window;
        tracing::info!(
            family = %params.family(),
            window = %window,
            "Starting synthesis pipeline"
        );
        self.events.emit(PipelineEvent::PipelineStarted {
            family: params.family().name().to_string(),
            from: window.from.name().to_string(),
            to: window.to.name().to_string(),
        });

        match self.execute(design, &params, window) {
            Ok(result) => Ok(result),
            Err(err) => {
                self.events.emit(PipelineEvent::PipelineFailed {
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn execute<D: Design + ?Sized>(
        &self,
        design: &mut D,
        params: &ResolvedParams,
        window: RunWindow,
    ) -> Result<PipelineResult> {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let mut invoker = StageInvoker::new(design).with_events(&self.events);
        let mut executed: Vec<Label> = Vec::new();

        for stage in table::stages() {
            let label = stage.label;
            if !window.contains(label) {
                tracing::debug!(label = %label, "Skipping checkpoint outside run window");
                continue;
            }

            // Planned just before execution so writers see the hierarchy top
            // resolved by earlier checkpoints.
            let bindings = Bindings::concrete(params, invoker.design());
            if label == Label::Edif && stage.guard.holds(&params.config) {
                bindings.require_top(label)?;
            }
            let ops = selector::plan(stage, &params.config, &bindings);

            self.events.emit(PipelineEvent::StageStarted {
                label: label.name().to_string(),
            });
            let stage_start = Instant::now();
            for op in &ops {
                invoker.invoke(label, op)?;
            }
            let duration_ms = stage_start.elapsed().as_millis() as u64;
            executed.push(label);

            tracing::info!(label = %label, operations = ops.len(), "Checkpoint complete");
            self.events.emit(PipelineEvent::StageCompleted {
                label: label.name().to_string(),
                operations: ops.len(),
                duration_ms,
            });

            if let Some(dir) = &self.config.checkpoint_dir {
                let checkpoint = RunCheckpoint::new(run_id, params.family(), executed.clone());
                save_checkpoint(&checkpoint, dir)?;
                self.events.emit(PipelineEvent::CheckpointSaved {
                    label: label.name().to_string(),
                });
            }
        }

        let operations = invoker.invoked();
        tracing::info!(
            checkpoints = executed.len(),
            operations,
            "Synthesis pipeline finished"
        );
        self.events.emit(PipelineEvent::PipelineCompleted {
            executed: executed.iter().map(|l| l.name().to_string()).collect(),
            operations,
            duration_ms: started.elapsed().as_millis() as u64,
        });

        Ok(PipelineResult {
            run_id,
            family: params.family(),
            executed,
            operations,
            params: params.clone(),
        })
    }
}

impl Default for PipelineExecutor {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::ScriptDesign;
    use crate::resolver::DEFAULT_DELAY_TARGET;

    fn request(family: Family) -> RunRequest {
        RunRequest::new(SynthConfig::new(family))
    }

    #[test]
    fn full_run_executes_unguarded_checkpoints() {
        let mut design = ScriptDesign::new().with_top("top");
        let result = PipelineExecutor::default()
            .run(&mut design, &request(Family::QlfK4n8))
            .unwrap();

        assert_eq!(result.executed.len(), Label::ALL.len());
        assert_eq!(result.operations, design.commands().len());
        assert_eq!(
            design.commands()[0],
            "read_verilog -lib -specify -nomem2reg +/quicklogic/common/cells_sim.v \
             +/quicklogic/qlf_k4n8/cells_sim.v"
        );
        assert_eq!(design.commands().last().unwrap(), "blackbox =A:whitebox");
    }

    #[test]
    fn partial_selection_fails_before_any_operation() {
        let mut design = ScriptDesign::new().with_partial_selection();
        let err = PipelineExecutor::default()
            .run(&mut design, &request(Family::Pp3))
            .unwrap_err();
        assert!(matches!(err, SynthError::NotFullySelected));
        assert!(err.is_precondition());
        assert!(design.commands().is_empty());
    }

    #[test]
    fn window_limits_executed_checkpoints() {
        let mut design = ScriptDesign::new();
        let req = request(Family::QlfK6n10)
            .with_window(RunWindow::parse("map_ffs:map_luts").unwrap());
        let result = PipelineExecutor::default().run(&mut design, &req).unwrap();

        assert_eq!(result.executed, vec![Label::MapFfs, Label::MapLuts]);
        assert_eq!(design.commands()[0], "opt_expr");
        assert!(!design.commands().iter().any(|c| c.starts_with("read_verilog -lib -specify -nomem2reg")));
    }

    #[test]
    fn defaulted_delay_target_is_written_back() {
        let mut design = ScriptDesign::new();
        let req = request(Family::QlfK6n10f).with_window(RunWindow::parse("begin").unwrap());
        let result = PipelineExecutor::default().run(&mut design, &req).unwrap();
        assert!(result.params.delay_defaulted);
        assert_eq!(
            design.scratchpad_get_int(DELAY_TARGET_KEY),
            Some(DEFAULT_DELAY_TARGET)
        );
    }

    #[test]
    fn lib_path_override_reaches_commands() {
        let mut design = ScriptDesign::new();
        let req = request(Family::Pp3)
            .with_window(RunWindow::parse("begin").unwrap())
            .with_lib_path("/opt/ql/");
        PipelineExecutor::default().run(&mut design, &req).unwrap();
        assert_eq!(
            design.commands()[0],
            "read_verilog -lib -specify -nomem2reg /opt/ql/common/cells_sim.v /opt/ql/pp3/cells_sim.v"
        );
    }

    #[test]
    fn invocation_failure_aborts_and_reports_checkpoint() {
        let mut design = ScriptDesign::new().failing_on("muxcover");
        let events = EventEmitter::new(1024);
        let mut rx = events.subscribe();
        let executor = PipelineExecutor::default().with_events(events);

        let err = executor.run(&mut design, &request(Family::Pp3)).unwrap_err();
        assert_eq!(err.label(), Some("map_gates"));
        assert!(!design.commands().iter().any(|c| c.starts_with("dfflegalize")));

        let mut saw_failure = false;
        while let Ok(event) = rx.try_recv() {
            if let PipelineEvent::PipelineFailed { error } = event {
                assert!(error.contains("muxcover"));
                saw_failure = true;
            }
        }
        assert!(saw_failure);
    }

    #[test]
    fn checkpoints_are_saved_after_each_stage() {
        let dir = tempfile::tempdir().unwrap();
        let executor = PipelineExecutor::new(PipelineConfig {
            checkpoint_dir: Some(dir.path().to_path_buf()),
        });
        let mut design = ScriptDesign::new();
        let req = request(Family::QlfK4n8).with_window(RunWindow::parse("begin:map_gates").unwrap());
        let result = executor.run(&mut design, &req).unwrap();

        let cp = load_checkpoint(dir.path()).unwrap().unwrap();
        assert_eq!(cp.run_id, result.run_id);
        assert_eq!(cp.completed_labels, result.executed);
        assert_eq!(cp.next_label, Some(Label::MapFfs));
    }

    #[test]
    fn continuation_under_another_family_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let executor = PipelineExecutor::new(PipelineConfig {
            checkpoint_dir: Some(dir.path().to_path_buf()),
        });
        let mut design = ScriptDesign::new().with_top("top");
        let head = request(Family::QlfK4n8).with_window(RunWindow::parse("begin:map_gates").unwrap());
        executor.run(&mut design, &head).unwrap();
        let recorded = design.commands().len();

        let tail = request(Family::Pp3).with_window(RunWindow::parse("map_ffs:verilog").unwrap());
        let err = executor.run(&mut design, &tail).unwrap_err();
        match &err {
            SynthError::FamilyMismatch { expected, found } => {
                assert_eq!(expected, "pp3");
                assert_eq!(found, "qlf_k4n8");
            }
            other => panic!("Expected FamilyMismatch, got: {other:?}"),
        }
        assert!(err.is_precondition());
        assert_eq!(design.commands().len(), recorded);
        assert_eq!(
            load_checkpoint(dir.path()).unwrap().unwrap().family,
            Family::QlfK4n8
        );

        // The same family continues, and a fresh start may switch family.
        let tail = request(Family::QlfK4n8).with_window(RunWindow::parse("map_ffs:verilog").unwrap());
        executor.run(&mut design, &tail).unwrap();
        let mut fresh = ScriptDesign::new().with_top("top");
        executor.run(&mut fresh, &request(Family::Pp3)).unwrap();
    }

    #[test]
    fn edif_without_top_fails_before_the_writer() {
        let mut design = ScriptDesign::new();
        let mut config = SynthConfig::new(Family::Pp3);
        config.edif_file = Some("out.edif".into());
        let err = PipelineExecutor::default()
            .run(&mut design, &RunRequest::new(config))
            .unwrap_err();

        assert!(matches!(err, SynthError::UnresolvedTop { ref label } if label == "edif"));
        assert_eq!(err.label(), Some("edif"));
        assert!(design.commands().iter().any(|c| c == "hierarchy -check -auto-top"));
        assert!(!design.commands().iter().any(|c| c.starts_with("write_ql_edif")));
    }

    #[test]
    fn events_follow_stage_order() {
        let events = EventEmitter::new(1024);
        let mut rx = events.subscribe();
        let executor = PipelineExecutor::default().with_events(events);
        let mut design = ScriptDesign::new();
        let req = request(Family::QlfK4n8).with_window(RunWindow::parse("check").unwrap());
        executor.run(&mut design, &req).unwrap();

        let mut names = Vec::new();
        while let Ok(event) = rx.try_recv() {
            names.push(match event {
                PipelineEvent::PipelineStarted { .. } => "started".to_string(),
                PipelineEvent::StageStarted { label } => format!("stage:{label}"),
                PipelineEvent::OperationInvoked { command, .. } => command,
                PipelineEvent::StageCompleted { operations, .. } => format!("done:{operations}"),
                PipelineEvent::PipelineCompleted { .. } => "completed".to_string(),
                other => panic!("unexpected event: {other:?}"),
            });
        }
        assert_eq!(
            names,
            vec![
                "started",
                "stage:check",
                "autoname",
                "hierarchy -check",
                "stat",
                "check -noinit",
                "done:4",
                "completed",
            ]
        );
    }
}
