//! Checkpointed synthesis pipeline engine.
//!
//! This crate implements the qlsynth pipeline: a declarative stage table
//! guarded by family and option predicates, two interpreters over it (a
//! concrete planner and a documentation preview), parameter resolution,
//! the resume window, the checkpoint loop with persisted run checkpoints,
//! and a recording design host.

pub mod bram;
pub mod checkpoint;
pub mod dsp;
pub mod engine;
pub mod entry;
pub mod events;
pub mod guard;
pub mod invoker;
pub mod recorder;
pub mod resolver;
pub mod selector;
pub mod stage;
pub mod table;
pub mod window;

pub use bram::{BramMode, BramVariant, Geometry};
pub use checkpoint::{clear_checkpoint, load_checkpoint, save_checkpoint, RunCheckpoint};
pub use dsp::{bind_multiplier, DspRule, K6N10F_DSP_RULES, K6N10_DSP_RULE};
pub use engine::{PipelineConfig, PipelineExecutor, PipelineResult, RunRequest};
pub use entry::{synthesize, SynthOptions};
pub use events::{EventEmitter, PipelineEvent};
pub use guard::{Flag, Guard};
pub use invoker::{Design, StageInvoker};
pub use recorder::ScriptDesign;
pub use resolver::{
    apply_family_overrides, resolve, DffArgs, ResolvedParams, RunContext, DEFAULT_DELAY_TARGET,
    DEFAULT_LIB_PATH, DELAY_TARGET_KEY, LIB_PATH_KEY,
};
pub use selector::{plan, plan_label, preview, preview_all, render_help_script, PreviewLine, StagePreview};
pub use stage::{Bindings, Stage, Step};
pub use window::RunWindow;
