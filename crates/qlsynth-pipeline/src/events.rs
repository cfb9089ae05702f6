//! Pipeline event system for observability.
//!
//! Emits [`PipelineEvent`]s via a [`tokio::sync::broadcast`] channel so that
//! external observers (loggers, progress displays, tests) can follow a run
//! without coupling to the engine internals. Sending never blocks, so the
//! synchronous engine can emit from any point.

use serde::{Deserialize, Serialize};

/// Events emitted during pipeline execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    PipelineStarted {
        family: String,
        from: String,
        to: String,
    },
    PipelineCompleted {
        executed: Vec<String>,
        operations: usize,
        duration_ms: u64,
    },
    PipelineFailed {
        error: String,
    },
    StageStarted {
        label: String,
    },
    StageCompleted {
        label: String,
        operations: usize,
        duration_ms: u64,
    },
    OperationInvoked {
        label: String,
        command: String,
    },
    CheckpointSaved {
        label: String,
    },
}

/// Event emitter wrapping a broadcast sender.
#[derive(Clone)]
pub struct EventEmitter {
    sender: tokio::sync::broadcast::Sender<PipelineEvent>,
}

impl EventEmitter {
    /// Create a new emitter with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = tokio::sync::broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all current subscribers.
    ///
    /// If there are no active receivers the event is silently dropped.
    pub fn emit(&self, event: PipelineEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to events. Returns a broadcast receiver.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<PipelineEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(256)
    }
}
