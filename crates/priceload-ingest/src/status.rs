//! Run status events
//!
//! The pipeline never touches presentation state. It reports progress as
//! `Stage` values through a `StatusSink`, which may be a closure, a Tokio
//! channel, or anything else a shell wants to subscribe with.

use serde::Serialize;
use tokio::sync::mpsc;

/// Stage of one ingestion run
///
/// A run moves `Parsing → DuplicateCheck → Writing → Fetching → Journaling →
/// Done`, or ends in `Failed` from any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Parsing,
    DuplicateCheck,
    Writing,
    Fetching,
    Journaling,
    Done,
    Failed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }

    /// Short status text for a one-line label
    pub fn label(self) -> &'static str {
        match self {
            Stage::Parsing => "Parsing...",
            Stage::DuplicateCheck => "Checking journal...",
            Stage::Writing | Stage::Journaling => "Processing...",
            Stage::Fetching => "Fetching...",
            Stage::Done => "Success",
            Stage::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Receiver of stage transitions
pub trait StatusSink: Send {
    fn emit(&mut self, stage: Stage);
}

impl<F> StatusSink for F
where
    F: FnMut(Stage) + Send,
{
    fn emit(&mut self, stage: Stage) {
        self(stage)
    }
}

/// Forward stages to a channel; a dropped receiver is ignored
impl StatusSink for mpsc::UnboundedSender<Stage> {
    fn emit(&mut self, stage: Stage) {
        let _ = self.send(stage);
    }
}

/// Sink for callers that do not care about progress
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl StatusSink for Silent {
    fn emit(&mut self, _stage: Stage) {}
}
