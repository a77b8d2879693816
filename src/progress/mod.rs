use crate::core::pipeline::Stage;
use crate::core::RunOutcome;
use log::{info, warn};
use serde::Serialize;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StageStatus {
    Success,
    SoftFailure,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ProgressEvent {
    StageCompleted { stage: Stage, status: StageStatus },
    RunFinished(RunOutcome),
}

/// Receives progress signals as the pipeline moves through its stages.
pub trait ProgressSink: Send + Sync {
    fn stage_completed(&self, stage: Stage, status: StageStatus);

    fn run_finished(&self, _outcome: &RunOutcome) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn stage_completed(&self, stage: Stage, status: StageStatus) {
        match status {
            StageStatus::Success => info!("[{}] done", stage),
            StageStatus::SoftFailure => warn!("[{}] degraded, continuing", stage),
            StageStatus::Aborted => warn!("[{}] aborted", stage),
        }
    }

    fn run_finished(&self, outcome: &RunOutcome) {
        info!("Run finished: {}", outcome);
    }
}

/// Forwards progress events to a channel; events are dropped once the
/// receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgress {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelProgress {
    fn stage_completed(&self, stage: Stage, status: StageStatus) {
        let _ = self.tx.send(ProgressEvent::StageCompleted { stage, status });
    }

    fn run_finished(&self, outcome: &RunOutcome) {
        let _ = self.tx.send(ProgressEvent::RunFinished(outcome.clone()));
    }
}
