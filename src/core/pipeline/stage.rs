use serde::Serialize;
use std::fmt;

/// Pipeline states in the order a run reaches them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Stage {
    Connected,
    PopupsClear,
    SublistOpen,
    FiltersSet,
    SearchSubmitted,
    ResultsReady,
    Done,
}

impl Stage {
    /// Stages that run an action. `Done` is terminal.
    pub const ORDER: [Stage; 6] = [
        Stage::Connected,
        Stage::PopupsClear,
        Stage::SublistOpen,
        Stage::FiltersSet,
        Stage::SearchSubmitted,
        Stage::ResultsReady,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Connected => "Connected",
            Stage::PopupsClear => "PopupsClear",
            Stage::SublistOpen => "SublistOpen",
            Stage::FiltersSet => "FiltersSet",
            Stage::SearchSubmitted => "SearchSubmitted",
            Stage::ResultsReady => "ResultsReady",
            Stage::Done => "Done",
        }
    }

    pub fn next(&self) -> Stage {
        match self {
            Stage::Connected => Stage::PopupsClear,
            Stage::PopupsClear => Stage::SublistOpen,
            Stage::SublistOpen => Stage::FiltersSet,
            Stage::FiltersSet => Stage::SearchSubmitted,
            Stage::SearchSubmitted => Stage::ResultsReady,
            Stage::ResultsReady | Stage::Done => Stage::Done,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AbortReason {
    ConnectFailed,
    SublistEntryNotFound,
    SublistContextNotFound,
    QueryNotApplied,
    SearchTriggerNotFound,
    NoResultsGridFound,
    EmptyResultSet,
    /// A browser or extraction error outlasted the stage's retry budget.
    StageError,
}

impl AbortReason {
    /// `EmptyResultSet` is final for the run.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, AbortReason::EmptyResultSet)
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AbortReason::ConnectFailed => "could not load the portal",
            AbortReason::SublistEntryNotFound => "proposal-notice list entry not found",
            AbortReason::SublistContextNotFound => "proposal-notice list did not open",
            AbortReason::QueryNotApplied => "search query could not be applied",
            AbortReason::SearchTriggerNotFound => "search button not found",
            AbortReason::NoResultsGridFound => "results grid never appeared",
            AbortReason::EmptyResultSet => "results grid has no rows",
            AbortReason::StageError => "browser interaction kept failing",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Success,
    /// The stage degraded; the pipeline moves on.
    SoftFailure(String),
    HardFailure(AbortReason),
}

impl StageOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StageOutcome::Success)
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageOutcome::Success => write!(f, "success"),
            StageOutcome::SoftFailure(reason) => write!(f, "soft failure: {}", reason),
            StageOutcome::HardFailure(reason) => write!(f, "aborted: {}", reason),
        }
    }
}
