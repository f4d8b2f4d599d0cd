//! Two-phase submission of a new employee to the two backends.
//!
//! Basic info is written first, then details. The two writes are not atomic:
//! when details fail the basic-info record stays behind and nothing is rolled
//! back. Progress is published on a broadcast channel as the five
//! [`SubmitStep`]s.

use std::{fmt, sync::Arc, time::Duration};

use shared::{
    domain::{AccessRole, BasicInfo, Details, DetailsPatch, RecordId},
    protocol::SubmitStep,
};
use storage::DraftStore;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tracing::{error, info, warn};

use crate::{
    config::Timing,
    error::ClientError,
    services::{BasicInfoApi, DetailsApi},
};

pub const SUBMIT_FAILURE_MESSAGE: &str =
    "Failed to submit employee data. Please check your connection and try again.";

const EVENT_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionState {
    Idle,
    Step1Submitting,
    Step1Done,
    Step2Submitting,
    Step2Done,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    BeginBasicInfo,
    BasicInfoSaved,
    BeginDetails,
    DetailsSaved,
    Finish,
    Fail,
}

impl SubmissionState {
    /// The transition table. `None` means the transition is not allowed from
    /// this state.
    pub fn next(self, transition: Transition) -> Option<Self> {
        use SubmissionState::*;
        use Transition::*;

        match (self, transition) {
            (Idle, BeginBasicInfo) => Some(Step1Submitting),
            (Step1Submitting, BasicInfoSaved) => Some(Step1Done),
            (Step1Done | Idle, BeginDetails) => Some(Step2Submitting),
            (Step2Submitting, DetailsSaved) => Some(Step2Done),
            (Step2Done, Finish) => Some(Completed),
            (state, Fail) if state.is_in_flight() => Some(Failed),
            _ => None,
        }
    }

    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            Self::Step1Submitting | Self::Step1Done | Self::Step2Submitting | Self::Step2Done
        )
    }

    /// Progress shown for this state; `None` while idle or after a failure.
    pub fn progress(self) -> Option<SubmitStep> {
        match self {
            Self::Idle | Self::Failed => None,
            Self::Step1Submitting => Some(SubmitStep::SubmittingBasicInfo),
            Self::Step1Done => Some(SubmitStep::BasicInfoSaved),
            Self::Step2Submitting => Some(SubmitStep::SubmittingDetails),
            Self::Step2Done => Some(SubmitStep::DetailsSaved),
            Self::Completed => Some(SubmitStep::Completed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    BasicInfo,
    Details,
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BasicInfo => "basic info",
            Self::Details => "details",
        })
    }
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Please complete Step 1 first")]
    Step1Incomplete,
    #[error("a submission is already in progress")]
    InFlight,
    #[error("{stage} submission failed: {source}")]
    Remote {
        stage: SubmissionStage,
        #[source]
        source: ClientError,
    },
    #[error("submission cannot {transition:?} while {state:?}")]
    InvalidTransition {
        state: SubmissionState,
        transition: Transition,
    },
}

impl SubmissionError {
    /// Text shown to the person submitting.
    pub fn user_message(&self) -> String {
        match self {
            Self::Remote { .. } => SUBMIT_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

/// How a submission reaches the backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionPlan {
    /// Basic info from step 1, then details.
    TwoStep { basic_info: BasicInfo },
    /// Ops registering details for an employee with no basic info: a
    /// placeholder basic-info record is written first.
    Placeholder,
    /// Only details are written for an existing employee. An existing record
    /// is patched, otherwise a new one is created.
    DetailsOnly { existing: Option<Details> },
}

impl SubmissionPlan {
    /// `fill_details` is `Some` when completing an existing employee and
    /// carries the record found for them, if any.
    pub fn resolve(
        role: AccessRole,
        basic_info: Option<BasicInfo>,
        fill_details: Option<Option<Details>>,
    ) -> Result<Self, SubmissionError> {
        if let Some(existing) = fill_details {
            return Ok(Self::DetailsOnly { existing });
        }
        match (role, basic_info) {
            (_, Some(basic_info)) => Ok(Self::TwoStep { basic_info }),
            (AccessRole::Admin, None) => Err(SubmissionError::Step1Incomplete),
            (AccessRole::Ops, None) => Ok(Self::Placeholder),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextView {
    EmployeeList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    /// `None` for details-only submissions.
    pub basic_info: Option<BasicInfo>,
    pub details: Details,
    pub next_view: NextView,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionEvent {
    pub state: SubmissionState,
    pub progress: Option<SubmitStep>,
}

pub struct SubmissionOrchestrator {
    basic_info: Arc<dyn BasicInfoApi>,
    details: Arc<dyn DetailsApi>,
    drafts: DraftStore,
    timing: Timing,
    state: watch::Sender<SubmissionState>,
    events: broadcast::Sender<SubmissionEvent>,
}

impl SubmissionOrchestrator {
    pub fn new(
        basic_info: Arc<dyn BasicInfoApi>,
        details: Arc<dyn DetailsApi>,
        drafts: DraftStore,
        timing: Timing,
    ) -> Self {
        let (state, _) = watch::channel(SubmissionState::Idle);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            basic_info,
            details,
            drafts,
            timing,
            state,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SubmissionEvent> {
        self.events.subscribe()
    }

    pub fn watch_state(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SubmissionState {
        *self.state.borrow()
    }

    pub fn progress(&self) -> Option<SubmitStep> {
        self.state().progress()
    }

    pub fn is_submitting(&self) -> bool {
        self.state().is_in_flight()
    }

    /// Runs `plan` to completion. On success the role's drafts are cleared
    /// and, after a short pause, the listing view is next.
    pub async fn submit(
        &self,
        role: AccessRole,
        plan: SubmissionPlan,
        details: Details,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        self.begin()?;
        let _abandoned = AbandonGuard { orchestrator: self };
        info!(%role, employee_id = %details.employee_id, "submitting employee");

        let outcome = match plan {
            SubmissionPlan::TwoStep { basic_info } => {
                self.submit_two_step(basic_info, details).await?
            }
            SubmissionPlan::Placeholder => {
                let placeholder = BasicInfo::placeholder(details.employee_id.clone());
                self.submit_two_step(placeholder, details).await?
            }
            SubmissionPlan::DetailsOnly { existing } => {
                self.submit_details_only(existing, details).await?
            }
        };

        self.apply(Transition::Finish)?;
        self.drafts.clear_all(role).await;
        pause(self.timing.redirect_pause).await;
        Ok(outcome)
    }

    async fn submit_two_step(
        &self,
        basic_info: BasicInfo,
        details: Details,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        self.apply(Transition::BeginBasicInfo)?;
        pause(self.timing.submit_delay).await;
        let created = match self.basic_info.create(&basic_info).await {
            Ok(created) => created,
            Err(err) => return Err(self.fail(SubmissionStage::BasicInfo, err)),
        };
        self.apply(Transition::BasicInfoSaved)?;

        let saved = self.write_details(None, &details).await?;
        Ok(SubmissionOutcome {
            basic_info: Some(created),
            details: saved,
            next_view: NextView::EmployeeList,
        })
    }

    async fn submit_details_only(
        &self,
        existing: Option<Details>,
        details: Details,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let existing_id = existing.and_then(|record| record.id);
        let saved = self.write_details(existing_id, &details).await?;
        Ok(SubmissionOutcome {
            basic_info: None,
            details: saved,
            next_view: NextView::EmployeeList,
        })
    }

    async fn write_details(
        &self,
        existing_id: Option<RecordId>,
        details: &Details,
    ) -> Result<Details, SubmissionError> {
        self.apply(Transition::BeginDetails)?;
        pause(self.timing.submit_delay).await;
        let result = match existing_id {
            Some(id) => self.details.update(id, &DetailsPatch::from(details)).await,
            None => self.details.create(details).await,
        };
        let saved = result.map_err(|err| self.fail(SubmissionStage::Details, err))?;
        self.apply(Transition::DetailsSaved)?;
        Ok(saved)
    }

    fn begin(&self) -> Result<(), SubmissionError> {
        let mut busy = false;
        self.state.send_if_modified(|state| {
            if state.is_in_flight() {
                busy = true;
                return false;
            }
            let modified = *state != SubmissionState::Idle;
            *state = SubmissionState::Idle;
            modified
        });
        if busy {
            return Err(SubmissionError::InFlight);
        }
        Ok(())
    }

    fn apply(&self, transition: Transition) -> Result<SubmissionState, SubmissionError> {
        let current = self.state();
        let next = current
            .next(transition)
            .ok_or(SubmissionError::InvalidTransition {
                state: current,
                transition,
            })?;
        self.state.send_replace(next);
        let progress = next.progress();
        if let Some(step) = progress {
            info!(step = step.number(), "{}", step.message());
        }
        let _ = self.events.send(SubmissionEvent {
            state: next,
            progress,
        });
        Ok(next)
    }

    fn fail(&self, stage: SubmissionStage, source: ClientError) -> SubmissionError {
        error!(%stage, error = %source, "error submitting employee data");
        if let Err(err) = self.apply(Transition::Fail) {
            error!(error = %err, "submission state out of sync");
        }
        SubmissionError::Remote { stage, source }
    }
}

/// Fails a run whose `submit` future is dropped before it finishes, so the
/// next submission is not refused as in flight.
struct AbandonGuard<'a> {
    orchestrator: &'a SubmissionOrchestrator,
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        let state = self.orchestrator.state();
        if !state.is_in_flight() {
            return;
        }
        warn!(?state, "submission abandoned mid-flight");
        if let Err(err) = self.orchestrator.apply(Transition::Fail) {
            error!(error = %err, "submission state out of sync");
        }
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
