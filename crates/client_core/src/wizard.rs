//! Step sequencing for the two-step onboarding wizard.
//!
//! Admins start at step 1 (basic info) and move on to step 2 (details). Ops
//! start directly at step 2: with an employee id they complete that
//! employee's details, without one they register details behind a
//! placeholder basic-info record. Each mounted step owns its form and a
//! draft observer; unmounting a step drops both.

use std::sync::Arc;

use forms::{
    basic_info_schema, details_schema, BasicInfoField, BasicInfoForm, DetailsField, DetailsForm,
    FormState, IncompleteForm, SchemaError,
};
use shared::{
    domain::{AccessRole, BasicInfo, Details},
    protocol::WizardStep,
};
use storage::{DraftKey, DraftObserver};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    employee_id::generate_employee_id,
    orchestrator::{SubmissionError, SubmissionOrchestrator, SubmissionOutcome, SubmissionPlan},
    services::DetailsApi,
    OnboardingContext,
};

#[derive(Debug, Error)]
pub enum WizardError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("the {0} step is not active")]
    StepNotActive(WizardStep),
    #[error("only admins can return to step 1")]
    BackNotAllowed,
    #[error("field '{0}' is not editable here")]
    ReadOnlyField(&'static str),
    #[error(transparent)]
    Incomplete(#[from] IncompleteForm),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

pub fn initial_step(role: AccessRole) -> WizardStep {
    match role {
        AccessRole::Admin => WizardStep::BasicInfo,
        AccessRole::Ops => WizardStep::Details,
    }
}

struct BasicInfoStep {
    form: FormState<BasicInfoForm>,
    drafts: DraftObserver<BasicInfoForm>,
}

struct DetailsStep {
    form: FormState<DetailsForm>,
    drafts: DraftObserver<DetailsForm>,
    employee_id_editable: bool,
}

pub struct OnboardingWizard {
    ctx: OnboardingContext,
    role: AccessRole,
    employee_id: Option<String>,
    step: WizardStep,
    basic_info_data: Option<BasicInfo>,
    /// `Some` in fill-details mode, holding the record found for the
    /// employee, if any.
    existing_details: Option<Option<Details>>,
    basic_step: Option<BasicInfoStep>,
    details_step: Option<DetailsStep>,
    orchestrator: SubmissionOrchestrator,
}

impl OnboardingWizard {
    pub async fn start(
        ctx: OnboardingContext,
        role: AccessRole,
        employee_id: Option<String>,
    ) -> Result<Self, WizardError> {
        let employee_id = employee_id.filter(|id| !id.trim().is_empty());
        let existing_details = match (&employee_id, role) {
            (Some(id), AccessRole::Ops) => Some(find_existing_details(ctx.details.as_ref(), id).await),
            _ => None,
        };

        let mut wizard = Self {
            orchestrator: ctx.orchestrator(),
            ctx,
            role,
            employee_id,
            step: initial_step(role),
            basic_info_data: None,
            existing_details,
            basic_step: None,
            details_step: None,
        };
        wizard.mount_current().await?;
        Ok(wizard)
    }

    pub fn role(&self) -> AccessRole {
        self.role
    }

    pub fn current_step(&self) -> WizardStep {
        self.step
    }

    pub fn is_fill_details_mode(&self) -> bool {
        self.existing_details.is_some()
    }

    pub fn existing_details(&self) -> Option<&Details> {
        self.existing_details.as_ref().and_then(Option::as_ref)
    }

    pub fn basic_info_data(&self) -> Option<&BasicInfo> {
        self.basic_info_data.as_ref()
    }

    pub fn orchestrator(&self) -> &SubmissionOrchestrator {
        &self.orchestrator
    }

    pub fn basic_form(&self) -> Option<&FormState<BasicInfoForm>> {
        self.basic_step.as_ref().map(|step| &step.form)
    }

    pub fn details_form(&self) -> Option<&FormState<DetailsForm>> {
        self.details_step.as_ref().map(|step| &step.form)
    }

    /// The employee id input is only offered to ops registering a new
    /// employee; otherwise the id is known.
    pub fn employee_id_editable(&self) -> bool {
        self.details_step
            .as_ref()
            .is_some_and(|step| step.employee_id_editable)
    }

    /// Updates a step 1 field. Choosing a department regenerates the
    /// employee id.
    pub async fn set_basic_field(
        &mut self,
        field: BasicInfoField,
        value: impl Into<String>,
    ) -> Result<(), WizardError> {
        let api = Arc::clone(&self.ctx.basic_info);
        let step = self
            .basic_step
            .as_mut()
            .ok_or(WizardError::StepNotActive(WizardStep::BasicInfo))?;

        let value = value.into();
        let department = (field == BasicInfoField::Department && !value.trim().is_empty())
            .then(|| value.clone());
        step.form.set_value(field, value);
        if let Some(department) = department {
            let employee_id = generate_employee_id(api.as_ref(), &department).await;
            debug!(%department, %employee_id, "employee id generated");
            step.form.set_value(BasicInfoField::EmployeeId, employee_id);
        }
        step.drafts.observe(step.form.values().clone());
        Ok(())
    }

    pub fn blur_basic_field(&mut self, field: BasicInfoField) -> Result<(), WizardError> {
        let step = self
            .basic_step
            .as_mut()
            .ok_or(WizardError::StepNotActive(WizardStep::BasicInfo))?;
        step.form.handle_blur(field);
        Ok(())
    }

    pub fn set_details_field(
        &mut self,
        field: DetailsField,
        value: impl Into<String>,
    ) -> Result<(), WizardError> {
        let step = self
            .details_step
            .as_mut()
            .ok_or(WizardError::StepNotActive(WizardStep::Details))?;
        if field == DetailsField::EmployeeId && !step.employee_id_editable {
            return Err(WizardError::ReadOnlyField(forms::FormField::name(field)));
        }
        step.form.set_value(field, value);
        step.drafts.observe(step.form.values().clone());
        Ok(())
    }

    pub fn blur_details_field(&mut self, field: DetailsField) -> Result<(), WizardError> {
        let step = self
            .details_step
            .as_mut()
            .ok_or(WizardError::StepNotActive(WizardStep::Details))?;
        step.form.handle_blur(field);
        Ok(())
    }

    /// Validates step 1 and moves to step 2. Returns `false`, leaving the
    /// errors on the form, when validation fails.
    pub async fn next(&mut self) -> Result<bool, WizardError> {
        let step = self
            .basic_step
            .as_mut()
            .ok_or(WizardError::StepNotActive(WizardStep::BasicInfo))?;
        if !step.form.validate() {
            return Ok(false);
        }
        let record = step.form.values().to_record()?;
        step.drafts.flush().await;

        self.basic_info_data = Some(record);
        self.basic_step = None;
        self.step = WizardStep::Details;
        self.mount_current().await?;
        Ok(true)
    }

    /// Returns to step 1, which is re-read from its draft.
    pub async fn back(&mut self) -> Result<(), WizardError> {
        if self.role != AccessRole::Admin {
            return Err(WizardError::BackNotAllowed);
        }
        let step = self
            .details_step
            .as_mut()
            .ok_or(WizardError::StepNotActive(WizardStep::Details))?;
        step.drafts.flush().await;

        self.details_step = None;
        self.step = WizardStep::BasicInfo;
        self.mount_current().await
    }

    /// Validates step 2 and submits. `Ok(None)` means validation failed and
    /// nothing was sent.
    pub async fn submit(&mut self) -> Result<Option<SubmissionOutcome>, WizardError> {
        let step = self
            .details_step
            .as_mut()
            .ok_or(WizardError::StepNotActive(WizardStep::Details))?;
        if !step.form.validate() {
            return Ok(None);
        }
        let details = step.form.values().to_record()?;
        let plan = SubmissionPlan::resolve(
            self.role,
            self.basic_info_data.clone(),
            self.existing_details.clone(),
        )?;
        step.drafts.flush().await;

        let outcome = self.orchestrator.submit(self.role, plan, details).await?;
        self.basic_info_data = None;
        Ok(Some(outcome))
    }

    /// Clears both drafts of the role and starts over.
    pub async fn clear_drafts(&mut self) -> Result<(), WizardError> {
        if let Some(step) = self.basic_step.as_mut() {
            step.drafts.cancel();
        }
        if let Some(step) = self.details_step.as_mut() {
            step.drafts.cancel();
        }
        self.ctx.drafts.clear_all(self.role).await;

        self.basic_info_data = None;
        self.basic_step = None;
        self.details_step = None;
        self.step = initial_step(self.role);
        self.mount_current().await
    }

    /// Persists pending draft writes now.
    pub async fn flush_drafts(&mut self) {
        if let Some(step) = self.basic_step.as_mut() {
            step.drafts.flush().await;
        }
        if let Some(step) = self.details_step.as_mut() {
            step.drafts.flush().await;
        }
    }

    async fn mount_current(&mut self) -> Result<(), WizardError> {
        match self.step {
            WizardStep::BasicInfo => self.basic_step = Some(self.mount_basic_step().await?),
            WizardStep::Details => self.details_step = Some(self.mount_details_step().await?),
        }
        debug!(role = %self.role, step = %self.step, "step mounted");
        Ok(())
    }

    async fn mount_basic_step(&self) -> Result<BasicInfoStep, WizardError> {
        let key = DraftKey::new(self.role, WizardStep::BasicInfo);
        let initial: BasicInfoForm = self.ctx.drafts.restore(key).await.unwrap_or_default();

        let mut drafts = self.ctx.drafts.observe(key, self.ctx.timing.draft_debounce);
        drafts.observe(initial.clone());
        Ok(BasicInfoStep {
            form: FormState::with_schema(initial, basic_info_schema()?),
            drafts,
        })
    }

    async fn mount_details_step(&self) -> Result<DetailsStep, WizardError> {
        let key = DraftKey::new(self.role, WizardStep::Details);
        let known_id = self
            .basic_info_data
            .as_ref()
            .map(|record| record.employee_id.clone())
            .or_else(|| self.employee_id.clone());

        let initial = match &self.existing_details {
            Some(Some(existing)) => DetailsForm::from_details(existing, known_id.as_deref()),
            Some(None) => DetailsForm::for_employee(known_id.unwrap_or_default()),
            None => {
                let mut draft: DetailsForm =
                    self.ctx.drafts.restore(key).await.unwrap_or_default();
                if let Some(id) = known_id {
                    draft.employee_id = id;
                }
                draft
            }
        };

        let mut drafts = self.ctx.drafts.observe(key, self.ctx.timing.draft_debounce);
        drafts.observe(initial.clone());
        Ok(DetailsStep {
            form: FormState::with_schema(initial, details_schema()?),
            drafts,
            employee_id_editable: self.role == AccessRole::Ops
                && self.basic_info_data.is_none()
                && self.employee_id.is_none(),
        })
    }
}

/// First details record of the employee. A failed lookup counts as none.
async fn find_existing_details(api: &dyn DetailsApi, employee_id: &str) -> Option<Details> {
    match api.get_by_employee_id(employee_id).await {
        Ok(records) => records.into_iter().next(),
        Err(err) => {
            warn!(employee_id, error = %err, "error checking existing details");
            None
        }
    }
}

#[cfg(test)]
#[path = "tests/wizard_tests.rs"]
mod tests;
