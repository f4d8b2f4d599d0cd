//! Client side of the onboarding flow: HTTP services for the basic-info and
//! details backends, the employee listing, lookups, the submission
//! orchestrator and the wizard that sequences the two steps.

use std::sync::Arc;

use storage::DraftStore;

pub mod config;
pub mod directory;
pub mod employee_id;
pub mod error;
pub mod http;
pub mod lookup;
pub mod orchestrator;
pub mod services;
pub mod wizard;

#[cfg(test)]
mod test_support;

pub use config::{load_settings, Settings, Timing};
pub use directory::{merge_employees, EmployeeDirectory};
pub use employee_id::generate_employee_id;
pub use error::ClientError;
pub use http::JsonClient;
pub use lookup::{Autocomplete, DepartmentLookup, LocationLookup, LookupEndpoint, LookupSource};
pub use orchestrator::{
    SubmissionError, SubmissionEvent, SubmissionOrchestrator, SubmissionOutcome, SubmissionPlan,
    SubmissionState,
};
pub use services::{BasicInfoApi, BasicInfoService, DetailsApi, DetailsService};
pub use wizard::{OnboardingWizard, WizardError};

/// Everything a wizard or listing needs, shared by cheap clones.
#[derive(Clone)]
pub struct OnboardingContext {
    pub basic_info: Arc<dyn BasicInfoApi>,
    pub details: Arc<dyn DetailsApi>,
    pub drafts: DraftStore,
    pub timing: Timing,
    pub page_size: u32,
}

impl OnboardingContext {
    /// Wires the HTTP services for both backends named in `settings`.
    pub fn http(settings: &Settings, drafts: DraftStore) -> Self {
        let http = reqwest::Client::new();
        let basic_info = BasicInfoService::new(JsonClient::with_client(
            http.clone(),
            &settings.step1_api_url,
        ));
        let details = DetailsService::new(JsonClient::with_client(http, &settings.step2_api_url));
        Self {
            basic_info: Arc::new(basic_info),
            details: Arc::new(details),
            drafts,
            timing: settings.timing(),
            page_size: settings.page_size,
        }
    }

    pub fn orchestrator(&self) -> SubmissionOrchestrator {
        SubmissionOrchestrator::new(
            Arc::clone(&self.basic_info),
            Arc::clone(&self.details),
            self.drafts.clone(),
            self.timing,
        )
    }

    pub fn directory(&self) -> EmployeeDirectory {
        EmployeeDirectory::new(
            Arc::clone(&self.basic_info),
            Arc::clone(&self.details),
            self.page_size,
        )
    }

    pub fn department_autocomplete(&self) -> Autocomplete {
        Autocomplete::new(
            Arc::new(DepartmentLookup(Arc::clone(&self.basic_info))),
            self.timing.lookup_debounce,
        )
    }

    pub fn location_autocomplete(&self) -> Autocomplete {
        Autocomplete::new(
            Arc::new(LocationLookup(Arc::clone(&self.details))),
            self.timing.lookup_debounce,
        )
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
