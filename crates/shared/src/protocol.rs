use std::fmt;

use serde::{Deserialize, Serialize};

/// The two screens of the onboarding wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[serde(rename = "step1")]
    BasicInfo,
    #[serde(rename = "step2")]
    Details,
}

impl WizardStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BasicInfo => "step1",
            Self::Details => "step2",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Submission progress as shown to the user. Only carries UI copy; the
/// transitions themselves live with the submission orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitStep {
    SubmittingBasicInfo,
    BasicInfoSaved,
    SubmittingDetails,
    DetailsSaved,
    Completed,
}

impl SubmitStep {
    pub const ALL: [SubmitStep; 5] = [
        Self::SubmittingBasicInfo,
        Self::BasicInfoSaved,
        Self::SubmittingDetails,
        Self::DetailsSaved,
        Self::Completed,
    ];

    pub fn number(self) -> u8 {
        match self {
            Self::SubmittingBasicInfo => 1,
            Self::BasicInfoSaved => 2,
            Self::SubmittingDetails => 3,
            Self::DetailsSaved => 4,
            Self::Completed => 5,
        }
    }

    pub fn from_number(step: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.number() == step)
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::SubmittingBasicInfo => "Submitting employee basic information...",
            Self::BasicInfoSaved => "Basic information saved successfully!",
            Self::SubmittingDetails => "Submitting employee details...",
            Self::DetailsSaved => "Employee details saved successfully!",
            Self::Completed => "Employee registration completed successfully!",
        }
    }

    /// Fraction of the progress bar to fill.
    pub fn fraction(self) -> f32 {
        f32::from(self.number()) / 5.0
    }
}

impl fmt::Display for SubmitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/5] {}", self.number(), self.message())
    }
}

/// `?_page=P&_limit=L` on list endpoints.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PageQuery {
    #[serde(rename = "_page")]
    pub page: u32,
    #[serde(rename = "_limit")]
    pub limit: u32,
}
