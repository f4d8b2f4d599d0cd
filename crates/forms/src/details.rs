use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared::domain::{Details, EmploymentType};

use crate::{
    schema::{FormField, FormModel, Rule, Schema, SchemaError},
    IncompleteForm,
};

const EMPLOYMENT_TYPE_CHOICES: &[&str] = &["Full-time", "Part-time", "Contract", "Intern"];

/// Base64 data URL of a 5 MB image, plus room for the `data:` prefix.
const PHOTO_MAX_CHARS: usize = 7_000_000;

/// Step 2 values. Optional fields are empty strings when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetailsForm {
    pub employee_id: String,
    pub photo: String,
    pub employment_type: String,
    pub office_location: String,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DetailsField {
    EmployeeId,
    Photo,
    EmploymentType,
    OfficeLocation,
    Notes,
}

impl FormField for DetailsField {
    const ALL: &'static [Self] = &[
        Self::EmployeeId,
        Self::Photo,
        Self::EmploymentType,
        Self::OfficeLocation,
        Self::Notes,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::EmployeeId => "employeeId",
            Self::Photo => "photo",
            Self::EmploymentType => "employmentType",
            Self::OfficeLocation => "officeLocation",
            Self::Notes => "notes",
        }
    }
}

impl FormModel for DetailsForm {
    type Field = DetailsField;

    fn value(&self, field: DetailsField) -> &str {
        match field {
            DetailsField::EmployeeId => &self.employee_id,
            DetailsField::Photo => &self.photo,
            DetailsField::EmploymentType => &self.employment_type,
            DetailsField::OfficeLocation => &self.office_location,
            DetailsField::Notes => &self.notes,
        }
    }

    fn value_mut(&mut self, field: DetailsField) -> &mut String {
        match field {
            DetailsField::EmployeeId => &mut self.employee_id,
            DetailsField::Photo => &mut self.photo,
            DetailsField::EmploymentType => &mut self.employment_type,
            DetailsField::OfficeLocation => &mut self.office_location,
            DetailsField::Notes => &mut self.notes,
        }
    }
}

impl DetailsForm {
    pub fn for_employee(employee_id: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            ..Self::default()
        }
    }

    /// Seeds the form from a record fetched from the details service.
    /// `fallback_employee_id` is used when the record carries none.
    pub fn from_details(details: &Details, fallback_employee_id: Option<&str>) -> Self {
        let employee_id = if details.employee_id.is_empty() {
            fallback_employee_id.unwrap_or_default().to_string()
        } else {
            details.employee_id.clone()
        };
        Self {
            employee_id,
            photo: details.photo.clone().unwrap_or_default(),
            employment_type: details.employment_type.as_str().to_string(),
            office_location: details.office_location.clone(),
            notes: details.notes.clone().unwrap_or_default(),
        }
    }

    pub fn to_record(&self) -> Result<Details, IncompleteForm> {
        let employment_type =
            self.employment_type
                .parse::<EmploymentType>()
                .map_err(|err| IncompleteForm {
                    field: DetailsField::EmploymentType.name(),
                    message: err.to_string(),
                })?;
        Ok(Details {
            id: None,
            employee_id: self.employee_id.clone(),
            photo: non_empty(&self.photo),
            employment_type,
            office_location: self.office_location.clone(),
            notes: non_empty(&self.notes),
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

pub fn details_schema() -> Result<Arc<Schema<DetailsForm>>, SchemaError> {
    Schema::builder()
        .field(
            DetailsField::EmployeeId,
            [Rule::Required("Employee ID is required")],
        )
        .field(
            DetailsField::Photo,
            [Rule::optional(Rule::MaxLength {
                max: PHOTO_MAX_CHARS,
                message: "File size must be less than 5MB",
            })],
        )
        .field(
            DetailsField::EmploymentType,
            [Rule::OneOf {
                choices: EMPLOYMENT_TYPE_CHOICES,
                message: "Employment type is required",
            }],
        )
        .field(
            DetailsField::OfficeLocation,
            [Rule::Required("Office location is required")],
        )
        .field(DetailsField::Notes, [])
        .build()
        .map(Arc::new)
}
