use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared::domain::{BasicInfo, JobRole};

use crate::{
    schema::{FormField, FormModel, Rule, Schema, SchemaError},
    IncompleteForm,
};

const JOB_ROLE_CHOICES: &[&str] = &["Ops", "Admin", "Engineer", "Finance"];

/// Step 1 values. Missing keys in a restored draft fall back to empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BasicInfoForm {
    pub full_name: String,
    pub email: String,
    pub department: String,
    pub role: String,
    pub employee_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BasicInfoField {
    FullName,
    Email,
    Department,
    Role,
    EmployeeId,
}

impl FormField for BasicInfoField {
    const ALL: &'static [Self] = &[
        Self::FullName,
        Self::Email,
        Self::Department,
        Self::Role,
        Self::EmployeeId,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::FullName => "fullName",
            Self::Email => "email",
            Self::Department => "department",
            Self::Role => "role",
            Self::EmployeeId => "employeeId",
        }
    }
}

impl FormModel for BasicInfoForm {
    type Field = BasicInfoField;

    fn value(&self, field: BasicInfoField) -> &str {
        match field {
            BasicInfoField::FullName => &self.full_name,
            BasicInfoField::Email => &self.email,
            BasicInfoField::Department => &self.department,
            BasicInfoField::Role => &self.role,
            BasicInfoField::EmployeeId => &self.employee_id,
        }
    }

    fn value_mut(&mut self, field: BasicInfoField) -> &mut String {
        match field {
            BasicInfoField::FullName => &mut self.full_name,
            BasicInfoField::Email => &mut self.email,
            BasicInfoField::Department => &mut self.department,
            BasicInfoField::Role => &mut self.role,
            BasicInfoField::EmployeeId => &mut self.employee_id,
        }
    }
}

impl BasicInfoForm {
    pub fn to_record(&self) -> Result<BasicInfo, IncompleteForm> {
        let role = self.role.parse::<JobRole>().map_err(|err| IncompleteForm {
            field: BasicInfoField::Role.name(),
            message: err.to_string(),
        })?;
        Ok(BasicInfo {
            id: None,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            department: self.department.clone(),
            role,
            employee_id: self.employee_id.clone(),
        })
    }
}

pub fn basic_info_schema() -> Result<Arc<Schema<BasicInfoForm>>, SchemaError> {
    Schema::builder()
        .field(
            BasicInfoField::FullName,
            [Rule::Required("Full name is required")],
        )
        .field(BasicInfoField::Email, [Rule::Email("Invalid email address")])
        .field(
            BasicInfoField::Department,
            [Rule::Required("Department is required")],
        )
        .field(
            BasicInfoField::Role,
            [Rule::OneOf {
                choices: JOB_ROLE_CHOICES,
                message: "Role is required",
            }],
        )
        // Assigned by the generator, never typed by the user.
        .field(BasicInfoField::EmployeeId, [])
        .build()
        .map(Arc::new)
}
