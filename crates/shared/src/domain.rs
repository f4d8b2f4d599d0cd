use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(RecordId);
id_newtype!(LookupId);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

/// Who is operating the wizard. Scopes drafts and decides the starting step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccessRole {
    #[default]
    Admin,
    Ops,
}

impl AccessRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Ops => "ops",
        }
    }
}

impl fmt::Display for AccessRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "ops" => Ok(Self::Ops),
            other => Err(UnknownVariant {
                kind: "access role",
                value: other.to_string(),
            }),
        }
    }
}

/// The employee's job role as stored by the basic-info service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobRole {
    Ops,
    Admin,
    Engineer,
    Finance,
}

impl JobRole {
    pub const ALL: [JobRole; 4] = [Self::Ops, Self::Admin, Self::Engineer, Self::Finance];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ops => "Ops",
            Self::Admin => "Admin",
            Self::Engineer => "Engineer",
            Self::Finance => "Finance",
        }
    }
}

impl fmt::Display for JobRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "job role",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmploymentType {
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    Contract,
    Intern,
}

impl EmploymentType {
    pub const ALL: [EmploymentType; 4] = [
        Self::FullTime,
        Self::PartTime,
        Self::Contract,
        Self::Intern,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullTime => "Full-time",
            Self::PartTime => "Part-time",
            Self::Contract => "Contract",
            Self::Intern => "Intern",
        }
    }
}

impl fmt::Display for EmploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmploymentType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "employment type",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub full_name: String,
    pub email: String,
    pub department: String,
    pub role: JobRole,
    pub employee_id: String,
}

impl BasicInfo {
    /// Stand-in record created when ops registers details for an employee
    /// that has no basic info yet.
    pub fn placeholder(employee_id: impl Into<String>) -> Self {
        Self {
            id: None,
            full_name: "Ops User".into(),
            email: "ops@example.com".into(),
            department: "Operations".into(),
            role: JobRole::Ops,
            employee_id: employee_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Details {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub employee_id: String,
    /// Image as a base64 data URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub employment_type: EmploymentType,
    pub office_location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Body of `PATCH /details/:id`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<EmploymentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Full replacement of the editable fields. Absent optionals are sent as
/// empty strings so a correction can clear them.
impl From<&Details> for DetailsPatch {
    fn from(value: &Details) -> Self {
        Self {
            employee_id: Some(value.employee_id.clone()),
            photo: Some(value.photo.clone().unwrap_or_default()),
            employment_type: Some(value.employment_type),
            office_location: Some(value.office_location.clone()),
            notes: Some(value.notes.clone().unwrap_or_default()),
        }
    }
}

/// Autocomplete suggestion returned by the department and location endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupItem {
    pub id: LookupId,
    pub name: String,
}

/// Listing view entity: a basic-info record left-joined with its details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(flatten)]
    pub basic: BasicInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Details>,
}

impl Employee {
    pub fn employee_id(&self) -> &str {
        &self.basic.employee_id
    }

    pub fn employment_type(&self) -> Option<EmploymentType> {
        self.details.as_ref().map(|d| d.employment_type)
    }

    pub fn office_location(&self) -> Option<&str> {
        self.details
            .as_ref()
            .map(|d| d.office_location.as_str())
            .filter(|location| !location.is_empty())
    }

    pub fn photo(&self) -> Option<&str> {
        self.details.as_ref().and_then(|d| d.photo.as_deref())
    }

    pub fn notes(&self) -> Option<&str> {
        self.details
            .as_ref()
            .and_then(|d| d.notes.as_deref())
            .filter(|notes| !notes.trim().is_empty())
    }

    /// Drives the "fill details" affordance of the listing view.
    pub fn is_incomplete(&self) -> bool {
        self.employment_type().is_none() || self.office_location().is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePage {
    pub employees: Vec<Employee>,
    pub page: u32,
    pub total_pages: u32,
}
