//! Validated form state for the two onboarding steps.
//!
//! A form is a plain record of string fields ([`FormModel`]) paired with a
//! declarative [`Schema`]. [`FormState`] owns the current values, the
//! per-field error map and the touched set.

mod basic_info;
mod details;
mod schema;
mod state;

pub use basic_info::{basic_info_schema, BasicInfoField, BasicInfoForm};
pub use details::{details_schema, DetailsField, DetailsForm};
pub use schema::{FormField, FormModel, Issue, Rule, Schema, SchemaBuilder, SchemaError};
pub use state::{FieldProps, FormState};

use thiserror::Error;

/// A form value could not be turned into its backend record. Only happens
/// when converting a form that has not passed [`FormState::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct IncompleteForm {
    pub field: &'static str,
    pub message: String,
}
