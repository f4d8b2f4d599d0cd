use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use tracing::debug;

use crate::schema::{FormField, FormModel, Schema};

/// What an input widget needs to render one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldProps<'a> {
    pub name: &'static str,
    pub value: &'a str,
    pub error: Option<&'a str>,
    pub touched: bool,
}

#[derive(Debug, Clone)]
pub struct FormState<M: FormModel> {
    initial: M,
    values: M,
    errors: BTreeMap<M::Field, String>,
    touched: BTreeSet<M::Field>,
    schema: Option<Arc<Schema<M>>>,
    validate_on_change: bool,
}

impl<M: FormModel> FormState<M> {
    pub fn new(initial: M, schema: Option<Arc<Schema<M>>>, validate_on_change: bool) -> Self {
        Self {
            values: initial.clone(),
            initial,
            errors: BTreeMap::new(),
            touched: BTreeSet::new(),
            schema,
            validate_on_change,
        }
    }

    /// Schema-backed state that validates on every change.
    pub fn with_schema(initial: M, schema: Arc<Schema<M>>) -> Self {
        Self::new(initial, Some(schema), true)
    }

    pub fn values(&self) -> &M {
        &self.values
    }

    pub fn value(&self, field: M::Field) -> &str {
        self.values.value(field)
    }

    pub fn errors(&self) -> &BTreeMap<M::Field, String> {
        &self.errors
    }

    pub fn error(&self, field: M::Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn touched(&self) -> &BTreeSet<M::Field> {
        &self.touched
    }

    pub fn is_touched(&self, field: M::Field) -> bool {
        self.touched.contains(&field)
    }

    /// No outstanding errors and the user has interacted with the form.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && !self.touched.is_empty()
    }

    pub fn field_props(&self, field: M::Field) -> FieldProps<'_> {
        FieldProps {
            name: field.name(),
            value: self.values.value(field),
            error: self.error(field),
            touched: self.is_touched(field),
        }
    }

    /// Overwrites one field. With validate-on-change the whole object is
    /// re-checked but only this field's error is updated.
    pub fn set_value(&mut self, field: M::Field, value: impl Into<String>) {
        *self.values.value_mut(field) = value.into();
        if self.validate_on_change {
            let error = self.field_error(&self.values, field);
            self.store_error(field, error);
        }
    }

    /// Bulk overwrite without validation.
    pub fn set_values<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = (M::Field, String)>,
    {
        for (field, value) in values {
            *self.values.value_mut(field) = value;
        }
    }

    pub fn handle_blur(&mut self, field: M::Field) {
        self.touched.insert(field);
        let error = self.field_error(&self.values, field);
        self.store_error(field, error);
    }

    /// Checks the entire form, replaces every error and marks every field
    /// touched. Returns whether the form may be submitted.
    pub fn validate(&mut self) -> bool {
        let mut errors = BTreeMap::new();
        if let Some(schema) = &self.schema {
            for issue in schema.check(&self.values) {
                errors.entry(issue.field).or_insert(issue.message);
            }
        }
        if !errors.is_empty() {
            debug!(
                fields = ?errors.keys().map(|f: &M::Field| f.name()).collect::<Vec<_>>(),
                "form validation failed"
            );
        }
        self.errors = errors;
        self.touched = M::Field::ALL.iter().copied().collect();
        self.errors.is_empty()
    }

    pub fn reset(&mut self, new_values: Option<M>) {
        self.values = new_values.unwrap_or_else(|| self.initial.clone());
        self.errors.clear();
        self.touched.clear();
    }

    fn field_error(&self, candidate: &M, field: M::Field) -> Option<String> {
        let schema = self.schema.as_ref()?;
        schema
            .check(candidate)
            .into_iter()
            .find(|issue| issue.field == field)
            .map(|issue| issue.message)
    }

    fn store_error(&mut self, field: M::Field, error: Option<String>) {
        match error {
            Some(message) => {
                self.errors.insert(field, message);
            }
            None => {
                self.errors.remove(&field);
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
