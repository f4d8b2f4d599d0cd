use std::{collections::BTreeSet, fmt, hash::Hash, sync::Arc};

use thiserror::Error;
use validator::ValidateEmail;

/// Field identity of a form. `ALL` is the canonical field list.
pub trait FormField: Copy + Eq + Ord + Hash + fmt::Debug + Send + Sync + 'static {
    const ALL: &'static [Self];

    /// Wire / draft name of the field.
    fn name(self) -> &'static str;
}

/// A form's values: one string per field.
pub trait FormModel: Clone + fmt::Debug + Send + Sync + 'static {
    type Field: FormField;

    fn value(&self, field: Self::Field) -> &str;
    fn value_mut(&mut self, field: Self::Field) -> &mut String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue<F> {
    pub field: F,
    pub message: String,
}

impl<F> Issue<F> {
    pub fn new(field: F, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// At least one character.
    Required(&'static str),
    Email(&'static str),
    OneOf {
        choices: &'static [&'static str],
        message: &'static str,
    },
    MaxLength {
        max: usize,
        message: &'static str,
    },
    /// Empty passes; anything else must satisfy the inner rule.
    Optional(Box<Rule>),
}

impl Rule {
    pub fn optional(inner: Rule) -> Self {
        Self::Optional(Box::new(inner))
    }

    fn check(&self, value: &str) -> Option<&'static str> {
        match self {
            Self::Required(message) => value.is_empty().then_some(*message),
            Self::Email(message) => (!value.validate_email()).then_some(*message),
            Self::OneOf { choices, message } => {
                (!choices.iter().any(|choice| *choice == value)).then_some(*message)
            }
            Self::MaxLength { max, message } => (value.chars().count() > *max).then_some(*message),
            Self::Optional(inner) => {
                if value.is_empty() {
                    None
                } else {
                    inner.check(value)
                }
            }
        }
    }

    fn verify(&self, field: &'static str) -> Result<(), SchemaError> {
        match self {
            Self::OneOf { choices, .. } if choices.is_empty() => {
                Err(SchemaError::EmptyChoices { field })
            }
            Self::Optional(inner) => inner.verify(field),
            _ => Ok(()),
        }
    }
}

/// A malformed schema. This is a programming error, so unlike validation
/// issues it is returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("field '{field}' is declared more than once")]
    DuplicateField { field: &'static str },
    #[error("field '{field}' has no declaration")]
    MissingField { field: &'static str },
    #[error("field '{field}' has a one-of rule with no choices")]
    EmptyChoices { field: &'static str },
}

type Refinement<M> = Arc<dyn Fn(&M) -> Vec<Issue<<M as FormModel>::Field>> + Send + Sync>;

pub struct Schema<M: FormModel> {
    fields: Vec<(M::Field, Vec<Rule>)>,
    refinements: Vec<Refinement<M>>,
}

impl<M: FormModel> fmt::Debug for Schema<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("fields", &self.fields)
            .field("refinements", &self.refinements.len())
            .finish()
    }
}

impl<M: FormModel> Schema<M> {
    pub fn builder() -> SchemaBuilder<M> {
        SchemaBuilder {
            fields: Vec::new(),
            refinements: Vec::new(),
        }
    }

    /// Every issue for `values`: field rules in declaration order, then
    /// whole-object refinements.
    pub fn check(&self, values: &M) -> Vec<Issue<M::Field>> {
        let mut issues = Vec::new();
        for (field, rules) in &self.fields {
            let value = values.value(*field);
            issues.extend(
                rules
                    .iter()
                    .filter_map(|rule| rule.check(value))
                    .map(|message| Issue::new(*field, message)),
            );
        }
        for refine in &self.refinements {
            issues.extend(refine(values));
        }
        issues
    }

    pub fn fields(&self) -> impl Iterator<Item = M::Field> + '_ {
        self.fields.iter().map(|(field, _)| *field)
    }
}

pub struct SchemaBuilder<M: FormModel> {
    fields: Vec<(M::Field, Vec<Rule>)>,
    refinements: Vec<Refinement<M>>,
}

impl<M: FormModel> SchemaBuilder<M> {
    pub fn field(mut self, field: M::Field, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.fields.push((field, rules.into_iter().collect()));
        self
    }

    /// Adds a rule over the whole object, e.g. a cross-field constraint.
    pub fn refine<R>(mut self, refinement: R) -> Self
    where
        R: Fn(&M) -> Vec<Issue<M::Field>> + Send + Sync + 'static,
    {
        self.refinements.push(Arc::new(refinement));
        self
    }

    pub fn build(self) -> Result<Schema<M>, SchemaError> {
        let mut seen = BTreeSet::new();
        for (field, rules) in &self.fields {
            if !seen.insert(*field) {
                return Err(SchemaError::DuplicateField {
                    field: field.name(),
                });
            }
            for rule in rules {
                rule.verify(field.name())?;
            }
        }
        if let Some(missing) = M::Field::ALL.iter().find(|field| !seen.contains(*field)) {
            return Err(SchemaError::MissingField {
                field: missing.name(),
            });
        }

        Ok(Schema {
            fields: self.fields,
            refinements: self.refinements,
        })
    }
}
