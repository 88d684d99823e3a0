//! Declarative validation rules for form records.
//!
//! A [`Schema`] is an ordered set of [`FieldSpec`]s plus cross-field
//! [`Refinement`]s. Schemas compose with [`Schema::intersect`]: a record
//! satisfies the intersection only if it satisfies both sides.

use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, LazyLock};

use crate::{
    error::{FieldIssue, ValidationErrors},
    record::FormRecord,
};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

const REQUIRED: &str = "Required";

/// Shape a field value must have
#[derive(Clone, Debug)]
pub enum FieldKind {
    Text,
    Boolean,
    Number,
    /// Array whose items are objects validated by the nested schema
    List(Schema),
    Object(Schema),
}

impl FieldKind {
    fn type_message(&self) -> &'static str {
        match self {
            FieldKind::Text => "Expected text",
            FieldKind::Boolean => "Expected true or false",
            FieldKind::Number => "Expected a number",
            FieldKind::List(_) => "Expected a list",
            FieldKind::Object(_) => "Expected an object",
        }
    }
}

/// A rule applied to a value that already has the right kind
#[derive(Clone, Debug)]
pub enum Check {
    MinLength(usize, String),
    MaxLength(usize, String),
    ExactLength(usize, String),
    Email(String),
    Matches(Regex, String),
    NotMatches(Regex, String),
    /// Rejects any run of this many identical consecutive characters
    NoRepeatedRun(usize, String),
    IsTrue(String),
    OneOf(Vec<String>, String),
}

impl Check {
    fn message(&self) -> &str {
        match self {
            Check::MinLength(_, m)
            | Check::MaxLength(_, m)
            | Check::ExactLength(_, m)
            | Check::Email(m)
            | Check::Matches(_, m)
            | Check::NotMatches(_, m)
            | Check::NoRepeatedRun(_, m)
            | Check::IsTrue(m)
            | Check::OneOf(_, m) => m,
        }
    }

    fn passes(&self, value: &Value) -> bool {
        match (self, value) {
            (Check::MinLength(min, _), Value::String(s)) => s.chars().count() >= *min,
            (Check::MinLength(min, _), Value::Array(items)) => items.len() >= *min,
            (Check::MaxLength(max, _), Value::String(s)) => s.chars().count() <= *max,
            (Check::MaxLength(max, _), Value::Array(items)) => items.len() <= *max,
            (Check::ExactLength(len, _), Value::String(s)) => s.chars().count() == *len,
            (Check::Email(_), Value::String(s)) => EMAIL_PATTERN.is_match(s),
            (Check::Matches(re, _), Value::String(s)) => re.is_match(s),
            (Check::NotMatches(re, _), Value::String(s)) => !re.is_match(s),
            (Check::NoRepeatedRun(run, _), Value::String(s)) => !has_repeated_run(s, *run),
            (Check::IsTrue(_), Value::Bool(b)) => *b,
            (Check::OneOf(allowed, _), Value::String(s)) => allowed.iter().any(|a| a == s),
            // a check that does not apply to this kind never fails
            _ => true,
        }
    }
}

fn has_repeated_run(s: &str, run: usize) -> bool {
    if run < 2 {
        return !s.is_empty();
    }
    let mut count = 0;
    let mut last = None;
    for c in s.chars() {
        if Some(c) == last {
            count += 1;
        } else {
            last = Some(c);
            count = 1;
        }
        if count >= run {
            return true;
        }
    }
    false
}

/// Validation rules for one named field
#[derive(Clone, Debug)]
pub struct FieldSpec {
    pub name: String,
    pub required: bool,
    pub kind: FieldKind,
    pub checks: Vec<Check>,
}

impl FieldSpec {
    fn with_kind(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            required: true,
            kind,
            checks: Vec::new(),
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Text)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Boolean)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Number)
    }

    pub fn list(name: impl Into<String>, item: Schema) -> Self {
        Self::with_kind(name, FieldKind::List(item))
    }

    pub fn object(name: impl Into<String>, shape: Schema) -> Self {
        Self::with_kind(name, FieldKind::Object(shape))
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    pub fn min(self, len: usize, message: impl Into<String>) -> Self {
        self.check(Check::MinLength(len, message.into()))
    }

    pub fn max(self, len: usize, message: impl Into<String>) -> Self {
        self.check(Check::MaxLength(len, message.into()))
    }

    pub fn length(self, len: usize, message: impl Into<String>) -> Self {
        self.check(Check::ExactLength(len, message.into()))
    }

    pub fn email(self, message: impl Into<String>) -> Self {
        self.check(Check::Email(message.into()))
    }

    /// # Panics
    /// If `pattern` is not a valid regex. Patterns are compile-time literals.
    pub fn matches(self, pattern: &str, message: impl Into<String>) -> Self {
        let re = Regex::new(pattern).expect("schema pattern is valid");
        self.check(Check::Matches(re, message.into()))
    }

    /// # Panics
    /// If `pattern` is not a valid regex. Patterns are compile-time literals.
    pub fn not_matches(self, pattern: &str, message: impl Into<String>) -> Self {
        let re = Regex::new(pattern).expect("schema pattern is valid");
        self.check(Check::NotMatches(re, message.into()))
    }

    pub fn no_repeated_run(self, run: usize, message: impl Into<String>) -> Self {
        self.check(Check::NoRepeatedRun(run, message.into()))
    }

    pub fn must_be_true(self, message: impl Into<String>) -> Self {
        self.check(Check::IsTrue(message.into()))
    }

    pub fn one_of<I, S>(self, allowed: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed = allowed.into_iter().map(Into::into).collect();
        self.check(Check::OneOf(allowed, message.into()))
    }

    /// Field-level AND: required if either side is, both sides' checks apply.
    fn intersect(mut self, other: FieldSpec) -> Self {
        self.required |= other.required;
        self.kind = match (self.kind, other.kind) {
            (FieldKind::List(a), FieldKind::List(b)) => FieldKind::List(a.intersect(b)),
            (FieldKind::Object(a), FieldKind::Object(b)) => FieldKind::Object(a.intersect(b)),
            (_, kind) => kind,
        };
        self.checks.extend(other.checks);
        self
    }

    fn is_blank(&self, value: &Value) -> bool {
        match value {
            Value::Null => true,
            // an optional text field left empty counts as not provided
            Value::String(s) => !self.required && s.is_empty(),
            _ => false,
        }
    }

    fn validate(&self, path: &str, value: Option<&Value>, errors: &mut ValidationErrors) {
        let value = match value {
            Some(value) if !self.is_blank(value) => value,
            _ => {
                if self.required {
                    errors.push(FieldIssue::new(path, REQUIRED));
                }
                return;
            }
        };

        match (&self.kind, value) {
            (FieldKind::Text, Value::String(_))
            | (FieldKind::Boolean, Value::Bool(_))
            | (FieldKind::Number, Value::Number(_)) => {}
            (FieldKind::List(item), Value::Array(items)) => {
                for (i, entry) in items.iter().enumerate() {
                    let entry_path = format!("{path}.{i}");
                    match entry {
                        Value::Object(fields) => item.validate_map(&entry_path, fields, errors),
                        _ => errors.push(FieldIssue::new(entry_path, "Expected an object")),
                    }
                }
            }
            (FieldKind::Object(shape), Value::Object(fields)) => {
                shape.validate_map(path, fields, errors)
            }
            (kind, _) => {
                errors.push(FieldIssue::new(path, kind.type_message()));
                return;
            }
        }

        for check in &self.checks {
            if !check.passes(value) {
                errors.push(FieldIssue::new(path, check.message()));
            }
        }
    }
}

type RefinementFn = Arc<dyn Fn(&FormRecord) -> bool + Send + Sync>;

/// Cross-field rule reported against a single field path
#[derive(Clone)]
pub struct Refinement {
    pub path: String,
    pub message: String,
    predicate: RefinementFn,
}

impl fmt::Debug for Refinement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refinement")
            .field("path", &self.path)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// Ordered field rules plus cross-field refinements
#[derive(Clone, Debug, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
    refinements: Vec<Refinement>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, replacing any earlier spec with the same name
    pub fn field(mut self, spec: FieldSpec) -> Self {
        match self.fields.iter_mut().find(|f| f.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.fields.push(spec),
        }
        self
    }

    /// Adds a rule over the whole record. Refinements only run once every
    /// field rule passes, so predicates can assume well-formed input.
    pub fn refine<F>(mut self, path: impl Into<String>, message: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&FormRecord) -> bool + Send + Sync + 'static,
    {
        self.refinements.push(Refinement {
            path: path.into(),
            message: message.into(),
            predicate: Arc::new(predicate),
        });
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.get(name).is_some_and(|f| f.required)
    }

    pub fn required_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect()
    }

    pub fn optional_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| !f.required)
            .map(|f| f.name.as_str())
            .collect()
    }

    /// A schema whose records must satisfy both `self` and `other`
    pub fn intersect(mut self, other: Schema) -> Self {
        for spec in other.fields {
            match self.fields.iter().position(|f| f.name == spec.name) {
                Some(i) => {
                    let existing = self.fields.remove(i);
                    self.fields.insert(i, existing.intersect(spec));
                }
                None => self.fields.push(spec),
            }
        }
        self.refinements.extend(other.refinements);
        self
    }

    pub fn validate(&self, record: &FormRecord) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        self.validate_map("", record.as_map(), &mut errors);

        if errors.is_empty() {
            for refinement in &self.refinements {
                if !(refinement.predicate)(record) {
                    errors.push(FieldIssue::new(&refinement.path, &refinement.message));
                }
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn validate_map(&self, prefix: &str, fields: &Map<String, Value>, errors: &mut ValidationErrors) {
        for spec in &self.fields {
            let path = if prefix.is_empty() {
                spec.name.clone()
            } else {
                format!("{prefix}.{}", spec.name)
            };
            spec.validate(&path, fields.get(&spec.name), errors);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> FormRecord {
        FormRecord::try_from(value).unwrap()
    }

    fn contact_schema() -> Schema {
        Schema::new()
            .field(FieldSpec::text("name").min(1, "Name is required"))
            .field(FieldSpec::text("email").email("Please enter a valid email address"))
            .field(FieldSpec::text("nickname").optional().max(5, "Too long"))
    }

    #[test]
    fn test_missing_required_and_empty_optional() {
        let schema = contact_schema();

        let errors = schema.validate(&record(json!({"nickname": ""}))).unwrap_err();
        assert_eq!(errors.messages_for("name"), vec!["Required"]);
        assert_eq!(errors.messages_for("email"), vec!["Required"]);
        assert!(!errors.has_issue_for("nickname"));
    }

    #[test]
    fn test_checks_report_their_message() {
        let schema = contact_schema();

        let errors = schema
            .validate(&record(json!({"name": "", "email": "nope", "nickname": "toolong"})))
            .unwrap_err();
        assert_eq!(errors.messages_for("name"), vec!["Name is required"]);
        assert_eq!(
            errors.messages_for("email"),
            vec!["Please enter a valid email address"]
        );
        assert_eq!(errors.messages_for("nickname"), vec!["Too long"]);

        assert!(
            schema
                .validate(&record(json!({"name": "Ana", "email": "ana@example.com"})))
                .is_ok()
        );
    }

    #[test]
    fn test_wrong_kind_is_reported() {
        let schema = Schema::new().field(FieldSpec::boolean("agreed"));
        let errors = schema.validate(&record(json!({"agreed": "yes"}))).unwrap_err();
        assert_eq!(errors.messages_for("agreed"), vec!["Expected true or false"]);
    }

    #[test]
    fn test_nested_paths() {
        let schema = Schema::new()
            .field(FieldSpec::object(
                "address",
                Schema::new().field(FieldSpec::text("city").min(1, "City is required")),
            ))
            .field(
                FieldSpec::list(
                    "witnesses",
                    Schema::new().field(FieldSpec::text("name").min(1, "Witness name is required")),
                )
                .optional(),
            );

        let errors = schema
            .validate(&record(json!({
                "address": {"city": ""},
                "witnesses": [{"name": "Ana"}, {"name": ""}, "bob"],
            })))
            .unwrap_err();

        assert_eq!(errors.messages_for("address.city"), vec!["City is required"]);
        assert_eq!(
            errors.messages_for("witnesses.1.name"),
            vec!["Witness name is required"]
        );
        assert_eq!(errors.messages_for("witnesses.2"), vec!["Expected an object"]);
        assert!(!errors.has_issue_for("witnesses.0.name"));
    }

    #[test]
    fn test_intersect_unions_required_fields_and_keeps_both_checks() {
        let base = Schema::new()
            .field(FieldSpec::text("date").min(1, "Date is required"))
            .field(FieldSpec::text("reference").optional());
        let extension = Schema::new()
            .field(FieldSpec::text("reference").min(3, "Reference too short"))
            .field(FieldSpec::text("flight").min(1, "Flight is required"));

        let merged = base.intersect(extension);

        assert_eq!(merged.required_fields(), vec!["date", "reference", "flight"]);
        assert!(merged.optional_fields().is_empty());

        let errors = merged
            .validate(&record(json!({"date": "2024-01-01", "reference": "ab"})))
            .unwrap_err();
        assert_eq!(errors.messages_for("reference"), vec!["Reference too short"]);
        assert_eq!(errors.messages_for("flight"), vec!["Required"]);
    }

    #[test]
    fn test_refinements_run_after_field_rules() {
        let schema = Schema::new()
            .field(FieldSpec::text("password").min(1, "Password is required"))
            .field(FieldSpec::text("confirm").min(1, "Please confirm"))
            .refine("confirm", "Passwords do not match", |r| {
                r.get_str("password") == r.get_str("confirm")
            });

        let errors = schema
            .validate(&record(json!({"password": "a", "confirm": "b"})))
            .unwrap_err();
        assert_eq!(errors.messages_for("confirm"), vec!["Passwords do not match"]);

        let errors = schema.validate(&record(json!({"password": "a"}))).unwrap_err();
        assert_eq!(errors.messages_for("confirm"), vec!["Required"]);
    }

    #[test]
    fn test_repeated_run_detection() {
        assert!(has_repeated_run("abccc", 3));
        assert!(!has_repeated_run("aabbcc", 3));
        assert!(!has_repeated_run("", 3));
    }
}
