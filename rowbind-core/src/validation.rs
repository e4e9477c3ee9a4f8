//! Declarative field rules and the bridge that turns a rule run into
//! pass/fail plus a populated [`ErrorContainer`].
//!
//! Rule sets deserialize from the same shape they are usually written in:
//!
//! ```
//! use rowbind_core::validation::{RuleSet, RuleValidator, ValidationBridge};
//! use rowbind_core::record;
//!
//! let rules = RuleSet::from_json(serde_json::json!({
//!     "attr": { "required": true, "message": "please enter attr" }
//! })).unwrap();
//!
//! let mut bridge = ValidationBridge::new(RuleValidator::shared());
//! assert!(!bridge.validate(&record! { "attr" => "" }, &rules, true));
//! assert_eq!(bridge.first_error().unwrap().message, "please enter attr");
//! ```

use crate::error::{ErrorContainer, ErrorRecord};
use crate::value::{Record, Value};
use dashmap::DashMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};
use validator::ValidateEmail;

/// Compiled `pattern` rules, keyed by their source.
static PATTERNS: LazyLock<DashMap<String, Regex>> = LazyLock::new(DashMap::new);

fn compiled(pattern: &str) -> Result<Regex, regex::Error> {
    if let Some(re) = PATTERNS.get(pattern) {
        return Ok(re.clone());
    }
    let re = Regex::new(pattern)?;
    PATTERNS.insert(pattern.to_string(), re.clone());
    Ok(re)
}

/// Rules for one field. Every rule except `required` is skipped when the
/// value is absent or blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldRules {
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub email: bool,
    pub pattern: Option<String>,
    pub one_of: Vec<Value>,
    /// Replaces the default message of whichever rule fails.
    pub message: Option<String>,
}

impl FieldRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn email(mut self) -> Self {
        self.email = true;
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn one_of(mut self, values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        self.one_of = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Field name to rules, checked in field-name order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    fields: BTreeMap<String, FieldRules>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, rules: FieldRules) -> Self {
        self.fields.insert(name.into(), rules);
        self
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldRules)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// The rule engine contract.
pub trait Validator: Send + Sync {
    /// Check `data` against `rules`, returning every failure in order (or
    /// only the first one when `stop_on_first_error` is set).
    fn check(&self, data: &Record, rules: &RuleSet, stop_on_first_error: bool) -> Vec<ErrorRecord>;
}

/// Built-in [`Validator`] for [`FieldRules`]. Reports at most one error per field.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleValidator;

impl RuleValidator {
    pub fn shared() -> Arc<dyn Validator> {
        Arc::new(RuleValidator)
    }
}

impl Validator for RuleValidator {
    fn check(&self, data: &Record, rules: &RuleSet, stop_on_first_error: bool) -> Vec<ErrorRecord> {
        let mut errors = Vec::new();
        for (field, field_rules) in rules.iter() {
            if let Some(err) = check_field(field, data.get(field), field_rules) {
                errors.push(err);
                if stop_on_first_error {
                    break;
                }
            }
        }
        errors
    }
}

fn check_field(field: &str, value: Option<&Value>, rules: &FieldRules) -> Option<ErrorRecord> {
    let fail = |code: &str, default: String| {
        let message = rules.message.clone().unwrap_or(default);
        Some(ErrorRecord::new(message).with_code(code).with_field(field))
    };

    let value = match value {
        Some(v) if !v.is_blank() => v,
        _ => {
            return if rules.required {
                fail("required", format!("{field} is required"))
            } else {
                None
            };
        }
    };

    if let Some(min) = rules.min_length {
        if value.len().is_some_and(|len| len < min) {
            return fail("length", format!("{field} must be at least {min} characters"));
        }
    }
    if let Some(max) = rules.max_length {
        if value.len().is_some_and(|len| len > max) {
            return fail("length", format!("{field} must be at most {max} characters"));
        }
    }

    if rules.min.is_some() || rules.max.is_some() {
        let Some(number) = value.as_f64() else {
            return fail("range", format!("{field} must be a number"));
        };
        if let Some(min) = rules.min {
            if number < min {
                return fail("range", format!("{field} must be greater than or equal to {min}"));
            }
        }
        if let Some(max) = rules.max {
            if number > max {
                return fail("range", format!("{field} must be less than or equal to {max}"));
            }
        }
    }

    if rules.email && !value.as_str().is_some_and(|s| s.validate_email()) {
        return fail("email", format!("{field} must be a valid email address"));
    }

    if let Some(pattern) = &rules.pattern {
        match compiled(pattern) {
            Ok(re) => {
                let text = value.to_string();
                if !re.is_match(&text) {
                    return fail("pattern", format!("{field} has an invalid format"));
                }
            }
            Err(e) => {
                tracing::warn!(field, pattern = %pattern, error = %e, "invalid validation pattern");
                return fail("pattern", format!("{field} has an unusable pattern rule"));
            }
        }
    }

    if !rules.one_of.is_empty() && !rules.one_of.contains(value) {
        return fail("one_of", format!("{field} is not an allowed value"));
    }

    None
}

/// Adapts a [`Validator`] into the bool-plus-errors shape models consume.
#[derive(Clone)]
pub struct ValidationBridge {
    validator: Arc<dyn Validator>,
    errors: ErrorContainer,
}

impl ValidationBridge {
    pub fn new(validator: Arc<dyn Validator>) -> Self {
        Self {
            validator,
            errors: ErrorContainer::multiple(),
        }
    }

    /// Run the rules; errors from the previous run are discarded first.
    pub fn validate(&mut self, data: &Record, rules: &RuleSet, stop_on_first_error: bool) -> bool {
        self.errors.reset();
        if rules.is_empty() {
            return true;
        }
        let found = self.validator.check(data, rules, stop_on_first_error);
        self.errors.extend(found);
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &ErrorContainer {
        &self.errors
    }

    pub fn first_error(&self) -> Option<&ErrorRecord> {
        self.errors.first()
    }
}

impl std::fmt::Debug for ValidationBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationBridge")
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    fn run(data: &Record, rules: &RuleSet) -> Vec<ErrorRecord> {
        RuleValidator.check(data, rules, false)
    }

    #[test]
    fn required_rejects_missing_and_blank() {
        let rules = RuleSet::new().field("name", FieldRules::new().required());
        assert_eq!(run(&record! {}, &rules)[0].code, "required");
        assert_eq!(run(&record! { "name" => "  " }, &rules).len(), 1);
        assert!(run(&record! { "name" => "bob" }, &rules).is_empty());
    }

    #[test]
    fn optional_rules_skip_blank_values() {
        let rules = RuleSet::new().field("email", FieldRules::new().email());
        assert!(run(&record! {}, &rules).is_empty());
        assert!(run(&record! { "email" => "" }, &rules).is_empty());
        assert_eq!(run(&record! { "email" => "nope" }, &rules)[0].code, "email");
        assert!(run(&record! { "email" => "a@b.io" }, &rules).is_empty());
    }

    #[test]
    fn length_and_range() {
        let rules = RuleSet::new()
            .field("code", FieldRules::new().length(Some(2), Some(4)))
            .field("age", FieldRules::new().range(Some(0.0), Some(150.0)));
        let errors = run(&record! { "code" => "abcde", "age" => 200 }, &rules);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field.as_deref(), Some("age"));
        assert_eq!(errors[1].field.as_deref(), Some("code"));
        assert_eq!(run(&record! { "age" => "old" }, &rules)[0].code, "range");
    }

    #[test]
    fn pattern_and_one_of() {
        let rules = RuleSet::new()
            .field("sku", FieldRules::new().pattern("^[A-Z]{3}-[0-9]+$"))
            .field("state", FieldRules::new().one_of(["open", "closed"]));
        assert!(run(&record! { "sku" => "ABC-12", "state" => "open" }, &rules).is_empty());
        let errors = run(&record! { "sku" => "abc", "state" => "gone" }, &rules);
        assert_eq!(errors.iter().map(|e| e.code.as_str()).collect::<Vec<_>>(), ["pattern", "one_of"]);
    }

    #[test]
    fn stop_on_first_error() {
        let rules = RuleSet::new()
            .field("a", FieldRules::new().required())
            .field("b", FieldRules::new().required());
        assert_eq!(RuleValidator.check(&record! {}, &rules, true).len(), 1);
    }

    #[test]
    fn custom_message_from_json() {
        let rules = RuleSet::from_json(serde_json::json!({
            "attr": { "required": true, "message": "please enter attr" }
        }))
        .unwrap();
        let mut bridge = ValidationBridge::new(RuleValidator::shared());
        assert!(!bridge.validate(&record! { "attr" => "" }, &rules, true));
        assert_eq!(bridge.first_error().unwrap().message, "please enter attr");
        assert!(bridge.validate(&record! { "attr" => "set" }, &rules, true));
        assert!(bridge.errors().is_empty());
    }

    #[test]
    fn unknown_rule_keys_are_rejected() {
        let err = RuleSet::from_json(serde_json::json!({ "attr": { "requird": true } }));
        assert!(err.is_err());
    }

    #[test]
    fn email_shape() {
        let rules = RuleSet::new().field("email", FieldRules::new().email());
        assert!(run(&record! { "email" => "a.b@example.com" }, &rules).is_empty());
        for bad in ["a@@example.com", "a b@example.com", "a@b..c", "a@-.com", "a\0@b.c"] {
            assert_eq!(run(&record! { "email" => bad }, &rules).len(), 1, "{bad}");
        }
    }

    #[test]
    fn patterns_compile_once() {
        let rules = RuleSet::new().field("zip", FieldRules::new().pattern("^[0-9]{5}$"));
        assert!(run(&record! { "zip" => "12345" }, &rules).is_empty());
        assert!(PATTERNS.contains_key("^[0-9]{5}$"));
        assert_eq!(run(&record! { "zip" => "1234" }, &rules)[0].code, "pattern");

        let broken = RuleSet::new().field("zip", FieldRules::new().pattern("("));
        assert_eq!(run(&record! { "zip" => "1" }, &broken)[0].code, "pattern");
        assert!(!PATTERNS.contains_key("("));
    }
}
