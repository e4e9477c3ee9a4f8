use serde::Serialize;
use std::fmt;

/// Code used when an error is recorded without one.
pub const DEFAULT_ERROR_CODE: &str = "error";

/// A structured error: message, machine-readable code, and optionally the
/// field it is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorRecord {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: DEFAULT_ERROR_CODE.to_string(),
            field: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "[{}] {}: {}", self.code, field, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

impl From<&str> for ErrorRecord {
    fn from(message: &str) -> Self {
        ErrorRecord::new(message)
    }
}

impl From<String> for ErrorRecord {
    fn from(message: String) -> Self {
        ErrorRecord::new(message)
    }
}

/// How many records an [`ErrorContainer`] keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMode {
    /// Zero or one record; every push replaces the previous one.
    Single,
    /// Zero or many records in push order.
    Multiple,
}

/// Holds the errors produced by a model or a validation run.
#[derive(Debug, Clone)]
pub struct ErrorContainer {
    mode: ErrorMode,
    records: Vec<ErrorRecord>,
}

impl ErrorContainer {
    pub fn single() -> Self {
        Self {
            mode: ErrorMode::Single,
            records: Vec::with_capacity(1),
        }
    }

    pub fn multiple() -> Self {
        Self {
            mode: ErrorMode::Multiple,
            records: Vec::new(),
        }
    }

    pub fn mode(&self) -> ErrorMode {
        self.mode
    }

    pub fn push(&mut self, record: impl Into<ErrorRecord>) {
        if self.mode == ErrorMode::Single {
            self.records.clear();
        }
        self.records.push(record.into());
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = ErrorRecord>) {
        for record in records {
            self.push(record);
        }
    }

    pub fn first(&self) -> Option<&ErrorRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&ErrorRecord> {
        self.records.last()
    }

    pub fn all(&self) -> &[ErrorRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ErrorRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_error(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn reset(&mut self) {
        self.records.clear();
    }

    pub fn into_vec(self) -> Vec<ErrorRecord> {
        self.records
    }
}

impl Default for ErrorContainer {
    fn default() -> Self {
        Self::multiple()
    }
}

impl<'a> IntoIterator for &'a ErrorContainer {
    type Item = &'a ErrorRecord;
    type IntoIter = std::slice::Iter<'a, ErrorRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_mode_overwrites() {
        let mut errors = ErrorContainer::single();
        errors.push("first");
        errors.push(ErrorRecord::new("second").with_code("db"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().unwrap().message, "second");
        assert_eq!(errors.first().unwrap().code, "db");
    }

    #[test]
    fn multiple_mode_keeps_order() {
        let mut errors = ErrorContainer::multiple();
        errors.push(ErrorRecord::new("a").with_field("x"));
        errors.push("b");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.first().unwrap().field.as_deref(), Some("x"));
        assert_eq!(errors.last().unwrap().message, "b");
        errors.reset();
        assert!(!errors.has_error());
    }

    #[test]
    fn default_code() {
        let record = ErrorRecord::from("oops");
        assert_eq!(record.code, DEFAULT_ERROR_CODE);
        assert_eq!(record.to_string(), "[error] oops");
    }
}
