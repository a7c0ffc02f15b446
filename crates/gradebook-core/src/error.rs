//! Error types for outline parsing, validation, grade entry, and storage.
//!
//! Each layer gets its own enum so callers can tell a malformed outline apart
//! from a corrupt data file without string matching.

use std::path::PathBuf;

use thiserror::Error;

/// A malformed outline line. Parsing stops at the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {reason}")]
pub struct ParseError {
    /// 1-based line number in the outline text.
    pub line: usize,
    /// Human-readable reason.
    pub reason: String,
}

impl ParseError {
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// The JSON document does not have the dataset shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid format in '{path}': {reason}")]
pub struct StructureError {
    /// Location of the offending value, e.g. `Math 101 -> assessments`.
    pub path: String,
    pub reason: String,
}

/// Numeric inconsistency inside an otherwise well-formed course.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticError {
    #[error("weight must be positive for {course} {assessment}")]
    NonPositiveWeight { course: String, assessment: String },

    #[error("dropped amount is negative in {course} {assessment}")]
    NegativeDropped { course: String, assessment: String },

    #[error("too many dropped assessments in {course} {assessment}")]
    TooManyDropped { course: String, assessment: String },

    #[error("{course} {assessment} has {actual} grade slots but an amount of {expected}")]
    GradeCount {
        course: String,
        assessment: String,
        expected: i64,
        actual: usize,
    },

    #[error("grade {grade} in {course} {assessment} is outside 0-100")]
    GradeOutOfRange {
        course: String,
        assessment: String,
        grade: f64,
    },

    #[error("total weight does not add up to 100% in {course} (found {total}%)")]
    TotalWeight { course: String, total: i128 },
}

/// Any failure reported by the validator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error(transparent)]
    Semantic(#[from] SemanticError),
}

/// Rejected grade entry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradeError {
    #[error("unknown course: {0}")]
    UnknownCourse(String),

    #[error("unknown assessment '{assessment}' in {course}")]
    UnknownAssessment { course: String, assessment: String },

    #[error("invalid attempt number {number}: {assessment} has {amount} attempt(s)")]
    IndexOutOfRange {
        assessment: String,
        number: usize,
        amount: usize,
    },

    #[error("grade {0} is outside 0-100")]
    OutOfRange(f64),
}

/// Failures of the on-disk store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON syntax in {}: {source}", .path.display())]
    Syntax {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid dataset name '{0}'")]
    InvalidName(String),

    #[error("invalid dataset in {}: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },

    #[error("failed to serialize dataset '{name}': {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("dataset '{name}' is unusable and no backup exists (moved to {})", .quarantined.display())]
    NoBackup { name: String, quarantined: PathBuf },

    #[error("restoring dataset '{name}' from backup was declined")]
    RecoveryDeclined { name: String },

    #[error("backup of dataset '{name}' is also invalid: {reason}")]
    BackupInvalid { name: String, reason: String },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the file was readable but its contents are unusable, which
    /// is the case the backup recovery handles.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::Syntax { .. } | StoreError::Invalid { .. })
    }
}

/// Failures loading `gradebook.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_mentions_line() {
        let e = ParseError::new(7, "Invalid weight: '3 Quiz 20'");
        assert_eq!(e.to_string(), "line 7: Invalid weight: '3 Quiz 20'");
    }

    #[test]
    fn validation_error_is_transparent() {
        let e: ValidationError = SemanticError::TotalWeight {
            course: "Math 101".into(),
            total: 90,
        }
        .into();
        assert!(e.to_string().contains("Math 101"));
        assert!(e.to_string().starts_with("total weight"));
    }
}
