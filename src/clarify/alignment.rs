// src/clarify/alignment.rs
// Verify that clarifier answers line up one-to-one, in order, with the
// sub-questions they claim to answer

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, warn};

use crate::utils::normalize_text;

/// One answer record from the responding party (model or tool).
///
/// Only `sub_question` and `answer` matter for alignment. Every other field
/// (`classification`, `source`, `ref`, `canonical_value`, `details`, or
/// anything newer) rides along untouched in `payload`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClarifierAnswer {
    #[serde(default)]
    pub sub_question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl ClarifierAnswer {
    pub fn new(sub_question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            sub_question: Some(sub_question.into()),
            answer: Some(answer.into()),
            payload: Map::new(),
        }
    }

    /// Attach a passthrough field
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    pub fn classification(&self) -> Option<&str> {
        self.payload_str("classification")
    }

    pub fn source(&self) -> Option<&str> {
        self.payload_str("source")
    }

    pub fn reference(&self) -> Option<&Value> {
        self.payload.get("ref")
    }

    pub fn canonical_value(&self) -> Option<&Value> {
        self.payload.get("canonical_value")
    }

    pub fn details(&self) -> Option<&Value> {
        self.payload.get("details")
    }
}

/// Why an answer set failed alignment. `Display` renders the reason code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlignmentFailure {
    AnswerCountMismatch { expected: usize, got: usize },
    MissingSubQuestion { index: usize },
    SubQuestionMismatch { index: usize },
    EmptyAnswer { index: usize },
}

impl AlignmentFailure {
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::AnswerCountMismatch { .. } => None,
            Self::MissingSubQuestion { index }
            | Self::SubQuestionMismatch { index }
            | Self::EmptyAnswer { index } => Some(*index),
        }
    }
}

impl fmt::Display for AlignmentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnswerCountMismatch { expected, got } => {
                write!(f, "answer_count_mismatch: expected={expected} got={got}")
            }
            Self::MissingSubQuestion { index } => {
                write!(f, "missing_sub_question_at_index={index}")
            }
            Self::SubQuestionMismatch { index } => {
                write!(f, "sub_question_mismatch_at_index={index}")
            }
            Self::EmptyAnswer { index } => write!(f, "empty_answer_at_index={index}"),
        }
    }
}

/// `(is_valid, reason)`; reason is empty on success
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlignmentResult {
    pub is_valid: bool,
    pub reason: String,
}

impl AlignmentResult {
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            reason: String::new(),
        }
    }

    pub fn as_tuple(&self) -> (bool, &str) {
        (self.is_valid, self.reason.as_str())
    }
}

impl From<AlignmentFailure> for AlignmentResult {
    fn from(failure: AlignmentFailure) -> Self {
        Self {
            is_valid: false,
            reason: failure.to_string(),
        }
    }
}

impl From<std::result::Result<(), AlignmentFailure>> for AlignmentResult {
    fn from(res: std::result::Result<(), AlignmentFailure>) -> Self {
        match res {
            Ok(()) => Self::ok(),
            Err(failure) => failure.into(),
        }
    }
}

fn is_blank(s: Option<&str>) -> bool {
    s.is_none_or(|s| s.trim().is_empty())
}

/// Typed form of the alignment check; first failing rule wins
pub fn check_alignment<S: AsRef<str>>(
    expected: &[S],
    answers: &[ClarifierAnswer],
) -> std::result::Result<(), AlignmentFailure> {
    if expected.is_empty() {
        return Ok(());
    }
    if answers.len() != expected.len() {
        return Err(AlignmentFailure::AnswerCountMismatch {
            expected: expected.len(),
            got: answers.len(),
        });
    }

    for (index, (question, answer)) in expected.iter().zip(answers).enumerate() {
        let claimed = answer.sub_question.as_deref();
        if is_blank(claimed) {
            return Err(AlignmentFailure::MissingSubQuestion { index });
        }
        if normalize_text(claimed.unwrap_or_default()) != normalize_text(question.as_ref()) {
            return Err(AlignmentFailure::SubQuestionMismatch { index });
        }
        if is_blank(answer.answer.as_deref()) {
            return Err(AlignmentFailure::EmptyAnswer { index });
        }
    }
    Ok(())
}

/// Validate that `answers` pair index-for-index with `expected`
pub fn validate_clarifier_alignment<S: AsRef<str>>(
    expected: &[S],
    answers: &[ClarifierAnswer],
) -> AlignmentResult {
    let result = check_alignment(expected, answers);
    match &result {
        Ok(()) => debug!(count = answers.len(), "Clarifier answers aligned"),
        Err(failure) => warn!(reason = %failure, "Clarifier answers misaligned"),
    }
    result.into()
}
