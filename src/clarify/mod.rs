// src/clarify/mod.rs
// Clarification sub-protocol: split the model's question into sub-questions,
// then check that the answers line up with them

pub mod alignment;
pub mod parser;

pub use alignment::{
    AlignmentFailure, AlignmentResult, ClarifierAnswer, check_alignment,
    validate_clarifier_alignment,
};
pub use parser::{ParseMethod, parse_sub_questions};

use serde::Serialize;

/// One clarification exchange: the parsed questions of a payload, ready to
/// validate the answers that come back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClarificationTurn {
    pub questions: Vec<String>,
    pub method: ParseMethod,
}

impl ClarificationTurn {
    pub fn from_payload(payload: &str) -> Self {
        let (questions, method) = parse_sub_questions(payload);
        Self { questions, method }
    }

    /// True when the payload held no actual question text
    pub fn is_empty(&self) -> bool {
        self.questions.iter().all(|q| q.trim().is_empty())
    }

    pub fn validate(&self, answers: &[ClarifierAnswer]) -> AlignmentResult {
        validate_clarifier_alignment(&self.questions, answers)
    }

    /// Question/answer pairs in question order, only if the answers align
    pub fn pair<'a>(
        &'a self,
        answers: &'a [ClarifierAnswer],
    ) -> std::result::Result<Vec<(&'a str, &'a str)>, AlignmentFailure> {
        check_alignment(&self.questions, answers)?;
        Ok(self
            .questions
            .iter()
            .zip(answers)
            .map(|(q, a)| (q.as_str(), a.answer.as_deref().unwrap_or_default().trim()))
            .collect())
    }
}
