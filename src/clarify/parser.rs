// src/clarify/parser.rs
// Split a clarification payload into ordered sub-questions
//
// Precedence: labeled lines ("1. ...", "Q2) ..."), then a semicolon split of
// the whole payload, then the whole trimmed payload as a single question.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

use crate::chain::{Step, first_success};

/// Which heuristic produced a sub-question list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ParseMethod {
    Labeled,
    Semicolon,
    Single,
}

impl ParseMethod {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Index label at the start of a line: optional bullet or bold marker, an
/// optional "Q"/"Question" prefix, digits, then `:`, `.` or `)`. Group 1 is
/// the question text; a label without it is bare.
#[allow(clippy::expect_used)]
static LABELED_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[-*•]\s*)?(?:\*\*)?(?:q(?:uestion)?\s*)?\d+[:.)](?:\*\*)?(?:\s+(.*))?$")
        .expect("valid regex")
});

/// Parse a payload into sub-questions. Never returns an empty list.
pub fn parse_sub_questions(payload: &str) -> (Vec<String>, ParseMethod) {
    let steps: [Step<'_, str, ParseMethod, Vec<String>>; 2] = [
        (ParseMethod::Labeled, &labeled_questions),
        (ParseMethod::Semicolon, &semicolon_questions),
    ];

    let (method, questions) = first_success(payload, &steps)
        .unwrap_or_else(|| (ParseMethod::Single, vec![payload.trim().to_string()]));

    debug!(
        method = method.as_str(),
        count = questions.len(),
        "Parsed clarification payload"
    );
    (questions, method)
}

/// Text following the index label (empty for a bare label), or None if the
/// line is not labeled
fn label_text(line: &str) -> Option<&str> {
    LABELED_LINE_RE
        .captures(line)
        .map(|caps| caps.get(1).map_or("", |m| m.as_str().trim()))
}

fn labeled_questions(payload: &str) -> Option<Vec<String>> {
    let mut questions = Vec::new();
    let mut current: Option<String> = None;

    for line in payload.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match label_text(line) {
            // A bare label asks nothing
            Some("") => continue,
            Some(text) => {
                if let Some(done) = current.take() {
                    questions.push(done);
                }
                current = Some(text.to_string());
            }
            None => {
                // Continuation of a wrapped question
                if let Some(q) = current.as_mut() {
                    q.push(' ');
                    q.push_str(line);
                }
            }
        }
    }
    if let Some(done) = current {
        questions.push(done);
    }

    (!questions.is_empty()).then_some(questions)
}

fn semicolon_questions(payload: &str) -> Option<Vec<String>> {
    let pieces: Vec<String> = payload
        .split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect();
    (pieces.len() > 1).then_some(pieces)
}
