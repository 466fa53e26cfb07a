// src/extract/solve_unit.rs
// Slice the target function definition out of extracted code
//
// Everything before the first `def <target>(...):` header is dropped. The
// slice is only usable if it holds a return statement.

use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

use super::fence::extract_single_code_block;
use super::syntax;
use crate::error::{ProtocolError, Result};

/// Function name the agent asks the model to define
pub const DEFAULT_TARGET_FUNCTION: &str = "solve";

#[allow(clippy::expect_used)]
static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

#[allow(clippy::expect_used)]
static DEFAULT_EXTRACTOR: LazyLock<SolveUnitExtractor> = LazyLock::new(|| {
    SolveUnitExtractor::new(DEFAULT_TARGET_FUNCTION).expect("default target is an identifier")
});

/// Finds and slices one named function definition
#[derive(Debug, Clone)]
pub struct SolveUnitExtractor {
    target: String,
    header: Regex,
}

impl SolveUnitExtractor {
    pub fn new(target: &str) -> Result<Self> {
        let target = target.trim();
        if !IDENTIFIER_RE.is_match(target) {
            return Err(ProtocolError::Config(format!(
                "target function '{target}' is not a valid identifier"
            )));
        }
        // `def` opens its line; parameters may span lines; return annotation
        // is optional
        let pattern = format!(
            r"(?m)^[ \t]*(def\s+{}\s*\((?s:.*?)\)\s*(?:->\s*[^:\n]+)?:)",
            regex::escape(target)
        );
        let header = Regex::new(&pattern)
            .map_err(|e| ProtocolError::Config(format!("invalid header pattern: {e}")))?;
        Ok(Self {
            target: target.to_string(),
            header,
        })
    }

    pub fn default_target() -> &'static Self {
        &DEFAULT_EXTRACTOR
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn has_header(&self, text: &str) -> bool {
        self.header.is_match(text)
    }

    /// Slice from the first target header to the end, if it returns something
    pub fn solve_unit(&self, text: &str) -> Option<String> {
        let start = self.header.captures(text)?.get(1)?.start();
        let unit = &text[start..];
        if !has_return_statement(unit) {
            debug!(function = %self.target, "Target function has no return statement");
            return None;
        }
        Some(unit.trim_end().to_string())
    }

    /// Fence-extract `raw` (falling back to `raw` itself) and slice the unit.
    /// Empty string on failure.
    pub fn extract_from_raw(&self, raw: &str) -> String {
        let code = extract_single_code_block(raw);
        let candidate = if code.is_empty() { raw } else { code.as_str() };
        self.solve_unit(candidate).unwrap_or_default()
    }
}

fn has_return_statement(unit: &str) -> bool {
    syntax::has_return_statement(unit).unwrap_or_else(|e| {
        warn!(error = %e, "Could not scan for return statement");
        false
    })
}

/// Solve unit of the default `solve` target, or empty string
pub fn extract_solve_from_raw(raw: &str) -> String {
    DEFAULT_EXTRACTOR.extract_from_raw(raw)
}
