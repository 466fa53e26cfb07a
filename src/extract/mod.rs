// src/extract/mod.rs
// Turn an arbitrary model response into one runnable solve unit
//
// fence -> solve_unit -> syntax. Nothing here returns an error for bad model
// output; failure is always `is_complete == false`.

pub mod fence;
pub mod solve_unit;
pub mod syntax;

pub use fence::{FenceStrategy, extract_code_from_response, extract_single_code_block, locate_code};
pub use solve_unit::{DEFAULT_TARGET_FUNCTION, SolveUnitExtractor, extract_solve_from_raw};
pub use syntax::{SyntaxIssue, SyntaxIssueKind, is_syntactically_complete, syntax_issues};

use serde::Serialize;
use tracing::{debug, warn};

use crate::chain::{Step, first_success};
use crate::error::Result;
use crate::utils::truncate;

/// `(code, is_complete)`; `is_complete` implies non-empty, parseable code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    pub code: String,
    pub is_complete: bool,
}

impl ExtractionResult {
    fn empty() -> Self {
        Self::default()
    }

    pub fn into_tuple(self) -> (String, bool) {
        (self.code, self.is_complete)
    }
}

/// Where the final code unit came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SolveSource {
    /// Solve unit sliced from the extracted code region
    Code,
    /// Solve unit sliced from the raw response
    Raw,
    /// No target definition anywhere; the whole code region is used
    WholeBlock,
}

impl SolveSource {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Extraction outcome plus the diagnostics of how it was reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionReport {
    #[serde(flatten)]
    pub result: ExtractionResult,
    pub fence: Option<FenceStrategy>,
    pub solve_source: Option<SolveSource>,
    pub syntax_issues: Vec<SyntaxIssue>,
}

impl ExtractionReport {
    fn rejected(fence: Option<FenceStrategy>) -> Self {
        Self {
            result: ExtractionResult::empty(),
            fence,
            solve_source: None,
            syntax_issues: Vec::new(),
        }
    }
}

/// Full response-to-code pipeline for one target function
#[derive(Debug, Clone)]
pub struct SolutionExtractor {
    solve: SolveUnitExtractor,
}

impl Default for SolutionExtractor {
    fn default() -> Self {
        Self {
            solve: SolveUnitExtractor::default_target().clone(),
        }
    }
}

impl SolutionExtractor {
    pub fn new(target_function: &str) -> Result<Self> {
        Ok(Self {
            solve: SolveUnitExtractor::new(target_function)?,
        })
    }

    pub fn target(&self) -> &str {
        self.solve.target()
    }

    pub fn extract(&self, raw: &str) -> ExtractionResult {
        self.extract_with_report(raw).result
    }

    pub fn extract_with_report(&self, raw: &str) -> ExtractionReport {
        let Some((fence, code)) = locate_code(raw) else {
            debug!(raw = %truncate(raw, 120), "No code found in response");
            return ExtractionReport::rejected(None);
        };

        // Slice from the extracted code first, then from the raw response
        let input = SliceInput {
            solve: &self.solve,
            code: &code,
            raw,
        };
        let steps: [Step<'_, SliceInput<'_>, SolveSource, String>; 2] =
            [(SolveSource::Code, &slice_code), (SolveSource::Raw, &slice_raw)];

        let (source, unit) = match first_success(&input, &steps) {
            Some(found) => found,
            // A target definition that never returns is not a usable answer
            None if self.solve.has_header(&code) => {
                debug!(function = self.target(), "Target function found without return");
                return ExtractionReport::rejected(Some(fence));
            }
            None => (SolveSource::WholeBlock, code),
        };

        let issues = match syntax_issues(&unit) {
            Ok(issues) => issues,
            Err(e) => {
                warn!(error = %e, "Could not run syntax check");
                return ExtractionReport {
                    result: ExtractionResult {
                        code: unit,
                        is_complete: false,
                    },
                    fence: Some(fence),
                    solve_source: Some(source),
                    syntax_issues: Vec::new(),
                };
            }
        };
        let is_complete = !unit.trim().is_empty() && issues.is_empty();
        debug!(
            fence = fence.as_str(),
            source = source.as_str(),
            is_complete,
            issues = issues.len(),
            "Extracted solution"
        );

        ExtractionReport {
            result: ExtractionResult {
                code: unit,
                is_complete,
            },
            fence: Some(fence),
            solve_source: Some(source),
            syntax_issues: issues,
        }
    }
}

/// Both texts a solve unit may be sliced from
struct SliceInput<'a> {
    solve: &'a SolveUnitExtractor,
    code: &'a str,
    raw: &'a str,
}

fn slice_code(input: &SliceInput<'_>) -> Option<String> {
    non_empty(input.solve.extract_from_raw(input.code))
}

fn slice_raw(input: &SliceInput<'_>) -> Option<String> {
    non_empty(input.solve.extract_from_raw(input.raw))
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

/// Extraction with diagnostics for the default `solve` target
pub fn extract_with_report(raw: &str) -> ExtractionReport {
    SolutionExtractor::default().extract_with_report(raw)
}

/// `(code, is_complete)` for the default `solve` target. Never fails.
pub fn extract_single_solution_from_raw(raw: &str) -> (String, bool) {
    SolutionExtractor::default().extract(raw).into_tuple()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_solve_round_trip() {
        let t = "def solve(x):\n    return x";
        let raw = format!("```python\n{t}\n```");
        assert_eq!(extract_single_solution_from_raw(&raw), (t.to_string(), true));
    }

    #[test]
    fn test_prose_only() {
        assert_eq!(
            extract_single_solution_from_raw("I am not sure what you want."),
            (String::new(), false)
        );
    }

    #[test]
    fn test_solve_without_return_rejected() {
        let raw = "```python\ndef solve(df):\n    df.to_csv('out.csv')\n```";
        assert_eq!(extract_single_solution_from_raw(raw), (String::new(), false));
    }

    #[test]
    fn test_syntax_error_keeps_text() {
        let raw = "```python\ndef solve(x):\n    return (x + 1\n```";
        let (code, complete) = extract_single_solution_from_raw(raw);
        assert_eq!(code, "def solve(x):\n    return (x + 1");
        assert!(!complete);
    }

    #[test]
    fn test_imports_before_solve_are_sliced_off() {
        let raw = "```python\nimport pandas as pd\n\ndef solve(df):\n    return df.head()\n```";
        let report = extract_with_report(raw);
        assert_eq!(report.result.code, "def solve(df):\n    return df.head()");
        assert!(report.result.is_complete);
        assert_eq!(report.fence, Some(FenceStrategy::PythonFence));
        assert_eq!(report.solve_source, Some(SolveSource::Code));
    }

    #[test]
    fn test_solve_found_in_raw_when_python_block_lacks_it() {
        // The python fence is preferred for the code region, but the solve
        // unit lives in the first (untagged) fence of the raw response
        let raw = "```text\ndef solve(x):\n    return x\n```\nRun with:\n```python\nprint(solve(1))\n```";
        let report = extract_with_report(raw);
        assert_eq!(report.fence, Some(FenceStrategy::PythonFence));
        assert_eq!(report.solve_source, Some(SolveSource::Raw));
        assert_eq!(report.result.code, "def solve(x):\n    return x");
        assert!(report.result.is_complete);
    }

    #[test]
    fn test_whole_block_when_no_target_defined() {
        let raw = "```python\nresult = 1 + 1\n```";
        let report = extract_with_report(raw);
        assert_eq!(report.solve_source, Some(SolveSource::WholeBlock));
        assert_eq!(report.result.code, "result = 1 + 1");
        assert!(report.result.is_complete);
    }

    #[test]
    fn test_truncated_response_recovered() {
        let raw = "Here it is:\n```python\ndef solve(x):\n    return x * 2\n";
        let report = extract_with_report(raw);
        assert_eq!(report.fence, Some(FenceStrategy::UnterminatedFence));
        assert_eq!(report.result.code, "def solve(x):\n    return x * 2");
        assert!(report.result.is_complete);
    }

    #[test]
    fn test_custom_target_function() {
        let extractor = SolutionExtractor::new("transform").unwrap();
        let raw = "```python\ndef transform(rows):\n    return sorted(rows)\n```";
        assert_eq!(
            extractor.extract(raw),
            ExtractionResult {
                code: "def transform(rows):\n    return sorted(rows)".to_string(),
                is_complete: true,
            }
        );
    }

    #[test]
    fn test_report_serializes_flat() {
        let report = extract_with_report("```python\ndef solve():\n    return 1\n```");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["is_complete"], true);
        assert_eq!(json["fence"], "python_fence");
        assert_eq!(json["solve_source"], "code");
    }

    #[test]
    fn test_python2_and_python3_invalid_code_incomplete() {
        for body in [
            "def solve(x):\n    print \"hi\"\n    return x",
            "def solve(x):\n    y := 1\n    return y",
            "def solve(x):\n    return f(a for a in x, 1)",
            "def solve(x):\n    y = 1\n\treturn x",
        ] {
            let raw = format!("```python\n{body}\n```");
            let report = extract_with_report(&raw);
            assert_eq!(report.result.code, body);
            assert!(!report.result.is_complete, "accepted: {body:?}");
            assert!(!report.syntax_issues.is_empty());
        }
    }

    #[test]
    fn test_whole_block_with_stray_return_incomplete() {
        let report = extract_with_report("```python\nreturn f(a for a in x, 1)\n```");
        assert_eq!(report.solve_source, Some(SolveSource::WholeBlock));
        assert!(!report.result.is_complete);
        assert!(
            report
                .syntax_issues
                .iter()
                .any(|i| i.kind == SyntaxIssueKind::OutsideFunction)
        );
    }

    #[test]
    fn test_commented_header_does_not_start_unit() {
        let raw = "```python\n# entry point: def solve(df): returns a frame\ndef solve(df):\n    return df\n```";
        assert_eq!(
            extract_single_solution_from_raw(raw),
            ("def solve(df):\n    return df".to_string(), true)
        );
    }

    #[test]
    fn test_return_only_inside_string_rejected() {
        let raw = "```python\ndef solve(df):\n    print('note: return later')\n```";
        assert_eq!(extract_single_solution_from_raw(raw), (String::new(), false));
    }

    #[test]
    fn test_slice_steps_read_their_own_text() {
        let solve = SolveUnitExtractor::default_target();
        let input = SliceInput {
            solve,
            code: "def solve():\n    return 1",
            raw: "no code here",
        };
        assert_eq!(slice_code(&input).as_deref(), Some("def solve():\n    return 1"));
        assert_eq!(slice_raw(&input), None);

        let input = SliceInput {
            solve,
            code: "print(1)",
            raw: "def solve():\n    return 2",
        };
        assert_eq!(slice_code(&input), None);
        assert_eq!(slice_raw(&input).as_deref(), Some("def solve():\n    return 2"));
    }
}
