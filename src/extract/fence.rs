// src/extract/fence.rs
// Locate the code region inside free-form model output
//
// A fenced block (```lang ... ```) wins over anything else. Without a fence
// the whole response only counts as code when it opens like Python source.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::debug;

use crate::chain::{Step, first_success};

/// Which strategy located the code region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FenceStrategy {
    /// First fence tagged python/py/python3/py3
    PythonFence,
    /// First closed fence of any (or no) language
    AnyFence,
    /// A trailing fence that was opened but never closed
    UnterminatedFence,
    /// No fence; the response itself starts like code
    BareCode,
}

impl FenceStrategy {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

const PYTHON_TAGS: &[&str] = &["python", "py", "python3", "py3"];

/// Tokens a bare (unfenced) response must open with to be taken as code
const CODE_OPENERS: &[&str] = &["import ", "from ", "def ", "class ", "#"];

const FENCE: &str = "```";

/// Closed fence: optional language tag, rest of the opening line ignored
#[allow(clippy::expect_used)]
static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[ \t]*([A-Za-z0-9_+#.\-]*)[^\n]*\n(.*?)```").expect("valid regex")
});

/// Closed fence explicitly tagged as Python
#[allow(clippy::expect_used)]
static PYTHON_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[ \t]*(?i:python3?|py3?)\b[^\n]*\n(.*?)```").expect("valid regex")
});

pub fn is_python_tag(tag: &str) -> bool {
    PYTHON_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

/// Drop leading blank lines and trailing whitespace, keep first-line indentation
fn strip_blank_edges(body: &str) -> &str {
    let trimmed = body.trim_end();
    let mut start = 0;
    for line in trimmed.split_inclusive('\n') {
        if !line.trim().is_empty() {
            break;
        }
        start += line.len();
    }
    &trimmed[start..]
}

/// Some models echo the fence's language as the first body line. When the tag
/// is not Python, drop a first line that is just a language name.
fn strip_echoed_tag<'a>(tag: &str, body: &'a str) -> &'a str {
    if tag.is_empty() || is_python_tag(tag) {
        return body;
    }
    let (first, rest) = body.split_once('\n').unwrap_or((body, ""));
    let first = first.trim();
    if is_python_tag(first) || first.eq_ignore_ascii_case(tag) {
        debug!(tag, echoed = first, "Dropping echoed language line");
        rest
    } else {
        body
    }
}

fn non_empty(body: &str) -> Option<String> {
    let body = strip_blank_edges(body);
    (!body.is_empty()).then(|| body.to_string())
}

fn python_fence(raw: &str) -> Option<String> {
    let caps = PYTHON_FENCE_RE.captures(raw)?;
    non_empty(caps.get(1)?.as_str())
}

fn any_fence(raw: &str) -> Option<String> {
    let caps = FENCE_RE.captures(raw)?;
    let tag = caps.get(1).map_or("", |m| m.as_str());
    let body = strip_blank_edges(caps.get(2)?.as_str());
    non_empty(strip_echoed_tag(tag, body))
}

fn unterminated_fence(raw: &str) -> Option<String> {
    if raw.matches(FENCE).count() % 2 == 0 {
        return None;
    }
    let open = raw.rfind(FENCE)?;
    let (opening_line, body) = raw[open + FENCE.len()..].split_once('\n')?;
    let tag = opening_line.split_whitespace().next().unwrap_or("");
    non_empty(strip_echoed_tag(tag, strip_blank_edges(body)))
}

fn bare_code(raw: &str) -> Option<String> {
    let text = raw.trim_start();
    if CODE_OPENERS.iter().any(|opener| text.starts_with(opener)) {
        non_empty(text)
    } else {
        None
    }
}

/// Body of the first closed fence, or the whole response if it reads as code.
/// Empty string when no code is present.
pub fn extract_single_code_block(raw: &str) -> String {
    let steps: [Step<'_, str, FenceStrategy, String>; 2] = [
        (FenceStrategy::AnyFence, &any_fence),
        (FenceStrategy::BareCode, &bare_code),
    ];
    first_success(raw, &steps)
        .map(|(_, code)| code)
        .unwrap_or_default()
}

/// Response-level variant: prefer a Python-tagged fence, then any fence, then
/// an unterminated trailing fence, then bare code.
pub fn locate_code(raw: &str) -> Option<(FenceStrategy, String)> {
    let steps: [Step<'_, str, FenceStrategy, String>; 4] = [
        (FenceStrategy::PythonFence, &python_fence),
        (FenceStrategy::AnyFence, &any_fence),
        (FenceStrategy::UnterminatedFence, &unterminated_fence),
        (FenceStrategy::BareCode, &bare_code),
    ];
    first_success(raw, &steps)
}

pub fn extract_code_from_response(raw: &str) -> String {
    locate_code(raw).map(|(_, code)| code).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_python_block() {
        let raw = "Here you go:\n```python\nimport pandas as pd\n\ndef solve():\n    return 1\n```\nDone.";
        assert_eq!(
            extract_single_code_block(raw),
            "import pandas as pd\n\ndef solve():\n    return 1"
        );
    }

    #[test]
    fn test_untagged_fence() {
        let raw = "```\nx = 1\n```";
        assert_eq!(extract_single_code_block(raw), "x = 1");
    }

    #[test]
    fn test_first_fence_wins() {
        let raw = "```\nfirst = 1\n```\ntext\n```\nsecond = 2\n```";
        assert_eq!(extract_single_code_block(raw), "first = 1");
    }

    #[test]
    fn test_echoed_language_line_dropped_for_non_python_tag() {
        let raw = "```text\npython\ndef solve():\n    return 2\n```";
        assert_eq!(extract_single_code_block(raw), "def solve():\n    return 2");

        let raw = "```sql\nsql\nSELECT 1\n```";
        assert_eq!(extract_single_code_block(raw), "SELECT 1");
    }

    #[test]
    fn test_python_tag_keeps_first_line() {
        let raw = "```python\npython = 3\n```";
        assert_eq!(extract_single_code_block(raw), "python = 3");
    }

    #[test]
    fn test_indentation_of_first_line_kept() {
        let raw = "```\n\n    x = 1\n```";
        assert_eq!(extract_single_code_block(raw), "    x = 1");
    }

    #[test]
    fn test_bare_code_fallback() {
        assert_eq!(
            extract_single_code_block("\n  import csv\nrows = []\n"),
            "import csv\nrows = []"
        );
        assert_eq!(
            extract_single_code_block("# solution\ndef solve():\n    return 0"),
            "# solution\ndef solve():\n    return 0"
        );
        assert_eq!(
            extract_single_code_block("class Foo:\n    pass"),
            "class Foo:\n    pass"
        );
    }

    #[test]
    fn test_prose_yields_empty() {
        assert_eq!(extract_single_code_block("I think the answer is 42."), "");
        assert_eq!(extract_single_code_block(""), "");
        // "define" is not "def "
        assert_eq!(extract_single_code_block("define the key first"), "");
    }

    #[test]
    fn test_unclosed_fence_not_accepted_by_single_block() {
        assert_eq!(extract_single_code_block("```python\ndef solve():\n    return 1"), "");
    }

    #[test]
    fn test_response_prefers_python_fence() {
        let raw = "```bash\npip install pandas\n```\n```python\nimport pandas\n```";
        assert_eq!(
            locate_code(raw),
            Some((FenceStrategy::PythonFence, "import pandas".to_string()))
        );
        assert_eq!(extract_single_code_block(raw), "pip install pandas");
    }

    #[test]
    fn test_python_tag_variants() {
        for tag in ["py", "Python3", "PY3", "python"] {
            let raw = format!("```{tag}\nx = 1\n```");
            assert_eq!(
                locate_code(&raw),
                Some((FenceStrategy::PythonFence, "x = 1".to_string())),
                "tag {tag}"
            );
        }
        let raw = "```pyspark\nx = 1\n```";
        assert_eq!(locate_code(raw).map(|(s, _)| s), Some(FenceStrategy::AnyFence));
    }

    #[test]
    fn test_response_recovers_unterminated_fence() {
        let raw = "Sure:\n```python\ndef solve():\n    return 1\n";
        assert_eq!(
            locate_code(raw),
            Some((
                FenceStrategy::UnterminatedFence,
                "def solve():\n    return 1".to_string()
            ))
        );
    }

    #[test]
    fn test_empty_fence_falls_through() {
        assert_eq!(extract_code_from_response("```python\n```"), "");
        // Only the first fence counts, even when a later one has code
        let raw = "```\n\n```\n```\nx = 2\n```";
        assert_eq!(locate_code(raw), None);
    }

    #[test]
    fn test_response_bare_code() {
        assert_eq!(
            locate_code("from math import pi\nprint(pi)"),
            Some((
                FenceStrategy::BareCode,
                "from math import pi\nprint(pi)".to_string()
            ))
        );
        assert_eq!(locate_code("no code here"), None);
    }
}
